use crate::utils::{PreprocessConfig, ScanError};
use base64::{engine::general_purpose, Engine as _};
use image::{DynamicImage, ImageFormat, Rgba};
use imageproc::map::map_colors;
use log::{debug, warn};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

/// An ID card image as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Encoded image bytes (JPEG, PNG, ...) as read from a file.
    File(Vec<u8>),
    /// `data:<mime>;base64,<payload>` string.
    DataUrl(String),
}

impl ImageSource {
    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| {
            ScanError::ImageProcessingError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Ok(ImageSource::File(bytes))
    }

    /// A command-line image argument: a `data:` URL or a file path.
    pub fn from_arg(arg: &str) -> Result<Self, ScanError> {
        if arg.starts_with("data:") {
            decode_data_url(arg)?;
            Ok(ImageSource::DataUrl(arg.to_string()))
        } else {
            ImageSource::from_path(Path::new(arg))
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, ImageSource::File(_))
    }

    /// Encoded image bytes, decoding the data URL if needed.
    pub fn bytes(&self) -> Result<Cow<'_, [u8]>, ScanError> {
        match self {
            ImageSource::File(bytes) => Ok(Cow::Borrowed(bytes)),
            ImageSource::DataUrl(url) => decode_data_url(url).map(Cow::Owned),
        }
    }

    /// Data URL form, encoding file bytes with their sniffed MIME type.
    pub fn to_data_url(&self) -> String {
        match self {
            ImageSource::DataUrl(url) => url.clone(),
            ImageSource::File(bytes) => encode_data_url(sniff_mime(bytes), bytes),
        }
    }
}

fn sniff_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => "application/octet-stream",
    }
}

pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, general_purpose::STANDARD.encode(bytes))
}

pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ScanError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| ScanError::InvalidDataUrl("missing data: prefix".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ScanError::InvalidDataUrl("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ScanError::InvalidDataUrl(format!(
            "unsupported encoding in header '{}'",
            header
        )));
    }
    general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanError::InvalidDataUrl(e.to_string()))
}

/// Turns a raw card photo into something the OCR engine reads better.
pub trait Preprocessor {
    /// Never fails: on any problem the original image is handed back.
    fn preprocess(&self, image: &ImageSource) -> ImageSource;
}

/// Grayscale, contrast stretch and band threshold, emitted as a PNG data URL.
pub struct ImageProcessor {
    config: PreprocessConfig,
}

impl ImageProcessor {
    pub fn new(config: PreprocessConfig) -> Self {
        ImageProcessor { config }
    }

    fn try_preprocess(&self, image: &ImageSource) -> Result<ImageSource, ScanError> {
        let bytes = image.bytes()?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| {
            ScanError::ImageProcessingError(format!("Failed to load image: {}", e))
        })?;
        let cleaned = self.clean(&decoded);
        debug!(
            "Preprocessed {}x{} image for OCR",
            cleaned.width(),
            cleaned.height()
        );

        let mut buffer = Vec::new();
        cleaned
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| {
                ScanError::ImageProcessingError(format!("Failed to encode processed image: {}", e))
            })?;
        Ok(ImageSource::DataUrl(encode_data_url("image/png", &buffer)))
    }

    /// Pixel transform; alpha is carried through untouched.
    pub fn clean(&self, image: &DynamicImage) -> DynamicImage {
        let rgba = image.to_rgba8();
        let cleaned = map_colors(&rgba, |Rgba([r, g, b, a])| {
            let value = self.transform_pixel(r, g, b);
            Rgba([value, value, value, a])
        });
        DynamicImage::ImageRgba8(cleaned)
    }

    pub fn transform_pixel(&self, r: u8, g: u8, b: u8) -> u8 {
        let gray = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        let stretched = ((gray - 128.0) * self.config.contrast_factor + 128.0)
            .round()
            .clamp(0.0, 255.0) as u8;
        if stretched > self.config.white_threshold {
            255
        } else if stretched < self.config.black_threshold {
            0
        } else {
            stretched
        }
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        ImageProcessor::new(PreprocessConfig::default())
    }
}

impl Preprocessor for ImageProcessor {
    fn preprocess(&self, image: &ImageSource) -> ImageSource {
        match self.try_preprocess(image) {
            Ok(processed) => processed,
            Err(e) => {
                warn!("Preprocessing failed, using original image: {}", e);
                image.clone()
            }
        }
    }
}

/// Hands the image through unchanged.
pub struct NoopPreprocessor;

impl Preprocessor for NoopPreprocessor {
    fn preprocess(&self, image: &ImageSource) -> ImageSource {
        image.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, RgbaImage};

    fn png_bytes(image: RgbaImage) -> Vec<u8> {
        let mut buffer = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_pixel_transform_thresholds() {
        let processor = ImageProcessor::default();
        assert_eq!(processor.transform_pixel(255, 255, 255), 255);
        assert_eq!(processor.transform_pixel(0, 0, 0), 0);
        // Mid gray 128 stays on the midpoint and inside the band.
        assert_eq!(processor.transform_pixel(128, 128, 128), 128);
        // 140 -> (12 * 1.3) + 128 = 143.6 -> 144, above the white threshold.
        assert_eq!(processor.transform_pixel(140, 140, 140), 255);
        // 110 -> 104.6 -> 105, inside the band.
        assert_eq!(processor.transform_pixel(110, 110, 110), 105);
        // 100 -> 91.6 -> 92, below the black threshold.
        assert_eq!(processor.transform_pixel(100, 100, 100), 0);
    }

    #[test]
    fn test_pixel_transform_uses_luminance_weights() {
        let processor = ImageProcessor::default();
        // Pure green is brighter than pure blue under luminance weighting.
        assert_eq!(processor.transform_pixel(0, 255, 0), 255);
        assert_eq!(processor.transform_pixel(0, 0, 255), 0);
    }

    #[test]
    fn test_preprocess_keeps_dimensions_and_emits_png_data_url() {
        let image = RgbaImage::from_pixel(7, 3, Rgba([200, 30, 30, 255]));
        let source = ImageSource::File(png_bytes(image));

        let processed = ImageProcessor::default().preprocess(&source);
        let url = match &processed {
            ImageSource::DataUrl(url) => url.clone(),
            other => panic!("expected data URL, got {:?}", other),
        };
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = image::load_from_memory(&decode_data_url(&url).unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (7, 3));
        let pixel = decoded.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(pixel[0], pixel[1]);
        assert_eq!(pixel[1], pixel[2]);
    }

    #[test]
    fn test_preprocess_falls_back_on_undecodable_input() {
        let source = ImageSource::File(b"not an image".to_vec());
        assert_eq!(ImageProcessor::default().preprocess(&source), source);

        let bad_url = ImageSource::DataUrl("data:image/png,plain".to_string());
        assert_eq!(ImageProcessor::default().preprocess(&bad_url), bad_url);
    }

    #[test]
    fn test_data_url_round_trip_through_source() {
        let bytes = png_bytes(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 255])));
        let url = ImageSource::File(bytes.clone()).to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(ImageSource::DataUrl(url).bytes().unwrap().as_ref(), bytes.as_slice());
    }

    #[test]
    fn test_from_arg_accepts_data_urls_and_paths() {
        let url = "data:image/png;base64,AAAA";
        assert_eq!(
            ImageSource::from_arg(url).unwrap(),
            ImageSource::DataUrl(url.to_string())
        );
        assert!(ImageSource::from_arg("data:image/png,AAAA").is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"bytes").unwrap();
        let source = ImageSource::from_arg(file.path().to_str().unwrap()).unwrap();
        assert_eq!(source, ImageSource::File(b"bytes".to_vec()));
        assert!(ImageSource::from_arg("/nonexistent/card.jpg").is_err());
    }

    #[test]
    fn test_decode_data_url_rejects_malformed_input() {
        assert!(matches!(
            decode_data_url("image/png;base64,AAAA"),
            Err(ScanError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64"),
            Err(ScanError::InvalidDataUrl(_))
        ));
    }
}
