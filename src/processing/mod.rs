pub mod extractors;
pub mod image;
pub mod ocr;
pub mod strategy;
pub mod text_correction;

pub use extractors::FieldExtractor;
pub use image::{ImageProcessor, ImageSource, NoopPreprocessor, Preprocessor};
pub use ocr::{OcrEngine, OcrOutput, OcrProcessor, RetryPolicy, TesseractEngine};
