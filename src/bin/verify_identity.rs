use clap::Parser;
use idscan::{
    models::ExpectedIdentity,
    processing::ImageSource,
    submission::VerificationPayload,
    utils::{ScanError, ScannerConfig},
    verification::{CaptureStore, FacePose, LivenessCapture, LivenessStep},
    IdScanner,
};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Build an identity verification submission from an ID card photo and
/// three face captures. Captures are kept between runs until a payload is
/// produced, so they can be supplied one at a time.
#[derive(Parser, Debug)]
#[command(name = "verify_identity", version)]
struct Args {
    /// ID card image (file path or data URL)
    #[arg(long)]
    id_image: Option<String>,

    /// Account first name
    #[arg(long)]
    first_name: String,

    /// Account last name
    #[arg(long)]
    last_name: String,

    /// Face looking straight at the camera
    #[arg(long)]
    face_front: Option<String>,

    /// Face turned to the left
    #[arg(long)]
    face_left: Option<String>,

    /// Face turned to the right
    #[arg(long)]
    face_right: Option<String>,

    /// Discard stored captures before starting
    #[arg(long, default_value_t = false)]
    reset: bool,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), ScanError> {
    env_logger::init();
    let args = Args::parse();
    let config = ScannerConfig::load(args.config.as_deref())?;

    let store = CaptureStore::from_config(&config);
    if args.reset {
        store.clear()?;
    }
    let mut liveness = LivenessCapture::resume(store.load()?.unwrap_or_default());
    if liveness.step() == LivenessStep::Idle {
        liveness.start()?;
    }

    let faces = [
        (FacePose::Front, &args.face_front),
        (FacePose::Left, &args.face_left),
        (FacePose::Right, &args.face_right),
    ];
    for (pose, image) in faces {
        let Some(image) = image else {
            continue;
        };
        if liveness.step().pose() != Some(pose) {
            warn!(
                "Ignoring {} face image, current step is {:?}",
                pose,
                liveness.step()
            );
            continue;
        }
        liveness.capture(ImageSource::from_arg(image)?.to_data_url())?;
        store.save(liveness.captures())?;
    }

    if !liveness.is_done() {
        println!("{}", liveness.step().instruction());
        return Ok(());
    }

    let Some(id_image) = &args.id_image else {
        println!("Face captures complete. Provide --id-image to finish verification.");
        return Ok(());
    };

    let account = ExpectedIdentity::new(Some(args.first_name.as_str()), Some(args.last_name.as_str()));
    let id_image = ImageSource::from_arg(id_image)?;
    let mut scanner = IdScanner::from_config(config);
    let scan = scanner.scan(&id_image, Some(&account), &mut |p| debug!("OCR progress {}%", p));
    for warning in &scan.warnings {
        println!("warning: {}", warning);
    }

    let payload = VerificationPayload::build(&scan, &account, &id_image, liveness.captures())?;
    println!("{}", payload.to_json()?);
    store.clear()?;
    info!("Verification payload produced, stored captures cleared");
    Ok(())
}
