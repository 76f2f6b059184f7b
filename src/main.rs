// Command line front end for the ID card scanner

use clap::{Parser, Subcommand};
use idscan::{
    models::{ExpectedIdentity, ScanResult},
    processing::ImageSource,
    submission::{check_response, FoundIdPayload},
    utils::{ScanError, ScannerConfig},
    IdScanner,
};
use log::debug;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "idscan", version, about = "Scan a national ID card and extract its fields")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON config file; built-in defaults are used otherwise
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tesseract language, overrides the config
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Directory holding the Tesseract language data
    #[arg(long, global = true)]
    tessdata: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan a card image (file path or data URL) and print a report
    Scan {
        image: String,
        /// Account first name to cross-check against the card
        #[arg(long)]
        first_name: Option<String>,
        /// Account last name to cross-check against the card
        #[arg(long)]
        last_name: Option<String>,
        /// Print the result as JSON instead of a report
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Scan a card image and print the found-ID registry payload
    FoundPayload { image: String },
    /// Interpret a backend submission response
    CheckResponse {
        #[arg(long)]
        status: u16,
        #[arg(long, default_value = "")]
        body: String,
    },
}

fn print_report(result: &ScanResult) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    println!("\n===============================================");
    println!("         ID CARD SCAN REPORT");
    println!("===============================================\n");

    println!("CARD INFORMATION:");
    println!("  ID Number: {}", field(&result.id_number));
    println!("  Serial Number: {}", field(&result.serial_number));
    println!("  Full Names: {}", field(&result.full_names));
    println!("  Date of Birth: {}", field(&result.date_of_birth));
    println!(
        "  Sex: {}",
        result.sex.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("  District of Birth: {}", field(&result.district_of_birth));
    println!("  Place of Issue: {}", field(&result.place_of_issue));
    println!("  Date of Issue: {}", field(&result.date_of_issue));
    println!("  OCR Confidence: {:.1}%", result.confidence);

    if !result.errors.is_empty() {
        println!("\nERRORS:");
        for error in &result.errors {
            println!("  - {}", error);
        }
    }
    if !result.warnings.is_empty() {
        println!("\nWARNINGS:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }

    println!(
        "\nScan result: {}",
        if result.success { "SUCCESS" } else { "FAILED" }
    );
}

fn load_config(args: &Args) -> Result<ScannerConfig, ScanError> {
    let mut config = ScannerConfig::load(args.config.as_deref())?;
    if let Some(lang) = &args.lang {
        config.language = lang.clone();
    }
    if let Some(tessdata) = &args.tessdata {
        config.tessdata_prefix = Some(tessdata.clone());
    }
    config.validate()?;
    Ok(config)
}

fn scan(config: ScannerConfig, image: &str, expected: Option<&ExpectedIdentity>) -> Result<ScanResult, ScanError> {
    let image = ImageSource::from_arg(image)?;
    let mut scanner = IdScanner::from_config(config);
    Ok(scanner.scan(&image, expected, &mut |p| debug!("OCR progress {}%", p)))
}

fn main() -> Result<(), ScanError> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(&args)?;

    match &args.command {
        Command::Scan {
            image,
            first_name,
            last_name,
            json,
        } => {
            let expected = ExpectedIdentity::new(first_name.as_deref(), last_name.as_deref());
            let expected = (!expected.is_empty()).then_some(expected);
            let result = scan(config, image, expected.as_ref())?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_report(&result);
            }
        }
        Command::FoundPayload { image } => {
            let result = scan(config, image, None)?;
            let payload = FoundIdPayload::from_outcome(&result.outcome())?;
            println!("{}", payload.to_json()?);
        }
        Command::CheckResponse { status, body } => match check_response(*status, body) {
            Ok(()) => println!("Submission accepted."),
            Err(e) => println!("{}", e),
        },
    }

    Ok(())
}
