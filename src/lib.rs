pub mod id_scanner;
pub mod models;
pub mod processing;
pub mod submission;
pub mod utils;
pub mod validation;
pub mod verification;

pub use id_scanner::{scan_id_card, IdScanner};
