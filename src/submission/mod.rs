pub mod found_id;
pub mod identity_verification;
pub mod rate_limit;

pub use found_id::FoundIdPayload;
pub use identity_verification::VerificationPayload;
pub use rate_limit::{check_response, RateLimit};
