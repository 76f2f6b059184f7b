use crate::utils::ScanError;
use log::warn;
use serde::Deserialize;

pub const TOO_MANY_REQUESTS: u16 = 429;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    remaining_seconds: Option<u64>,
    message: Option<String>,
    error: Option<String>,
}

/// Cool-down reported by the backend after too many submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub remaining_seconds: Option<u64>,
}

impl RateLimit {
    /// Recognize a 429 response. The body's `remainingSeconds` is optional.
    pub fn from_response(status: u16, body: &str) -> Option<Self> {
        if status != TOO_MANY_REQUESTS {
            return None;
        }
        let remaining_seconds = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.remaining_seconds);
        Some(RateLimit { remaining_seconds })
    }

    pub fn message(&self) -> String {
        match self.remaining_seconds {
            Some(secs) if secs > 0 => format!(
                "Too many submissions. Please wait {} before trying again.",
                format_wait(secs)
            ),
            _ => "Too many submissions. Please try again later.".to_string(),
        }
    }

    pub fn into_error(self) -> ScanError {
        ScanError::RateLimited {
            remaining_seconds: self.remaining_seconds.unwrap_or(0),
            message: self.message(),
        }
    }
}

/// Map a backend response to `Ok` for 2xx, or the matching error.
pub fn check_response(status: u16, body: &str) -> Result<(), ScanError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    if let Some(limit) = RateLimit::from_response(status, body) {
        warn!("Submission rate limited: {:?}", limit.remaining_seconds);
        return Err(limit.into_error());
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| "Submission failed. Please try again.".to_string());
    Err(ScanError::SubmissionFailed { status, message })
}

fn format_wait(secs: u64) -> String {
    let plural = |n: u64, unit: &str| {
        if n == 1 {
            format!("1 {}", unit)
        } else {
            format!("{} {}s", n, unit)
        }
    };
    let (minutes, seconds) = (secs / 60, secs % 60);
    match (minutes, seconds) {
        (0, s) => plural(s, "second"),
        (m, 0) => plural(m, "minute"),
        (m, s) => format!("{} {}", plural(m, "minute"), plural(s, "second")),
    }
}
