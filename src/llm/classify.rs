//! Map raw transport/API failures onto the user-facing error classes.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::GenerationError;

static RATE_LIMIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)429|quota|rate[ _-]?limit|resource_exhausted|too many requests")
        .expect("rate limit pattern is valid")
});

/// Classify a failure by its message text.
///
/// Anything mentioning HTTP 429, quota or rate limiting is `RateLimited`;
/// everything else is `Failed` with the message preserved.
pub fn classify_failure(message: impl Into<String>) -> GenerationError {
    let message = message.into();
    if RATE_LIMIT.is_match(&message) {
        GenerationError::RateLimited(message)
    } else {
        GenerationError::Failed(message)
    }
}
