//! Channel name validation.
//!
//! Valid channel names:
//! - Must be non-empty and at most 255 bytes
//! - Must not contain whitespace or control characters
//! - Must not contain `/` or `\` (names key files and maps, never paths)
//! - Must not be `.` or `..`

use crate::error::{HeadError, Result};

const MAX_LEN: usize = 255;

/// Validate a channel name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use chanlog_refs::names::validate_channel_name;
///
/// assert!(validate_channel_name("chat").is_ok());
/// assert!(validate_channel_name("team.general-2").is_ok());
/// assert!(validate_channel_name("").is_err());
/// assert!(validate_channel_name("a/b").is_err());
/// ```
pub fn validate_channel_name(name: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(HeadError::InvalidChannelName {
            name: name.to_string(),
            reason: reason.into(),
        })
    };

    if name.is_empty() {
        return reject("channel name must not be empty");
    }
    if name.len() > MAX_LEN {
        return reject("channel name exceeds 255 bytes");
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return reject("contains whitespace or control characters");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("must not contain path separators");
    }
    if name == "." || name == ".." {
        return reject("must not be '.' or '..'");
    }
    Ok(())
}
