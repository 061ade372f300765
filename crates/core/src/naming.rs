//! Script name validation.
//!
//! Script names become file-path components in the repository and the
//! scratch area, so only a conservative character set is accepted.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;

/// Letters, digits, underscore and hyphen; at least one character.
const SCRIPT_NAME_PATTERN: &str = r"^[A-Za-z0-9_-]+$";

static SCRIPT_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SCRIPT_NAME_PATTERN).expect("valid regex"));

/// Message returned for every rejected name.
pub const INVALID_NAME_MESSAGE: &str =
    "Script name can only contain letters, numbers, underscores, and hyphens";

/// Validate a script name, returning it unchanged on success.
///
/// # Examples
///
/// ```
/// use bsm_core::naming::validate_script_name;
///
/// assert!(validate_script_name("hello_cube-2").is_ok());
/// assert!(validate_script_name("../etc/passwd").is_err());
/// ```
pub fn validate_script_name(name: &str) -> Result<&str, CoreError> {
    if SCRIPT_NAME_RE.is_match(name) {
        Ok(name)
    } else {
        Err(CoreError::Validation(INVALID_NAME_MESSAGE.to_string()))
    }
}
