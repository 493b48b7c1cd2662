// Key provider: reads the provider API key from a local file and checks
// its shape before any request is built. The key is loaded once in `main`
// and handed to the client; nothing re-reads it afterwards.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PickerError, Result};

/// Conventional key file location, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "./apikey.txt";

/// `AIza` followed by exactly 35 URL-safe characters, nothing else.
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^AIza[0-9A-Za-z_-]{35}$").expect("valid regex"));

/// A validated provider API key.
///
/// `Debug` is redacted so the key never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validate a raw key string.
    ///
    /// Returns `None` when the string is not exactly one well-formed key.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        KEY_PATTERN.is_match(raw).then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(AIza****)")
    }
}

/// Read the key file at `path` and validate its contents.
///
/// The whole contents must be one key; a key followed by anything else is
/// rejected rather than prefix-matched. One trailing `\n` or `\r\n` is
/// stripped before matching, since editors add it. Any other surrounding
/// whitespace makes the key invalid.
pub fn load_credential(path: &Path) -> Result<Credential> {
    let contents = std::fs::read_to_string(path).map_err(|source| PickerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = contents
        .strip_suffix("\r\n")
        .or_else(|| contents.strip_suffix('\n'))
        .unwrap_or(&contents);

    let credential = Credential::parse(raw).ok_or_else(|| PickerError::InvalidCredentialFormat {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(path = %path.display(), "loaded API key");
    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = "abcdefghijklmnopqrstuvwxyz0123456-_"; // 35 chars

    #[test]
    fn accepts_prefix_plus_35_valid_chars() {
        assert_eq!(BODY.len(), 35);
        let key = format!("AIza{BODY}");
        assert_eq!(Credential::parse(&key).map(|c| c.as_str().to_owned()), Some(key));
    }

    #[test]
    fn rejects_one_short() {
        let key = format!("AIza{}", &BODY[..34]);
        assert!(Credential::parse(&key).is_none());
    }

    #[test]
    fn rejects_one_over() {
        let key = format!("AIza{BODY}X");
        assert!(Credential::parse(&key).is_none());
    }

    #[test]
    fn rejects_invalid_character() {
        let key = format!("AIza{}!", &BODY[..34]);
        assert!(Credential::parse(&key).is_none());
    }

    #[test]
    fn rejects_wrong_prefix() {
        let key = format!("AIzb{BODY}");
        assert!(Credential::parse(&key).is_none());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = Credential::parse(&format!("AIza{BODY}")).unwrap();
        assert!(!format!("{key:?}").contains(BODY));
    }
}
