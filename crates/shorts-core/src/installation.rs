//! Installation identifiers.

use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Maximum length of an installation identifier.
pub const MAX_INSTALLATION_ID_LEN: usize = 100;

/// Maximum length of a client version string.
pub const MAX_VERSION_LEN: usize = 20;

/// Version reported when a client does not send one.
pub const DEFAULT_CLIENT_VERSION: &str = "1.0.0";

/// Generates a fresh opaque installation identifier.
pub fn generate_installation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Checks that an installation identifier is usable as a storage key.
pub fn validate_installation_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(CoreError::InvalidId("installation id is required".into()));
    }
    if id.len() > MAX_INSTALLATION_ID_LEN {
        return Err(CoreError::InvalidId(format!(
            "installation id exceeds {} characters",
            MAX_INSTALLATION_ID_LEN
        )));
    }
    if id.chars().any(|c| c.is_control() || c == '/') {
        return Err(CoreError::InvalidId(
            "installation id contains forbidden characters".into(),
        ));
    }
    Ok(())
}

/// Checks a client version string.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() || version.len() > MAX_VERSION_LEN {
        return Err(CoreError::InvalidVersion(format!(
            "version must be 1-{} characters",
            MAX_VERSION_LEN
        )));
    }
    Ok(())
}
