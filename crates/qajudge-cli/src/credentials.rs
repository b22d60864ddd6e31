use std::path::Path;

use serde::Deserialize;

use qajudge_core::error::{ConfigError, Result};

/// API credentials read from a small YAML file:
///
/// ```yaml
/// key: sk-...
/// ```
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("key", &"<redacted>").finish()
    }
}

impl Credentials {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let creds: Credentials = serde_yaml::from_str(text)
            .map_err(|e| ConfigError::Credentials(format!("invalid credentials: {e}")))?;
        if creds.key.trim().is_empty() {
            return Err(ConfigError::Credentials("`key` is empty".into()).into());
        }
        Ok(creds)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Credentials(format!("{}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }
}
