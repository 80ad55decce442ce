use std::path::Path;

use crate::config::ConfigError;

/// Settings read from the optional TOML config file.
///
/// Every key is optional here; required values may still come from flags or
/// the environment.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConmonConfigFile {
    pub hostname: Option<String>,
    pub webhook_url: Option<String>,
    pub time_limit: Option<u32>,
    pub restart_limit: Option<usize>,
    pub channel: Option<String>,
    pub proxy: Option<String>,
}

impl ConmonConfigFile {
    fn try_init_from_string(config: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(config)?)
    }

    pub fn try_init(path: &Path) -> Result<Self, ConfigError> {
        let config = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::try_init_from_string(&config)
    }
}
