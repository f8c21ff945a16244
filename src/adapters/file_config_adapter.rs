//! INI file configuration adapter.

use crate::domain::error::MomentumError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
    origin: String,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MomentumError> {
        let origin = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config
            .load(path.as_ref())
            .map_err(|reason| MomentumError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { config, origin })
    }

    pub fn from_string(content: &str) -> Result<Self, MomentumError> {
        let origin = "<inline>".to_string();
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| MomentumError::ConfigParse {
                file: origin.clone(),
                reason,
            })?;
        Ok(Self { config, origin })
    }

    /// File the settings were read from, for error messages.
    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }
}
