use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::common::error::PublisherError;
use crate::common::result::PublisherResult;
use crate::common::templates::TemplateProcessor;
use crate::domain::entities::publisher_config::PublisherConfig;

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "publisher.yml";

/// Loads and validates `publisher.yml` files
#[derive(Debug, Clone, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the config at `config_path` and expand placeholders in the
    /// commit message and the pre-run script
    pub fn read_config<P: AsRef<Path>>(
        &self,
        config_path: P,
        templates: &TemplateProcessor,
    ) -> PublisherResult<PublisherConfig> {
        let config_path = config_path.as_ref();
        debug!("Reading {} config", config_path.display());

        let contents = fs::read_to_string(config_path).map_err(|e| {
            let message = if e.kind() == ErrorKind::NotFound {
                format!("config file not found at {:?}", config_path.display().to_string())
            } else {
                format!("failed to read {:?}", config_path.display().to_string())
            };
            PublisherError::config_error_with_source(message, Some(config_path.to_path_buf()), e)
        })?;

        self.parse_config(&contents, templates).map_err(|e| match e {
            PublisherError::ConfigError {
                message,
                path: None,
                source,
            } => PublisherError::ConfigError {
                message,
                path: Some(config_path.to_path_buf()),
                source,
            },
            other => other,
        })
    }

    /// Parse YAML config contents
    pub fn parse_config(
        &self,
        contents: &str,
        templates: &TemplateProcessor,
    ) -> PublisherResult<PublisherConfig> {
        let mut config: PublisherConfig = serde_yaml::from_str(contents)?;

        config.commit_message = templates.process(&config.commit_message);
        config.pre_run_script = config
            .pre_run_script
            .map(|script| templates.process(&script));

        config.validate_all()?;

        Ok(config)
    }
}
