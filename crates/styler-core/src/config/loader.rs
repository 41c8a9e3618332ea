//! Parsing configuration from text

use super::limits::MutationConfiguration;
use crate::{Result, StylerError};
use schemars::Schema;

/// Loads and validates [`MutationConfiguration`] documents
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn from_json_str(content: &str) -> Result<MutationConfiguration> {
        let config: MutationConfiguration = serde_json::from_str(content)
            .map_err(|e| StylerError::config_error(format!("Invalid JSON configuration: {e}")))?;
        Self::finish(config, "JSON")
    }

    pub fn from_toml_str(content: &str) -> Result<MutationConfiguration> {
        let config: MutationConfiguration = toml::from_str(content)
            .map_err(|e| StylerError::config_error(format!("Invalid TOML configuration: {e}")))?;
        Self::finish(config, "TOML")
    }

    /// JSON Schema of the configuration document
    pub fn json_schema() -> Schema {
        schemars::schema_for!(MutationConfiguration)
    }

    fn finish(config: MutationConfiguration, format: &str) -> Result<MutationConfiguration> {
        config.validate()?;
        tracing::debug!(
            "Loaded {} configuration: max depth {}, max modifications {}",
            format,
            config.max_recursion_depth,
            config.max_modifications
        );
        Ok(config)
    }
}
