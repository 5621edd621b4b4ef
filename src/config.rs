//! Compiler input
//!
//! A YAML document shaped like the metrics section of the FlowCollector
//! resource, camelCase keys.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use netobs_common::{HealthMode, HealthSpec};

use crate::error::{NetobsError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(flatten)]
    pub health: HealthSpec,
}

impl HealthConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: HealthConfig = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.health.namespace.trim().is_empty() {
            return Err(NetobsError::ConfigError(
                "namespace must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Replaces the global mode, e.g. from the command line
    pub fn with_mode(mut self, mode: Option<HealthMode>) -> Self {
        if let Some(mode) = mode {
            self.health.health_mode = mode;
        }
        self
    }
}

pub async fn load(path: impl AsRef<Path>) -> Result<HealthConfig> {
    let path = path.as_ref();
    debug!("Loading configuration from {}", path.display());
    let contents = tokio::fs::read_to_string(path).await?;
    HealthConfig::from_yaml(&contents)
}
