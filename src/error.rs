use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetobsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid health rules configuration: {}", .0.join("; "))]
    InvalidHealthRules(Vec<String>),

    #[error("{template} health rule does not support grouping per {group_by}")]
    UnsupportedGroupBy { template: String, group_by: String },

    #[error("No rule builder for template: {0}")]
    NoRuleBuilder(String),

    #[error("Failed to encode health annotation: {0}")]
    EncodingError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Metrics error: {0}")]
    MetricsError(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetobsError>;
