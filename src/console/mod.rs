//! Console plugin configuration
//!
//! The health page of the console reads the configured templates and
//! thresholds from here; the rules themselves are queried from Prometheus.

pub mod health;

pub use health::{health_rules_metadata, HealthRuleMetadata, HealthRuleVariantMetadata};
