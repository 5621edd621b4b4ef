//! Shared health rule types for netobs
//!
//! This crate defines the health section of the FlowCollector resource:
//! - Health rule templates and the variants configured for each of them
//! - Per-severity thresholds and grouping criteria
//! - The built-in default catalog that user definitions override
//!
//! It carries no compilation logic; the `netobs` crate turns these values
//! into Prometheus rules.

mod defaults;
mod health;

pub use defaults::{default_health_rules, DEFAULT_INCLUDE_LIST, DEFAULT_NAMESPACE};
pub use health::{
    AgentFeature, GroupBy, HealthMode, HealthRuleDefinition, HealthRuleTemplate,
    HealthRuleThresholds, HealthRuleVariant, HealthSpec, Severity,
};
