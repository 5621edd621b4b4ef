//! Health rule compiler
//!
//! Turns the health section of the configuration into Prometheus alerting or
//! recording rules.

pub mod builders;
pub mod catalog;
pub mod context;
pub mod eligibility;
pub mod emitter;
pub mod promql;
pub mod rule;
pub mod validation;
pub mod variants;

pub use emitter::{build_rules, compile, CompilationReport};
pub use rule::{AlertingRule, MonitoringRule, RecordingRule};
