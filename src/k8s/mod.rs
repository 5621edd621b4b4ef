//! Kubernetes objects carrying the compiled rules

pub mod prometheus_rule;

pub use prometheus_rule::{prometheus_rule, PrometheusRule, PrometheusRuleSpec, RuleGroup};
