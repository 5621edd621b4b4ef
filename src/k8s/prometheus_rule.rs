use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use crate::health::MonitoringRule;

/// Name of the single group holding the health rules
pub const HEALTH_RULES_GROUP: &str = "NetObservHealthRules";

/// Prometheus operator rule resource, limited to what the health rules need
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "monitoring.coreos.com",
    version = "v1",
    kind = "PrometheusRule",
    namespaced,
    schema = "disabled"
)]
pub struct PrometheusRuleSpec {
    pub groups: Vec<RuleGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,
    pub rules: Vec<MonitoringRule>,
}

/// Wraps the rules, in order, into a `PrometheusRule` ready to be applied
pub fn prometheus_rule(
    rules: Vec<MonitoringRule>,
    name: &str,
    namespace: &str,
    app: &str,
    version: &str,
) -> PrometheusRule {
    let labels: BTreeMap<String, String> = [
        ("part-of", crate::OPERATOR_NAME),
        ("app", app),
        ("version", version),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    PrometheusRule {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: PrometheusRuleSpec {
            groups: vec![RuleGroup {
                name: HEALTH_RULES_GROUP.to_string(),
                rules,
            }],
        },
    }
}
