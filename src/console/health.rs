use serde::{Deserialize, Serialize};
use tracing::debug;

use netobs_common::{default_health_rules, GroupBy, HealthMode, HealthRuleThresholds, HealthSpec};

use crate::health::catalog::template_info;
use crate::health::variants::effective_definitions;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRuleLink {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRuleVariantMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_volume_threshold: Option<String>,
    pub thresholds: HealthRuleThresholds,
}

/// What the console needs to know about one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRuleMetadata {
    pub template: String,
    pub mode: HealthMode,
    pub summary: String,
    /// Pattern with `{threshold}`, `{legend}` and `{offset}` placeholders
    pub description: String,
    /// Supported groupings; `Global` stands for no grouping
    pub supported_groupings: Vec<String>,
    pub variants: Vec<HealthRuleVariantMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<HealthRuleLink>,
}

fn grouping_name(group_by: Option<GroupBy>) -> String {
    group_by.map_or_else(|| "Global".to_string(), |g| g.to_string())
}

/// Metadata of every enabled template whose agent feature is available
pub fn health_rules_metadata(spec: &HealthSpec) -> Vec<HealthRuleMetadata> {
    effective_definitions(
        &default_health_rules(),
        spec.health_rules.as_deref(),
        &spec.disable_alerts,
    )
    .into_iter()
    .filter(|definition| {
        let allowed = spec.is_allowed(definition.template);
        if !allowed {
            debug!(template = %definition.template, "Template hidden from console, missing agent feature");
        }
        allowed
    })
    .map(|definition| {
        let info = template_info(definition.template);
        HealthRuleMetadata {
            template: definition.template.to_string(),
            mode: definition.mode.unwrap_or(spec.health_mode),
            summary: info.summary.to_string(),
            description: info.description.to_string(),
            supported_groupings: info
                .supported_groupings
                .iter()
                .map(|g| grouping_name(*g))
                .collect(),
            variants: definition
                .variants
                .iter()
                .map(|variant| HealthRuleVariantMetadata {
                    group_by: variant.group_by,
                    low_volume_threshold: variant.low_volume().map(String::from),
                    thresholds: variant.thresholds.clone(),
                })
                .collect(),
            links: vec![HealthRuleLink {
                name: "Runbook".to_string(),
                url: info.runbook_url(),
            }],
        }
    })
    .collect()
}
