//! Per-rule construction context and the health annotation it produces

use serde::{Deserialize, Serialize};

use netobs_common::{
    GroupBy, HealthMode, HealthRuleTemplate, HealthRuleThresholds, HealthRuleVariant, Severity,
};

use super::eligibility::{eligible_metrics, pick_or_first};
use super::promql::{self, AlertBand};

/// Directional view on symmetric flow metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Src,
    Dst,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Src, Side::Dst];

    /// Label prefix, as in `SrcK8S_Namespace`
    pub const fn as_str(self) -> &'static str {
        match self {
            Side::Src => "Src",
            Side::Dst => "Dst",
        }
    }

    const fn legend(self) -> &'static str {
        match self {
            Side::Src => "source ",
            Side::Dst => "dest. ",
        }
    }
}

/// Machine-readable block embedded in rule annotations for the console health page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_threshold: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_thresholds: Option<HealthRuleThresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<String>,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespace_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owner_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_link: Option<TrafficLink>,
}

/// Hints for the console to link an alert to the matching traffic view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficLink {
    pub extra_filter: String,
    pub back_and_forth: bool,
    pub filter_destination: bool,
}

impl HealthAnnotation {
    /// Gives a closed scale to open-ended increases: `max(factor * highest, 100)`
    pub fn close_open_scale(&mut self, ctx: &RuleContext<'_>, factor: f64) {
        let highest = ctx
            .highest_threshold()
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(100.0);
        self.upper_bound = Some(((highest * factor).max(100.0) as i64).to_string());
    }

    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Everything a builder needs to produce one rule
///
/// Built fresh for every emitted rule; it borrows the variant and the enabled
/// metrics from the compilation input.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub template: HealthRuleTemplate,
    pub variant: &'a HealthRuleVariant,
    pub mode: HealthMode,
    pub enabled_metrics: &'a [String],
    pub side: Option<Side>,
    pub severity: Option<Severity>,
    pub alert_threshold: Option<&'a str>,
    pub upper_threshold: Option<&'a str>,
    pub recording_thresholds: Option<HealthRuleThresholds>,
    pub duration: &'static str,
}

impl<'a> RuleContext<'a> {
    pub fn group_by(&self) -> Option<GroupBy> {
        self.variant.group_by
    }

    pub fn is_recording(&self) -> bool {
        self.mode == HealthMode::RecordingRules
    }

    /// Threshold comparison for alerts; `None` for recording rules
    pub fn alert_band(&self) -> Option<AlertBand<'a>> {
        if self.is_recording() {
            return None;
        }
        self.alert_threshold.map(|threshold| AlertBand {
            threshold,
            upper: self.upper_threshold,
        })
    }

    pub fn lowest_threshold(&self) -> Option<&str> {
        self.alert_threshold
            .or_else(|| self.recording_thresholds.as_ref().and_then(|t| t.lowest()))
    }

    pub fn highest_threshold(&self) -> Option<&str> {
        self.alert_threshold
            .or_else(|| self.recording_thresholds.as_ref().and_then(|t| t.highest()))
    }

    /// Label hint appended to descriptions, e.g. ` [source namespace={{ $labels.namespace }}]`
    pub fn legend(&self) -> String {
        let side = self.side.map(Side::legend).unwrap_or_default();
        match self.group_by() {
            Some(GroupBy::Node) => format!(" [{}node={{{{ $labels.node }}}}]", side),
            Some(GroupBy::Namespace) => {
                format!(" [{}namespace={{{{ $labels.namespace }}}}]", side)
            }
            Some(GroupBy::Workload) => format!(
                " [{}workload={{{{ $labels.workload }}}} ({{{{ $labels.kind }}}})]",
                side
            ),
            None => String::new(),
        }
    }

    pub fn filters(&self, extra: Option<&str>) -> String {
        promql::label_filters(self.group_by(), self.side, extra)
    }

    /// `netobserv:health:{key}[:{groupBy}[:{side}]]:rate{window}`
    pub fn recording_name(&self, key: &str, window: &str) -> String {
        let mut parts = vec!["netobserv".to_string(), "health".to_string(), key.to_string()];
        if let Some(group_by) = self.group_by() {
            parts.push(group_by.as_str().to_lowercase());
            if let Some(side) = self.side {
                parts.push(side.as_str().to_lowercase());
            }
        }
        parts.push(format!("rate{}", window));
        parts.join(":")
    }

    /// Numerator and denominator metric names, first enabled candidate of each
    pub fn metrics(&self) -> (String, String) {
        let candidates = eligible_metrics(self.template, self.group_by());
        (
            pick_or_first(&candidates.numerator, self.enabled_metrics),
            pick_or_first(&candidates.denominator, self.enabled_metrics),
        )
    }

    pub fn health_annotation(&self) -> HealthAnnotation {
        let mut annotation = HealthAnnotation {
            alert_threshold: self.alert_threshold.map(String::from),
            recording_thresholds: self.recording_thresholds.clone(),
            unit: "%".to_string(),
            ..Default::default()
        };
        match self.group_by() {
            Some(GroupBy::Node) => annotation.node_labels = vec!["node".to_string()],
            Some(GroupBy::Namespace) => {
                annotation.namespace_labels = vec!["namespace".to_string()]
            }
            Some(GroupBy::Workload) => {
                annotation.namespace_labels = vec!["namespace".to_string()];
                annotation.owner_labels = vec!["workload".to_string()];
            }
            None => {}
        }
        annotation
    }
}
