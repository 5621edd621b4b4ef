use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use netobs_common::{HealthRuleTemplate, Severity};

use super::builders::HealthRule;
use super::catalog::{runbook_url, template_info};
use super::context::{HealthAnnotation, RuleContext};
use crate::error::Result;

pub const HEALTH_ANNOTATION_KEY: &str = "netobserv_io_network_health";

/// A Prometheus rule as found in a `PrometheusRule` group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonitoringRule {
    Alert(AlertingRule),
    Record(RecordingRule),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertingRule {
    pub alert: String,
    pub expr: String,
    #[serde(rename = "for")]
    pub for_duration: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingRule {
    pub record: String,
    pub expr: String,
    pub labels: BTreeMap<String, String>,
}

impl MonitoringRule {
    pub fn name(&self) -> &str {
        match self {
            MonitoringRule::Alert(r) => &r.alert,
            MonitoringRule::Record(r) => &r.record,
        }
    }

    pub fn expr(&self) -> &str {
        match self {
            MonitoringRule::Alert(r) => &r.expr,
            MonitoringRule::Record(r) => &r.expr,
        }
    }

    pub fn labels(&self) -> &BTreeMap<String, String> {
        match self {
            MonitoringRule::Alert(r) => &r.labels,
            MonitoringRule::Record(r) => &r.labels,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, MonitoringRule::Alert(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MonitoringRule::Alert(_) => "alert",
            MonitoringRule::Record(_) => "recording",
        }
    }
}

/// Labels shared by every rule; `for_health` marks rules read by the console health page
pub fn base_labels(
    template: HealthRuleTemplate,
    severity: Option<Severity>,
    for_health: bool,
) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("template".to_string(), template.to_string());
    labels.insert("app".to_string(), "netobserv".to_string());
    if let Some(severity) = severity {
        labels.insert("severity".to_string(), severity.to_string());
    }
    if for_health {
        labels.insert("netobserv".to_string(), "true".to_string());
    }
    labels
}

fn recording_labels(ctx: &RuleContext<'_>) -> BTreeMap<String, String> {
    let mut labels = base_labels(ctx.template, None, true);
    if let Some(group_by) = ctx.group_by() {
        labels.insert("groupBy".to_string(), group_by.to_string());
    }
    if let Some(side) = ctx.side {
        labels.insert("side".to_string(), side.as_str().to_string());
    }
    labels
}

/// `{template}_[Per{side}{groupBy}]{Severity}`
pub fn alert_name(ctx: &RuleContext<'_>) -> String {
    let per = ctx
        .group_by()
        .map(|g| {
            let side = ctx.side.map(|s| s.as_str()).unwrap_or_default();
            format!("Per{}{}", side, g)
        })
        .unwrap_or_default();
    let severity = ctx.severity.map(|s| s.title()).unwrap_or_default();
    format!("{}_{}{}", ctx.template, per, severity)
}

/// Standard annotation set: summary, description, runbook and health block
///
/// The description uses the lowest threshold in play, so that it stays
/// meaningful for recording contexts too.
pub fn annotations(
    ctx: &RuleContext<'_>,
    legend: &str,
    offset: &str,
    health: &HealthAnnotation,
) -> Result<BTreeMap<String, String>> {
    let info = template_info(ctx.template);
    let threshold = ctx.lowest_threshold().unwrap_or_default();

    let mut annotations = BTreeMap::new();
    annotations.insert("summary".to_string(), info.summary.to_string());
    annotations.insert(
        "description".to_string(),
        info.render_description(threshold, legend, offset),
    );
    annotations.insert("runbook_url".to_string(), runbook_url(ctx.template));
    annotations.insert(HEALTH_ANNOTATION_KEY.to_string(), health.encode()?);
    Ok(annotations)
}

/// Wraps an expression into an alerting or recording rule, per the context mode
pub fn create_rule(ctx: &RuleContext<'_>, rule: &dyn HealthRule, expr: String) -> Result<MonitoringRule> {
    if ctx.is_recording() {
        // Prometheus does not accept annotations on recording rules
        return Ok(MonitoringRule::Record(RecordingRule {
            record: rule.recording_name(),
            expr,
            labels: recording_labels(ctx),
        }));
    }

    Ok(MonitoringRule::Alert(AlertingRule {
        alert: alert_name(ctx),
        expr,
        for_duration: ctx.duration.to_string(),
        labels: base_labels(ctx.template, ctx.severity, true),
        annotations: rule.annotations()?,
    }))
}
