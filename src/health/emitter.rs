//! Rule emission
//!
//! Drives the whole compilation: resolve definitions, validate them, expand
//! every variant into rule contexts (per severity and side for alerts, per
//! side for recording rules), run the builders, then append the baseline
//! rules.

use tracing::{debug, error, info, warn};

use netobs_common::{
    default_health_rules, HealthMode, HealthRuleDefinition, HealthRuleTemplate, HealthRuleThresholds,
    HealthRuleVariant, HealthSpec, Severity,
};

use super::builders::builder_for;
use super::catalog::{runbook_url, template_info, BASELINE_RULE_FOR, HEALTH_RULE_FOR};
use super::context::{RuleContext, Side};
use super::rule::{base_labels, AlertingRule, MonitoringRule, RecordingRule};
use super::validation::check;
use super::variants::{effective_definitions, flatten};
use crate::error::{NetobsError, Result};

/// Output of one compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationReport {
    pub rules: Vec<MonitoringRule>,
    /// Advisory messages, to surface next to the rules
    pub warnings: Vec<String>,
    /// Errors of the rules that could not be built
    pub dropped: Vec<String>,
}

struct BaselineRule {
    template: HealthRuleTemplate,
    record: &'static str,
    rate: &'static str,
    condition: &'static str,
}

const BASELINE_RULES: [BaselineRule; 2] = [
    BaselineRule {
        template: HealthRuleTemplate::NoFlows,
        record: "netobserv:health:no_flows:rate1m",
        rate: "sum(rate(netobserv_ingest_flows_processed[1m]))",
        condition: " == 0",
    },
    BaselineRule {
        template: HealthRuleTemplate::LokiError,
        record: "netobserv:health:loki_errors:rate1m",
        rate: "sum(rate(netobserv_loki_dropped_entries_total[1m]))",
        condition: " > 0",
    },
];

fn baseline_rule(rule: &BaselineRule, mode: HealthMode) -> MonitoringRule {
    match mode {
        HealthMode::RecordingRules => MonitoringRule::Record(RecordingRule {
            record: rule.record.to_string(),
            expr: rule.rate.to_string(),
            labels: base_labels(rule.template, None, true),
        }),
        HealthMode::Alerts => {
            let info = template_info(rule.template);
            let annotations = [
                ("summary", info.summary.to_string()),
                ("description", info.render_description("", "", "")),
                ("runbook_url", runbook_url(rule.template)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            MonitoringRule::Alert(AlertingRule {
                alert: rule.template.to_string(),
                expr: format!("{}{}", rule.rate, rule.condition),
                for_duration: BASELINE_RULE_FOR.to_string(),
                labels: base_labels(rule.template, Some(Severity::Warning), false),
                annotations,
            })
        }
    }
}

/// Fixed pipeline health rules, minus the disabled ones
pub fn baseline_rules(spec: &HealthSpec) -> Vec<MonitoringRule> {
    BASELINE_RULES
        .iter()
        .filter(|r| !spec.is_disabled(r.template))
        .map(|r| baseline_rule(r, spec.health_mode))
        .collect()
}

fn sides(variant: &HealthRuleVariant) -> &'static [Option<Side>] {
    if variant.group_by.is_some() {
        &[Some(Side::Src), Some(Side::Dst)]
    } else {
        &[None]
    }
}

/// Blank thresholds dropped, so that they don't show up in annotations
fn set_thresholds(variant: &HealthRuleVariant) -> HealthRuleThresholds {
    let get = |s| variant.thresholds.get(s).map(String::from);
    HealthRuleThresholds {
        info: get(Severity::Info),
        warning: get(Severity::Warning),
        critical: get(Severity::Critical),
    }
}

/// One context per rule to build
///
/// Alerts iterate severities from the most severe down, then sides; each
/// severity is capped by the threshold of the one emitted before it so that
/// firing bands never overlap.
pub fn contexts_for_variant<'a>(
    template: HealthRuleTemplate,
    variant: &'a HealthRuleVariant,
    mode: HealthMode,
    enabled_metrics: &'a [String],
) -> Vec<RuleContext<'a>> {
    let base = RuleContext {
        template,
        variant,
        mode,
        enabled_metrics,
        side: None,
        severity: None,
        alert_threshold: None,
        upper_threshold: None,
        recording_thresholds: None,
        duration: HEALTH_RULE_FOR,
    };

    match mode {
        HealthMode::RecordingRules => {
            let thresholds = set_thresholds(variant);
            sides(variant)
                .iter()
                .map(|side| RuleContext {
                    side: *side,
                    recording_thresholds: Some(thresholds.clone()),
                    ..base.clone()
                })
                .collect()
        }
        HealthMode::Alerts => {
            let mut contexts = Vec::new();
            let mut upper: Option<&'a str> = None;
            for severity in Severity::DESCENDING {
                let Some(threshold) = variant.thresholds.get(severity) else {
                    continue;
                };
                for side in sides(variant) {
                    contexts.push(RuleContext {
                        side: *side,
                        severity: Some(severity),
                        alert_threshold: Some(threshold),
                        upper_threshold: upper,
                        ..base.clone()
                    });
                }
                upper = Some(threshold);
            }
            contexts
        }
    }
}

/// Compiles the health section into monitoring rules
///
/// Configuration errors abort before anything is built. Past that point a
/// failing rule is dropped and reported, and the batch goes on.
pub fn compile(spec: &HealthSpec) -> Result<CompilationReport> {
    let definitions = effective_definitions(
        &default_health_rules(),
        spec.health_rules.as_deref(),
        &spec.disable_alerts,
    );
    let checked = check(spec, &definitions);
    if !checked.is_valid() {
        return Err(NetobsError::InvalidHealthRules(checked.errors));
    }
    for warning in &checked.warnings {
        warn!("{}", warning);
    }

    let enabled = spec.enabled_metrics();
    let mut report = CompilationReport {
        warnings: checked.warnings,
        ..Default::default()
    };
    let allowed: Vec<HealthRuleDefinition> = definitions
        .into_iter()
        .filter(|definition| spec.is_allowed(definition.template))
        .collect();

    for resolved in flatten(&allowed) {
        let template = resolved.template;
        let mode = resolved
            .variant
            .effective_mode(resolved.definition_mode, spec.health_mode);
        for ctx in contexts_for_variant(template, &resolved.variant, mode, &enabled) {
            match builder_for(ctx).and_then(|builder| builder.build()) {
                Ok(Some(rule)) => {
                    debug!(template = %template, rule = rule.name(), "Built health rule");
                    report.rules.push(rule);
                }
                Ok(None) => {}
                Err(e) => {
                    error!(template = %template, error = %e, "Can't build a health rule");
                    report.dropped.push(e.to_string());
                }
            }
        }
    }

    report.rules.extend(baseline_rules(spec));
    info!(
        rules = report.rules.len(),
        warnings = report.warnings.len(),
        dropped = report.dropped.len(),
        "Health rules compiled"
    );
    Ok(report)
}

/// Rules only, for callers that handle warnings separately
pub fn build_rules(spec: &HealthSpec) -> Result<Vec<MonitoringRule>> {
    compile(spec).map(|report| report.rules)
}
