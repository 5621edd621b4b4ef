//! Configuration checks run before compilation
//!
//! Errors abort the whole batch; warnings are advisory and never block it.

use netobs_common::{
    HealthRuleDefinition, HealthRuleTemplate, HealthRuleVariant, HealthSpec, Severity,
};

use super::catalog::template_info;
use super::eligibility::{eligible_metrics, pick_first_eligible};
use crate::error::NetobsError;

const DURATION_UNITS: [&str; 7] = ["y", "w", "d", "h", "m", "s", "ms"];

/// Whether `value` is a Prometheus duration such as `1h30m` or `24h`
pub fn is_prometheus_duration(value: &str) -> bool {
    let mut rest = value;
    let mut last_unit: Option<usize> = None;
    if rest.is_empty() {
        return false;
    }
    while !rest.is_empty() {
        let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return false;
        }
        rest = &rest[digits..];
        let letters = rest.chars().take_while(|c| c.is_ascii_alphabetic()).count();
        let unit = &rest[..letters];
        rest = &rest[letters..];
        match DURATION_UNITS.iter().position(|u| *u == unit) {
            Some(index) if last_unit.map_or(true, |last| index > last) => {
                last_unit = Some(index)
            }
            _ => return false,
        }
    }
    true
}

fn validate_thresholds(variant: &HealthRuleVariant, location: &str, errors: &mut Vec<String>) {
    if variant.thresholds.is_empty() {
        errors.push(format!(
            "a health rule variant must define at least one threshold, in {}",
            location
        ));
        return;
    }

    // From the most severe down: each threshold must not exceed the previous one
    let mut higher: Option<f64> = None;
    for severity in Severity::DESCENDING {
        let Some(raw) = variant.thresholds.get(severity) else {
            continue;
        };
        match raw.parse::<f64>() {
            Err(_) => errors.push(format!(
                r#"cannot parse {} threshold as float in {}: "{}""#,
                severity, location, raw
            )),
            Ok(value) if value < 0.0 => errors.push(format!(
                r#"{} threshold must be positive in {}: "{}""#,
                severity, location, raw
            )),
            Ok(value) => {
                if let Some(limit) = higher.filter(|limit| value > *limit) {
                    errors.push(format!(
                        r#"{} threshold must be lower than {}, which is defined for a higher severity, in {}: "{}""#,
                        severity, limit, location, raw
                    ));
                }
                higher = Some(value);
            }
        }
    }
}

fn validate_variant(
    template: HealthRuleTemplate,
    variant: &HealthRuleVariant,
    location: &str,
    errors: &mut Vec<String>,
) {
    if let Some(group_by) = variant.group_by {
        if !template_info(template).supports(Some(group_by)) {
            let err = NetobsError::UnsupportedGroupBy {
                template: template.to_string(),
                group_by: group_by.to_string(),
            };
            errors.push(format!("{}, in {}", err, location));
        }
    }

    validate_thresholds(variant, location, errors);

    if let Some(low_volume) = variant.low_volume() {
        if low_volume.parse::<f64>().is_err() {
            errors.push(format!(
                r#"cannot parse lowVolumeThreshold as float in {}: "{}""#,
                location, low_volume
            ));
        }
    }

    let trend_fields = [
        ("trendOffset", variant.trend_offset.as_deref()),
        ("trendDuration", variant.trend_duration.as_deref()),
    ];
    for (field, value) in trend_fields {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if !is_prometheus_duration(value) {
                errors.push(format!(
                    r#"cannot parse {} as a duration in {}: "{}""#,
                    field, location, value
                ));
            }
        }
    }
}

/// Configuration errors of the effective definitions; empty when valid
pub fn validate_definitions(definitions: &[HealthRuleDefinition]) -> Vec<String> {
    let mut errors = Vec::new();
    for definition in definitions {
        let template = definition.template;
        if template.is_baseline() {
            errors.push(format!(
                "{} is not a configurable health rule template",
                template
            ));
            continue;
        }
        for (i, variant) in definition.variants.iter().enumerate() {
            let location = format!("{} variant #{}", template, i + 1);
            validate_variant(template, variant, &location, &mut errors);
        }
    }
    errors
}

/// Warning for a template whose agent feature is not enabled
pub fn feature_warning(spec: &HealthSpec, template: HealthRuleTemplate) -> Option<String> {
    template
        .required_feature()
        .filter(|feature| !spec.is_feature_enabled(*feature))
        .map(|feature| {
            format!(
                "Health rule {} requires the {} agent feature to be enabled",
                template, feature
            )
        })
}

/// Warnings for each metric list of a variant with no enabled candidate
pub fn eligibility_warnings(
    template: HealthRuleTemplate,
    variant: &HealthRuleVariant,
    enabled: &[String],
) -> Vec<String> {
    let candidates = eligible_metrics(template, variant.group_by);
    let group_by = variant.group_by.map(|g| g.as_str()).unwrap_or_default();
    [candidates.numerator, candidates.denominator]
        .iter()
        .filter(|list| !list.is_empty() && pick_first_eligible(list, enabled).is_none())
        .map(|list| {
            format!(
                "Health rule {}/{} requires enabling at least one metric from this list: {}",
                template,
                group_by,
                list.join(", ")
            )
        })
        .collect()
}

/// Outcome of checking a configuration without building any rule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs every check over the effective definitions
///
/// Feature warnings come first, in definition order, then the eligibility
/// warnings of the variants whose template is allowed.
pub fn check(spec: &HealthSpec, definitions: &[HealthRuleDefinition]) -> ValidationReport {
    let errors = validate_definitions(definitions);
    let mut warnings: Vec<String> = definitions
        .iter()
        .filter_map(|definition| feature_warning(spec, definition.template))
        .collect();

    let enabled = spec.enabled_metrics();
    for definition in definitions
        .iter()
        .filter(|d| !d.template.is_baseline() && spec.is_allowed(d.template))
    {
        for variant in &definition.variants {
            warnings.extend(eligibility_warnings(definition.template, variant, &enabled));
        }
    }
    ValidationReport { errors, warnings }
}
