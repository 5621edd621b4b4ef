//! HAProxy 5xx responses from the cluster ingress
//!
//! HAProxy exports the route namespace as `exported_namespace`; it is renamed
//! to `namespace` inline.

use std::collections::BTreeMap;

use netobs_common::GroupBy;

use super::{HealthRule, RATE_WINDOW};
use crate::error::{NetobsError, Result};
use crate::health::context::{RuleContext, Side};
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

const RESPONSES_METRIC: &str = "haproxy_server_http_responses_total";

struct IngressErrors<'a> {
    ctx: RuleContext<'a>,
    applicable: bool,
}

pub fn new<'a>(mut ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    let applicable = ctx.side != Some(Side::Dst);
    ctx.side = None;
    Box::new(IngressErrors { ctx, applicable })
}

/// Checks the grouping of ingress templates; returns whether it is per namespace
pub(super) fn per_namespace(ctx: &RuleContext<'_>) -> Result<bool> {
    match ctx.group_by() {
        None => Ok(false),
        Some(GroupBy::Namespace) => Ok(true),
        Some(other) => Err(NetobsError::UnsupportedGroupBy {
            template: ctx.template.to_string(),
            group_by: other.to_string(),
        }),
    }
}

pub(super) const NAMESPACE_LEGEND: &str = " [namespace={{ $labels.namespace }}]";

fn responses(filter: &str, per_namespace: bool) -> String {
    let rate = format!("rate({}{}[{}])", RESPONSES_METRIC, filter, RATE_WINDOW);
    if per_namespace {
        format!(
            r#"sum(label_replace({}, "namespace", "$1", "exported_namespace", "(.*)")) by (namespace)"#,
            rate
        )
    } else {
        format!("sum({})", rate)
    }
}

impl HealthRule for IngressErrors<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name("ingress_5xx_errors", RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let legend = if per_namespace(&self.ctx)? {
            NAMESPACE_LEGEND
        } else {
            ""
        };
        annotations(&self.ctx, legend, "", &self.ctx.health_annotation())
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        if !self.applicable {
            return Ok(None);
        }
        let per_namespace = per_namespace(&self.ctx)?;
        let expr = promql::percentage(
            &responses(r#"{code="5xx"}"#, per_namespace),
            &responses("", per_namespace),
            self.ctx.alert_band(),
            self.ctx.variant.low_volume(),
        );
        create_rule(&self.ctx, self, expr).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::context::tests::alert_ctx;
    use netobs_common::{HealthRuleTemplate, HealthRuleVariant};

    fn per(group_by: Option<GroupBy>) -> HealthRuleVariant {
        HealthRuleVariant {
            group_by,
            ..Default::default()
        }
    }

    #[test]
    fn test_destination_side_is_skipped() {
        let v = per(Some(GroupBy::Namespace));
        let ctx = alert_ctx(HealthRuleTemplate::Ingress5xxErrors, &v, Some(Side::Dst), "5");
        assert_eq!(new(ctx).build().unwrap(), None);
    }

    #[test]
    fn test_per_namespace() {
        let v = per(Some(GroupBy::Namespace));
        let ctx = alert_ctx(HealthRuleTemplate::Ingress5xxErrors, &v, Some(Side::Src), "5");
        let MonitoringRule::Alert(rule) = new(ctx).build().unwrap().unwrap() else {
            panic!("expected an alerting rule");
        };
        assert_eq!(
            rule.expr,
            r#"100 * (sum(label_replace(rate(haproxy_server_http_responses_total{code="5xx"}[2m]), "namespace", "$1", "exported_namespace", "(.*)")) by (namespace)) / (sum(label_replace(rate(haproxy_server_http_responses_total[2m]), "namespace", "$1", "exported_namespace", "(.*)")) by (namespace)) > 5"#
        );
        assert_eq!(rule.alert, "Ingress5xxErrors_PerNamespaceWarning");
        assert_eq!(
            rule.annotations["description"],
            "HAProxy is reporting more than 5% of 5xx HTTP response codes from ingress traffic [namespace={{ $labels.namespace }}]."
        );
    }

    #[test]
    fn test_global() {
        let v = per(None);
        let ctx = alert_ctx(HealthRuleTemplate::Ingress5xxErrors, &v, None, "10");
        let rule = new(ctx).build().unwrap().unwrap();
        assert_eq!(
            rule.expr(),
            r#"100 * (sum(rate(haproxy_server_http_responses_total{code="5xx"}[2m]))) / (sum(rate(haproxy_server_http_responses_total[2m]))) > 10"#
        );
    }

    #[test]
    fn test_unsupported_grouping() {
        for group_by in [GroupBy::Node, GroupBy::Workload] {
            let v = per(Some(group_by));
            let ctx = alert_ctx(HealthRuleTemplate::Ingress5xxErrors, &v, Some(Side::Src), "5");
            assert!(matches!(
                new(ctx).build(),
                Err(NetobsError::UnsupportedGroupBy { .. })
            ));
        }
    }
}
