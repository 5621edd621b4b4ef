use std::collections::BTreeMap;

use super::{HealthRule, RATE_WINDOW};
use crate::error::Result;
use crate::health::context::RuleContext;
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

const QUANTILE: &str = "0.9";
const SCALE_FACTOR: f64 = 5.0;

/// p90 TCP round-trip time compared to its own past
struct LatencyTrend<'a> {
    ctx: RuleContext<'a>,
}

pub fn new<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(LatencyTrend { ctx })
}

impl HealthRule for LatencyTrend<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name("tcp_latency_p90", RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let (offset, _) = self.ctx.variant.trend_params();
        let mut health = self.ctx.health_annotation();
        health.close_open_scale(&self.ctx, SCALE_FACTOR);
        annotations(&self.ctx, &self.ctx.legend(), offset, &health)
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        let (offset, duration) = self.ctx.variant.trend_params();
        let (metric, baseline) = self.ctx.metrics();
        let filters = self.ctx.filters(None);
        let current = promql::rate(&metric, "_bucket", &filters, RATE_WINDOW, None);
        let past = promql::rate(&baseline, "_bucket", &filters, duration, Some(offset));

        let expr = promql::baseline_increase(
            &promql::histogram_quantile(&current, self.ctx.group_by(), self.ctx.side, QUANTILE),
            &promql::histogram_quantile(&past, self.ctx.group_by(), self.ctx.side, QUANTILE),
            self.ctx.alert_band(),
        );
        create_rule(&self.ctx, self, expr).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::context::tests::alert_ctx;
    use crate::health::context::Side;
    use crate::health::rule::HEALTH_ANNOTATION_KEY;
    use netobs_common::{GroupBy, HealthRuleTemplate, HealthRuleVariant};

    #[test]
    fn test_latency_promql() {
        let v = HealthRuleVariant {
            group_by: Some(GroupBy::Namespace),
            trend_offset: Some("1d".to_string()),
            trend_duration: Some("1h".to_string()),
            ..Default::default()
        };
        let ctx = alert_ctx(HealthRuleTemplate::LatencyHighTrend, &v, Some(Side::Src), "100");
        let MonitoringRule::Alert(rule) = new(ctx).build().unwrap().unwrap() else {
            panic!("expected an alerting rule");
        };
        assert_eq!(
            rule.expr,
            r#"100 * ((histogram_quantile(0.9, sum(label_replace(rate(netobserv_namespace_rtt_seconds_bucket{SrcK8S_Namespace!=""}[2m]), "namespace", "$1", "SrcK8S_Namespace", "(.*)")) by (namespace,le))) - (histogram_quantile(0.9, sum(label_replace(rate(netobserv_namespace_rtt_seconds_bucket{SrcK8S_Namespace!=""}[1h] offset 1d), "namespace", "$1", "SrcK8S_Namespace", "(.*)")) by (namespace,le)))) / (histogram_quantile(0.9, sum(label_replace(rate(netobserv_namespace_rtt_seconds_bucket{SrcK8S_Namespace!=""}[1h] offset 1d), "namespace", "$1", "SrcK8S_Namespace", "(.*)")) by (namespace,le))) > 100"#
        );
        assert_eq!(rule.alert, "LatencyHighTrend_PerSrcNamespaceWarning");
        assert_eq!(
            rule.annotations["description"],
            "NetObserv is detecting TCP latency increased by more than 100% [source namespace={{ $labels.namespace }}], compared to baseline (offset: 1d)."
        );
        assert_eq!(
            rule.annotations[HEALTH_ANNOTATION_KEY],
            r#"{"alertThreshold":"100","upperBound":"500","unit":"%","namespaceLabels":["namespace"]}"#
        );
    }

    #[test]
    fn test_default_trend_params() {
        let v = HealthRuleVariant::default();
        let ctx = alert_ctx(HealthRuleTemplate::LatencyHighTrend, &v, None, "50");
        let rule = new(ctx).build().unwrap().unwrap();
        assert!(rule
            .expr()
            .contains("rate(netobserv_namespace_rtt_seconds_bucket[2h] offset 24h)"));
        assert!(rule.expr().ends_with(" > 50"));
    }
}
