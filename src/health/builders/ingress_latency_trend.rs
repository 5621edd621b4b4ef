use std::collections::BTreeMap;

use super::ingress_errors::{per_namespace, NAMESPACE_LEGEND};
use super::{HealthRule, RATE_WINDOW};
use crate::error::Result;
use crate::health::context::{RuleContext, Side};
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

const LATENCY_METRIC: &str = "haproxy_server_http_average_response_latency_milliseconds";
const SCALE_FACTOR: f64 = 5.0;

/// HAProxy average response latency compared to its own past
struct IngressLatencyTrend<'a> {
    ctx: RuleContext<'a>,
    applicable: bool,
}

pub fn new<'a>(mut ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    let applicable = ctx.side != Some(Side::Dst);
    ctx.side = None;
    Box::new(IngressLatencyTrend { ctx, applicable })
}

fn average_latency(offset: Option<&str>, per_namespace: bool) -> String {
    let selector = match offset {
        Some(offset) => format!("{} offset {}", LATENCY_METRIC, offset),
        None => LATENCY_METRIC.to_string(),
    };
    if per_namespace {
        format!(
            r#"avg(label_replace({}, "namespace", "$1", "exported_namespace", "(.*)")) by (namespace)"#,
            selector
        )
    } else {
        format!("avg({})", selector)
    }
}

impl HealthRule for IngressLatencyTrend<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name("ingress_http_latency_avg", RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let legend = if per_namespace(&self.ctx)? {
            NAMESPACE_LEGEND
        } else {
            ""
        };
        let (offset, _) = self.ctx.variant.trend_params();
        let mut health = self.ctx.health_annotation();
        health.close_open_scale(&self.ctx, SCALE_FACTOR);
        annotations(&self.ctx, legend, offset, &health)
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        if !self.applicable {
            return Ok(None);
        }
        let per_namespace = per_namespace(&self.ctx)?;
        let (offset, _) = self.ctx.variant.trend_params();
        let expr = promql::baseline_increase(
            &average_latency(None, per_namespace),
            &average_latency(Some(offset), per_namespace),
            self.ctx.alert_band(),
        );
        create_rule(&self.ctx, self, expr).map(Some)
    }
}
