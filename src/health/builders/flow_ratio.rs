//! Percentage of flows matching a condition, per side
//!
//! Covers kernel drops, IPsec errors and network policy denials; DNS
//! templates reuse `ratio_expr`.

use std::collections::BTreeMap;

use super::{HealthRule, RATE_WINDOW};
use crate::error::Result;
use crate::health::context::RuleContext;
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

struct FlowRatio<'a> {
    ctx: RuleContext<'a>,
    recording_key: &'static str,
    numerator_filter: Option<&'static str>,
}

pub fn kernel_drops<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(FlowRatio {
        ctx,
        recording_key: "packet_drops_kernel",
        numerator_filter: None,
    })
}

pub fn ipsec_errors<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(FlowRatio {
        ctx,
        recording_key: "ipsec_errors",
        numerator_filter: None,
    })
}

pub fn netpol_denied<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(FlowRatio {
        ctx,
        recording_key: "netpol_denied",
        numerator_filter: Some(r#"action="drop""#),
    })
}

/// `100 * (sum(numerator rate)) / (sum(denominator rate))` with the context band
///
/// The extra filter narrows the numerator only.
pub(super) fn ratio_expr(ctx: &RuleContext<'_>, suffix: &str, numerator_filter: Option<&str>) -> String {
    let (metric, total_metric) = ctx.metrics();
    let metric_rate = promql::rate(&metric, suffix, &ctx.filters(numerator_filter), RATE_WINDOW, None);
    let total_rate = promql::rate(&total_metric, suffix, &ctx.filters(None), RATE_WINDOW, None);
    promql::percentage(
        &promql::sum_by(&metric_rate, ctx.group_by(), ctx.side, None),
        &promql::sum_by(&total_rate, ctx.group_by(), ctx.side, None),
        ctx.alert_band(),
        ctx.variant.low_volume(),
    )
}

impl HealthRule for FlowRatio<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name(self.recording_key, RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        annotations(&self.ctx, &self.ctx.legend(), "", &self.ctx.health_annotation())
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        let expr = ratio_expr(&self.ctx, "", self.numerator_filter);
        create_rule(&self.ctx, self, expr).map(Some)
    }
}
