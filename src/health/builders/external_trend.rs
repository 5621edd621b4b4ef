//! External traffic volume compared to its own past
//!
//! Egress is only meaningful on the source side and ingress on the
//! destination side.

use std::collections::BTreeMap;

use super::{HealthRule, RATE_WINDOW};
use crate::error::Result;
use crate::health::context::{RuleContext, Side, TrafficLink};
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

const SCALE_FACTOR: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Egress,
    Ingress,
}

impl Direction {
    fn recording_key(self) -> &'static str {
        match self {
            Direction::Egress => "external_egress",
            Direction::Ingress => "external_ingress",
        }
    }

    /// Flows whose remote end is outside of the cluster
    fn external_filter(self) -> &'static str {
        match self {
            Direction::Egress => {
                r#"DstSubnetLabel=~"|EXT:.*",DstK8S_Namespace="",DstK8S_OwnerName="""#
            }
            Direction::Ingress => {
                r#"SrcSubnetLabel=~"|EXT:.*",SrcK8S_Namespace="",SrcK8S_OwnerName="""#
            }
        }
    }

    fn traffic_filter(self) -> &'static str {
        match self {
            Direction::Egress => r#"dst_subnet_label="",EXT:"#,
            Direction::Ingress => r#"src_subnet_label="",EXT:"#,
        }
    }

    fn excluded_side(self) -> Side {
        match self {
            Direction::Egress => Side::Dst,
            Direction::Ingress => Side::Src,
        }
    }
}

struct ExternalTrend<'a> {
    ctx: RuleContext<'a>,
    direction: Direction,
}

pub fn egress<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(ExternalTrend {
        ctx,
        direction: Direction::Egress,
    })
}

pub fn ingress<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(ExternalTrend {
        ctx,
        direction: Direction::Ingress,
    })
}

impl HealthRule for ExternalTrend<'_> {
    fn recording_name(&self) -> String {
        self.ctx
            .recording_name(self.direction.recording_key(), RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let (offset, _) = self.ctx.variant.trend_params();
        let mut health = self.ctx.health_annotation();
        health.close_open_scale(&self.ctx, SCALE_FACTOR);
        health.traffic_link = Some(TrafficLink {
            extra_filter: self.direction.traffic_filter().to_string(),
            back_and_forth: true,
            filter_destination: self.ctx.side == Some(Side::Dst),
        });
        annotations(&self.ctx, &self.ctx.legend(), offset, &health)
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        if self.ctx.side == Some(self.direction.excluded_side()) {
            return Ok(None);
        }
        let (offset, duration) = self.ctx.variant.trend_params();
        let (metric, baseline) = self.ctx.metrics();
        let filters = self.ctx.filters(Some(self.direction.external_filter()));
        let current = promql::rate(&metric, "", &filters, RATE_WINDOW, None);
        let past = promql::rate(&baseline, "", &filters, duration, Some(offset));

        let expr = promql::baseline_increase(
            &promql::sum_by(&current, self.ctx.group_by(), self.ctx.side, None),
            &promql::sum_by(&past, self.ctx.group_by(), self.ctx.side, None),
            self.ctx.alert_band(),
        );
        create_rule(&self.ctx, self, expr).map(Some)
    }
}
