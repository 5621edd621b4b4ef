//! DNS error ratios, read on the response side only

use std::collections::BTreeMap;

use super::flow_ratio::ratio_expr;
use super::{HealthRule, RATE_WINDOW};
use crate::error::Result;
use crate::health::context::{RuleContext, Side, TrafficLink};
use crate::health::rule::{annotations, create_rule, MonitoringRule};

struct DnsRatio<'a> {
    ctx: RuleContext<'a>,
    recording_key: &'static str,
    response_code_filter: &'static str,
    traffic_filter: &'static str,
}

/// Responses with an error code other than NXDomain
pub fn errors<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(DnsRatio {
        ctx,
        recording_key: "dns_errors",
        response_code_filter: r#"DnsFlagsResponseCode!~"NoError|NXDomain""#,
        traffic_filter: r#"dns_flag_response_code!="NoError,NXDomain""#,
    })
}

pub fn nx_domain<'a>(ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    Box::new(DnsRatio {
        ctx,
        recording_key: "dns_nxdomain",
        response_code_filter: r#"DnsFlagsResponseCode="NXDomain""#,
        traffic_filter: r#"dns_flag_response_code="NXDomain""#,
    })
}

impl HealthRule for DnsRatio<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name(self.recording_key, RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let mut health = self.ctx.health_annotation();
        health.traffic_link = Some(TrafficLink {
            extra_filter: self.traffic_filter.to_string(),
            back_and_forth: false,
            filter_destination: true,
        });
        annotations(&self.ctx, &self.ctx.legend(), "", &health)
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        // Errors only show up in responses
        if self.ctx.side == Some(Side::Src) {
            return Ok(None);
        }
        let expr = ratio_expr(&self.ctx, "_count", Some(self.response_code_filter));
        create_rule(&self.ctx, self, expr).map(Some)
    }
}
