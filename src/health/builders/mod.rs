//! One rule builder per template
//!
//! Builders are looked up by template in a static table. A builder may
//! decline a side (`Ok(None)`) when its template has no directional meaning
//! on that side.

mod device_drops;
mod dns_errors;
mod external_trend;
mod flow_ratio;
mod ingress_errors;
mod ingress_latency_trend;
mod latency_trend;

use std::collections::BTreeMap;

use netobs_common::HealthRuleTemplate;

use super::context::RuleContext;
use super::rule::MonitoringRule;
use crate::error::{NetobsError, Result};

/// Rate window of the current value in every template expression
pub const RATE_WINDOW: &str = "2m";

pub trait HealthRule {
    /// Name of the rule in recording mode
    fn recording_name(&self) -> String;

    /// Annotations of the rule in alert mode
    fn annotations(&self) -> Result<BTreeMap<String, String>>;

    /// The rule, or `None` when the context side does not apply
    fn build(&self) -> Result<Option<MonitoringRule>>;
}

type BuilderFn = for<'a> fn(RuleContext<'a>) -> Box<dyn HealthRule + 'a>;

const BUILDERS: &[(HealthRuleTemplate, BuilderFn)] = &[
    (HealthRuleTemplate::PacketDropsByKernel, flow_ratio::kernel_drops),
    (HealthRuleTemplate::PacketDropsByDevice, device_drops::new),
    (HealthRuleTemplate::IpsecErrors, flow_ratio::ipsec_errors),
    (HealthRuleTemplate::DnsErrors, dns_errors::errors),
    (HealthRuleTemplate::DnsNxDomain, dns_errors::nx_domain),
    (HealthRuleTemplate::NetpolDenied, flow_ratio::netpol_denied),
    (HealthRuleTemplate::LatencyHighTrend, latency_trend::new),
    (HealthRuleTemplate::ExternalEgressHighTrend, external_trend::egress),
    (HealthRuleTemplate::ExternalIngressHighTrend, external_trend::ingress),
    (HealthRuleTemplate::Ingress5xxErrors, ingress_errors::new),
    (HealthRuleTemplate::IngressHttpLatencyTrend, ingress_latency_trend::new),
];

pub fn has_builder(template: HealthRuleTemplate) -> bool {
    BUILDERS.iter().any(|(t, _)| *t == template)
}

/// Instantiates the builder registered for the context template
pub fn builder_for(ctx: RuleContext<'_>) -> Result<Box<dyn HealthRule + '_>> {
    let template = ctx.template;
    BUILDERS
        .iter()
        .find(|(t, _)| *t == template)
        .map(|(_, new)| new(ctx))
        .ok_or_else(|| NetobsError::NoRuleBuilder(template.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::context::tests::{alert_ctx, recording_ctx};
    use crate::health::context::Side;
    use netobs_common::{GroupBy, HealthRuleVariant};

    #[test]
    fn test_every_configurable_template_has_a_builder() {
        for template in HealthRuleTemplate::ALL {
            assert_eq!(has_builder(template), !template.is_baseline(), "{}", template);
        }
    }

    #[test]
    fn test_no_builder_for_baseline() {
        let v = HealthRuleVariant::default();
        let ctx = alert_ctx(HealthRuleTemplate::NoFlows, &v, None, "1");
        assert!(matches!(builder_for(ctx), Err(NetobsError::NoRuleBuilder(_))));
    }

    #[test]
    fn test_recording_names_per_template() {
        let v = HealthRuleVariant {
            group_by: Some(GroupBy::Node),
            ..Default::default()
        };
        let cases = [
            (HealthRuleTemplate::PacketDropsByKernel, "netobserv:health:packet_drops_kernel:node:src:rate2m"),
            (HealthRuleTemplate::PacketDropsByDevice, "netobserv:health:packet_drops_device:node:rate2m"),
            (HealthRuleTemplate::IpsecErrors, "netobserv:health:ipsec_errors:node:src:rate2m"),
            (HealthRuleTemplate::NetpolDenied, "netobserv:health:netpol_denied:node:src:rate2m"),
            (HealthRuleTemplate::LatencyHighTrend, "netobserv:health:tcp_latency_p90:node:src:rate2m"),
            (HealthRuleTemplate::ExternalEgressHighTrend, "netobserv:health:external_egress:node:src:rate2m"),
        ];
        for (template, expected) in cases {
            let ctx = recording_ctx(template, &v, Some(Side::Src));
            let rule = builder_for(ctx).unwrap().build().unwrap().unwrap();
            assert_eq!(rule.name(), expected);
            assert!(!rule.is_alert());
        }

        let cases = [
            (HealthRuleTemplate::DnsErrors, "netobserv:health:dns_errors:node:dst:rate2m"),
            (HealthRuleTemplate::DnsNxDomain, "netobserv:health:dns_nxdomain:node:dst:rate2m"),
            (HealthRuleTemplate::ExternalIngressHighTrend, "netobserv:health:external_ingress:node:dst:rate2m"),
        ];
        for (template, expected) in cases {
            let ctx = recording_ctx(template, &v, Some(Side::Dst));
            let rule = builder_for(ctx).unwrap().build().unwrap().unwrap();
            assert_eq!(rule.name(), expected);
        }

        let ns = HealthRuleVariant {
            group_by: Some(GroupBy::Namespace),
            ..Default::default()
        };
        let cases = [
            (HealthRuleTemplate::Ingress5xxErrors, "netobserv:health:ingress_5xx_errors:namespace:rate2m"),
            (HealthRuleTemplate::IngressHttpLatencyTrend, "netobserv:health:ingress_http_latency_avg:namespace:rate2m"),
        ];
        for (template, expected) in cases {
            let ctx = recording_ctx(template, &ns, Some(Side::Src));
            let rule = builder_for(ctx).unwrap().build().unwrap().unwrap();
            assert_eq!(rule.name(), expected);
        }
    }
}
