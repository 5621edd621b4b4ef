//! Interface drops reported by node-exporter
//!
//! Not a flow metric: there is no side, so only one of the two side
//! contexts produces a rule.

use std::collections::BTreeMap;

use netobs_common::GroupBy;

use super::{HealthRule, RATE_WINDOW};
use crate::error::{NetobsError, Result};
use crate::health::context::{RuleContext, Side};
use crate::health::promql;
use crate::health::rule::{annotations, create_rule, MonitoringRule};

struct DeviceDrops<'a> {
    ctx: RuleContext<'a>,
    applicable: bool,
}

pub fn new<'a>(mut ctx: RuleContext<'a>) -> Box<dyn HealthRule + 'a> {
    let applicable = ctx.side != Some(Side::Dst);
    ctx.side = None;
    Box::new(DeviceDrops { ctx, applicable })
}

impl DeviceDrops<'_> {
    /// Aggregation clause per node-exporter instance
    fn by_labels(&self) -> Result<&'static str> {
        match self.ctx.group_by() {
            None => Ok(""),
            Some(GroupBy::Node) => Ok(" by (instance)"),
            Some(other) => Err(NetobsError::UnsupportedGroupBy {
                template: self.ctx.template.to_string(),
                group_by: other.to_string(),
            }),
        }
    }
}

impl HealthRule for DeviceDrops<'_> {
    fn recording_name(&self) -> String {
        self.ctx.recording_name("packet_drops_device", RATE_WINDOW)
    }

    fn annotations(&self) -> Result<BTreeMap<String, String>> {
        let by = self.by_labels()?;
        let mut health = self.ctx.health_annotation();
        let legend = if by.is_empty() {
            ""
        } else {
            health.node_labels = vec!["instance".to_string()];
            " [node={{ $labels.instance }}]"
        };
        annotations(&self.ctx, legend, "", &health)
    }

    fn build(&self) -> Result<Option<MonitoringRule>> {
        if !self.applicable {
            return Ok(None);
        }
        let by = self.by_labels()?;
        let sum = |metric: &str| format!("sum(rate({}[{}])){}", metric, RATE_WINDOW, by);
        let expr = promql::percentage(
            &format!(
                "{} + {}",
                sum("node_network_receive_drop_total"),
                sum("node_network_transmit_drop_total")
            ),
            &format!(
                "{} + {}",
                sum("node_network_receive_packets_total"),
                sum("node_network_transmit_packets_total")
            ),
            self.ctx.alert_band(),
            self.ctx.variant.low_volume(),
        );
        create_rule(&self.ctx, self, expr).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::context::tests::{alert_ctx, recording_ctx};
    use crate::health::rule::HEALTH_ANNOTATION_KEY;
    use netobs_common::{HealthRuleTemplate, HealthRuleVariant};

    fn per(group_by: Option<GroupBy>) -> HealthRuleVariant {
        HealthRuleVariant {
            group_by,
            ..Default::default()
        }
    }

    #[test]
    fn test_destination_side_is_skipped() {
        let v = per(Some(GroupBy::Node));
        let ctx = alert_ctx(HealthRuleTemplate::PacketDropsByDevice, &v, Some(Side::Dst), "5");
        assert_eq!(new(ctx).build().unwrap(), None);
    }

    #[test]
    fn test_per_node() {
        let v = per(Some(GroupBy::Node));
        let ctx = alert_ctx(HealthRuleTemplate::PacketDropsByDevice, &v, Some(Side::Src), "5");
        let MonitoringRule::Alert(rule) = new(ctx).build().unwrap().unwrap() else {
            panic!("expected an alerting rule");
        };
        assert_eq!(
            rule.expr,
            "100 * (sum(rate(node_network_receive_drop_total[2m])) by (instance) + sum(rate(node_network_transmit_drop_total[2m])) by (instance)) / (sum(rate(node_network_receive_packets_total[2m])) by (instance) + sum(rate(node_network_transmit_packets_total[2m])) by (instance)) > 5"
        );
        assert_eq!(rule.alert, "PacketDropsByDevice_PerNodeWarning");
        assert_eq!(
            rule.annotations["description"],
            "node-exporter is reporting more than 5% of dropped packets [node={{ $labels.instance }}]."
        );
        assert_eq!(
            rule.annotations[HEALTH_ANNOTATION_KEY],
            r#"{"alertThreshold":"5","unit":"%","nodeLabels":["instance"]}"#
        );
    }

    #[test]
    fn test_global_recording() {
        let v = per(None);
        let ctx = recording_ctx(HealthRuleTemplate::PacketDropsByDevice, &v, None);
        let rule = new(ctx).build().unwrap().unwrap();
        assert_eq!(
            rule.expr(),
            "100 * (sum(rate(node_network_receive_drop_total[2m])) + sum(rate(node_network_transmit_drop_total[2m]))) / (sum(rate(node_network_receive_packets_total[2m])) + sum(rate(node_network_transmit_packets_total[2m])))"
        );
        assert_eq!(rule.name(), "netobserv:health:packet_drops_device:rate2m");
    }

    #[test]
    fn test_unsupported_grouping() {
        for group_by in [GroupBy::Namespace, GroupBy::Workload] {
            let v = per(Some(group_by));
            let ctx = alert_ctx(HealthRuleTemplate::PacketDropsByDevice, &v, Some(Side::Src), "5");
            let builder = new(ctx);
            assert!(matches!(
                builder.build(),
                Err(NetobsError::UnsupportedGroupBy { .. })
            ));
            assert!(builder.annotations().is_err());
        }
    }
}
