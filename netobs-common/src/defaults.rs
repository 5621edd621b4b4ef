//! Built-in health rules and enabled metrics
//!
//! Defaults are set in code rather than in the CRD, so that an unset field
//! can be told apart from one set intentionally.

use crate::health::{
    GroupBy, HealthRuleDefinition, HealthRuleTemplate, HealthRuleThresholds, HealthRuleVariant,
};

pub const DEFAULT_NAMESPACE: &str = "netobserv";

pub const DEFAULT_INCLUDE_LIST: &[&str] = &[
    "node_ingress_bytes_total",
    "node_egress_bytes_total",
    "node_ingress_packets_total",
    "node_drop_packets_total",
    "workload_sampling",
    "workload_ingress_bytes_total",
    "workload_egress_bytes_total",
    "namespace_flows_total",
    "namespace_ingress_packets_total",
    "namespace_drop_packets_total",
    "namespace_rtt_seconds",
    "namespace_dns_latency_seconds",
    "namespace_network_policy_events_total",
    "node_ipsec_flows_total",
    "node_to_node_ingress_flows_total",
];

fn thresholds(info: Option<&str>, warning: Option<&str>, critical: Option<&str>) -> HealthRuleThresholds {
    HealthRuleThresholds {
        info: info.map(String::from),
        warning: warning.map(String::from),
        critical: critical.map(String::from),
    }
}

fn variant(group_by: Option<GroupBy>, thresholds: HealthRuleThresholds) -> HealthRuleVariant {
    HealthRuleVariant {
        thresholds,
        group_by,
        ..Default::default()
    }
}

fn trend_variant(
    group_by: Option<GroupBy>,
    thresholds: HealthRuleThresholds,
    offset: &str,
    duration: &str,
) -> HealthRuleVariant {
    HealthRuleVariant {
        trend_offset: Some(offset.to_string()),
        trend_duration: Some(duration.to_string()),
        ..variant(group_by, thresholds)
    }
}

fn definition(template: HealthRuleTemplate, variants: Vec<HealthRuleVariant>) -> HealthRuleDefinition {
    HealthRuleDefinition {
        template,
        mode: None,
        variants,
    }
}

/// Default health rule catalog, in its canonical order
pub fn default_health_rules() -> Vec<HealthRuleDefinition> {
    use GroupBy::*;
    use HealthRuleTemplate::*;

    vec![
        definition(
            PacketDropsByKernel,
            vec![
                HealthRuleVariant {
                    low_volume_threshold: Some("5".to_string()),
                    ..variant(Some(Namespace), thresholds(Some("10"), Some("20"), None))
                },
                variant(Some(Node), thresholds(Some("5"), Some("10"), None)),
            ],
        ),
        definition(
            PacketDropsByDevice,
            vec![variant(Some(Node), thresholds(None, Some("5"), None))],
        ),
        definition(
            IpsecErrors,
            vec![
                variant(None, thresholds(None, None, Some("2"))),
                variant(Some(Node), thresholds(None, None, Some("2"))),
            ],
        ),
        definition(
            DnsErrors,
            vec![
                variant(None, thresholds(None, Some("5"), None)),
                variant(Some(Namespace), thresholds(Some("5"), Some("10"), None)),
            ],
        ),
        definition(
            DnsNxDomain,
            vec![variant(Some(Namespace), thresholds(Some("10"), Some("80"), None))],
        ),
        definition(
            NetpolDenied,
            vec![variant(Some(Namespace), thresholds(Some("5"), Some("10"), None))],
        ),
        definition(
            LatencyHighTrend,
            vec![trend_variant(
                Some(Namespace),
                thresholds(Some("100"), None, None),
                "24h",
                "2h",
            )],
        ),
        definition(
            ExternalEgressHighTrend,
            vec![
                trend_variant(Some(Node), thresholds(None, Some("200"), None), "24h", "1h"),
                trend_variant(
                    Some(Namespace),
                    thresholds(Some("100"), Some("500"), None),
                    "24h",
                    "1h",
                ),
            ],
        ),
        definition(
            ExternalIngressHighTrend,
            vec![
                trend_variant(Some(Node), thresholds(None, Some("200"), None), "24h", "1h"),
                trend_variant(
                    Some(Namespace),
                    thresholds(Some("100"), Some("500"), None),
                    "24h",
                    "1h",
                ),
            ],
        ),
        definition(
            Ingress5xxErrors,
            vec![variant(Some(Namespace), thresholds(Some("5"), Some("10"), None))],
        ),
        definition(
            IngressHttpLatencyTrend,
            vec![trend_variant(
                Some(Namespace),
                thresholds(Some("100"), Some("200"), None),
                "24h",
                "1h",
            )],
        ),
    ]
}
