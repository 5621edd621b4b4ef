//! Metric eligibility
//!
//! Each template owns abstract metric name patterns, instantiated once per
//! scope token derived from the variant grouping. The first instantiation
//! found among the enabled metrics is used.

use netobs_common::{GroupBy, HealthRuleTemplate};

const SCOPE_PLACEHOLDER: &str = "{scope}";

/// Candidate metric names for the numerator and the denominator (or baseline)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleMetrics {
    pub numerator: Vec<String>,
    pub denominator: Vec<String>,
}

impl EligibleMetrics {
    pub fn is_empty(&self) -> bool {
        self.numerator.is_empty() && self.denominator.is_empty()
    }
}

fn patterns(template: HealthRuleTemplate) -> (&'static [&'static str], &'static [&'static str]) {
    match template {
        HealthRuleTemplate::PacketDropsByKernel => (
            &["{scope}_drop_packets_total"],
            &["{scope}_ingress_packets_total", "{scope}_egress_packets_total"],
        ),
        HealthRuleTemplate::DnsErrors | HealthRuleTemplate::DnsNxDomain => (
            &["{scope}_dns_latency_seconds"],
            &["{scope}_dns_latency_seconds"],
        ),
        HealthRuleTemplate::ExternalEgressHighTrend => (
            &["{scope}_egress_bytes_total"],
            &["{scope}_egress_bytes_total"],
        ),
        HealthRuleTemplate::ExternalIngressHighTrend => (
            &["{scope}_ingress_bytes_total"],
            &["{scope}_ingress_bytes_total"],
        ),
        HealthRuleTemplate::LatencyHighTrend => {
            (&["{scope}_rtt_seconds"], &["{scope}_rtt_seconds"])
        }
        HealthRuleTemplate::NetpolDenied => (
            &["{scope}_network_policy_events_total"],
            &["{scope}_flows_total"],
        ),
        // Fixed names, not scope dependent
        HealthRuleTemplate::IpsecErrors => {
            (&["node_ipsec_flows_total"], &["node_to_node_ingress_flows_total"])
        }
        // External metrics (node-exporter, HAProxy) or baseline rules
        HealthRuleTemplate::PacketDropsByDevice
        | HealthRuleTemplate::Ingress5xxErrors
        | HealthRuleTemplate::IngressHttpLatencyTrend
        | HealthRuleTemplate::NoFlows
        | HealthRuleTemplate::LokiError => (&[], &[]),
    }
}

/// Scope tokens tried for a grouping; a global rule can use any of them
pub fn scope_tokens(group_by: Option<GroupBy>) -> &'static [&'static str] {
    match group_by {
        Some(GroupBy::Node) => &["node"],
        Some(GroupBy::Namespace) => &["namespace", "workload"],
        Some(GroupBy::Workload) => &["workload"],
        None => &["namespace", "workload", "node"],
    }
}

fn instantiate(patterns: &[&str], scopes: &[&str]) -> Vec<String> {
    patterns
        .iter()
        .flat_map(|p| {
            scopes.iter().map(move |scope| {
                if p.contains(SCOPE_PLACEHOLDER) {
                    p.replace(SCOPE_PLACEHOLDER, scope)
                } else {
                    p.to_string()
                }
            })
        })
        .fold(Vec::new(), |mut acc, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        })
}

pub fn eligible_metrics(template: HealthRuleTemplate, group_by: Option<GroupBy>) -> EligibleMetrics {
    let (numerator, denominator) = patterns(template);
    let scopes = scope_tokens(group_by);
    EligibleMetrics {
        numerator: instantiate(numerator, scopes),
        denominator: instantiate(denominator, scopes),
    }
}

/// First candidate present in the enabled metrics, if any
pub fn pick_first_eligible<'a, S: AsRef<str>>(candidates: &'a [String], enabled: &[S]) -> Option<&'a str> {
    candidates
        .iter()
        .find(|c| enabled.iter().any(|m| m.as_ref() == c.as_str()))
        .map(String::as_str)
}

/// Like `pick_first_eligible`, falling back to the first candidate so that
/// the rule stays visible until the right metric gets enabled.
pub fn pick_or_first<S: AsRef<str>>(candidates: &[String], enabled: &[S]) -> String {
    pick_first_eligible(candidates, enabled)
        .or_else(|| candidates.first().map(String::as_str))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_expansion() {
        let m = eligible_metrics(HealthRuleTemplate::PacketDropsByKernel, Some(GroupBy::Namespace));
        assert_eq!(
            m.numerator,
            vec!["namespace_drop_packets_total", "workload_drop_packets_total"]
        );
        assert_eq!(
            m.denominator,
            vec![
                "namespace_ingress_packets_total",
                "workload_ingress_packets_total",
                "namespace_egress_packets_total",
                "workload_egress_packets_total",
            ]
        );

        let m = eligible_metrics(HealthRuleTemplate::LatencyHighTrend, None);
        assert_eq!(
            m.numerator,
            vec!["namespace_rtt_seconds", "workload_rtt_seconds", "node_rtt_seconds"]
        );
    }

    #[test]
    fn test_fixed_and_empty_patterns() {
        let m = eligible_metrics(HealthRuleTemplate::IpsecErrors, Some(GroupBy::Node));
        assert_eq!(m.numerator, vec!["node_ipsec_flows_total"]);
        assert_eq!(m.denominator, vec!["node_to_node_ingress_flows_total"]);

        let m = eligible_metrics(HealthRuleTemplate::IpsecErrors, None);
        assert_eq!(m.numerator, vec!["node_ipsec_flows_total"]);

        assert!(eligible_metrics(HealthRuleTemplate::PacketDropsByDevice, None).is_empty());
        assert!(eligible_metrics(HealthRuleTemplate::Ingress5xxErrors, None).is_empty());
    }

    #[test]
    fn test_pick_first_eligible() {
        let candidates = vec![
            "namespace_drop_packets_total".to_string(),
            "workload_drop_packets_total".to_string(),
        ];
        let enabled = ["workload_drop_packets_total", "namespace_flows_total"];
        assert_eq!(
            pick_first_eligible(&candidates, &enabled),
            Some("workload_drop_packets_total")
        );
        assert_eq!(pick_first_eligible(&candidates, &["node_flows_total"]), None);
    }

    #[test]
    fn test_pick_or_first_fallback() {
        let candidates = vec![
            "namespace_rtt_seconds".to_string(),
            "workload_rtt_seconds".to_string(),
        ];
        let enabled: [&str; 0] = [];
        assert_eq!(pick_or_first(&candidates, &enabled), "namespace_rtt_seconds");
        assert_eq!(pick_or_first(&[], &enabled), "");
    }
}
