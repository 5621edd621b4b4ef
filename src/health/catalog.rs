//! Static template catalog
//!
//! Display metadata per template, shared by rule annotations and by the
//! console exporter. Description patterns use `{threshold}`, `{legend}` and
//! `{offset}` placeholders.

use netobs_common::{GroupBy, HealthRuleTemplate};

const RUNBOOK_URL_BASE: &str =
    "https://github.com/openshift/runbooks/blob/master/alerts/network-observability-operator";

/// `for` duration of template rules
pub const HEALTH_RULE_FOR: &str = "5m";
/// `for` duration of the baseline rules
pub const BASELINE_RULE_FOR: &str = "10m";

const ANY_GROUPING: &[Option<GroupBy>] = &[
    None,
    Some(GroupBy::Node),
    Some(GroupBy::Namespace),
    Some(GroupBy::Workload),
];
const GLOBAL_OR_NODE: &[Option<GroupBy>] = &[None, Some(GroupBy::Node)];
const GLOBAL_OR_NAMESPACE: &[Option<GroupBy>] = &[None, Some(GroupBy::Namespace)];

#[derive(Debug, Clone, Copy)]
pub struct TemplateInfo {
    pub template: HealthRuleTemplate,
    pub summary: &'static str,
    pub description: &'static str,
    pub supported_groupings: &'static [Option<GroupBy>],
}

impl TemplateInfo {
    pub fn supports(&self, group_by: Option<GroupBy>) -> bool {
        self.supported_groupings.contains(&group_by)
    }

    pub fn runbook_url(&self) -> String {
        runbook_url(self.template)
    }

    pub fn render_description(&self, threshold: &str, legend: &str, offset: &str) -> String {
        let mut text = self
            .description
            .replace("{threshold}", threshold)
            .replace("{legend}", legend)
            .replace("{offset}", offset);
        text.push('.');
        text
    }
}

// Indexed by template discriminant: keep in `HealthRuleTemplate` declaration order.
static CATALOG: [TemplateInfo; 13] = [
    TemplateInfo {
        template: HealthRuleTemplate::PacketDropsByKernel,
        summary: "Too many packets dropped by the kernel",
        description: "NetObserv is detecting more than {threshold}% of packets dropped by the kernel{legend}",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::PacketDropsByDevice,
        summary: "Too many drops from device",
        description: "node-exporter is reporting more than {threshold}% of dropped packets{legend}",
        supported_groupings: GLOBAL_OR_NODE,
    },
    TemplateInfo {
        template: HealthRuleTemplate::IpsecErrors,
        summary: "Too many IPsec errors",
        description: "NetObserv is detecting more than {threshold}% of IPsec errors{legend}",
        supported_groupings: GLOBAL_OR_NODE,
    },
    TemplateInfo {
        template: HealthRuleTemplate::DnsErrors,
        summary: "Too many DNS errors",
        description: "NetObserv is detecting more than {threshold}% of DNS errors{legend} (other than NX_DOMAIN)",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::DnsNxDomain,
        summary: "Too many DNS NX_DOMAIN errors",
        description: "NetObserv is detecting more than {threshold}% of DNS NX_DOMAIN errors{legend}. In Kubernetes, this is a common error due to the resolution using several search suffixes. It can be optimized by using trailing dots in domain names",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::NetpolDenied,
        summary: "Traffic denied by Network Policies",
        description: "NetObserv is detecting more than {threshold}% of denied traffic due to Network Policies{legend}",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::LatencyHighTrend,
        summary: "TCP latency increase",
        description: "NetObserv is detecting TCP latency increased by more than {threshold}%{legend}, compared to baseline (offset: {offset})",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::ExternalEgressHighTrend,
        summary: "External egress traffic increase",
        description: "NetObserv is detecting external egress traffic increased by more than {threshold}%{legend}, compared to baseline (offset: {offset})",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::ExternalIngressHighTrend,
        summary: "External ingress traffic increase",
        description: "NetObserv is detecting external ingress traffic increased by more than {threshold}%{legend}, compared to baseline (offset: {offset})",
        supported_groupings: ANY_GROUPING,
    },
    TemplateInfo {
        template: HealthRuleTemplate::Ingress5xxErrors,
        summary: "Too many ingress 5xx errors",
        description: "HAProxy is reporting more than {threshold}% of 5xx HTTP response codes from ingress traffic{legend}",
        supported_groupings: GLOBAL_OR_NAMESPACE,
    },
    TemplateInfo {
        template: HealthRuleTemplate::IngressHttpLatencyTrend,
        summary: "Ingress HTTP latency increase",
        description: "HAProxy ingress average HTTP response latency increased by more than {threshold}%{legend}, compared to baseline (offset: {offset})",
        supported_groupings: GLOBAL_OR_NAMESPACE,
    },
    TemplateInfo {
        template: HealthRuleTemplate::NoFlows,
        summary: "NetObserv flowlogs-pipeline is not receiving any flow",
        description: "NetObserv flowlogs-pipeline is not receiving any flow, this is either a connection issue with the agent, or an agent issue",
        supported_groupings: &[],
    },
    TemplateInfo {
        template: HealthRuleTemplate::LokiError,
        summary: "NetObserv flowlogs-pipeline is dropping flows because of Loki errors",
        description: "NetObserv flowlogs-pipeline is dropping flows because of Loki errors, Loki may be down or having issues ingesting every flows. Please check Loki and flowlogs-pipeline logs",
        supported_groupings: &[],
    },
];

pub fn template_info(template: HealthRuleTemplate) -> &'static TemplateInfo {
    &CATALOG[template as usize]
}

pub fn runbook_url(template: HealthRuleTemplate) -> String {
    format!("{}/{}.md", RUNBOOK_URL_BASE, template)
}
