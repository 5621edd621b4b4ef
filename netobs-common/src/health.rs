use serde::{Deserialize, Serialize};
use std::fmt;

use crate::defaults::{DEFAULT_INCLUDE_LIST, DEFAULT_NAMESPACE};

const DEFAULT_TREND_OFFSET: &str = "24h";
const DEFAULT_TREND_DURATION: &str = "2h";

/// Health rule template identifier
///
/// The two `NetObserv*` values are the baseline rules; they can be listed in
/// `disableAlerts` but are not configurable through `healthRules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HealthRuleTemplate {
    PacketDropsByKernel,
    PacketDropsByDevice,
    #[serde(rename = "IPsecErrors")]
    IpsecErrors,
    #[serde(rename = "DNSErrors")]
    DnsErrors,
    #[serde(rename = "DNSNxDomain")]
    DnsNxDomain,
    NetpolDenied,
    LatencyHighTrend,
    ExternalEgressHighTrend,
    ExternalIngressHighTrend,
    Ingress5xxErrors,
    #[serde(rename = "IngressHTTPLatencyTrend")]
    IngressHttpLatencyTrend,
    #[serde(rename = "NetObservNoFlows")]
    NoFlows,
    #[serde(rename = "NetObservLokiError")]
    LokiError,
}

impl HealthRuleTemplate {
    pub const ALL: [HealthRuleTemplate; 13] = [
        HealthRuleTemplate::PacketDropsByKernel,
        HealthRuleTemplate::PacketDropsByDevice,
        HealthRuleTemplate::IpsecErrors,
        HealthRuleTemplate::DnsErrors,
        HealthRuleTemplate::DnsNxDomain,
        HealthRuleTemplate::NetpolDenied,
        HealthRuleTemplate::LatencyHighTrend,
        HealthRuleTemplate::ExternalEgressHighTrend,
        HealthRuleTemplate::ExternalIngressHighTrend,
        HealthRuleTemplate::Ingress5xxErrors,
        HealthRuleTemplate::IngressHttpLatencyTrend,
        HealthRuleTemplate::NoFlows,
        HealthRuleTemplate::LokiError,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            HealthRuleTemplate::PacketDropsByKernel => "PacketDropsByKernel",
            HealthRuleTemplate::PacketDropsByDevice => "PacketDropsByDevice",
            HealthRuleTemplate::IpsecErrors => "IPsecErrors",
            HealthRuleTemplate::DnsErrors => "DNSErrors",
            HealthRuleTemplate::DnsNxDomain => "DNSNxDomain",
            HealthRuleTemplate::NetpolDenied => "NetpolDenied",
            HealthRuleTemplate::LatencyHighTrend => "LatencyHighTrend",
            HealthRuleTemplate::ExternalEgressHighTrend => "ExternalEgressHighTrend",
            HealthRuleTemplate::ExternalIngressHighTrend => "ExternalIngressHighTrend",
            HealthRuleTemplate::Ingress5xxErrors => "Ingress5xxErrors",
            HealthRuleTemplate::IngressHttpLatencyTrend => "IngressHTTPLatencyTrend",
            HealthRuleTemplate::NoFlows => "NetObservNoFlows",
            HealthRuleTemplate::LokiError => "NetObservLokiError",
        }
    }

    /// Baseline templates are emitted as fixed rules, outside of `healthRules`
    pub const fn is_baseline(&self) -> bool {
        matches!(
            self,
            HealthRuleTemplate::NoFlows | HealthRuleTemplate::LokiError
        )
    }

    /// Agent feature that must be enabled for this template to produce data
    pub const fn required_feature(&self) -> Option<AgentFeature> {
        match self {
            HealthRuleTemplate::PacketDropsByKernel => Some(AgentFeature::PacketDrop),
            HealthRuleTemplate::IpsecErrors => Some(AgentFeature::IpSec),
            HealthRuleTemplate::DnsErrors | HealthRuleTemplate::DnsNxDomain => {
                Some(AgentFeature::DnsTracking)
            }
            HealthRuleTemplate::LatencyHighTrend => Some(AgentFeature::FlowRtt),
            HealthRuleTemplate::NetpolDenied => Some(AgentFeature::NetworkEvents),
            _ => None,
        }
    }
}

impl fmt::Display for HealthRuleTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregation scope of a variant; an absent value means global
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupBy {
    Node,
    Namespace,
    Workload,
}

impl GroupBy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Node => "Node",
            GroupBy::Namespace => "Namespace",
            GroupBy::Workload => "Workload",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    /// Emission order for alerts: the most severe band comes first
    pub const DESCENDING: [Severity; 3] = [Severity::Critical, Severity::Warning, Severity::Info];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    /// Capitalized form, used as alert name suffix
    pub const fn title(&self) -> &'static str {
        match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Critical => "Critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether health rules are produced as alerts or as recording rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthMode {
    #[default]
    Alerts,
    RecordingRules,
}

impl HealthMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HealthMode::Alerts => "Alerts",
            HealthMode::RecordingRules => "RecordingRules",
        }
    }
}

impl fmt::Display for HealthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentFeature {
    PacketDrop,
    #[serde(rename = "DNSTracking")]
    DnsTracking,
    #[serde(rename = "FlowRTT")]
    FlowRtt,
    NetworkEvents,
    PacketTranslation,
    EbpfManager,
    #[serde(rename = "UDNMapping")]
    UdnMapping,
    #[serde(rename = "IPSec")]
    IpSec,
}

impl AgentFeature {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgentFeature::PacketDrop => "PacketDrop",
            AgentFeature::DnsTracking => "DNSTracking",
            AgentFeature::FlowRtt => "FlowRTT",
            AgentFeature::NetworkEvents => "NetworkEvents",
            AgentFeature::PacketTranslation => "PacketTranslation",
            AgentFeature::EbpfManager => "EbpfManager",
            AgentFeature::UdnMapping => "UDNMapping",
            AgentFeature::IpSec => "IPSec",
        }
    }
}

impl fmt::Display for AgentFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Thresholds per severity, expressed as percentages
///
/// A severity without threshold produces no alert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRuleThresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<String>,
}

impl HealthRuleThresholds {
    /// Threshold for a severity; blank strings count as unset
    pub fn get(&self, severity: Severity) -> Option<&str> {
        let value = match severity {
            Severity::Info => self.info.as_deref(),
            Severity::Warning => self.warning.as_deref(),
            Severity::Critical => self.critical.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Severity::DESCENDING.iter().all(|s| self.get(*s).is_none())
    }

    /// Lowest configured threshold, looking from info up to critical
    pub fn lowest(&self) -> Option<&str> {
        Severity::DESCENDING
            .iter()
            .rev()
            .find_map(|s| self.get(*s))
    }

    /// Highest configured threshold, looking from critical down to info
    pub fn highest(&self) -> Option<&str> {
        Severity::DESCENDING.iter().find_map(|s| self.get(*s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRuleVariant {
    #[serde(default)]
    pub thresholds: HealthRuleThresholds,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<GroupBy>,

    /// Absolute rate under which the denominator is ignored, to improve signal-to-noise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_volume_threshold: Option<String>,

    /// Trend templates: how far back the baseline is taken (e.g. "1d")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_offset: Option<String>,

    /// Trend templates: window over which the baseline is averaged (e.g. "2h")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HealthMode>,
}

impl HealthRuleVariant {
    /// Returns (offset, duration) with defaults applied
    pub fn trend_params(&self) -> (&str, &str) {
        (
            self.trend_offset
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_TREND_OFFSET),
            self.trend_duration
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_TREND_DURATION),
        )
    }

    pub fn low_volume(&self) -> Option<&str> {
        self.low_volume_threshold
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    /// Variant mode, else definition mode, else the global mode
    pub fn effective_mode(&self, definition: Option<HealthMode>, global: HealthMode) -> HealthMode {
        self.mode.or(definition).unwrap_or(global)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRuleDefinition {
    pub template: HealthRuleTemplate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<HealthMode>,

    #[serde(default)]
    pub variants: Vec<HealthRuleVariant>,
}

/// Health section of the FlowCollector metrics configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSpec {
    #[serde(default)]
    pub health_mode: HealthMode,

    /// Definitions replacing the defaults of the same template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_rules: Option<Vec<HealthRuleDefinition>>,

    /// Templates to drop, including the baseline ones; wins over `healthRules`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disable_alerts: Vec<HealthRuleTemplate>,

    /// Enabled metric names; the default include list applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_list: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agent_features: Vec<AgentFeature>,

    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for HealthSpec {
    fn default() -> Self {
        Self {
            health_mode: HealthMode::default(),
            health_rules: None,
            disable_alerts: Vec::new(),
            include_list: None,
            agent_features: Vec::new(),
            namespace: default_namespace(),
        }
    }
}

impl HealthSpec {
    pub fn enabled_metrics(&self) -> Vec<String> {
        match &self.include_list {
            Some(list) => list.clone(),
            None => DEFAULT_INCLUDE_LIST.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn is_feature_enabled(&self, feature: AgentFeature) -> bool {
        self.agent_features.contains(&feature)
    }

    pub fn is_disabled(&self, template: HealthRuleTemplate) -> bool {
        self.disable_alerts.contains(&template)
    }

    /// Whether the template's agent feature prerequisite is met
    pub fn is_allowed(&self, template: HealthRuleTemplate) -> bool {
        template
            .required_feature()
            .map_or(true, |f| self.is_feature_enabled(f))
    }
}
