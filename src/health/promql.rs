//! PromQL assembly primitives
//!
//! Every function here is a pure string builder. Builders compose them; none
//! of them know about templates.

use std::fmt;

use netobs_common::GroupBy;

use super::context::Side;

const METRIC_PREFIX: &str = "netobserv_";

/// A `rate(...)` expression, the only accepted input of the aggregations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rate(String);

impl Rate {
    /// Wraps an already-built rate expression
    pub fn from_raw(expr: impl Into<String>) -> Self {
        Rate(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Threshold comparison appended to alert expressions
///
/// Recording expressions carry no band at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertBand<'a> {
    pub threshold: &'a str,
    pub upper: Option<&'a str>,
}

impl AlertBand<'_> {
    fn render(&self) -> String {
        match self.upper {
            Some(upper) => format!(" > {} < {}", self.threshold, upper),
            None => format!(" > {}", self.threshold),
        }
    }
}

fn render_band(band: Option<AlertBand<'_>>) -> String {
    band.map(|b| b.render()).unwrap_or_default()
}

/// `rate(netobserv_{metric}{suffix}{filters}[{window}] offset {offset})`
pub fn rate(metric: &str, suffix: &str, filters: &str, window: &str, offset: Option<&str>) -> Rate {
    let offset = offset
        .map(|o| format!(" offset {}", o))
        .unwrap_or_default();
    Rate(format!(
        "rate({}{}{}{}[{}]{})",
        METRIC_PREFIX, metric, suffix, filters, window, offset
    ))
}

/// Directional input labels and their canonical output names for a grouping
fn directional_labels(group_by: GroupBy) -> &'static [(&'static str, &'static str)] {
    match group_by {
        GroupBy::Node => &[("K8S_HostName", "node")],
        GroupBy::Namespace => &[("K8S_Namespace", "namespace")],
        GroupBy::Workload => &[
            ("K8S_Namespace", "namespace"),
            ("K8S_OwnerName", "workload"),
            ("K8S_OwnerType", "kind"),
        ],
    }
}

/// Aggregates a rate, renaming `Src`/`Dst` labels to canonical ones so that
/// both directional views can be compared and added.
pub fn sum_by(rate: &Rate, group_by: Option<GroupBy>, side: Option<Side>, extra_label: Option<&str>) -> String {
    let Some(group_by) = group_by else {
        return match extra_label {
            Some(label) => format!("sum({}) by ({})", rate, label),
            None => format!("sum({})", rate),
        };
    };

    let prefix = side.map(Side::as_str).unwrap_or_default();
    let labels = directional_labels(group_by);
    let replaced = labels.iter().fold(rate.to_string(), |expr, (input, output)| {
        format!(
            r#"label_replace({}, "{}", "$1", "{}{}", "(.*)")"#,
            expr, output, prefix, input
        )
    });

    let mut by: Vec<&str> = labels.iter().map(|(_, output)| *output).collect();
    if let Some(label) = extra_label {
        by.push(label);
    }
    format!("sum({}) by ({})", replaced, by.join(","))
}

pub fn histogram_quantile(rate: &Rate, group_by: Option<GroupBy>, side: Option<Side>, quantile: &str) -> String {
    format!(
        "histogram_quantile({}, {})",
        quantile,
        sum_by(rate, group_by, side, Some("le"))
    )
}

/// `100 * (numerator) / (denominator [> lowVolume])` plus the alert band
pub fn percentage(
    numerator: &str,
    denominator: &str,
    band: Option<AlertBand<'_>>,
    low_volume: Option<&str>,
) -> String {
    let low_volume = low_volume
        .map(|v| format!(" > {}", v))
        .unwrap_or_default();
    format!(
        "100 * ({}) / ({}{}){}",
        numerator,
        denominator,
        low_volume,
        render_band(band)
    )
}

/// Relative increase of `current` over `baseline`, in percent
pub fn baseline_increase(current: &str, baseline: &str, band: Option<AlertBand<'_>>) -> String {
    format!(
        "100 * (({}) - ({})) / ({}){}",
        current,
        baseline,
        baseline,
        render_band(band)
    )
}

/// Label matcher block for a grouping, guarding against empty K8S labels
///
/// Returns an empty string when there is nothing to match on.
pub fn label_filters(group_by: Option<GroupBy>, side: Option<Side>, extra: Option<&str>) -> String {
    let prefix = side.map(Side::as_str).unwrap_or_default();
    let mut filters: Vec<String> = group_by
        .map(|g| {
            directional_labels(g)
                .iter()
                .map(|(input, _)| format!(r#"{}{}!="""#, prefix, input))
                .collect()
        })
        .unwrap_or_default();
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        filters.push(extra.to_string());
    }

    if filters.is_empty() {
        String::new()
    } else {
        format!("{{{}}}", filters.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate() {
        assert_eq!(
            rate("namespace_drop_packets_total", "", "", "2m", None).as_str(),
            "rate(netobserv_namespace_drop_packets_total[2m])"
        );
        assert_eq!(
            rate(
                "namespace_rtt_seconds",
                "_bucket",
                r#"{SrcK8S_Namespace!=""}"#,
                "2h",
                Some("24h")
            )
            .as_str(),
            r#"rate(netobserv_namespace_rtt_seconds_bucket{SrcK8S_Namespace!=""}[2h] offset 24h)"#
        );
    }

    #[test]
    fn test_sum_by() {
        let pql = sum_by(
            &Rate::from_raw(r#"rate(my_metric{SrcK8S_HostName!=""}[1m])"#),
            Some(GroupBy::Node),
            Some(Side::Src),
            None,
        );
        assert_eq!(
            pql,
            r#"sum(label_replace(rate(my_metric{SrcK8S_HostName!=""}[1m]), "node", "$1", "SrcK8S_HostName", "(.*)")) by (node)"#
        );

        let pql = sum_by(
            &Rate::from_raw(r#"rate(my_metric{DstK8S_Namespace!="",DstK8S_OwnerName!="",DstK8S_OwnerType!=""}[1m])"#),
            Some(GroupBy::Workload),
            Some(Side::Dst),
            None,
        );
        assert_eq!(
            pql,
            r#"sum(label_replace(label_replace(label_replace(rate(my_metric{DstK8S_Namespace!="",DstK8S_OwnerName!="",DstK8S_OwnerType!=""}[1m]), "namespace", "$1", "DstK8S_Namespace", "(.*)"), "workload", "$1", "DstK8S_OwnerName", "(.*)"), "kind", "$1", "DstK8S_OwnerType", "(.*)")) by (namespace,workload,kind)"#
        );

        let pql = sum_by(
            &Rate::from_raw(r#"rate(my_metric{DstK8S_Namespace!="",DnsFlagsResponseCode!="NoError"}[1m])"#),
            Some(GroupBy::Namespace),
            Some(Side::Dst),
            None,
        );
        assert_eq!(
            pql,
            r#"sum(label_replace(rate(my_metric{DstK8S_Namespace!="",DnsFlagsResponseCode!="NoError"}[1m]), "namespace", "$1", "DstK8S_Namespace", "(.*)")) by (namespace)"#
        );
    }

    #[test]
    fn test_sum_by_global() {
        let r = Rate::from_raw("rate(my_metric[1m])");
        let pql = sum_by(&r, None, None, None);
        assert_eq!(pql, "sum(rate(my_metric[1m]))");
        assert!(!pql.contains("K8S_"));

        assert_eq!(sum_by(&r, None, None, Some("le")), "sum(rate(my_metric[1m])) by (le)");
    }

    #[test]
    fn test_histogram_quantile() {
        let r = Rate::from_raw("rate(my_metric_bucket[2m])");
        assert_eq!(
            histogram_quantile(&r, Some(GroupBy::Node), Some(Side::Dst), "0.9"),
            r#"histogram_quantile(0.9, sum(label_replace(rate(my_metric_bucket[2m]), "node", "$1", "DstK8S_HostName", "(.*)")) by (node,le))"#
        );
        assert_eq!(
            histogram_quantile(&r, None, None, "0.9"),
            "histogram_quantile(0.9, sum(rate(my_metric_bucket[2m])) by (le))"
        );
    }

    #[test]
    fn test_percentage_alert() {
        let num = "sum(rate(my_metric[1m]))";
        let den = "sum(rate(my_total[1m]))";
        let band = |threshold, upper| {
            Some(AlertBand {
                threshold,
                upper,
            })
        };

        assert_eq!(
            percentage(num, den, band("10", None), None),
            "100 * (sum(rate(my_metric[1m]))) / (sum(rate(my_total[1m]))) > 10"
        );
        assert_eq!(
            percentage(num, den, band("10", Some("20")), None),
            "100 * (sum(rate(my_metric[1m]))) / (sum(rate(my_total[1m]))) > 10 < 20"
        );
        assert_eq!(
            percentage(num, den, band("10", Some("20")), Some("2")),
            "100 * (sum(rate(my_metric[1m]))) / (sum(rate(my_total[1m])) > 2) > 10 < 20"
        );
    }

    #[test]
    fn test_percentage_recording() {
        let num = "sum(rate(my_metric[1m]))";
        let den = "sum(rate(my_total[1m]))";

        let pql = percentage(num, den, None, None);
        assert_eq!(pql, "100 * (sum(rate(my_metric[1m]))) / (sum(rate(my_total[1m])))");
        assert!(!pql.contains('>'));
        assert!(!pql.contains('<'));

        let pql = percentage(num, den, None, Some("2"));
        assert_eq!(pql, "100 * (sum(rate(my_metric[1m]))) / (sum(rate(my_total[1m])) > 2)");
    }

    #[test]
    fn test_baseline_increase() {
        assert_eq!(
            baseline_increase("A", "B", Some(AlertBand { threshold: "100", upper: None })),
            "100 * ((A) - (B)) / (B) > 100"
        );
        assert_eq!(
            baseline_increase("A", "B", Some(AlertBand { threshold: "50", upper: Some("100") })),
            "100 * ((A) - (B)) / (B) > 50 < 100"
        );
        assert_eq!(baseline_increase("A", "B", None), "100 * ((A) - (B)) / (B)");
    }

    #[test]
    fn test_label_filters() {
        assert_eq!(
            label_filters(Some(GroupBy::Node), Some(Side::Src), None),
            r#"{SrcK8S_HostName!=""}"#
        );
        assert_eq!(
            label_filters(Some(GroupBy::Node), Some(Side::Dst), None),
            r#"{DstK8S_HostName!=""}"#
        );
        assert_eq!(
            label_filters(Some(GroupBy::Namespace), Some(Side::Src), None),
            r#"{SrcK8S_Namespace!=""}"#
        );
        assert_eq!(
            label_filters(Some(GroupBy::Workload), Some(Side::Dst), None),
            r#"{DstK8S_Namespace!="",DstK8S_OwnerName!="",DstK8S_OwnerType!=""}"#
        );
        assert_eq!(
            label_filters(
                Some(GroupBy::Namespace),
                Some(Side::Src),
                Some(r#"DnsFlagsResponseCode!="NoError""#)
            ),
            r#"{SrcK8S_Namespace!="",DnsFlagsResponseCode!="NoError"}"#
        );
        assert_eq!(
            label_filters(Some(GroupBy::Workload), Some(Side::Dst), Some(r#"action="drop""#)),
            r#"{DstK8S_Namespace!="",DstK8S_OwnerName!="",DstK8S_OwnerType!="",action="drop"}"#
        );
        assert_eq!(label_filters(None, None, None), "");
        assert_eq!(
            label_filters(None, None, Some(r#"DnsFlagsResponseCode!="NoError""#)),
            r#"{DnsFlagsResponseCode!="NoError"}"#
        );
    }
}
