use prometheus::{IntCounter, IntCounterVec, Opts, Registry};

use crate::health::CompilationReport;
use crate::Result;

/// Counters describing what the compiler produced
#[derive(Clone)]
pub struct CompilerMetrics {
    registry: Registry,
    rules_emitted: IntCounterVec,
    warnings: IntCounter,
    rules_dropped: IntCounter,
}

impl CompilerMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let rules_emitted = IntCounterVec::new(
            Opts::new(
                "netobs_health_rules_emitted_total",
                "Health rules emitted, per rule kind",
            ),
            &["kind"],
        )?;
        let warnings = IntCounter::new(
            "netobs_health_warnings_total",
            "Advisory warnings raised while compiling health rules",
        )?;
        let rules_dropped = IntCounter::new(
            "netobs_health_rules_dropped_total",
            "Health rules that could not be built",
        )?;

        registry.register(Box::new(rules_emitted.clone()))?;
        registry.register(Box::new(warnings.clone()))?;
        registry.register(Box::new(rules_dropped.clone()))?;

        Ok(Self {
            registry,
            rules_emitted,
            warnings,
            rules_dropped,
        })
    }

    pub fn observe(&self, report: &CompilationReport) {
        for rule in &report.rules {
            self.rules_emitted.with_label_values(&[rule.kind()]).inc();
        }
        self.warnings.inc_by(report.warnings.len() as u64);
        self.rules_dropped.inc_by(report.dropped.len() as u64);
    }

    pub fn rules_emitted(&self, kind: &str) -> u64 {
        self.rules_emitted.with_label_values(&[kind]).get()
    }

    pub fn warnings(&self) -> u64 {
        self.warnings.get()
    }

    pub fn rules_dropped(&self) -> u64 {
        self.rules_dropped.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::compile;
    use netobs_common::HealthSpec;

    #[test]
    fn test_observe_report() {
        let metrics = CompilerMetrics::new().unwrap();
        let report = compile(&HealthSpec::default()).unwrap();
        metrics.observe(&report);

        assert_eq!(metrics.rules_emitted("alert"), report.rules.len() as u64);
        assert_eq!(metrics.rules_emitted("recording"), 0);
        assert_eq!(metrics.warnings(), report.warnings.len() as u64);
        assert_eq!(metrics.rules_dropped(), 0);
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = CompilerMetrics::new().unwrap();
        let report = CompilationReport {
            rules: Vec::new(),
            warnings: vec!["a".to_string(), "b".to_string()],
            dropped: vec!["c".to_string()],
        };
        metrics.observe(&report);
        metrics.observe(&report);
        assert_eq!(metrics.warnings(), 4);
        assert_eq!(metrics.rules_dropped(), 2);
    }

    #[test]
    fn test_instances_are_independent() {
        let first = CompilerMetrics::new().unwrap();
        let second = CompilerMetrics::new().unwrap();
        first.observe(&CompilationReport {
            warnings: vec!["w".to_string()],
            ..Default::default()
        });
        assert_eq!(first.warnings(), 1);
        assert_eq!(second.warnings(), 0);
    }
}
