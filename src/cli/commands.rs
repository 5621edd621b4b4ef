use std::path::{Path, PathBuf};

use anyhow::Context;
use netobs_common::HealthMode;
use tracing::{debug, info, warn};

use crate::cli::Commands;
use crate::config::{self, HealthConfig};
use crate::console::health_rules_metadata;
use crate::health::compile;
use crate::health::validation::check;
use crate::health::variants::effective_definitions;
use crate::k8s::prometheus_rule;
use crate::metrics::{CompilerMetrics, PrometheusExporter};

const APP_LABEL: &str = "netobserv";

pub async fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Rules {
            config,
            output,
            mode,
            metrics_out,
            name,
        } => handle_rules(config, output, mode.map(HealthMode::from), metrics_out, name).await,
        Commands::Validate { config } => handle_validate(config).await,
        Commands::Templates { config } => handle_templates(config).await,
    }
}

async fn load_config(path: &Path) -> anyhow::Result<HealthConfig> {
    config::load(path)
        .await
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

async fn write_output(output: Option<PathBuf>, text: String) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(&path, text)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

async fn handle_rules(
    config: PathBuf,
    output: Option<PathBuf>,
    mode: Option<HealthMode>,
    metrics_out: Option<PathBuf>,
    name: String,
) -> anyhow::Result<()> {
    let config = load_config(&config).await?.with_mode(mode);
    let health = &config.health;
    info!("Compiling health rules in {} mode", health.health_mode);

    let report = compile(health)?;
    let metrics = CompilerMetrics::new()?;
    metrics.observe(&report);

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    for dropped in &report.dropped {
        eprintln!("dropped: {}", dropped);
    }

    let resource = prometheus_rule(
        report.rules,
        &name,
        &health.namespace,
        APP_LABEL,
        crate::VERSION,
    );
    let yaml = serde_yaml::to_string(&resource)?;
    write_output(output, yaml).await?;

    if let Some(path) = metrics_out {
        PrometheusExporter::new(metrics).write_to(&path).await?;
    }
    Ok(())
}

async fn handle_validate(config: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&config).await?;
    let health = &config.health;
    let definitions = effective_definitions(
        &netobs_common::default_health_rules(),
        health.health_rules.as_deref(),
        &health.disable_alerts,
    );
    debug!("Checking {} health rule definitions", definitions.len());

    let report = check(health, &definitions);
    for warning in &report.warnings {
        warn!("{}", warning);
        println!("warning: {}", warning);
    }
    for error in &report.errors {
        println!("error: {}", error);
    }

    if !report.is_valid() {
        anyhow::bail!(
            "{} health rule configuration error(s) found",
            report.errors.len()
        );
    }
    println!("Health rules configuration is valid");
    Ok(())
}

async fn handle_templates(config: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => load_config(&path).await?,
        None => HealthConfig::default(),
    };
    let metadata = health_rules_metadata(&config.health);
    info!("Exporting metadata for {} health rule templates", metadata.len());
    write_output(None, serde_yaml::to_string(&metadata)?).await
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
agentFeatures: [PacketDrop]
healthRules:
  - template: PacketDropsByKernel
    variants:
      - groupBy: Node
        thresholds:
          warning: "10"
"#;

    #[tokio::test]
    async fn test_rules_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("health.yaml");
        let output = dir.path().join("rules.yaml");
        let metrics = dir.path().join("metrics.prom");
        tokio::fs::write(&config, CONFIG).await.unwrap();

        handle_command(Commands::Rules {
            config,
            output: Some(output.clone()),
            mode: None,
            metrics_out: Some(metrics.clone()),
            name: "health".to_string(),
        })
        .await
        .unwrap();

        let yaml = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(yaml.contains("kind: PrometheusRule"));
        assert!(yaml.contains("name: health"));
        assert!(yaml.contains("PacketDropsByKernel_PerSrcNodeWarning"));
        let text = tokio::fs::read_to_string(&metrics).await.unwrap();
        assert!(text.contains("netobs_health_rules_emitted_total"));
    }

    #[tokio::test]
    async fn test_rules_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("health.yaml");
        tokio::fs::write(
            &config,
            "healthRules:\n  - template: IPsecErrors\n    variants:\n      - groupBy: Workload\n        thresholds:\n          warning: \"1\"\n",
        )
        .await
        .unwrap();

        let err = handle_command(Commands::Rules {
            config,
            output: Some(dir.path().join("rules.yaml")),
            mode: None,
            metrics_out: None,
            name: "health".to_string(),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("does not support grouping per Workload"));
    }

    #[tokio::test]
    async fn test_validate() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.yaml");
        tokio::fs::write(&good, CONFIG).await.unwrap();
        assert!(handle_command(Commands::Validate { config: good }).await.is_ok());

        let bad = dir.path().join("bad.yaml");
        tokio::fs::write(
            &bad,
            "healthRules:\n  - template: NetpolDenied\n    variants:\n      - thresholds:\n          warning: \"x\"\n",
        )
        .await
        .unwrap();
        let err = handle_command(Commands::Validate { config: bad }).await.unwrap_err();
        assert!(err.to_string().contains("1 health rule configuration error(s)"));
    }

    #[tokio::test]
    async fn test_missing_config() {
        let err = handle_command(Commands::Validate {
            config: PathBuf::from("/nonexistent/health.yaml"),
        })
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to load configuration"));
    }
}
