use std::path::Path;

use prometheus::{Encoder, TextEncoder};
use tracing::info;

use crate::metrics::collector::CompilerMetrics;
use crate::Result;

/// Renders the compiler metrics in the Prometheus text exposition format
pub struct PrometheusExporter {
    metrics: CompilerMetrics,
}

impl PrometheusExporter {
    pub fn new(metrics: CompilerMetrics) -> Self {
        Self { metrics }
    }

    pub fn format_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.metrics.registry().gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub async fn write_to(&self, path: &Path) -> Result<()> {
        let text = self.format_metrics()?;
        tokio::fs::write(path, text).await?;
        info!("Wrote compiler metrics to {}", path.display());
        Ok(())
    }
}
