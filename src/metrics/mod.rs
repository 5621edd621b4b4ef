pub mod collector;
pub mod exporter;

pub use collector::CompilerMetrics;
pub use exporter::PrometheusExporter;
