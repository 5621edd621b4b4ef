pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use netobs_common::HealthMode;

#[derive(Parser)]
#[command(name = "netobs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiles network observability health rules into Prometheus rules", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Compile health rules into a PrometheusRule resource")]
    Rules {
        #[arg(short, long, help = "Health configuration file (YAML)")]
        config: PathBuf,

        #[arg(short, long, help = "Output file path, stdout when omitted")]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, help = "Override the configured health mode")]
        mode: Option<ModeArg>,

        #[arg(long, help = "Write compiler metrics to this file")]
        metrics_out: Option<PathBuf>,

        #[arg(
            long,
            default_value = "netobserv-health-rules",
            help = "Name of the PrometheusRule resource"
        )]
        name: String,
    },
    #[command(about = "Check a health configuration without producing rules")]
    Validate {
        #[arg(short, long, help = "Health configuration file (YAML)")]
        config: PathBuf,
    },
    #[command(about = "Export health rule metadata for the console plugin")]
    Templates {
        #[arg(short, long, help = "Health configuration file, defaults apply when omitted")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    #[value(name = "Alerts")]
    Alerts,
    #[value(name = "RecordingRules")]
    RecordingRules,
}

impl From<ModeArg> for HealthMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Alerts => HealthMode::Alerts,
            ModeArg::RecordingRules => HealthMode::RecordingRules,
        }
    }
}
