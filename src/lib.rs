pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod health;
pub mod k8s;
pub mod metrics;

pub use error::{NetobsError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value of the `part-of` label on generated objects
pub const OPERATOR_NAME: &str = "netobserv-operator";
