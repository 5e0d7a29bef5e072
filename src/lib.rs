pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod features;
pub mod form;
pub mod h2h;
pub mod history;
pub mod ledger;
pub mod matches;
pub mod odds;
pub mod outcome;
pub mod performance;
pub mod prediction;
pub mod standings;
pub mod strength;
pub mod synthetic;
pub mod value;

use tracing_subscriber::EnvFilter;

/// Stderr logging for the binaries; `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,matchedge=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
