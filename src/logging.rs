use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::types::path_data::PathResult;

/// Installs the global fmt subscriber, writing to stderr so stdout stays
/// clean for JSON output.
///
/// `RUST_LOG` overrides `default_directive`. Calling this twice is harmless.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Per-level overview of a finished path.
pub fn log_path_summary(name: &str, result: &PathResult) {
    info!("{}", "=".repeat(60));
    info!("Path '{}': {} items", name, result.summary.total_items);
    for level in &result.levels {
        info!(
            "  {}: {} items, coverage {:.1}% ({:?})",
            level.level,
            level.items.len(),
            level.coverage * 100.0,
            level.stop_reason
        );
    }
    for step in &result.summary.difficulty_progression {
        info!("  avg difficulty {}: {:.2}", step.level, step.average_difficulty);
    }
    info!("{}", "=".repeat(60));
}
