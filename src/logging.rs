// src/logging.rs

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;

/// Environment variable holding the `EnvFilter` directive
pub const LOG_ENV: &str = "MODGRAPH_LOG";
/// "compact" (default) or "full" (timestamps)
pub const LOG_STYLE_ENV: &str = "MODGRAPH_LOG_STYLE";

/// A timer that outputs nothing but still enables span timing calculation
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(
        &self,
        _w: &mut tracing_subscriber::fmt::format::Writer<'_>,
    ) -> std::fmt::Result {
        Ok(())
    }
}

/// Install a stderr subscriber if `MODGRAPH_LOG` is set.
///
/// Returns true if this call installed it. Safe to call more than once; a
/// subscriber installed elsewhere is left in place.
pub fn init_tracing() -> bool {
    let Ok(filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return false;
    };
    let style = std::env::var(LOG_STYLE_ENV).unwrap_or_default();
    let installed = if style == "full" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    } else {
        // Compact output: no timestamp prefix
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_writer(std::io::stderr)
            .try_init()
            .is_ok()
    };
    if installed {
        tracing::debug!(style = %style, "tracing initialized");
    }
    installed
}
