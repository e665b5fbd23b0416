//! Log setup for the `sitediag` binary and for tests that want output.
//!
//! Reports go to stdout, so every log line is written to stderr. Without
//! `RUST_LOG` the chosen level applies to the sitediag crates only; the HTTP
//! stack underneath the prober stays at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Library crates plus the `sitediag` binary itself.
const SITEDIAG_TARGETS: [&str; 4] = ["sitediag", "sitediag_core", "sitediag_checks", "sitediag_cli"];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    std::iter::once("warn".to_string())
        .chain(SITEDIAG_TARGETS.iter().map(|t| format!("{t}={level}")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber; `json` switches to one JSON object per
/// line. A second call leaves the first subscriber in place.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));
    let output = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(output.json()).try_init()
    } else {
        registry.with(output).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
