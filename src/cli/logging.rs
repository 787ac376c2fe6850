//! stderr logging for the CLI.
//!
//! `RUST_LOG` wins when set. Otherwise `--log-level` applies to this crate
//! and everything else stays at `warn`, so `keys --json` output on stdout
//! is never interleaved with dependency chatter.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Level for targets outside this crate when `RUST_LOG` is unset.
const OTHER_CRATES_LEVEL: LevelFilter = LevelFilter::WARN;

/// Build the filter from an optional `RUST_LOG` value and the `--log-level` flag.
pub fn filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter, String> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        return EnvFilter::try_new(directives)
            .map_err(|e| format!("invalid {} '{}': {}", EnvFilter::DEFAULT_ENV, directives, e));
    }

    let level: LevelFilter = log_level
        .parse()
        .map_err(|_| format!("invalid --log-level '{}'", log_level))?;
    EnvFilter::try_new(format!(
        "{},{}={}",
        OTHER_CRATES_LEVEL,
        env!("CARGO_CRATE_NAME"),
        level
    ))
    .map_err(|e| e.to_string())
}

/// Install the global subscriber. Fails on a bad filter or a second call.
pub fn init(log_level: &str) -> Result<(), String> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    install(filter(rust_log.as_deref(), log_level)?)
}

fn install(filter: EnvFilter) -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| format!("cannot install logger: {}", e))
}
