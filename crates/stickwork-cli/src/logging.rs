//! Tracing subscriber setup.
//!
//! Logs go to stderr so they never mix with JSON written to stdout.
//! `RUST_LOG` wins over the `--verbose` default when it is set.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a verbosity flag.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "stickwork_core=debug,stickwork_cli=debug,warn"
    } else {
        "warn"
    }
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
