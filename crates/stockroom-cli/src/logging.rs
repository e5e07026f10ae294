//! Subscriber setup.
//!
//! Library crates log through the `log` facade; the fmt subscriber bridges
//! those records into tracing, so one filter governs both.

use tracing_subscriber::EnvFilter;

const WORKSPACE_TARGETS: [&str; 3] = ["stockroom_session", "stockroom_client", "stockroom_cli"];

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(level: &str, verbose: bool) -> String {
    if !verbose {
        return level.to_string();
    }
    let mut directive = level.to_string();
    for target in WORKSPACE_TARGETS {
        directive.push_str(&format!(",{target}=debug"));
    }
    directive
}

/// Install the global subscriber, writing to stderr.
pub fn init(level: &str, verbose: bool) {
    let fallback = default_directive(level, verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    if let Err(err) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("logging already initialised: {err}");
    }
}
