use tracing_subscriber::EnvFilter;

/// HTTP plumbing that floods debug output without adding business context.
const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

/// `RUST_LOG` if set, otherwise `level` with the noisy modules held at warn.
fn build_filter(level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }
    EnvFilter::new(directives)
}

/// Install the stderr subscriber. stdout stays reserved for the report.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
