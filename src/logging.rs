use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "docanalysis=info";

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter;
/// calling this more than once is harmless.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        tracing::debug!("tracing subscriber already installed");
    }
}
