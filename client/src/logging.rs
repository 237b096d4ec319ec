use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Log to stderr so command output on stdout stays clean. `RUST_LOG`
/// overrides the default `warn`, `--verbose` raises it to `debug`.
pub fn init(verbose: bool) {
    LOGGER_INIT.get_or_init(|| {
        let default = if verbose { "debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
