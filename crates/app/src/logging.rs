use tracing_subscriber::EnvFilter;

/// Initialise logging at `info`, or `debug` when requested on the command
/// line. With `--debug`, `RUST_LOG` may override the level.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
