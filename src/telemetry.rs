use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "leaf_diagnosis=info,rocket=warn";

/// Installs the global `fmt` subscriber. `RUST_LOG` overrides the defaults.
///
/// Returns `false` when a subscriber was already installed.
pub fn init() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
