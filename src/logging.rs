//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "DYNOBATCH_LOG";

/// Install a fmt subscriber filtered by `DYNOBATCH_LOG`, or by
/// `default_directive` when the variable is unset or invalid.
///
/// Returns false if a global subscriber was already installed.
pub fn init_logging(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let _ = init_logging("dynobatch=debug");
        assert!(!init_logging("dynobatch=debug"));
    }
}
