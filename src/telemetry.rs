//! Tracing subscriber setup for the `mise` binary.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Logs go to stderr so stdout stays clean for
/// reports; `RUST_LOG` takes precedence over `default_filter`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_filter: &str, json_output: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if json_output {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
    } else {
        fmt()
            .compact()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow!("Failed to initialize tracing: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails() {
        // Another test may have installed a subscriber first; either way the
        // second call in this test must fail.
        let _ = init_tracing("info", false);
        let err = init_tracing("info", true).unwrap_err();
        assert!(err.to_string().contains("Failed to initialize tracing"));
    }
}
