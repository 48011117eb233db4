//! Tracing setup for the CLI. Logs go to stderr so ticker output on stdout
//! stays pipeable.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const CRATE_TARGET: &str = "goldtick";

/// Filter directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> String {
    if verbose {
        format!("{CRATE_TARGET}=debug")
    } else {
        "off".to_string()
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `verbose`.
///
/// Verbose runs get multi-line pretty events; everything else stays compact.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    let events = fmt::layer().without_time().with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    if verbose {
        registry.with(events.pretty()).init();
    } else {
        registry.with(events.compact()).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(true), "goldtick=debug");
        assert_eq!(default_directive(false), "off");
        assert!(EnvFilter::try_new(default_directive(true)).is_ok());
    }
}
