use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_ENV;

/// Initialize structured diagnostics based on CLI arguments.
///
/// `RUST_LOG` or `NODEKEEPER_LOG` take precedence over the flags.
pub fn init_tracing(verbose: bool, log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose {
        "nodekeeper=debug"
    } else {
        "nodekeeper=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env(LOG_ENV))
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
