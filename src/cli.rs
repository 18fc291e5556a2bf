//! Command line interface and logging setup.

use std::{io, path::PathBuf};

use clap::{Args, Parser};
use jiff::Timestamp;
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

/// Apply coupon codes to a fixture cart and print the receipt.
#[derive(Debug, Parser)]
#[command(name = "rebate", version)]
pub struct CliArgs {
    /// Fixture set to load the products, cart and coupons from
    #[arg(short, long, env = "REBATE_FIXTURE", default_value = "basic")]
    pub fixture: String,

    /// Directory holding the fixture sets
    #[arg(long, env = "REBATE_FIXTURES_DIR", default_value = "./fixtures")]
    pub fixtures_dir: PathBuf,

    /// Coupon code to apply (repeat for several)
    #[arg(short, long = "code", value_name = "CODE")]
    pub codes: Vec<String>,

    /// Replace the cart's customer email
    #[arg(short, long, env = "REBATE_EMAIL")]
    pub email: Option<String>,

    /// Check coupon validity windows at this RFC 3339 instant instead of now
    #[arg(long, env = "REBATE_NOW")]
    pub now: Option<Timestamp>,

    /// Reapply the codes already stored on the cart
    #[arg(long, conflicts_with = "codes")]
    pub revalidate: bool,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REBATE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "REBATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Install a global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `--log-level` when set.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    match config.log_format {
        LogFormat::Compact => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(true),
        ),
        LogFormat::Json => init_with_layer(
            config,
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        ),
    }
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

fn init_with_layer<L>(config: &LoggingConfig, fmt_layer: L) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(build_env_filter(config))
        .try_init()
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parses_repeated_codes_and_defaults() -> TestResult {
        let args = CliArgs::try_parse_from([
            "rebate",
            "--fixture",
            "stacking",
            "--code",
            "TENOFF",
            "-c",
            "STATIONERY15",
            "--now",
            "2025-06-01T12:00:00Z",
        ])?;

        assert_eq!(args.fixture, "stacking");
        assert_eq!(args.codes, ["TENOFF", "STATIONERY15"]);
        assert_eq!(args.now, Some("2025-06-01T12:00:00Z".parse()?));
        assert!(!args.revalidate);
        assert!(matches!(args.logging.log_format, LogFormat::Compact));

        Ok(())
    }

    #[test]
    fn revalidate_conflicts_with_codes() {
        let result = CliArgs::try_parse_from(["rebate", "--revalidate", "--code", "TEN"]);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_malformed_timestamp() {
        let result = CliArgs::try_parse_from(["rebate", "--now", "next tuesday"]);

        assert!(result.is_err());
    }
}
