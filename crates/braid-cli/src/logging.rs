//! Tracing setup for the `braid` binary
//!
//! `BRAID_LOG` selects what is logged, with the same syntax as `RUST_LOG`
//! (which is used when `BRAID_LOG` is unset). `BRAID_LOG_FORMAT` picks
//! `text` (default) or `json`. Output goes to stderr so that command
//! output on stdout stays clean.
//!
//! ```bash
//! BRAID_LOG=braid_mixins=debug braid order catalog.toml
//! BRAID_LOG=trace BRAID_LOG_FORMAT=json braid emit catalog.toml --class Shop.Order
//! ```

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Flat text lines
    Text,
    /// One JSON object per event
    Json,
}

impl LogFormat {
    /// Parse a `BRAID_LOG_FORMAT` value; unknown values mean text
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("BRAID_LOG_FORMAT").unwrap_or_default())
    }
}

fn build_filter() -> EnvFilter {
    match std::env::var("BRAID_LOG") {
        Ok(directives) => EnvFilter::builder().parse_lossy(directives),
        Err(_) => EnvFilter::from_default_env(),
    }
}

/// Install the global subscriber
///
/// Nothing is installed unless `BRAID_LOG` or `RUST_LOG` is set.
pub fn init_tracing() {
    if std::env::var_os("BRAID_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_writer(std::io::stderr);
            Registry::default().with(filter).with(layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse("tree"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }
}
