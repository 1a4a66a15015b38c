//! Logging setup for docmodel.
//!
//! The crates log through `tracing`. Installing a subscriber is left to the
//! application; with the `tracing-subscriber` feature enabled, [`init`]
//! installs one configured from the environment.
//!
//! # Environment Variables
//!
//! - `DOCMODEL_DEBUG=true|1|yes` - Enable debug logging
//! - `DOCMODEL_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `DOCMODEL_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! use docmodel_core::logging;
//!
//! // Once, at startup.
//! logging::init();
//! ```
//!
//! Inside the crates, plain tracing macros are used with structured fields:
//!
//! ```rust,ignore
//! debug!(collection = %name, filter = ?filter, "Finding documents");
//! warn!(model = %schema.name(), depth, "Nesting limit reached");
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Environment variable enabling debug logging.
pub const DEBUG_VAR: &str = "DOCMODEL_DEBUG";
/// Environment variable selecting the log level.
pub const LEVEL_VAR: &str = "DOCMODEL_LOG_LEVEL";
/// Environment variable selecting the output format.
pub const FORMAT_VAR: &str = "DOCMODEL_LOG_FORMAT";

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_level(value: Option<&str>, debug: bool) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("trace") => "trace",
        Some("debug") => "debug",
        Some("info") => "info",
        Some("warn") => "warn",
        Some("error") => "error",
        _ if debug => "debug",
        _ => "warn",
    }
}

fn parse_format(value: Option<&str>) -> &'static str {
    match value.map(str::to_lowercase).as_deref() {
        Some("pretty") => "pretty",
        Some("compact") => "compact",
        _ => "json",
    }
}

/// Whether `DOCMODEL_DEBUG` is set to "true", "1" or "yes".
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).map(|v| parse_flag(&v)).unwrap_or(false)
}

/// Level from `DOCMODEL_LOG_LEVEL`; "debug" under `DOCMODEL_DEBUG`, else "warn".
pub fn get_log_level() -> &'static str {
    parse_level(env::var(LEVEL_VAR).ok().as_deref(), is_debug_enabled())
}

/// Format from `DOCMODEL_LOG_FORMAT`, "json" by default.
pub fn get_log_format() -> &'static str {
    parse_format(env::var(FORMAT_VAR).ok().as_deref())
}

/// Install the docmodel subscriber. Later calls are no-ops.
///
/// Nothing is installed unless `DOCMODEL_DEBUG` or `DOCMODEL_LOG_LEVEL` is
/// set, or when the `tracing-subscriber` feature is disabled.
pub fn init() {
    INIT.call_once(|| {
        if !is_debug_enabled() && env::var(LEVEL_VAR).is_err() {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let level = get_log_level();
            let filter = EnvFilter::try_new(format!(
                "docmodel={level},docmodel_core={level},docmodel_mongodb={level}"
            ))
            .unwrap_or_else(|_| EnvFilter::new("warn"));

            let installed = match get_log_format() {
                "json" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().json())
                    .try_init(),
                "compact" => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().compact())
                    .try_init(),
                _ => tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt::layer().pretty())
                    .try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = level,
                    format = get_log_format(),
                    "docmodel logging initialized"
                );
            }
        }
    });
}
