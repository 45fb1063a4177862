use crate::config::{TelemetryConfig, LOG_VAR};
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Logging could not be set up before the command ran.
#[derive(Debug)]
pub enum TelemetryError {
    /// `--log-level` or the log variable is not a tracing filter directive.
    BadFilter { directive: String, source: ParseError },
    /// Another global subscriber was already installed.
    AlreadyInstalled(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::BadFilter { directive, source } => write!(
                f,
                "cannot use '{directive}' as a log filter (from --log-level or {LOG_VAR}): {source}"
            ),
            TelemetryError::AlreadyInstalled(err) => {
                write!(f, "logging was already set up for this process: {err}")
            }
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::BadFilter { source, .. } => Some(source),
            TelemetryError::AlreadyInstalled(err) => Some(&**err),
        }
    }
}

fn filter_for(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::BadFilter {
            directive: config.log_level.clone(),
            source,
        }),
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins when set; otherwise the
/// configured level applies. Events go to stderr so stdout carries only
/// command output.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(filter_for(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_filter_names_its_sources() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "dscr_pricing_core=loud".into(),
        };
        let err = filter_for(&config).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("dscr_pricing_core=loud"));
        assert!(message.contains("--log-level"));
        assert!(message.contains(LOG_VAR));
    }
}
