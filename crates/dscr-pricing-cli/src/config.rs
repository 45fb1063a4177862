use std::env;
use std::fmt;
use std::path::PathBuf;

pub const RATE_SHEET_VAR: &str = "DSCR_PRICING_RATE_SHEET";
pub const PROGRAM_VAR: &str = "DSCR_PRICING_PROGRAM";
pub const LOG_VAR: &str = "DSCR_PRICING_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Settings resolved from `.env`, the environment and command-line flags.
/// Flags take precedence over the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Alternate rate sheet file; the built-in standard book when `None`
    pub rate_sheet: Option<PathBuf>,
    /// Program priced when a request does not name one
    pub program: Option<String>,
    pub telemetry: TelemetryConfig,
}

/// Tracing controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Command-line values that override the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub rate_sheet: Option<String>,
    pub log_level: Option<String>,
}

impl CliConfig {
    pub fn load(overrides: Overrides) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(overrides, |name| env::var(name).ok())
    }

    fn from_lookup(
        overrides: Overrides,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |name: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(name) {
                Some(v) if v.trim().is_empty() => Err(ConfigError::Empty { name }),
                Some(v) => Ok(Some(v.trim().to_string())),
                None => Ok(None),
            }
        };

        let rate_sheet = match overrides.rate_sheet {
            Some(path) => Some(path),
            None => non_empty(RATE_SHEET_VAR)?,
        }
        .map(PathBuf::from);

        let program = non_empty(PROGRAM_VAR)?;

        let log_level = match overrides.log_level {
            Some(level) => level,
            None => non_empty(LOG_VAR)?.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        };

        Ok(Self {
            rate_sheet,
            program,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Empty { name: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Empty { name } => write!(f, "{name} is set but empty"),
        }
    }
}

impl std::error::Error for ConfigError {}
