use crate::providers::MergePolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_INPUT: &str = "data/Public_Utility_Map_with_City.csv";
pub const DEFAULT_OUTPUT: &str = "energyproviders.json";
pub const DEFAULT_APIS_FILE: &str = "apis.json";

/// Distinguishes runtime behavior for different stages of the updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Everything a run needs; there are no process-wide path constants beyond
/// the defaults above.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub environment: AppEnvironment,
    pub paths: PathConfig,
    pub merge_policy: MergePolicy,
    pub telemetry: TelemetryConfig,
}

impl PipelineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("PROVIDERS_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let paths = PathConfig {
            input: path_var("PROVIDERS_INPUT", DEFAULT_INPUT),
            output: path_var("PROVIDERS_OUTPUT", DEFAULT_OUTPUT),
            apis: path_var("PROVIDERS_APIS_FILE", DEFAULT_APIS_FILE),
            zip_reference: env::var("PROVIDERS_ZIP_REFERENCE")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        let merge_policy = match env::var("PROVIDERS_MERGE_POLICY") {
            Ok(raw) => MergePolicy::parse(&raw).ok_or(ConfigError::InvalidMergePolicy(raw))?,
            Err(_) => MergePolicy::default(),
        };

        let log_level = env::var("PROVIDERS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let format = match env::var("PROVIDERS_LOG_FORMAT") {
            Ok(raw) => LogFormat::parse(&raw).ok_or(ConfigError::InvalidLogFormat(raw))?,
            Err(_) => LogFormat::for_environment(environment),
        };

        Ok(Self {
            environment,
            paths,
            merge_policy,
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
                format,
            },
        })
    }
}

fn path_var(name: &str, default: &str) -> PathBuf {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Input, output and reference-data locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    /// Spreadsheet export read by `import`.
    pub input: PathBuf,
    /// Persisted provider collection.
    pub output: PathBuf,
    /// API list read by `fetch`.
    pub apis: PathBuf,
    /// Optional ZIP to city reference CSV.
    pub zip_reference: Option<PathBuf>,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
    pub format: LogFormat,
}

/// Shape of log lines on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human output.
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// JSON in production, compact everywhere else.
    fn for_environment(environment: AppEnvironment) -> Self {
        match environment {
            AppEnvironment::Production => Self::Json,
            AppEnvironment::Development | AppEnvironment::Test => Self::Compact,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMergePolicy(String),
    InvalidLogFormat(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMergePolicy(value) => write!(
                f,
                "PROVIDERS_MERGE_POLICY must be 'exact' or 'union' (got '{}')",
                value
            ),
            ConfigError::InvalidLogFormat(value) => write!(
                f,
                "PROVIDERS_LOG_FORMAT must be 'compact' or 'json' (got '{}')",
                value
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
