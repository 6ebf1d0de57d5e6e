//! CLI-specific error types and exit code mapping

use logmap_core::error::LogmapError;
use logmap_logsource::LogsourceError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Mapping documents could not be loaded or are inconsistent.
    #[error("mapping error: {0}")]
    Mapping(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Converted rule could not be serialised.
    #[error("yaml output error: {0}")]
    YamlSerialize(#[from] serde_yaml::Error),

    /// IO error (file write, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logmap-core.
    #[error("{0}")]
    Core(#[from] LogmapError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | General / command error          |
    /// | 2    | Configuration error              |
    /// | 3    | Mapping configuration error      |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Mapping(_) => 3,
            Self::Io(_) => 10,
            Self::Core(LogmapError::Config(_)) => 2,
            Self::Core(LogmapError::Mapping(_)) => 3,
            Self::Core(LogmapError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::YamlSerialize(_) | Self::Command(_) => 1,
        }
    }
}

impl From<LogsourceError> for CliError {
    fn from(e: LogsourceError) -> Self {
        match e {
            LogsourceError::Io(io) => Self::Io(io),
            e if e.is_rule_level() => Self::Command(e.to_string()),
            e => Self::Mapping(e.to_string()),
        }
    }
}
