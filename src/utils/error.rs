use thiserror::Error;

#[derive(Error, Debug)]
pub enum HsnError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Reference file not found: {path}")]
    SourceNotFound { path: String },

    #[error("Reference file is missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl HsnError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HsnError::IoError(_) | HsnError::SourceNotFound { .. } => ErrorCategory::Io,
            HsnError::CsvError(_)
            | HsnError::SerializationError(_)
            | HsnError::MissingColumn { .. } => ErrorCategory::Data,
            HsnError::TomlError(_)
            | HsnError::ConfigError { .. }
            | HsnError::ConfigValidationError { .. }
            | HsnError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // The service still starts with an empty table.
            HsnError::SourceNotFound { .. } | HsnError::MissingColumn { .. } => {
                ErrorSeverity::Medium
            }
            HsnError::CsvError(_) | HsnError::SerializationError(_) => ErrorSeverity::High,
            HsnError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HsnError::SourceNotFound { path } => {
                format!("The HSN master data file '{}' could not be found.", path)
            }
            HsnError::MissingColumn { column } => format!(
                "The HSN master data file does not have a '{}' column.",
                column
            ),
            HsnError::CsvError(e) => format!("The HSN master data file could not be parsed: {}", e),
            HsnError::TomlError(e) => format!("The configuration file is not valid TOML: {}", e),
            HsnError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            HsnError::ConfigValidationError { field, message } => {
                format!("Invalid setting '{}': {}", field, message)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the data file path is correct and readable.",
            ErrorCategory::Data => {
                "Export the master sheet as CSV with 'HSNCode' and 'Description' columns, or set the column names in the config."
            }
            ErrorCategory::Configuration => {
                "Review the configuration file and command-line flags."
            }
        }
    }

    /// Process exit code for a failure of this severity.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, HsnError>;
