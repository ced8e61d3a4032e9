use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapeError {
    #[error("No time column selected or resolvable")]
    NoTimeColumn,

    #[error("Upstream query failed: {message}")]
    UpstreamError { message: String },

    #[error("Variable key '{key}' is not part of data schema")]
    VariableKeyError { key: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, ShapeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Upstream,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ShapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ShapeError::NoTimeColumn
            | ShapeError::VariableKeyError { .. }
            | ShapeError::ConfigError { .. }
            | ShapeError::ConfigValidationError { .. }
            | ShapeError::InvalidConfigValueError { .. }
            | ShapeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ShapeError::UpstreamError { .. } => ErrorCategory::Upstream,
            ShapeError::CsvError(_) | ShapeError::SerializationError(_) => ErrorCategory::Data,
            ShapeError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單一查詢目標的問題，不影響其他目標
            ErrorCategory::Upstream => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ShapeError::NoTimeColumn => {
                "Set time_key, or return a Date/DateTime column from the query".to_string()
            }
            ShapeError::UpstreamError { .. } => {
                "Check the query that produced this result set".to_string()
            }
            ShapeError::VariableKeyError { key } => {
                format!("Select one of the result columns instead of '{}'", key)
            }
            ShapeError::ConfigError { .. }
            | ShapeError::ConfigValidationError { .. }
            | ShapeError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            ShapeError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            ShapeError::CsvError(_) | ShapeError::SerializationError(_) => {
                "Make sure the input is a JSON object with 'meta' and 'data'".to_string()
            }
            ShapeError::IoError(_) => "Check file paths and permissions".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("設定錯誤: {}", self),
            ErrorCategory::Data => format!("資料格式錯誤: {}", self),
            ErrorCategory::Upstream => format!("上游查詢錯誤: {}", self),
            ErrorCategory::System => format!("系統錯誤: {}", self),
        }
    }
}
