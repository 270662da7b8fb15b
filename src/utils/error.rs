use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

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

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("File '{filename}' is {size_mb} MB, limit is {limit_mb} MB")]
    FileTooLarge {
        filename: String,
        size_mb: u64,
        limit_mb: u64,
    },

    #[error("Comparison worker failed: {message}")]
    WorkerFailed { message: String },

    #[error("Comparison timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Comparison was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Input,
    Configuration,
    Worker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiffError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            DiffError::ZipError(_) | DiffError::IoError(_) => ErrorCategory::Io,
            DiffError::CsvError(_)
            | DiffError::SerializationError(_)
            | DiffError::UnsupportedFormat { .. }
            | DiffError::FileTooLarge { .. } => ErrorCategory::Input,
            DiffError::ConfigError { .. }
            | DiffError::ConfigValidationError { .. }
            | DiffError::InvalidConfigValueError { .. }
            | DiffError::MissingConfigError { .. } => ErrorCategory::Configuration,
            DiffError::WorkerFailed { .. } | DiffError::Timeout { .. } | DiffError::Cancelled => {
                ErrorCategory::Worker
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DiffError::Cancelled => ErrorSeverity::Low,
            // 逾時可以放寬限制後重試
            DiffError::Timeout { .. } => ErrorSeverity::Medium,
            DiffError::WorkerFailed { .. } | DiffError::ZipError(_) | DiffError::IoError(_) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Io => "Check that the paths exist and the output directory is writable",
            ErrorCategory::Input => {
                "Make sure both files are UTF-8 CSV (or table JSON) files under 50 MB"
            }
            ErrorCategory::Configuration => {
                "Review the command line flags or the TOML configuration file"
            }
            ErrorCategory::Worker => match self {
                DiffError::Timeout { .. } => "Increase --timeout-seconds or compare smaller files",
                DiffError::Cancelled => "Run the comparison again",
                _ => "Re-run with --verbose and report the logged error",
            },
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DiffError::UnsupportedFormat { extension } => {
                format!("不支援的檔案格式: {}", extension)
            }
            DiffError::FileTooLarge { filename, limit_mb, .. } => {
                format!("檔案 {} 大小超過限制 ({}MB)", filename, limit_mb)
            }
            DiffError::CsvError(e) => format!("CSV 解析錯誤: {}", e),
            DiffError::Timeout { .. } => "比對超時".to_string(),
            DiffError::Cancelled => "比對已取消".to_string(),
            // 原始訊息直接呈現給使用者
            DiffError::WorkerFailed { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DiffError>;
