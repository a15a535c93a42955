use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Observation at {new} is earlier than the latest stored observation at {last}")]
    OutOfOrder { last: String, new: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Parse,
    Storage,
    Configuration,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScrapeError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::Parse { .. } => ErrorCategory::Parse,
            Self::Io(_) | Self::Csv(_) => ErrorCategory::Storage,
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => {
                ErrorCategory::Configuration
            }
            Self::Serialization(_) | Self::OutOfOrder { .. } => ErrorCategory::Data,
        }
    }

    /// 嚴重程度決定 CLI 的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 下一次排程會自動重試
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Parse | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::Http(_) => "Check network connectivity; the next scheduled run will retry",
            Self::HttpStatus { status, .. } if *status >= 500 => {
                "The ticketing site is having trouble; the next scheduled run will retry"
            }
            Self::HttpStatus { .. } => "Verify source.url still points at the availability page",
            Self::Parse { .. } => {
                "The page layout may have changed; update the [selectors] section and run `passwatch check`"
            }
            Self::Io(_) => "Check that the output directory exists and is writable",
            Self::Serialization(_) => {
                "The snapshot file is not valid JSON; restore it from version control"
            }
            Self::Csv(_) => "Check the export destination",
            Self::Config { .. } | Self::InvalidConfigValue { .. } | Self::MissingConfig { .. } => {
                "Fix the configuration file or command line flags"
            }
            Self::OutOfOrder { .. } => "Check the system clock and the configured timezone",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch the availability page: {}", self),
            ErrorCategory::Parse => format!("Could not read pass availability from the page: {}", self),
            ErrorCategory::Storage => format!("Could not access the snapshot file: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Snapshot data problem: {}", self),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
