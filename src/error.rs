use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolsError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Download of {url} failed with HTTP status {status}")]
    Http { url: String, status: u16 },

    #[error("Archive could not be read: {message}")]
    Archive {
        message: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("Source path not found: {path}")]
    MissingSource { path: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid pattern {pattern}: {message}")]
    Pattern { pattern: String, message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ToolsError {
    fn user_message(&self) -> String {
        match self {
            ToolsError::Io(e) => format!("File operation failed: {}", e),
            ToolsError::Network { message, .. } => format!("Network error: {}", message),
            ToolsError::Http { url, status } => {
                format!("Server answered {} for {}", status, url)
            }
            ToolsError::Archive { message, .. } => format!("Invalid archive: {}", message),
            ToolsError::MissingSource { path } => format!("Path does not exist: {}", path),
            ToolsError::InvalidPath { path } => format!("Invalid path: {}", path),
            ToolsError::Config { message } => format!("Configuration error: {}", message),
            ToolsError::Pattern { pattern, message } => {
                format!("Pattern '{}' is not a valid regular expression: {}", pattern, message)
            }
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ToolsError::Network { .. } => Some(
                "Check your internet connection, or pass a local archive path instead of a URL.".to_string()
            ),
            ToolsError::Http { status: 404, .. } => Some(
                "The requested version may not be published. Try a different --version-tag.".to_string()
            ),
            ToolsError::Archive { .. } => Some(
                "Make sure the file is a complete zip archive. Partial downloads are a common cause.".to_string()
            ),
            ToolsError::MissingSource { .. } => Some(
                "Run the command from the directory it expects, or set the paths in rampl-tools.toml.".to_string()
            ),
            ToolsError::Config { .. } | ToolsError::Pattern { .. } => Some(
                "Check your configuration file syntax. Use --generate-config to write a fresh sample.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ToolsError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_connect() {
            "connection failed".to_string()
        } else if error.is_timeout() {
            "request timed out".to_string()
        } else {
            error.to_string()
        };

        ToolsError::Network {
            message,
            source: error,
        }
    }
}

impl From<zip::result::ZipError> for ToolsError {
    fn from(error: zip::result::ZipError) -> Self {
        ToolsError::Archive {
            message: error.to_string(),
            source: error,
        }
    }
}

impl From<regex::Error> for ToolsError {
    fn from(error: regex::Error) -> Self {
        ToolsError::Pattern {
            pattern: String::new(),
            message: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for ToolsError {
    fn from(error: toml::de::Error) -> Self {
        ToolsError::Config {
            message: error.to_string(),
        }
    }
}

impl ToolsError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ToolsError::MissingSource { .. } => 3,
            ToolsError::Network { .. } | ToolsError::Http { .. } => 4,
            ToolsError::Archive { .. } => 5,
            ToolsError::Config { .. } | ToolsError::Pattern { .. } => 6,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolsError>;
