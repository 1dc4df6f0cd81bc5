use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Failed to render PDF pages: {message}")]
    RenderError { message: String },

    #[error("Recognition failed: {message}")]
    RecognitionError { message: String },

    #[error("Export failed: {message}")]
    ExportError { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Render,
    Recognition,
    Export,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl StatementError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::InputError {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::RenderError {
            message: message.into(),
        }
    }

    pub fn recognition(message: impl Into<String>) -> Self {
        Self::RecognitionError {
            message: message.into(),
        }
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::ExportError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InputError { .. } => ErrorCategory::Input,
            Self::RenderError { .. } => ErrorCategory::Render,
            Self::RecognitionError { .. } | Self::SerializationError(_) => {
                ErrorCategory::Recognition
            }
            Self::ExportError { .. } | Self::CsvError(_) => ErrorCategory::Export,
            Self::NotFound { .. } | Self::IoError(_) => ErrorCategory::Storage,
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // The caller can re-prompt for another upload.
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Render | ErrorCategory::Recognition | ErrorCategory::Export => {
                ErrorSeverity::High
            }
            ErrorCategory::Storage | ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity() <= ErrorSeverity::Medium
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::InputError { .. } => "Select a non-empty PDF statement and submit it again",
            Self::RenderError { .. } => {
                "Check that the file is a readable PDF and that pdftoppm (poppler-utils) is installed"
            }
            Self::RecognitionError { .. } | Self::SerializationError(_) => {
                "Check that tesseract and the configured language data are installed, or the entity command works"
            }
            Self::ExportError { .. } | Self::CsvError(_) => {
                "Check that the output directory is writable and has free space"
            }
            Self::NotFound { .. } => "Submit a statement first to generate an export",
            Self::IoError(_) => "Check file permissions for the upload and output directories",
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration file or command line flags and retry"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InputError { message } => format!("The uploaded file was rejected: {}", message),
            Self::RenderError { .. } => "The PDF could not be converted into page images".to_string(),
            Self::RecognitionError { .. } | Self::SerializationError(_) => {
                "Text or entity recognition failed for this document".to_string()
            }
            Self::ExportError { .. } | Self::CsvError(_) => {
                "The spreadsheet export could not be written".to_string()
            }
            Self::NotFound { what } => format!("Nothing to download yet: {}", what),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StatementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_errors_are_recoverable() {
        let err = StatementError::input("no file selected");
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(err.is_recoverable());
        assert!(err.user_friendly_message().contains("no file selected"));
    }

    #[test]
    fn test_pipeline_errors_are_distinct_categories() {
        assert_eq!(
            StatementError::render("bad pdf").category(),
            ErrorCategory::Render
        );
        assert_eq!(
            StatementError::recognition("tesseract died").category(),
            ErrorCategory::Recognition
        );
        assert_eq!(
            StatementError::export("disk full").category(),
            ErrorCategory::Export
        );
        assert_eq!(
            StatementError::export("disk full").severity(),
            ErrorSeverity::High
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StatementError = io.into();
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
