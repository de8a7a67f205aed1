use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscountError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Missing credential: {name}")]
    MissingCredentialError { name: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("API returned status {status}: {body}")]
    ApiStatusError { status: u16, body: String },

    #[error("API reported errors: {}", .messages.join("; "))]
    ApiErrors { messages: Vec<String> },

    #[error("{operation} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("Publish to {target} failed: {message}")]
    PublishError { target: String, message: String },

    #[error("Message of {len} chars cannot fit limit {limit}")]
    MessageTooLong { limit: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiscountError {
    /// 錯誤嚴重程度，決定 CLI 的退出碼
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DiscountError::MissingCredentialError { .. } => ErrorSeverity::Critical,
            DiscountError::IoError(_) | DiscountError::SerializationError(_) => {
                ErrorSeverity::High
            }
            DiscountError::ConfigParseError(_)
            | DiscountError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            DiscountError::HttpError(_)
            | DiscountError::ApiStatusError { .. }
            | DiscountError::ApiErrors { .. }
            | DiscountError::RetriesExhausted { .. } => ErrorSeverity::Medium,
            DiscountError::MalformedResponse { .. }
            | DiscountError::PublishError { .. }
            | DiscountError::MessageTooLong { .. } => ErrorSeverity::Low,
        }
    }

    /// 是否值得重試（暫時性錯誤）
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DiscountError::HttpError(_)
                | DiscountError::ApiStatusError { .. }
                | DiscountError::ApiErrors { .. }
                | DiscountError::MalformedResponse { .. }
        )
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DiscountError::MissingCredentialError { .. } => {
                "Set PA_API_KEY, PA_API_SECRET and PARTNER_TAG (or use --relaxed for local testing)"
            }
            DiscountError::ConfigParseError(_) | DiscountError::InvalidConfigValueError { .. } => {
                "Check search_config.toml; delete it to regenerate the default"
            }
            DiscountError::ApiStatusError { status: 429, .. } => {
                "Rate limited by the marketplace API; run less often"
            }
            DiscountError::HttpError(_)
            | DiscountError::ApiStatusError { .. }
            | DiscountError::RetriesExhausted { .. } => "Check network access and API credentials",
            DiscountError::ApiErrors { .. } => "Inspect the API error codes in the log",
            DiscountError::IoError(_) | DiscountError::SerializationError(_) => {
                "Check write permissions for the result store"
            }
            DiscountError::MalformedResponse { .. } => "The API response shape changed; check the logs",
            DiscountError::PublishError { .. } | DiscountError::MessageTooLong { .. } => {
                "Check the platform access tokens"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DiscountError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_critical() {
        let err = DiscountError::MissingCredentialError {
            name: "PA_API_KEY".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_transient());
        assert_eq!(err.to_string(), "Missing credential: PA_API_KEY");
    }

    #[test]
    fn test_api_errors_display_joins_messages() {
        let err = DiscountError::ApiErrors {
            messages: vec!["TooManyRequests: slow down".to_string(), "X: y".to_string()],
        };
        assert!(err.is_transient());
        assert_eq!(
            err.to_string(),
            "API reported errors: TooManyRequests: slow down; X: y"
        );
    }

    #[test]
    fn test_rate_limit_suggestion() {
        let err = DiscountError::ApiStatusError {
            status: 429,
            body: String::new(),
        };
        assert!(err.recovery_suggestion().contains("Rate limited"));
    }
}
