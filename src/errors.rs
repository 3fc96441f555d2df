use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("No element matches selector \"{selector}\"")]
    NotFound { selector: String },

    #[error("Waiting for \"{what}\" failed: timeout {timeout_ms}ms exceeded")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid usage: {0}")]
    Usage(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Gave up after {attempts} attempts without an observed failure")]
    RetryExhausted { attempts: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

// headless_chrome reports everything as anyhow::Error
impl From<anyhow::Error> for HarnessError {
    fn from(err: anyhow::Error) -> Self {
        HarnessError::AnyhowError(err.to_string())
    }
}

impl HarnessError {
    pub fn timeout(what: impl Into<String>, timeout: Duration) -> Self {
        HarnessError::Timeout {
            what: what.into(),
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn not_found(selector: impl Into<String>) -> Self {
        HarnessError::NotFound {
            selector: selector.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HarnessError::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, HarnessError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_selector_and_bound() {
        let err = HarnessError::timeout("[data-hook=\"row\"]", Duration::from_millis(5000));
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Waiting for \"[data-hook=\"row\"]\" failed: timeout 5000ms exceeded"
        );
    }

    #[test]
    fn anyhow_errors_convert() {
        let err: HarnessError = anyhow::anyhow!("socket closed").into();
        assert!(matches!(err, HarnessError::AnyhowError(ref m) if m == "socket closed"));
    }
}
