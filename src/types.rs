use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification used by views to pick how a failure is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Api,
    Decode,
    Validation,
    InvalidState,
    Config,
}

impl ConsoleError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ConsoleError::Transport(_) => FailureKind::Transport,
            ConsoleError::Api { .. } => FailureKind::Api,
            ConsoleError::Decode(_) => FailureKind::Decode,
            ConsoleError::Validation(_) => FailureKind::Validation,
            ConsoleError::InvalidState(_) => FailureKind::InvalidState,
            ConsoleError::Config(_) | ConsoleError::Io(_) => FailureKind::Config,
        }
    }

    pub(crate) fn api(status: u16, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("API Error: {status}"));
        ConsoleError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_falls_back_to_status_message() {
        let err = ConsoleError::api(502, None);
        assert_eq!(err.to_string(), "API Error: 502");
        assert_eq!(err.kind(), FailureKind::Api);

        let err = ConsoleError::api(409, Some("Client name already exists".into()));
        assert_eq!(err.to_string(), "Client name already exists");

        let err = ConsoleError::api(500, Some("   ".into()));
        assert_eq!(err.to_string(), "API Error: 500");
    }
}
