use shared::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed with status {status}{}", detail_suffix(.detail))]
    Request { status: u16, detail: Option<String> },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid API base url '{0}'")]
    InvalidBaseUrl(String),
    #[error("not signed in")]
    NotAuthenticated,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl ClientError {
    pub fn status(status: u16) -> Self {
        ClientError::Request {
            status,
            detail: None,
        }
    }

    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Error class of an HTTP failure; `None` for failures that never got a response.
    pub fn code(&self) -> Option<ErrorCode> {
        self.http_status().map(ErrorCode::from_status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == Some(ErrorCode::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(ErrorCode::NotFound)
    }
}
