use thiserror::Error;

/// Failures decoding the auth endpoint's answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("auth endpoint {url} answered with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed auth response from {url}: {reason}")]
    MalformedJson { url: String, reason: String },

    /// The endpoint explicitly refused; the message is the server's `error` field.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected status {status:?} from {url}")]
    UnexpectedStatus { url: String, status: Option<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Protocol,
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JwpError {
    /// Missing or null params given at socket/channel construction.
    #[error("{0}")]
    Configuration(String),

    /// Negotiated data lacks a required field.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Network failure reaching the auth endpoint, or a failure reported by
    /// the transport collaborator.
    #[error("{0}")]
    Transport(String),
}

impl JwpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JwpError::Configuration(_) => ErrorKind::Configuration,
            JwpError::Validation(_) => ErrorKind::Validation,
            JwpError::Protocol(_) => ErrorKind::Protocol,
            JwpError::Transport(_) => ErrorKind::Transport,
        }
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        JwpError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for JwpError {
    fn from(err: reqwest::Error) -> Self {
        JwpError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, JwpError>;

macro_rules! ensure_valid {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::errors::JwpError::Validation(format!($($arg)*)));
        }
    };
}

pub(crate) use ensure_valid;
