/// Error type returned by this crate.
///
/// Variants are chosen where the failure originates, so retryability is a
/// property of the variant and never of the message text.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The attempt did not complete before its deadline.
    #[error("request timed out")]
    Timeout,
    /// Connection-level failure: refused, reset, DNS, or an interrupted body.
    #[error("connection error: {0}")]
    Connection(String),
    /// Server-side failure (status 500-599) with raw response body.
    #[error("server error {status}: {body}")]
    Server { status: u16, body: String },
    /// Any other non-success status, in practice 4xx.
    #[error("client error {status}: {message}")]
    Client { status: u16, message: String },
    /// The caller cancelled the operation.
    #[error("request cancelled")]
    Cancelled,
    /// The request could not be built or failed local validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Response decoding or shape validation error.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RequestError {
    /// Returns true when the error is worth another attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Connection(_) | Self::Server { .. }
        )
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } | Self::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classifies a non-success HTTP status with its response body.
    pub(crate) fn from_status(status: u16, body: String) -> Self {
        if (500..=599).contains(&status) {
            Self::Server { status, body }
        } else {
            Self::Client {
                status,
                message: crate::api::error_message(&body),
            }
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            // connect, request and body failures are all connection-level
            Self::Connection(err.to_string())
        }
    }
}

/// Configuration error raised while reading client settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is absent.
    #[error("missing {0} environment variable")]
    Missing(&'static str),
    /// A variable is present but blank.
    #[error("{0} is set but empty")]
    Empty(&'static str),
    /// A variable could not be parsed.
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
    /// Options violate an invariant.
    #[error("invalid client options: {0}")]
    Options(String),
}
