use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

use crate::RequestError;

/// Why a logical request ended without a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// Every allowed attempt failed with a transient error.
    ExhaustedRetries,
    /// The server rejected the request (4xx).
    ClientError,
    /// The caller cancelled the request.
    Cancelled,
    /// The request could not be built or failed local validation.
    InvalidRequest,
    /// The server answered successfully but the payload was unusable.
    InvalidResponse,
}

impl FailureReason {
    /// Picks the reason for the error that ended the retry loop.
    pub(crate) fn for_error(error: &RequestError) -> Self {
        match error {
            RequestError::Timeout | RequestError::Connection(_) | RequestError::Server { .. } => {
                Self::ExhaustedRetries
            }
            RequestError::Client { .. } => Self::ClientError,
            RequestError::Cancelled => Self::Cancelled,
            RequestError::InvalidRequest(_) => Self::InvalidRequest,
            RequestError::Decode(_) => Self::InvalidResponse,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExhaustedRetries => "exhausted retries",
            Self::ClientError => "client error",
            Self::Cancelled => "cancelled",
            Self::InvalidRequest => "invalid request",
            Self::InvalidResponse => "invalid response",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one logical request.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure {
        reason: FailureReason,
        /// Last error observed; earlier transient errors are not aggregated.
        last_error: RequestError,
    },
}

impl<T> Outcome<T> {
    pub(crate) fn failure(last_error: RequestError) -> Self {
        Self::Failure {
            reason: FailureReason::for_error(&last_error),
            last_error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the failure reason, if any.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }

    /// Maps the success payload, leaving failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success(payload) => Outcome::Success(f(payload)),
            Self::Failure { reason, last_error } => Outcome::Failure { reason, last_error },
        }
    }

    /// Chains a fallible step on the success payload.
    ///
    /// An error from `f` becomes a failure classified like any other error.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Result<U, RequestError>) -> Outcome<U> {
        match self {
            Self::Success(payload) => match f(payload) {
                Ok(value) => Outcome::Success(value),
                Err(err) => Outcome::failure(err),
            },
            Self::Failure { reason, last_error } => Outcome::Failure { reason, last_error },
        }
    }

    /// Converts into a plain `Result`, dropping the reason.
    pub fn into_result(self) -> Result<T, RequestError> {
        match self {
            Self::Success(payload) => Ok(payload),
            Self::Failure { last_error, .. } => Err(last_error),
        }
    }
}

/// Classification of a single attempt's result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Transient,
    Fatal,
}

/// One execution try of a request.
#[derive(Clone, Debug, PartialEq)]
pub struct Attempt {
    /// 1-based ordinal.
    pub index: u32,
    pub started_at: Instant,
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

/// An outcome together with the attempts that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct Execution<T> {
    pub outcome: Outcome<T>,
    pub attempts: Vec<Attempt>,
}

impl<T> Execution<T> {
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureReason, Outcome};
    use crate::RequestError;

    #[test]
    fn reasons_follow_error_kind() {
        let exhausted: Outcome<()> = Outcome::failure(RequestError::Server {
            status: 503,
            body: String::new(),
        });
        assert_eq!(exhausted.reason(), Some(FailureReason::ExhaustedRetries));
        assert_eq!(exhausted.reason().map(|r| r.to_string()).as_deref(), Some("exhausted retries"));

        let rejected: Outcome<()> = Outcome::failure(RequestError::Client {
            status: 400,
            message: "bad".into(),
        });
        assert_eq!(rejected.reason().map(|r| r.to_string()).as_deref(), Some("client error"));

        let cancelled: Outcome<()> = Outcome::failure(RequestError::Cancelled);
        assert_eq!(cancelled.reason(), Some(FailureReason::Cancelled));
    }

    #[test]
    fn and_then_turns_decode_error_into_invalid_response() {
        let outcome = Outcome::Success("not json".to_owned())
            .and_then(|body| {
                serde_json::from_str::<u32>(&body)
                    .map_err(|err| RequestError::Decode(err.to_string()))
            });
        assert_eq!(outcome.reason(), Some(FailureReason::InvalidResponse));
    }

    #[test]
    fn into_result_keeps_last_error() {
        let outcome: Outcome<u8> = Outcome::failure(RequestError::Timeout);
        assert_eq!(outcome.into_result(), Err(RequestError::Timeout));
        assert_eq!(Outcome::Success(3u8).map(|v| v * 2).into_result(), Ok(6));
    }
}
