//! `fxconvert-http` is an async HTTP client for the currency converter API.
//!
//! Every call goes through a bounded retry loop with exponential backoff,
//! a per-attempt timeout and optional caller cancellation, and returns an
//! [`Outcome`] instead of panicking or throwing:
//! - [`ConverterClient::execute`] for arbitrary [`OperationRequest`]s
//! - [`ConverterClient::convert`], [`ConverterClient::rates`],
//!   [`ConverterClient::health`], [`ConverterClient::info`] for the API
//!
//! ```no_run
//! use fxconvert_http::{ConverterClient, Currency, Outcome};
//!
//! # async fn demo() {
//! let client = ConverterClient::new("http://localhost:8080");
//! match client.convert(100.0, Currency::Usd, Currency::Eur).await {
//!     Outcome::Success(conversion) => println!("{}", conversion.converted_amount),
//!     Outcome::Failure { reason, last_error } => eprintln!("{reason}: {last_error}"),
//! }
//! # }
//! ```

pub mod api;
mod cancel;
mod client;
mod error;
mod options;
mod outcome;
mod request;
mod response;
pub mod retry;
pub mod timeout;

pub use api::{ApiInfo, Conversion, ConversionRequest, Currency, ExchangeRates, HealthStatus};
pub use cancel::CancelToken;
pub use client::ConverterClient;
pub use error::{ConfigError, RequestError};
pub use options::ClientOptions;
pub use outcome::{Attempt, AttemptOutcome, Execution, FailureReason, Outcome};
pub use request::OperationRequest;
pub use response::Response;
pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, RequestError>;
