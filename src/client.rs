use std::fmt;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use tokio::time::sleep;

use crate::{
    api::{ApiInfo, Conversion, ConversionRequest, Currency, ExchangeRates, HealthStatus},
    retry, CancelToken, ClientOptions, ConfigError, Execution, OperationRequest, Outcome,
    RequestError, Response,
};

const API_URL_VAR: &str = "FXCONVERT_API_URL";

#[derive(Clone)]
/// HTTP client for the currency converter API.
///
/// Holds no per-request state; clones share the underlying connection pool.
pub struct ConverterClient {
    http: reqwest::Client,
    base_url: String,
    options: ClientOptions,
}

impl fmt::Debug for ConverterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterClient")
            .field("base_url", &self.base_url)
            .field("options", &self.options)
            .finish()
    }
}

impl ConverterClient {
    /// Creates a client for the API rooted at `base_url`, e.g.
    /// `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads `FXCONVERT_API_URL` (required) and the optional retry settings
    /// described on [`ClientOptions::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var(API_URL_VAR).map_err(|_| ConfigError::Missing(API_URL_VAR))?;
        if url.trim().is_empty() {
            return Err(ConfigError::Empty(API_URL_VAR));
        }
        Ok(Self::new(url.trim()).with_options(ClientOptions::from_env()?))
    }

    /// Applies timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Absolute URL for an API path such as `/api/convert`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Executes a request with bounded retries.
    pub async fn execute(&self, request: &OperationRequest) -> Outcome<Response> {
        self.execute_with_cancel(request, &CancelToken::new()).await
    }

    /// Executes a request that `cancel` can abort at any suspension point.
    pub async fn execute_with_cancel(
        &self,
        request: &OperationRequest,
        cancel: &CancelToken,
    ) -> Outcome<Response> {
        self.execute_traced(request, cancel).await.outcome
    }

    /// Executes a request and returns the attempt history with the outcome.
    pub async fn execute_traced(
        &self,
        request: &OperationRequest,
        cancel: &CancelToken,
    ) -> Execution<Response> {
        retry::run(&self.options, cancel, |_| self.send_once(request)).await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Outcome<HealthStatus> {
        self.health_with_cancel(&CancelToken::new()).await
    }

    pub async fn health_with_cancel(&self, cancel: &CancelToken) -> Outcome<HealthStatus> {
        let request = OperationRequest::get(self.endpoint("/health"));
        self.execute_with_cancel(&request, cancel)
            .await
            .and_then(|response| response.json())
    }

    /// `GET /api/info`.
    pub async fn info(&self) -> Outcome<ApiInfo> {
        self.info_with_cancel(&CancelToken::new()).await
    }

    pub async fn info_with_cancel(&self, cancel: &CancelToken) -> Outcome<ApiInfo> {
        let request = OperationRequest::get(self.endpoint("/api/info"));
        self.execute_with_cancel(&request, cancel)
            .await
            .and_then(|response| response.json())
    }

    /// `GET /api/rates?base=XXX`.
    pub async fn rates(&self, base: Currency) -> Outcome<ExchangeRates> {
        self.rates_with_cancel(base, &CancelToken::new()).await
    }

    pub async fn rates_with_cancel(
        &self,
        base: Currency,
        cancel: &CancelToken,
    ) -> Outcome<ExchangeRates> {
        let url = format!("{}?base={}", self.endpoint("/api/rates"), base.code());
        let request = OperationRequest::get(url);
        self.execute_with_cancel(&request, cancel)
            .await
            .and_then(|response| response.json())
    }

    /// `POST /api/convert`.
    ///
    /// Amounts the backend would reject are refused locally without any
    /// attempt.
    pub async fn convert(&self, amount: f64, from: Currency, to: Currency) -> Outcome<Conversion> {
        self.convert_with_cancel(amount, from, to, &CancelToken::new())
            .await
    }

    pub async fn convert_with_cancel(
        &self,
        amount: f64,
        from: Currency,
        to: Currency,
        cancel: &CancelToken,
    ) -> Outcome<Conversion> {
        let payload = ConversionRequest { amount, from, to };
        let request = match payload
            .validate()
            .and_then(|()| OperationRequest::post(self.endpoint("/api/convert")).with_json(&payload))
        {
            Ok(request) => request,
            Err(err) => return Outcome::failure(err),
        };

        self.execute_with_cancel(&request, cancel)
            .await
            .and_then(|response| response.json())
    }

    /// Polls `/health` until the backend reports healthy.
    ///
    /// Each poll is a full [`ConverterClient::health`] call with its own
    /// retries. The whole wait, including an in-flight poll, is bounded by
    /// `max_wait`; running out yields [`RequestError::Timeout`]. A fatal
    /// error ends polling immediately. `Duration::MAX` waits indefinitely.
    pub async fn wait_until_healthy(
        &self,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Outcome<HealthStatus> {
        self.wait_until_healthy_with_cancel(poll_interval, max_wait, &CancelToken::new())
            .await
    }

    pub async fn wait_until_healthy_with_cancel(
        &self,
        poll_interval: Duration,
        max_wait: Duration,
        cancel: &CancelToken,
    ) -> Outcome<HealthStatus> {
        let polling = async {
            loop {
                match self.health_with_cancel(cancel).await {
                    Outcome::Success(status) if status.is_healthy() => {
                        return Outcome::Success(status)
                    }
                    Outcome::Success(_status) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(status = %_status.status, "backend not healthy yet");
                    }
                    Outcome::Failure { last_error, .. } if !last_error.is_transient() => {
                        return Outcome::failure(last_error);
                    }
                    Outcome::Failure { .. } => {}
                }

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Outcome::failure(RequestError::Cancelled),
                    _ = sleep(poll_interval) => {}
                }
            }
        };

        // tokio clamps an overflowing deadline to the far future.
        match tokio::time::timeout(max_wait, polling).await {
            Ok(outcome) => outcome,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(max_wait_ms = max_wait.as_millis() as u64, "backend never became healthy");
                Outcome::failure(RequestError::Timeout)
            }
        }
    }

    async fn send_once(&self, request: &OperationRequest) -> Result<Response, RequestError> {
        let mut builder = self
            .http
            .request(request.method().clone(), request.url());

        for (name, value) in request.headers() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| RequestError::InvalidRequest(format!("header name '{name}': {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| RequestError::InvalidRequest(format!("header value for '{name}': {err}")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.to_owned());
        }

        let response = builder.send().await.map_err(RequestError::from_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(RequestError::from_transport)?;

        if !status.is_success() {
            return Err(RequestError::from_status(status.as_u16(), body));
        }

        Ok(Response {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::ConverterClient;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ConverterClient::new("http://localhost:8080/");
        assert_eq!(client.endpoint("/api/convert"), "http://localhost:8080/api/convert");
        assert_eq!(client.endpoint("health"), "http://localhost:8080/health");
    }

    #[test]
    fn debug_shows_base_url_and_options() {
        let client = ConverterClient::new("http://backend:8080");
        let debug = format!("{client:?}");
        assert!(debug.contains("http://backend:8080"));
        assert!(debug.contains("max_attempts"));
    }
}
