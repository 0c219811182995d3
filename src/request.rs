use reqwest::Method;
use serde::Serialize;

use crate::RequestError;

/// Description of a single outbound call.
///
/// Built once and never mutated by the client; every attempt replays it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRequest {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl OperationRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Adds a header; later values for the same name are sent as well.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets an opaque text body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `payload` as the JSON body and sets `Content-Type`.
    pub fn with_json<T: Serialize + ?Sized>(self, payload: &T) -> Result<Self, RequestError> {
        let body = serde_json::to_string(payload)
            .map_err(|err| RequestError::InvalidRequest(format!("body is not serializable: {err}")))?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_body(body))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::OperationRequest;

    #[test]
    fn json_body_sets_content_type() {
        let request = OperationRequest::post("http://localhost/api/convert")
            .with_json(&json!({"amount": 100, "from": "USD", "to": "EUR"}))
            .expect("json body must serialize");

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(
            request.headers(),
            &[("content-type".to_owned(), "application/json".to_owned())]
        );
        let body: serde_json::Value =
            serde_json::from_str(request.body().expect("body must be set")).expect("valid json");
        assert_eq!(body["from"], "USD");
    }

    #[test]
    fn get_has_no_body() {
        let request = OperationRequest::get("http://localhost/health").with_header("x-trace", "1");
        assert_eq!(request.body(), None);
        assert_eq!(request.url(), "http://localhost/health");
        assert_eq!(request.headers().len(), 1);
    }
}
