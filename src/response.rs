use serde::de::DeserializeOwned;

use crate::RequestError;

/// Successful response payload. The body is kept as opaque text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        serde_json::from_str(&self.body).map_err(|err| {
            RequestError::Decode(format!("invalid response JSON: {err}; body: {}", self.body))
        })
    }
}
