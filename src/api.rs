//! Payloads of the currency converter REST API.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RequestError;

/// Currencies the backend supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Self::Usd, Self::Eur, Self::Gbp, Self::Jpy];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Jpy => "JPY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = RequestError;

    /// Parses a currency code case-insensitively, as the backend does.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let code = value.trim();
        Self::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| RequestError::InvalidRequest(format!("unsupported currency: {code}")))
    }
}

/// `GET /health` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub supported_currencies: Vec<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `GET /api/info` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    #[serde(default)]
    pub supported_currencies: Vec<String>,
}

/// `GET /api/rates` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    pub base_currency: Currency,
    pub rates: BTreeMap<Currency, f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// `POST /api/convert` request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub amount: f64,
    pub from: Currency,
    pub to: Currency,
}

impl ConversionRequest {
    /// Rejects amounts the backend would answer with 400.
    pub fn validate(&self) -> Result<(), RequestError> {
        if !self.amount.is_finite() {
            return Err(RequestError::InvalidRequest(
                "Amount must be a valid number".to_owned(),
            ));
        }
        if self.amount < 0.0 {
            return Err(RequestError::InvalidRequest(
                "Amount must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// `POST /api/convert` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    #[serde(default)]
    pub success: bool,
    pub original_amount: f64,
    pub from_currency: Currency,
    pub to_currency: Currency,
    pub converted_amount: f64,
    pub exchange_rate: f64,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Error body returned by the backend for non-success statuses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub supported_currencies: Option<Vec<String>>,
}

/// Human-readable message for an error body; falls back to the raw text.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_owned(),
    }
}
