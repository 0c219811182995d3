//! Minimal currency converter backend for trying the client locally.
//!
//! ```bash
//! PORT=8080 cargo run --example backend
//! ```

use std::net::SocketAddr;

use axum::{
    extract::{Query, Request},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use fxconvert_http::Currency;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const API_VERSION: &str = "1.0.0";

fn rate(from: Currency, to: Currency) -> f64 {
    use Currency::*;
    match (from, to) {
        (Usd, Usd) | (Eur, Eur) | (Gbp, Gbp) | (Jpy, Jpy) => 1.0,
        (Usd, Eur) => 0.85,
        (Usd, Gbp) => 0.73,
        (Usd, Jpy) => 110.0,
        (Eur, Usd) => 1.18,
        (Eur, Gbp) => 0.86,
        (Eur, Jpy) => 129.5,
        (Gbp, Usd) => 1.37,
        (Gbp, Eur) => 1.16,
        (Gbp, Jpy) => 150.7,
        (Jpy, Usd) => 0.009,
        (Jpy, Eur) => 0.0077,
        (Jpy, Gbp) => 0.0066,
    }
}

fn supported() -> Vec<&'static str> {
    Currency::ALL.iter().map(Currency::code).collect()
}

/// Naive UTC ISO-8601 timestamp, e.g. `2024-05-01T12:00:00.123456`.
fn timestamp() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.f")
        .to_string()
}

fn bad_request(error: String, with_currencies: bool) -> Response {
    let body = if with_currencies {
        json!({"error": error, "supported_currencies": supported()})
    } else {
        json!({"error": error})
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

async fn health() -> Json<JsonValue> {
    tracing::info!("health check requested");
    Json(json!({
        "status": "healthy",
        "message": "Currency converter API is running",
        "version": API_VERSION,
        "timestamp": timestamp(),
        "supported_currencies": supported(),
    }))
}

async fn info() -> Json<JsonValue> {
    Json(json!({
        "name": "Currency Converter API",
        "version": API_VERSION,
        "endpoints": {
            "health": "GET /health",
            "convert": "POST /api/convert",
            "rates": "GET /api/rates",
        },
        "supported_currencies": supported(),
    }))
}

#[derive(Deserialize)]
struct RatesQuery {
    base: Option<String>,
}

async fn rates(Query(query): Query<RatesQuery>) -> Response {
    let requested = query.base.unwrap_or_else(|| "USD".to_owned()).to_uppercase();
    let Ok(base) = requested.parse::<Currency>() else {
        return bad_request(format!("Unsupported base currency: {requested}"), true);
    };

    let rates: serde_json::Map<String, JsonValue> = Currency::ALL
        .iter()
        .map(|to| (to.code().to_owned(), json!(rate(base, *to))))
        .collect();

    Json(json!({
        "base_currency": base.code(),
        "rates": rates,
        "timestamp": timestamp(),
    }))
    .into_response()
}

async fn convert(body: Option<Json<JsonValue>>) -> Response {
    let Some(Json(data)) = body else {
        return bad_request("No JSON data provided".to_owned(), false);
    };
    tracing::info!(request = %data, "conversion request");

    let amount = match data.get("amount") {
        None | Some(JsonValue::Null) => return bad_request("Amount is required".to_owned(), false),
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    let Some(amount) = amount.filter(|value| value.is_finite()) else {
        return bad_request("Amount must be a valid number".to_owned(), false);
    };
    if amount < 0.0 {
        return bad_request("Amount must be positive".to_owned(), false);
    }

    let field = |name: &str| {
        data.get(name)
            .and_then(JsonValue::as_str)
            .unwrap_or_default()
            .to_uppercase()
    };
    let (from, to) = (field("from"), field("to"));
    if from.is_empty() || to.is_empty() {
        return bad_request("Both from and to currencies are required".to_owned(), false);
    }
    let Ok(from_currency) = from.parse::<Currency>() else {
        return bad_request(format!("Unsupported source currency: {from}"), true);
    };
    let Ok(to_currency) = to.parse::<Currency>() else {
        return bad_request(format!("Unsupported target currency: {to}"), true);
    };

    let exchange_rate = rate(from_currency, to_currency);
    let converted_amount = (amount * exchange_rate * 100.0).round() / 100.0;
    tracing::info!(%amount, %from_currency, %converted_amount, %to_currency, "converted");

    Json(json!({
        "success": true,
        "original_amount": amount,
        "from_currency": from_currency.code(),
        "to_currency": to_currency.code(),
        "converted_amount": converted_amount,
        "exchange_rate": exchange_rate,
        "timestamp": timestamp(),
    }))
    .into_response()
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "message": "The requested endpoint does not exist",
        })),
    )
        .into_response()
}

async fn log_request(request: Request, next: Next) -> Response {
    tracing::info!(method = %request.method(), path = %request.uri().path(), "request");
    let response = next.run(request).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(json!({
                "error": "Method not allowed",
                "message": "The method is not allowed for this endpoint",
            })),
        )
            .into_response();
    }
    response
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let port: u16 = std::env::var("PORT")
        .ok()
        .map(|value| value.parse())
        .transpose()?
        .unwrap_or(8080);
    let address: SocketAddr = format!("{host}:{port}").parse()?;

    let app = Router::new()
        .route("/health", get(health))
        .route("/api/info", get(info))
        .route("/api/rates", get(rates))
        .route("/api/convert", post(convert))
        .fallback(not_found)
        .layer(middleware::from_fn(log_request));

    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(address = %listener.local_addr()?, version = API_VERSION, "currency converter API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
