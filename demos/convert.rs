//! Converts an amount through the API.
//!
//! ```bash
//! FXCONVERT_API_URL=http://localhost:8080 cargo run --example convert -- 100 USD EUR
//! ```

use std::time::Duration;

use fxconvert_http::{ConverterClient, Currency, Outcome};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fxconvert_http=debug,convert=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let amount: f64 = args.next().unwrap_or_else(|| "100".to_owned()).parse()?;
    let from: Currency = args.next().unwrap_or_else(|| "USD".to_owned()).parse()?;
    let to: Currency = args.next().unwrap_or_else(|| "EUR".to_owned()).parse()?;

    let client = ConverterClient::from_env()?;
    tracing::info!(?client, "waiting for backend");

    if let Outcome::Failure { reason, last_error } = client
        .wait_until_healthy(Duration::from_secs(1), Duration::from_secs(30))
        .await
    {
        anyhow::bail!("backend never became healthy ({reason}): {last_error}");
    }

    match client.convert(amount, from, to).await {
        Outcome::Success(conversion) => {
            println!(
                "{} {} = {} {} (rate {})",
                conversion.original_amount,
                conversion.from_currency,
                conversion.converted_amount,
                conversion.to_currency,
                conversion.exchange_rate
            );
            Ok(())
        }
        Outcome::Failure { reason, last_error } => {
            eprintln!("conversion failed ({reason}): {last_error}");
            eprintln!("run the command again to retry");
            std::process::exit(1);
        }
    }
}
