//! Till side: send one payment request and print the exchange.

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use caisse_ap::client;
use caisse_ap::request::PaymentRequest;

/// Send one payment request to a Caisse-AP terminal.
#[derive(Parser, Debug)]
#[command(name = "caisse-ap-client", version, about)]
struct Args {
    /// Terminal host name or address
    #[arg(short = 'd', long, default_value = "127.0.0.1")]
    destination: String,

    /// Terminal TCP port
    #[arg(short, long, default_value_t = 8888, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Amount to pay, negative for a refund
    #[arg(short, long, default_value_t = 112.45, allow_negative_numbers = true)]
    amount: f64,

    /// Currency name (EUR, XPF) or 3-digit ISO 4217 numeric code
    #[arg(short, long, default_value = "EUR")]
    currency: String,

    /// Decimal places the currency uses
    #[arg(short = 'm', long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=4))]
    decimals: u8,

    /// Pay by check instead of card
    #[arg(long)]
    check: bool,

    /// Ask for an immediate acknowledgement instead of an outcome
    #[arg(long)]
    immediate: bool,
}

fn currency_code(name: &str) -> Option<String> {
    match name.to_ascii_uppercase().as_str() {
        "EUR" => Some("978".to_string()),
        "XPF" => Some("953".to_string()),
        other if other.len() == 3 && other.bytes().all(|b| b.is_ascii_digit()) => {
            Some(other.to_string())
        }
        _ => None,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let Some(currency) = currency_code(&args.currency) else {
        eprintln!(
            "unknown currency '{}', use EUR, XPF or a numeric ISO 4217 code",
            args.currency
        );
        process::exit(1);
    };

    let mut request = PaymentRequest::new(args.amount, currency, args.decimals);
    if args.check {
        request = request.with_check();
    }
    if args.immediate {
        request = request.with_immediate();
    }
    let message = match request.into_message() {
        Ok(message) => message,
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    };

    match client::exchange(&args.destination, args.port, &message).await {
        Ok(exchange) => {
            println!("sent: {}", String::from_utf8_lossy(&exchange.sent));
            println!("received: {}", String::from_utf8_lossy(&exchange.received));
        }
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    }
}
