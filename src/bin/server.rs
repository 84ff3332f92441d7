//! Terminal side: simulate a payment terminal on a TCP port.

use std::process;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use caisse_ap::server::Server;
use caisse_ap::terminal::{FailureKind, PaymentKind, Terminal, TerminalConfig};

/// Simulate a Caisse-AP payment terminal.
#[derive(Parser, Debug)]
#[command(name = "caisse-ap-server", version, about)]
struct Args {
    /// TCP port to listen on, 0 picks a free one
    #[arg(short, long, default_value_t = 8888)]
    port: u16,

    /// Fail every transaction instead of delivering it
    #[arg(short, long)]
    failure: bool,

    /// How failed transactions are reported
    #[arg(long, value_enum)]
    failure_type: Option<FailureKind>,

    /// Seconds the terminal pretends to wait for the cardholder
    #[arg(short, long, default_value_t = 3)]
    duration: u64,

    /// Card scheme and reader interface reported on success
    #[arg(long, value_enum, default_value = "cbcontact")]
    payment_type: PaymentKind,

    /// Contract number reported in the seller contract field
    #[arg(long, default_value = "424242")]
    seller_contract: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if args.failure_type.is_some() && !args.failure {
        warn!("--failure-type has no effect without --failure");
    }
    let config = TerminalConfig {
        failure: args
            .failure
            .then(|| args.failure_type.unwrap_or(FailureKind::Abandon)),
        payment_kind: args.payment_type,
        delay: Duration::from_secs(args.duration),
        seller_contract: args.seller_contract,
    };
    info!(
        port = args.port,
        failure = ?config.failure,
        payment_kind = ?config.payment_kind,
        delay_s = config.delay.as_secs(),
        seller_contract = %config.seller_contract,
        "starting terminal simulator"
    );

    let terminal = match Terminal::new(config) {
        Ok(terminal) => terminal,
        Err(error) => {
            eprintln!("{error}");
            process::exit(1);
        }
    };
    let server = match Server::bind(args.port, terminal).await {
        Ok(server) => server,
        Err(error) => {
            eprintln!("cannot listen on port {}: {error}", args.port);
            process::exit(1);
        }
    };
    if let Err(error) = server.run().await {
        eprintln!("{error}");
        process::exit(1);
    }
}
