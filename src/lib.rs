pub mod amount;
pub mod client;
pub mod codec;
pub mod message;
pub mod request;
pub mod server;
pub mod session;
pub mod terminal;

pub use amount::MinorUnits;
pub use client::{Exchange, exchange, exchange_within};
pub use codec::{decode, encode};
pub use message::Message;
pub use request::PaymentRequest;
pub use server::Server;
pub use session::Session;
pub use terminal::{FailureKind, PaymentKind, Terminal, TerminalConfig};
