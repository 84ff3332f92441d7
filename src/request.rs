//! Builds the transaction request a till sends to the payment terminal.

use thiserror::Error;

use crate::amount::{AmountError, MinorUnits};
use crate::message::{CHECK_PAYMENT_MODE, Message, tag};

/// Protocol version announced in every request.
pub const PROTOCOL_VERSION: &str = "0300";

/// Fixed protocol identifier for the `CJ` field.
pub const PROTOCOL_ID: &str = "012345678901";

/// Till number announced in the `CA` field.
pub const TILL_NUMBER: &str = "01";

const ACTION_DEBIT: &str = "0";
const ACTION_REFUND: &str = "1";

/// Errors raised while turning a [`PaymentRequest`] into a [`Message`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("amount rounds to zero minor units, nothing to request")]
    ZeroAmount,

    #[error("currency '{0}' is not a 3-digit ISO 4217 numeric code")]
    InvalidCurrency(String),

    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// A payment to submit, in till terms rather than wire terms.
///
/// The sign of `amount` picks the direction: positive debits the card,
/// negative refunds it. The wire message always carries the magnitude.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    amount: f64,
    currency_num: String,
    decimals: u8,
    check: bool,
    immediate: bool,
}

impl PaymentRequest {
    pub fn new(amount: f64, currency_num: impl Into<String>, decimals: u8) -> Self {
        PaymentRequest {
            amount,
            currency_num: currency_num.into(),
            decimals,
            check: false,
            immediate: false,
        }
    }

    /// Pay by check instead of card.
    pub fn with_check(mut self) -> Self {
        self.check = true;
        self
    }

    /// Ask the terminal to acknowledge right away instead of reporting
    /// the transaction outcome.
    pub fn with_immediate(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Assemble the request message.
    pub fn into_message(self) -> Result<Message, BuildError> {
        if self.currency_num.len() != 3 || !self.currency_num.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BuildError::InvalidCurrency(self.currency_num));
        }
        let units = MinorUnits::from_decimal(self.amount, self.decimals)?;
        if units.is_zero() {
            return Err(BuildError::ZeroAmount);
        }
        let action = if self.amount < 0.0 {
            ACTION_REFUND
        } else {
            ACTION_DEBIT
        };

        let mut message = Message::new();
        message.set(tag::VERSION, PROTOCOL_VERSION);
        message.set(tag::PROTOCOL_ID, PROTOCOL_ID);
        message.set(tag::TILL, TILL_NUMBER);
        message.set(tag::CURRENCY, self.currency_num);
        // Partial payment stays off, the terminal must settle in full.
        message.set(tag::PARTIAL_PAYMENT, "0");
        message.set(tag::IMMEDIATE, if self.immediate { "1" } else { "0" });
        message.set(tag::ACTION, action);
        message.set(tag::AMOUNT, units.to_string());
        if self.check {
            message.set(tag::PAYMENT_MODE, CHECK_PAYMENT_MODE);
        }
        Ok(message)
    }
}
