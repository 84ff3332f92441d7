use std::time::Duration;

use clap::ValueEnum;
use thiserror::Error;

/// Longest contract number the seller contract field carries.
pub const MAX_SELLER_CONTRACT_LEN: usize = 10;

/// Processing delay applied when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

const DEFAULT_SELLER_CONTRACT: &str = "424242";

/// Errors raised when a [`TerminalConfig`] cannot drive a terminal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("seller contract '{0}' exceeds {MAX_SELLER_CONTRACT_LEN} characters")]
    SellerContractTooLong(String),

    #[error("seller contract must not be empty")]
    SellerContractEmpty,

    #[error("seller contract '{0}' contains non-ascii characters")]
    SellerContractNotAscii(String),
}

/// How a failing terminal reports the transaction it did not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureKind {
    /// The customer walked away before presenting a card.
    Abandon,
    /// Nobody touched the terminal before it gave up waiting.
    Timeout,
    /// The issuer refused the payment.
    Refused,
    /// The requested payment mode is not allowed on this terminal.
    Forbidden,
}

impl FailureKind {
    /// Complement code reported in the status complement field.
    pub fn af_code(self) -> &'static str {
        match self {
            FailureKind::Abandon => "11",
            FailureKind::Timeout => "08",
            FailureKind::Refused => "04",
            FailureKind::Forbidden => "05",
        }
    }
}

/// Card scheme and reader interface a succeeding terminal settles with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaymentKind {
    #[value(name = "cbcontact")]
    CbContact,
    #[value(name = "cbcontactless")]
    CbContactless,
    #[value(name = "amexcontact")]
    AmexContact,
    #[value(name = "amexcontactless")]
    AmexContactless,
}

impl PaymentKind {
    /// Payment mode reported in the payment mode field.
    pub fn cc_code(self) -> &'static str {
        match self {
            PaymentKind::CbContact => "001",
            PaymentKind::CbContactless => "00B",
            PaymentKind::AmexContact => "002",
            PaymentKind::AmexContactless => "00D",
        }
    }

    /// Reader interface reported in the reader mode field.
    pub fn ci_code(self) -> &'static str {
        match self {
            PaymentKind::CbContact | PaymentKind::AmexContact => "1",
            PaymentKind::CbContactless | PaymentKind::AmexContactless => "2",
        }
    }
}

/// Behavior knobs for a simulated terminal.
#[derive(Debug, Clone)]
pub struct TerminalConfig {
    /// Fail every delivered outcome this way instead of succeeding.
    pub failure: Option<FailureKind>,
    /// Scheme and interface reported on successful card payments.
    pub payment_kind: PaymentKind,
    /// How long the terminal pretends to wait for the cardholder.
    pub delay: Duration,
    /// Contract number reported in the seller contract field.
    pub seller_contract: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            failure: None,
            payment_kind: PaymentKind::CbContact,
            delay: DEFAULT_DELAY,
            seller_contract: DEFAULT_SELLER_CONTRACT.to_string(),
        }
    }
}

impl TerminalConfig {
    pub fn with_failure(mut self, failure: FailureKind) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn with_payment_kind(mut self, payment_kind: PaymentKind) -> Self {
        self.payment_kind = payment_kind;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_seller_contract(mut self, seller_contract: impl Into<String>) -> Self {
        self.seller_contract = seller_contract.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.seller_contract.is_empty() {
            return Err(ConfigError::SellerContractEmpty);
        }
        if !self.seller_contract.is_ascii() {
            return Err(ConfigError::SellerContractNotAscii(
                self.seller_contract.clone(),
            ));
        }
        if self.seller_contract.len() > MAX_SELLER_CONTRACT_LEN {
            return Err(ConfigError::SellerContractTooLong(
                self.seller_contract.clone(),
            ));
        }
        Ok(())
    }
}
