//! Simulated payment terminal.
//!
//! Turns each decoded request into the reply a real terminal would
//! produce: an echo of the request plus a synthesized outcome. The
//! terminal never sleeps itself, it only reports how long the caller
//! should pretend the cardholder took.

use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::message::{CHECK_PAYMENT_MODE, MANDATORY_TAGS, Message, tag};

mod card;
mod config;

pub use config::{
    ConfigError, DEFAULT_DELAY, FailureKind, MAX_SELLER_CONTRACT_LEN, PaymentKind, TerminalConfig,
};

/// Transaction status codes carried by the status field.
pub mod status {
    /// Transaction delivered.
    pub const DONE: &str = "10";
    /// Transaction not delivered.
    pub const NOT_DONE: &str = "01";
    /// Request acknowledged without reporting an outcome.
    pub const ACKNOWLEDGED: &str = "11";
}

/// Complement reported when a mandatory tag is missing.
const AF_MALFORMED: &str = "09";
/// Complement a terminal reports for any refused check payment.
const AF_CHECK_REFUSED: &str = "04";

const PRIVATE_DATA: &str = "1010000000";

/// A synthesized reply and how long to pretend to process it.
///
/// `delay: None` means the reply goes out right away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub message: Message,
    pub delay: Option<Duration>,
}

impl Reply {
    fn immediate(message: Message) -> Self {
        Reply {
            message,
            delay: None,
        }
    }

    fn delayed(message: Message, delay: Duration) -> Self {
        Reply {
            message,
            delay: Some(delay),
        }
    }

    pub fn is_immediate(&self) -> bool {
        self.delay.is_none()
    }
}

/// The response synthesizer, shared across every session of a server.
#[derive(Debug)]
pub struct Terminal {
    config: TerminalConfig,
}

/// Public API
impl Terminal {
    pub fn new(config: TerminalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Terminal { config })
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    /// Synthesize the reply to one request.
    pub fn respond(&self, request: &Message) -> Reply {
        self.respond_with(request, &mut rand::thread_rng())
    }

    /// Same machine with caller-owned randomness.
    pub fn respond_with(&self, request: &Message, rng: &mut impl Rng) -> Reply {
        let mut answer = request.clone();

        // First matching rule wins, a malformed request is refused even
        // when the till asked for an immediate acknowledgement.
        if let Some(missing) = MANDATORY_TAGS.into_iter().find(|t| !request.contains(t)) {
            warn!(tag = missing, "mandatory tag missing, refusing request");
            answer.set(tag::STATUS, status::NOT_DONE);
            answer.set(tag::STATUS_COMPLEMENT, AF_MALFORMED);
            return Reply::immediate(answer);
        }

        if request.get(tag::IMMEDIATE) == Some("1") {
            debug!("acknowledging without an outcome");
            answer.set(tag::STATUS, status::ACKNOWLEDGED);
            return Reply::immediate(answer);
        }

        let check = request.get(tag::PAYMENT_MODE) == Some(CHECK_PAYMENT_MODE);
        if let Some(failure) = self.config.failure {
            // Terminals report every failed check as refused, whatever
            // actually went wrong.
            let complement = if check {
                AF_CHECK_REFUSED
            } else {
                failure.af_code()
            };
            debug!(complement, "failing the transaction");
            answer.set(tag::STATUS, status::NOT_DONE);
            answer.set(tag::STATUS_COMPLEMENT, complement);
            return Reply::delayed(answer, self.config.delay);
        }

        debug!("delivering the transaction");
        answer.set(tag::STATUS, status::DONE);
        if !request.contains(tag::PAYMENT_MODE) {
            answer.set(tag::PAYMENT_MODE, self.config.payment_kind.cc_code());
            answer.set(tag::READER_MODE, self.config.payment_kind.ci_code());
        }
        answer.set(tag::AUTHORIZATION, card::authorization_number(rng));
        answer.set(tag::CARD_NUMBER, card::masked_card_number(rng));
        answer.set(tag::CARD_AID, card::card_aid(rng));
        answer.set(tag::CARD_EXPIRY, card::expiry_yymm(rng));
        answer.set(tag::PRIVATE_DATA, PRIVATE_DATA);
        answer.set(tag::SELLER_CONTRACT, self.config.seller_contract.as_str());
        Reply::delayed(answer, self.config.delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PaymentRequest;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn terminal(config: TerminalConfig) -> Terminal {
        Terminal::new(config).unwrap()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn card_request() -> Message {
        PaymentRequest::new(112.45, "978", 2).into_message().unwrap()
    }

    fn check_request() -> Message {
        PaymentRequest::new(112.45, "978", 2)
            .with_check()
            .into_message()
            .unwrap()
    }

    fn digits(value: &str) -> bool {
        value.bytes().all(|b| b.is_ascii_digit())
    }

    #[test]
    fn rejects_invalid_config() {
        let config = TerminalConfig::default().with_seller_contract("");
        assert_eq!(
            Terminal::new(config).err(),
            Some(ConfigError::SellerContractEmpty)
        );
    }

    #[test]
    fn missing_mandatory_tag_is_refused_immediately() {
        // No action field, but asks to fail with a delay and to
        // acknowledge immediately. The refusal wins over both.
        let request = Message::from_pairs([
            ("CZ", "0300"),
            ("CJ", "012345678901"),
            ("CA", "01"),
            ("CB", "11245"),
            ("CE", "978"),
            ("BA", "1"),
        ]);
        let terminal = terminal(TerminalConfig::default().with_failure(FailureKind::Timeout));

        let reply = terminal.respond_with(&request, &mut rng());
        assert!(reply.is_immediate());
        assert_eq!(reply.message.get(tag::STATUS), Some(status::NOT_DONE));
        assert_eq!(reply.message.get(tag::STATUS_COMPLEMENT), Some("09"));
        assert_eq!(reply.message.get(tag::CURRENCY), Some("978"));
    }

    #[test]
    fn immediate_flag_is_acknowledged_without_outcome() {
        let request = PaymentRequest::new(20.0, "978", 2)
            .with_immediate()
            .into_message()
            .unwrap();
        let terminal = terminal(TerminalConfig::default().with_failure(FailureKind::Refused));

        let reply = terminal.respond_with(&request, &mut rng());
        assert!(reply.is_immediate());
        assert_eq!(reply.message.get(tag::STATUS), Some(status::ACKNOWLEDGED));
        assert!(!reply.message.contains(tag::STATUS_COMPLEMENT));
        assert!(!reply.message.contains(tag::AUTHORIZATION));
    }

    #[test]
    fn configured_failure_reports_its_complement_after_the_delay() {
        let config = TerminalConfig::default()
            .with_failure(FailureKind::Timeout)
            .with_delay(Duration::from_secs(5));
        let reply = terminal(config).respond_with(&card_request(), &mut rng());

        assert_eq!(reply.delay, Some(Duration::from_secs(5)));
        assert_eq!(reply.message.get(tag::STATUS), Some(status::NOT_DONE));
        assert_eq!(reply.message.get(tag::STATUS_COMPLEMENT), Some("08"));
        assert!(!reply.message.contains(tag::AUTHORIZATION));
        assert!(!reply.message.contains(tag::CARD_NUMBER));
    }

    #[test]
    fn failed_check_is_always_refused() {
        // A timeout would report "08", checks report "04" regardless.
        let config = TerminalConfig::default().with_failure(FailureKind::Timeout);
        let reply = terminal(config).respond_with(&check_request(), &mut rng());

        assert_eq!(reply.message.get(tag::STATUS), Some(status::NOT_DONE));
        assert_eq!(reply.message.get(tag::STATUS_COMPLEMENT), Some("04"));
    }

    #[test]
    fn success_echoes_the_request_and_synthesizes_card_data() {
        let config = TerminalConfig::default().with_seller_contract("9876543");
        let request = card_request();
        let reply = terminal(config).respond_with(&request, &mut rng());

        assert_eq!(reply.delay, Some(DEFAULT_DELAY));
        for (t, v) in request.iter() {
            assert_eq!(reply.message.get(t), Some(v), "echo lost {t}");
        }
        let message = &reply.message;
        assert_eq!(message.get(tag::STATUS), Some(status::DONE));
        assert_eq!(message.get(tag::PAYMENT_MODE), Some("001"));
        assert_eq!(message.get(tag::READER_MODE), Some("1"));

        let auth = message.get(tag::AUTHORIZATION).unwrap();
        assert_eq!(auth.len(), 6);
        assert!(digits(auth));

        let pan = message.get(tag::CARD_NUMBER).unwrap();
        assert_eq!(pan.len(), 16);
        assert_eq!(&pan[6..12], "######");

        assert!(message.get(tag::CARD_AID).unwrap().starts_with("A00000000"));
        assert_eq!(message.get(tag::CARD_EXPIRY).unwrap().len(), 4);
        assert_eq!(message.get(tag::PRIVATE_DATA), Some("1010000000"));
        assert_eq!(message.get(tag::SELLER_CONTRACT), Some("9876543"));
    }

    #[test]
    fn successful_check_keeps_the_request_payment_mode() {
        let reply = terminal(TerminalConfig::default()).respond_with(&check_request(), &mut rng());

        let message = &reply.message;
        assert_eq!(message.get(tag::STATUS), Some(status::DONE));
        assert_eq!(message.get(tag::PAYMENT_MODE), Some(CHECK_PAYMENT_MODE));
        assert!(!message.contains(tag::READER_MODE));
        // Card data is synthesized either way.
        assert!(message.contains(tag::AUTHORIZATION));
        assert!(message.contains(tag::CARD_NUMBER));
        assert!(message.contains(tag::SELLER_CONTRACT));
    }

    #[test]
    fn payment_kind_drives_mode_and_reader_fields() {
        let config = TerminalConfig::default().with_payment_kind(PaymentKind::AmexContactless);
        let reply = terminal(config).respond_with(&card_request(), &mut rng());

        assert_eq!(reply.message.get(tag::PAYMENT_MODE), Some("00D"));
        assert_eq!(reply.message.get(tag::READER_MODE), Some("2"));
    }

    #[test]
    fn same_seed_same_reply() {
        let terminal = terminal(TerminalConfig::default());
        let first = terminal.respond_with(&card_request(), &mut rng());
        let second = terminal.respond_with(&card_request(), &mut rng());
        assert_eq!(first, second);
    }
}
