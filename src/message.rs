//! Core message type and tag vocabulary for the Caisse-AP protocol.

use std::fmt;

/// Well-known 2-character tags.
///
/// Decoded messages are not restricted to this set: unknown tags pass
/// through the codec and are echoed back by the terminal.
pub mod tag {
    /// Protocol version, always the first encoded field ("0300").
    pub const VERSION: &str = "CZ";
    /// Concert protocol identifier.
    pub const PROTOCOL_ID: &str = "CJ";
    /// Till (cash register) number.
    pub const TILL: &str = "CA";
    /// Amount in minor currency units, 2 to 12 digits.
    pub const AMOUNT: &str = "CB";
    /// Action: "0" debit, "1" reimbursement.
    pub const ACTION: &str = "CD";
    /// ISO 4217 numeric currency code ("978" for EUR).
    pub const CURRENCY: &str = "CE";
    /// Payment mode: "00C" check (set by the client), card codes otherwise.
    pub const PAYMENT_MODE: &str = "CC";
    /// Transaction reference, optional.
    pub const REFERENCE: &str = "CH";
    /// Reader mode: "1" contact, "2" contactless.
    pub const READER_MODE: &str = "CI";
    /// "1" = answer immediately, "0" = answer once the transaction settles.
    pub const IMMEDIATE: &str = "BA";
    /// "0" = partial payment disallowed.
    pub const PARTIAL_PAYMENT: &str = "BF";
    /// Transaction status: "10" done, "01" not done, "11" acknowledged.
    pub const STATUS: &str = "AE";
    /// Status complement, present on failures only.
    pub const STATUS_COMPLEMENT: &str = "AF";
    /// Authorization number.
    pub const AUTHORIZATION: &str = "AC";
    /// Masked payment card number.
    pub const CARD_NUMBER: &str = "AA";
    /// AID of the payment card application.
    pub const CARD_AID: &str = "AI";
    /// Card expiry date, YYMM.
    pub const CARD_EXPIRY: &str = "AB";
    /// Private acquirer data.
    pub const PRIVATE_DATA: &str = "CF";
    /// Seller contract reference.
    pub const SELLER_CONTRACT: &str = "CG";
}

/// `CC` value a client sends to announce payment by check.
pub const CHECK_PAYMENT_MODE: &str = "00C";

/// Tags a payment request must carry to be answerable.
pub const MANDATORY_TAGS: [&str; 6] = [
    tag::VERSION,
    tag::PROTOCOL_ID,
    tag::TILL,
    tag::AMOUNT,
    tag::ACTION,
    tag::CURRENCY,
];

/// An ordered tag-to-value mapping, at most one value per tag.
///
/// Setting an existing tag overwrites its value but keeps its original
/// position, so field order stays deterministic across edits. The `CZ`
/// version tag is special-cased by the codec, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    fields: Vec<(String, String)>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a message from `(tag, value)` pairs, in order.
    pub fn from_pairs<T, V>(pairs: impl IntoIterator<Item = (T, V)>) -> Self
    where
        T: Into<String>,
        V: Into<String>,
    {
        let mut message = Self::new();
        for (tag, value) in pairs {
            message.set(tag, value);
        }
        message
    }

    /// Insert a field, or overwrite the value of an existing tag in place.
    pub fn set(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        let tag = tag.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(t, _)| *t == tag) {
            Some((_, v)) => *v = value,
            None => self.fields.push((tag, value)),
        }
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(t, _)| t.as_str() == tag)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.fields.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// `tag=value` pairs in field order, the shape operators see in logs.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (tag, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{tag}={value}")?;
        }
        Ok(())
    }
}
