//! Credit purchases and gateway signature checks.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::{CreditAmount, UserId};

/// Minor currency units charged per credit.
pub const MINOR_UNITS_PER_CREDIT: u64 = 100;
/// Currency of every order.
pub const ORDER_CURRENCY: &str = "INR";

/// Lifecycle of a credit purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Success,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Stored payment fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDraft {
    pub id: Uuid,
    pub user_id: UserId,
    pub order_id: String,
    pub external_payment_id: Option<String>,
    pub credits_added: CreditAmount,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// A credit purchase tracked against an external order.
///
/// Only a verified signature moves it from CREATED to SUCCESS, and a SUCCESS
/// payment never credits again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    id: Uuid,
    user_id: UserId,
    order_id: String,
    external_payment_id: Option<String>,
    credits_added: CreditAmount,
    status: PaymentStatus,
    created_at: DateTime<Utc>,
}

impl Payment {
    /// New CREATED payment for an external order.
    pub fn created(
        user_id: UserId,
        order_id: impl Into<String>,
        credits_added: CreditAmount,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            order_id: order_id.into(),
            external_payment_id: None,
            credits_added,
            status: PaymentStatus::Created,
            created_at: at,
        }
    }

    pub fn from_draft(draft: PaymentDraft) -> Self {
        Self {
            id: draft.id,
            user_id: draft.user_id,
            order_id: draft.order_id,
            external_payment_id: draft.external_payment_id,
            credits_added: draft.credits_added,
            status: draft.status,
            created_at: draft.created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn order_id(&self) -> &str {
        self.order_id.as_str()
    }

    pub fn external_payment_id(&self) -> Option<&str> {
        self.external_payment_id.as_deref()
    }

    pub fn credits_added(&self) -> CreditAmount {
        self.credits_added
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether credits were already granted for this payment.
    pub fn is_settled(&self) -> bool {
        self.status == PaymentStatus::Success
    }

    /// Mark the payment SUCCESS with the gateway's payment id.
    #[must_use]
    pub fn settle(mut self, external_payment_id: impl Into<String>) -> Self {
        self.status = PaymentStatus::Success;
        self.external_payment_id = Some(external_payment_id.into());
        self
    }
}

/// Charge in minor units for `credits`.
///
/// # Examples
/// ```
/// use homeservices::domain::{order_amount_minor, CreditAmount};
///
/// let credits = CreditAmount::new(50).expect("positive");
/// assert_eq!(order_amount_minor(credits), Some(5000));
/// ```
pub fn order_amount_minor(credits: CreditAmount) -> Option<u64> {
    credits.value().checked_mul(MINOR_UNITS_PER_CREDIT)
}

/// The signature did not match the gateway payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("payment signature does not match")]
pub struct SignatureMismatch;

type HmacSha256 = Hmac<Sha256>;

/// Verifies gateway callbacks signed with HMAC-SHA256 over
/// `"{order_id}|{payment_id}"` and hex encoded.
#[derive(Clone)]
pub struct PaymentSignatureVerifier {
    secret: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for PaymentSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl PaymentSignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Hex signature the gateway is expected to send.
    ///
    /// # Examples
    /// ```
    /// use homeservices::domain::PaymentSignatureVerifier;
    ///
    /// let verifier = PaymentSignatureVerifier::new("secret");
    /// let signature = verifier.sign("order_1", "pay_1");
    /// assert!(verifier.verify("order_1", "pay_1", &signature).is_ok());
    /// assert!(verifier.verify("order_1", "pay_2", &signature).is_err());
    /// ```
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        let mut mac = match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(err) => panic!("HMAC accepts keys of any length: {err}"),
        };
        mac.update(order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Compare `signature` against the expected value in constant time.
    pub fn verify(&self, order_id: &str, payment_id: &str, signature: &str) -> Result<(), SignatureMismatch> {
        let expected = self.sign(order_id, payment_id);
        let provided = signature.trim().to_ascii_lowercase();
        if constant_time_eq::constant_time_eq(expected.as_bytes(), provided.as_bytes()) {
            Ok(())
        } else {
            Err(SignatureMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn verifier() -> PaymentSignatureVerifier {
        PaymentSignatureVerifier::new("test_secret")
    }

    #[rstest]
    fn signature_matches_reference_hmac(verifier: PaymentSignatureVerifier) {
        // HMAC-SHA256("test_secret", "order_A|pay_B")
        let mut mac = HmacSha256::new_from_slice(b"test_secret").expect("key");
        mac.update(b"order_A|pay_B");
        let expected = hex::encode(mac.finalize().into_bytes());
        assert_eq!(verifier.sign("order_A", "pay_B"), expected);
        assert_eq!(expected.len(), 64);
    }

    #[rstest]
    fn uppercase_hex_is_accepted(verifier: PaymentSignatureVerifier) {
        let signature = verifier.sign("order_A", "pay_B").to_ascii_uppercase();
        assert_eq!(verifier.verify("order_A", "pay_B", &signature), Ok(()));
    }

    #[rstest]
    #[case("")]
    #[case("deadbeef")]
    fn truncated_signatures_fail(verifier: PaymentSignatureVerifier, #[case] signature: &str) {
        assert_eq!(verifier.verify("order_A", "pay_B", signature), Err(SignatureMismatch));
    }

    #[rstest]
    fn other_secret_fails(verifier: PaymentSignatureVerifier) {
        let forged = PaymentSignatureVerifier::new("guess").sign("order_A", "pay_B");
        assert_eq!(verifier.verify("order_A", "pay_B", &forged), Err(SignatureMismatch));
    }

    #[rstest]
    fn settle_records_external_id() {
        let credits = CreditAmount::new(10).expect("positive");
        let payment = Payment::created(UserId::random(), "order_A", credits, Utc::now());
        assert!(!payment.is_settled());
        let settled = payment.settle("pay_B");
        assert!(settled.is_settled());
        assert_eq!(settled.external_payment_id(), Some("pay_B"));
    }

    #[rstest]
    fn debug_output_hides_secret(verifier: PaymentSignatureVerifier) {
        assert!(!format!("{verifier:?}").contains("test_secret"));
    }
}
