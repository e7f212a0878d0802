//! Credit ledger arithmetic.
//!
//! Balances only move through [`Ledger::debit`] and [`Ledger::credit`]. Each
//! posting yields the new balance together with the journal entry recording
//! it, so adapters persist both in the same transaction and the conservation
//! law (`balance == credits - debits`) can be replayed from the journal.

use std::fmt;
use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Failures raised by ledger arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The balance cannot cover the requested debit.
    #[error("insufficient credits: {available} available, {required} required")]
    InsufficientFunds { available: u64, required: u64 },
    /// Amounts must be strictly positive.
    #[error("credit amount must be greater than zero")]
    NonPositiveAmount,
    /// The credit would overflow the balance representation.
    #[error("credit balance overflow")]
    Overflow,
}

/// Non-negative credit balance held by a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreditBalance(u64);

impl CreditBalance {
    /// Wrap a raw balance.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw balance value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Convert a stored signed balance, rejecting negatives.
    pub fn try_from_stored(value: i64) -> Result<Self, LedgerError> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| LedgerError::NonPositiveAmount)
    }

    /// Signed form used by SQL columns.
    pub fn to_stored(self) -> Result<i64, LedgerError> {
        i64::try_from(self.0).map_err(|_| LedgerError::Overflow)
    }

    fn checked_debit(self, amount: CreditAmount) -> Result<Self, LedgerError> {
        self.0
            .checked_sub(amount.value())
            .map(Self)
            .ok_or(LedgerError::InsufficientFunds {
                available: self.0,
                required: amount.value(),
            })
    }

    fn checked_credit(self, amount: CreditAmount) -> Result<Self, LedgerError> {
        let next = self.0.checked_add(amount.value()).ok_or(LedgerError::Overflow)?;
        // Stored as BIGINT, so the balance must stay representable as i64.
        i64::try_from(next).map_err(|_| LedgerError::Overflow)?;
        Ok(Self(next))
    }
}

impl fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly positive number of credits moved by a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CreditAmount(NonZeroU64);

impl CreditAmount {
    /// Validate a raw amount.
    ///
    /// # Examples
    /// ```
    /// use homeservices::domain::CreditAmount;
    ///
    /// assert!(CreditAmount::new(0).is_err());
    /// assert_eq!(CreditAmount::new(40).map(CreditAmount::value), Ok(40));
    /// ```
    pub fn new(value: u64) -> Result<Self, LedgerError> {
        NonZeroU64::new(value)
            .map(Self)
            .ok_or(LedgerError::NonPositiveAmount)
    }

    /// Validate a signed amount, as received from clients or SQL.
    pub fn from_signed(value: i64) -> Result<Self, LedgerError> {
        let unsigned = u64::try_from(value).map_err(|_| LedgerError::NonPositiveAmount)?;
        Self::new(unsigned)
    }

    /// Raw amount.
    pub const fn value(self) -> u64 {
        self.0.get()
    }

    /// Signed form used by SQL columns.
    pub fn to_stored(self) -> Result<i64, LedgerError> {
        i64::try_from(self.value()).map_err(|_| LedgerError::Overflow)
    }
}

impl TryFrom<u64> for CreditAmount {
    type Error = LedgerError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreditAmount> for u64 {
    fn from(value: CreditAmount) -> Self {
        value.value()
    }
}

impl fmt::Display for CreditAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Direction and cause of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryKind {
    /// Credits spent on a booking.
    BookingDebit,
    /// Credits purchased through a verified payment.
    PaymentCredit,
}

impl LedgerEntryKind {
    /// Stable storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BookingDebit => "BOOKING_DEBIT",
            Self::PaymentCredit => "PAYMENT_CREDIT",
        }
    }
}

impl std::str::FromStr for LedgerEntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOKING_DEBIT" => Ok(Self::BookingDebit),
            "PAYMENT_CREDIT" => Ok(Self::PaymentCredit),
            other => Err(format!("unknown ledger entry kind: {other}")),
        }
    }
}

/// Append-only journal row written alongside every balance mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    id: Uuid,
    user_id: UserId,
    kind: LedgerEntryKind,
    amount: CreditAmount,
    balance_after: CreditBalance,
    reference: String,
    created_at: DateTime<Utc>,
}

/// Persisted fields of a [`LedgerEntry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntryDraft {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: LedgerEntryKind,
    pub amount: CreditAmount,
    pub balance_after: CreditBalance,
    pub reference: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Rehydrate an entry from storage.
    pub fn from_draft(draft: LedgerEntryDraft) -> Self {
        let LedgerEntryDraft {
            id,
            user_id,
            kind,
            amount,
            balance_after,
            reference,
            created_at,
        } = draft;
        Self {
            id,
            user_id,
            kind,
            amount,
            balance_after,
            reference,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn kind(&self) -> LedgerEntryKind {
        self.kind
    }

    pub fn amount(&self) -> CreditAmount {
        self.amount
    }

    pub fn balance_after(&self) -> CreditBalance {
        self.balance_after
    }

    /// Booking or payment order the posting belongs to.
    pub fn reference(&self) -> &str {
        self.reference.as_str()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Amount as a signed delta: negative for debits.
    pub fn signed_amount(&self) -> i128 {
        let amount = i128::from(self.amount.value());
        match self.kind {
            LedgerEntryKind::BookingDebit => -amount,
            LedgerEntryKind::PaymentCredit => amount,
        }
    }
}

/// Result of a successful posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Posting {
    pub balance: CreditBalance,
    pub entry: LedgerEntry,
}

/// Stateless ledger operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ledger;

/// Journal reference for credits an account starts with.
pub const OPENING_BALANCE_REFERENCE: &str = "opening_balance";

impl Ledger {
    /// Debit `amount` from `balance`, failing without side effects when the
    /// balance is too small.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use homeservices::domain::{CreditAmount, CreditBalance, Ledger, LedgerError, UserId};
    ///
    /// let user = UserId::random();
    /// let cost = CreditAmount::new(40).expect("positive");
    /// let posting = Ledger::debit(&user, CreditBalance::new(100), cost, "booking", Utc::now())
    ///     .expect("funds available");
    /// assert_eq!(posting.balance, CreditBalance::new(60));
    ///
    /// let err = Ledger::debit(&user, CreditBalance::new(10), cost, "booking", Utc::now());
    /// assert!(matches!(err, Err(LedgerError::InsufficientFunds { .. })));
    /// ```
    pub fn debit(
        user_id: &UserId,
        balance: CreditBalance,
        amount: CreditAmount,
        reference: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<Posting, LedgerError> {
        let next = balance.checked_debit(amount)?;
        Ok(Self::posting(
            user_id,
            LedgerEntryKind::BookingDebit,
            amount,
            next,
            reference.into(),
            at,
        ))
    }

    /// Credit `amount` to `balance`. There is no upper bound beyond the
    /// storage representation.
    pub fn credit(
        user_id: &UserId,
        balance: CreditBalance,
        amount: CreditAmount,
        reference: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<Posting, LedgerError> {
        let next = balance.checked_credit(amount)?;
        Ok(Self::posting(
            user_id,
            LedgerEntryKind::PaymentCredit,
            amount,
            next,
            reference.into(),
            at,
        ))
    }

    /// Journal entry for the balance an account is created with, `None` for
    /// a zero balance.
    pub fn opening(
        user_id: &UserId,
        credits: CreditBalance,
        at: DateTime<Utc>,
    ) -> Result<Option<Posting>, LedgerError> {
        let Ok(amount) = CreditAmount::new(credits.value()) else {
            return Ok(None);
        };
        Self::credit(user_id, CreditBalance::default(), amount, OPENING_BALANCE_REFERENCE, at).map(Some)
    }

    /// Replay a user's journal from a zero opening balance.
    ///
    /// Returns `None` if the journal would ever dip below zero.
    pub fn replay<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Option<i128> {
        entries.into_iter().try_fold(0_i128, |acc, entry| {
            let next = acc + entry.signed_amount();
            (next >= 0).then_some(next)
        })
    }

    fn posting(
        user_id: &UserId,
        kind: LedgerEntryKind,
        amount: CreditAmount,
        balance: CreditBalance,
        reference: String,
        at: DateTime<Utc>,
    ) -> Posting {
        let entry = LedgerEntry::from_draft(LedgerEntryDraft {
            id: Uuid::new_v4(),
            user_id: *user_id,
            kind,
            amount,
            balance_after: balance,
            reference,
            created_at: at,
        });
        Posting { balance, entry }
    }
}
