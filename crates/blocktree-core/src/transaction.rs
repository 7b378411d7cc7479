//! Checksummed value movements and the builder that finalizes them.

use crate::constants::{CHECKSUM_HEX_SIZE, MAX_ACCOUNT_LEN, MIN_ACCOUNT_LEN};
use crate::error::{LedgerError, Result};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

pub type TxId = u64;

/// What a transaction does with its amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Creates value in `to` out of nothing.
    Emission = 0,
    /// Moves value from `from` to `to`.
    Transfer = 1,
}

impl TransactionKind {
    /// Numeric code used in the checksum preimage.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TransactionKind {
    type Error = LedgerError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(TransactionKind::Emission),
            1 => Ok(TransactionKind::Transfer),
            other => Err(LedgerError::InvalidType(other)),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.parse::<u8>() {
            return TransactionKind::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "emission" => Ok(TransactionKind::Emission),
            "transfer" => Ok(TransactionKind::Transfer),
            _ => Err(LedgerError::UnknownKind(s.to_string())),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Emission => f.write_str("emission"),
            TransactionKind::Transfer => f.write_str("transfer"),
        }
    }
}

/// Checks that `name` is between [`MIN_ACCOUNT_LEN`] and `max` characters.
pub(crate) fn check_account(name: &str, max: usize) -> Result<()> {
    let len = name.chars().count();
    if !(MIN_ACCOUNT_LEN..=max).contains(&len) {
        return Err(LedgerError::InvalidAccount(name.to_string()));
    }
    Ok(())
}

/// Field rules every [`Transaction`] satisfies, whatever its checksum.
pub(crate) fn check_fields(
    kind: TransactionKind,
    from: Option<&str>,
    to: &str,
    amount: u64,
) -> Result<()> {
    check_account(to, MAX_ACCOUNT_LEN)?;
    match (kind, from) {
        (TransactionKind::Emission, None) => {}
        (TransactionKind::Emission, Some(_)) => {
            return Err(LedgerError::EmissionWithSource(to.to_string()));
        }
        (TransactionKind::Transfer, None) => return Err(LedgerError::MissingField("from")),
        (TransactionKind::Transfer, Some(from)) => {
            check_account(from, MAX_ACCOUNT_LEN)?;
            if from == to {
                return Err(LedgerError::SameAccount(to.to_string()));
            }
        }
    }
    if i64::try_from(amount).is_err() {
        return Err(LedgerError::AmountOverflow(amount));
    }
    Ok(())
}

/// MD5 over `id:kind:from:to:amount`, rendered as lowercase hex.
pub fn checksum_of(
    id: TxId,
    kind: TransactionKind,
    from: Option<&str>,
    to: &str,
    amount: u64,
) -> String {
    let preimage = format!(
        "{}:{}:{}:{}:{}",
        id,
        kind.code(),
        from.unwrap_or_default(),
        to,
        amount
    );
    let mut hasher = Md5::new();
    hasher.update(preimage.as_bytes());
    hex::encode(hasher.finalize())
}

/// An immutable, checksummed transaction.
///
/// Every constructor enforces the field rules (account lengths, no source on
/// emissions, distinct accounts on transfers, amount within `i64`). Values that
/// arrive from elsewhere (deserialized or assembled with
/// [`Transaction::from_parts`]) may still carry a stale checksum, which
/// [`Transaction::is_valid`] detects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTransaction")]
pub struct Transaction {
    id: TxId,
    kind: TransactionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    from: Option<String>,
    to: String,
    amount: u64,
    checksum: String,
}

impl Transaction {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    /// Emission of `amount` into `to`.
    pub fn emission(id: TxId, to: &str, amount: i64) -> Result<Self> {
        Self::builder()
            .id(id)
            .kind(TransactionKind::Emission)
            .to(to)?
            .amount(amount)?
            .build()
    }

    /// Transfer of `amount` from `from` to `to`.
    pub fn transfer(id: TxId, from: &str, to: &str, amount: i64) -> Result<Self> {
        Self::builder()
            .id(id)
            .kind(TransactionKind::Transfer)
            .from(from)?
            .to(to)?
            .amount(amount)?
            .build()
    }

    /// Assemble a transaction with a checksum supplied by the caller. The
    /// fields are checked; the checksum is not.
    pub fn from_parts(
        id: TxId,
        kind: TransactionKind,
        from: Option<String>,
        to: String,
        amount: u64,
        checksum: String,
    ) -> Result<Self> {
        check_fields(kind, from.as_deref(), &to, amount)?;
        Ok(Self {
            id,
            kind,
            from,
            to,
            amount,
            checksum,
        })
    }

    pub fn id(&self) -> TxId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    pub fn to(&self) -> &str {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    /// Checksum recomputed from the current field values.
    pub fn compute_checksum(&self) -> String {
        checksum_of(
            self.id,
            self.kind,
            self.from.as_deref(),
            &self.to,
            self.amount,
        )
    }

    /// True iff the stored checksum matches the recomputed one.
    pub fn is_valid(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// Reopen the fields for editing. The result must be built again to get
    /// a fresh checksum.
    pub fn to_builder(&self) -> TransactionBuilder {
        TransactionBuilder {
            id: Some(self.id),
            kind: Some(self.kind),
            from: self.from.clone(),
            to: Some(self.to.clone()),
            amount: Some(self.amount),
        }
    }
}

/// Wire shape of a [`Transaction`] before its fields are checked.
#[derive(Deserialize)]
struct RawTransaction {
    id: TxId,
    kind: TransactionKind,
    #[serde(default)]
    from: Option<String>,
    to: String,
    amount: u64,
    checksum: String,
}

impl TryFrom<RawTransaction> for Transaction {
    type Error = LedgerError;

    fn try_from(raw: RawTransaction) -> Result<Self> {
        Transaction::from_parts(raw.id, raw.kind, raw.from, raw.to, raw.amount, raw.checksum)
    }
}

/// Collects transaction fields; [`TransactionBuilder::build`] finalizes the
/// checksum. A setter that fails leaves the builder as it was.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransactionBuilder {
    id: Option<TxId>,
    kind: Option<TransactionKind>,
    from: Option<String>,
    to: Option<String>,
    amount: Option<u64>,
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&mut self, id: TxId) -> &mut Self {
        self.id = Some(id);
        self
    }

    /// Setting [`TransactionKind::Emission`] clears any source account.
    pub fn kind(&mut self, kind: TransactionKind) -> &mut Self {
        if kind == TransactionKind::Emission {
            self.from = None;
        }
        self.kind = Some(kind);
        self
    }

    pub fn kind_code(&mut self, code: u8) -> Result<&mut Self> {
        let kind = TransactionKind::try_from(code)?;
        Ok(self.kind(kind))
    }

    /// Ignored (source forced to absent) for emissions.
    pub fn from(&mut self, from: &str) -> Result<&mut Self> {
        if self.kind == Some(TransactionKind::Emission) {
            self.from = None;
            return Ok(self);
        }
        check_account(from, MAX_ACCOUNT_LEN)?;
        self.from = Some(from.to_string());
        Ok(self)
    }

    pub fn to(&mut self, to: &str) -> Result<&mut Self> {
        check_account(to, MAX_ACCOUNT_LEN)?;
        if self.from.as_deref() == Some(to) {
            return Err(LedgerError::SameAccount(to.to_string()));
        }
        self.to = Some(to.to_string());
        Ok(self)
    }

    pub fn amount(&mut self, amount: i64) -> Result<&mut Self> {
        let amount = u64::try_from(amount).map_err(|_| LedgerError::NegativeAmount(amount))?;
        self.amount = Some(amount);
        Ok(self)
    }

    /// Finalize: every field must be set, and the checksum is computed last.
    pub fn build(&self) -> Result<Transaction> {
        let id = self.id.ok_or(LedgerError::MissingField("id"))?;
        let kind = self.kind.ok_or(LedgerError::MissingField("kind"))?;
        let to = self.to.clone().ok_or(LedgerError::MissingField("to"))?;
        let amount = self.amount.ok_or(LedgerError::MissingField("amount"))?;
        let from = match kind {
            TransactionKind::Emission => None,
            TransactionKind::Transfer => {
                Some(self.from.clone().ok_or(LedgerError::MissingField("from"))?)
            }
        };
        // `from` may have been set after `to`.
        check_fields(kind, from.as_deref(), &to, amount)?;

        let checksum = checksum_of(id, kind, from.as_deref(), &to, amount);
        if checksum.len() != CHECKSUM_HEX_SIZE {
            return Err(LedgerError::ChecksumLengthError(checksum.len()));
        }
        trace!(id, %kind, %checksum, "transaction finalized");

        Ok(Transaction {
            id,
            kind,
            from,
            to,
            amount,
            checksum,
        })
    }
}
