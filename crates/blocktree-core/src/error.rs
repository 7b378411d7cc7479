use thiserror::Error;

/// Construction-time validation failures.
///
/// These are raised to the caller immediately; admission decisions made by
/// [`Block`](crate::Block) and [`Ledger`](crate::Ledger) are reported through
/// [`Admission`](crate::Admission) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid transaction type code {0}")]
    InvalidType(u8),
    #[error("unknown transaction type {0:?}")]
    UnknownKind(String),
    #[error("invalid account name {0:?}")]
    InvalidAccount(String),
    #[error("destination account {0:?} equals the source account")]
    SameAccount(String),
    #[error("negative amount {0}")]
    NegativeAmount(i64),
    #[error("amount {0} exceeds the largest representable balance")]
    AmountOverflow(u64),
    #[error("emission to {0:?} must not name a source account")]
    EmissionWithSource(String),
    #[error("balance of account {0:?} overflows")]
    BalanceOverflow(String),
    #[error("checksum must be 32 hex characters, got {0}")]
    ChecksumLengthError(usize),
    #[error("missing transaction field: {0}")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
