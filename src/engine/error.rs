//! Error types for loan processing.

use thiserror::Error;

use crate::Amount;
use crate::model::{LoanId, LoanStatus};
use crate::schedule::ScheduleError;

/// Top-level error returned by the [`Engine`](super::Engine) operations.
///
/// A failed operation never leaves a partially updated loan behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    #[error("loan {0} not found")]
    NotFound(LoanId),

    #[error("loan {0} is {1}, expected {2}")]
    NotEligible(LoanId, LoanStatus, LoanStatus),

    #[error("loan {0} still owes {1} but has no pending installment")]
    ScheduleExhausted(LoanId, Amount),

    #[error("engine is no longer running")]
    Shutdown,
}

/// Request payload rejected before touching any loan.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("principal must be positive, got {0}")]
    NonPositivePrincipal(Amount),

    #[error("term must be at least one installment")]
    ZeroTerm,

    #[error("tendered amount must be positive, got {0}")]
    NonPositiveTender(Amount),

    #[error("loan id must be positive")]
    ZeroLoanId,

    #[error("amount {0} exceeds the supported maximum of {max}", max = Amount::MAX)]
    AmountOutOfRange(Amount),

    #[error("no schedule can be built: {0}")]
    ScheduleOutOfRange(#[from] ScheduleError),
}
