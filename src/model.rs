//! Core domain types for the loan engine.

use std::fmt;

use chrono::NaiveDate;

use crate::Amount;

/// Loan identifier.
pub type LoanId = u32;

/// Opaque identity of the borrower owning a loan.
pub type OwnerKey = String;

/// A command representing the possible inputs of the engine.
#[derive(Debug, Clone)]
pub enum Command {
    /// Request a new loan; it starts out pending approval.
    Create {
        owner: OwnerKey,
        principal: Amount,
        term: u32,
        start_date: NaiveDate,
    },
    /// Approve a pending loan so it can be repaid.
    Approve { loan: LoanId },
    /// Tender a repayment against an approved loan.
    Repay {
        loan: LoanId,
        owner: OwnerKey,
        amount: Amount,
        date: NaiveDate,
    },
}

/// Lifecycle of a loan: `Pending -> Approved -> Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanStatus {
    #[default]
    Pending,
    Approved,
    /// Terminal.
    Paid,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Paid => "PAID",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
        })
    }
}

/// One installment of a loan schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    /// Scheduled amount, or the tendered amount once settled off-schedule.
    pub amount: Amount,
}

impl Payment {
    /// Create a new installment in the `Pending` state.
    pub fn new(due_date: NaiveDate, amount: Amount) -> Self {
        Self {
            due_date,
            status: PaymentStatus::Pending,
            amount,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// A fixed-term installment loan.
///
/// Fields that carry invariants are only mutated by the engine; callers get
/// read access through the accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub(crate) id: LoanId,
    pub(crate) owner: OwnerKey,
    pub(crate) principal: Amount,
    pub(crate) remaining_balance: Amount,
    pub(crate) start_date: NaiveDate,
    pub(crate) status: LoanStatus,
    pub(crate) cadence_days: u32,
    pub(crate) term: u32,
    pub(crate) payments: Vec<Payment>,
}

impl Loan {
    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn principal(&self) -> Amount {
        self.principal
    }

    /// Principal minus everything tendered so far.
    pub fn remaining_balance(&self) -> Amount {
        self.remaining_balance
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn status(&self) -> LoanStatus {
        self.status
    }

    pub fn cadence_days(&self) -> u32 {
        self.cadence_days
    }

    /// Number of installments originally requested.
    pub fn term(&self) -> u32 {
        self.term
    }

    /// Installments ordered by due date.
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    /// Position of the head installment: the earliest one still pending.
    pub fn head_position(&self) -> Option<usize> {
        self.payments.iter().position(Payment::is_pending)
    }
}
