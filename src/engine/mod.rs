//! Loan processing engine.
//!
//! The engine creates loans with their installment schedule, approves them and
//! reconciles repayments against the schedule, closing loans once their
//! balance is paid off. Also supports an async stream of commands.

use chrono::NaiveDate;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::Amount;
use crate::config::EngineConfig;
use crate::model::{Command, Loan, LoanId, LoanStatus, OwnerKey};
use crate::repository::{InMemoryLoans, LoanRepository};
use crate::schedule;

mod error;
pub use error::{EngineError, RequestError};

mod reconcile;
pub use reconcile::Repayment;

mod handle;
pub use handle::EngineHandle;

/// The loan processing engine.
///
/// Every operation looks a loan up, works on a copy and writes it back only
/// once the whole transition succeeded.
pub struct Engine<R = InMemoryLoans> {
    loans: R,
    config: EngineConfig,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_repository(InMemoryLoans::new(), config)
    }
}

/// Public API
impl<R: LoanRepository> Engine<R> {
    pub fn with_repository(loans: R, config: EngineConfig) -> Self {
        Self { loans, config }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Run the engine with the given command stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = Command> + Unpin) {
        while let Some(command) = stream.next().await {
            // a rejected command must not stop the engine, it is only logged
            let _ = self.apply(command);
        }
    }

    /// Return every loan in identifier order.
    pub fn loans(&self) -> impl Iterator<Item = &Loan> {
        self.loans.iter()
    }

    /// Return the loan `loan` if it belongs to `owner`.
    pub fn find_by_id(&self, loan: LoanId, owner: &str) -> Option<&Loan> {
        self.loans.get(loan).filter(|l| l.owner == owner)
    }

    /// Loans awaiting approval.
    pub fn list_pending(&self) -> impl Iterator<Item = &Loan> {
        self.loans
            .iter()
            .filter(|loan| loan.status == LoanStatus::Pending)
    }

    pub fn list_by_owner<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a Loan> {
        self.loans.iter().filter(move |loan| loan.owner == owner)
    }

    /// Apply a single command on top of the current engine state
    pub fn apply(&mut self, command: Command) -> Result<Loan, EngineError> {
        match command {
            Command::Create {
                owner,
                principal,
                term,
                start_date,
            } => {
                let result = self.create_loan(owner, principal, term, start_date);
                let id = result.as_ref().map(Loan::id).unwrap_or_default();
                Self::log_result("create", id, Some(principal), &result);
                result
            }
            Command::Approve { loan } => {
                let result = self.approve(loan);
                Self::log_result("approve", loan, None, &result);
                result
            }
            Command::Repay {
                loan,
                owner,
                amount,
                date,
            } => {
                let result = self.repay(loan, &owner, amount, date);
                Self::log_result("repay", loan, Some(amount), &result);
                result
            }
        }
    }

    /// Register a new pending loan for `owner` with its full schedule.
    pub fn create_loan(
        &mut self,
        owner: impl Into<OwnerKey>,
        principal: Amount,
        term: u32,
        start_date: NaiveDate,
    ) -> Result<Loan, EngineError> {
        if !principal.is_positive() {
            return Err(RequestError::NonPositivePrincipal(principal).into());
        }
        if principal > Amount::MAX {
            return Err(RequestError::AmountOutOfRange(principal).into());
        }
        if term == 0 {
            return Err(RequestError::ZeroTerm.into());
        }

        let cadence_days = self.config.cadence_days();
        let payments = schedule::generate(principal, term, start_date, cadence_days)
            .map_err(RequestError::from)?;
        let loan = Loan {
            id: self.loans.next_id(),
            owner: owner.into(),
            principal,
            remaining_balance: principal,
            start_date,
            status: LoanStatus::Pending,
            cadence_days,
            term,
            payments,
        };
        self.loans.upsert(loan.clone());

        Ok(loan)
    }

    /// Approve a pending loan.
    pub fn approve(&mut self, loan: LoanId) -> Result<Loan, EngineError> {
        self.update(loan, None, Loan::approve)
    }

    /// Apply a repayment of `amount`, made on `date`, by `owner`:
    /// - Ensure the loan exists, belongs to `owner` and is approved
    /// - Close the loan if the balance is paid off
    /// - Otherwise settle the head installment, re-spreading the balance over
    ///   the rest of the term when `amount` differs from what was scheduled
    pub fn repay(
        &mut self,
        loan: LoanId,
        owner: &str,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<Loan, EngineError> {
        if !amount.is_positive() {
            return Err(RequestError::NonPositiveTender(amount).into());
        }
        if amount > Amount::MAX {
            return Err(RequestError::AmountOutOfRange(amount).into());
        }

        self.update(loan, Some(owner), |l| {
            let outcome = l.repay(amount, date);
            match &outcome {
                Ok(repayment) => {
                    debug!(loan = l.id, balance = %l.remaining_balance, ?repayment, "repayment reconciled")
                }
                Err(EngineError::ScheduleExhausted(id, balance)) => {
                    warn!(loan = id, balance = %balance, "no pending installment left for outstanding balance")
                }
                Err(_) => {}
            }
            outcome.map(|_| ())
        })
    }
}

/// Private API
impl<R: LoanRepository> Engine<R> {
    /// Small helper to log `apply` results
    fn log_result<E: std::fmt::Display>(
        command: &str,
        loan: LoanId,
        amount: Option<Amount>,
        result: &Result<Loan, E>,
    ) {
        match (result, amount) {
            (Ok(l), Some(amt)) => {
                info!(
                    loan = %loan,
                    amount = %amt,
                    status = %l.status,
                    balance = %l.remaining_balance,
                    "{command} applied"
                );
            }
            (Ok(l), None) => {
                info!(
                    loan = %loan,
                    status = %l.status,
                    "{command} applied"
                );
            }
            (Err(e), Some(amt)) => {
                info!(
                    loan = %loan,
                    amount = %amt,
                    reason = %e,
                    "{command} skipped"
                );
            }
            (Err(e), None) => {
                info!(
                    loan = %loan,
                    reason = %e,
                    "{command} skipped"
                );
            }
        }
    }

    /// Run `transition` on a copy of loan `id` and store it on success.
    ///
    /// A loan owned by someone other than `owner` is reported as not found.
    fn update(
        &mut self,
        id: LoanId,
        owner: Option<&str>,
        transition: impl FnOnce(&mut Loan) -> Result<(), EngineError>,
    ) -> Result<Loan, EngineError> {
        if id == 0 {
            return Err(RequestError::ZeroLoanId.into());
        }

        let mut loan = self
            .loans
            .get(id)
            .filter(|l| owner.is_none_or(|owner| l.owner == owner))
            .cloned()
            .ok_or(EngineError::NotFound(id))?;

        transition(&mut loan)?;
        self.loans.upsert(loan.clone());

        Ok(loan)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
