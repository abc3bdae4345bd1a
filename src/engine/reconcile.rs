//! Loan state transitions: approval, repayment and closure.

use chrono::{Days, NaiveDate};

use super::{EngineError, RequestError};
use crate::Amount;
use crate::model::{Loan, LoanStatus, Payment, PaymentStatus};
use crate::schedule;

/// What a successful repayment did to the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repayment {
    /// The head installment was paid exactly as scheduled.
    Settled { installment: usize },
    /// The head installment was paid off-schedule and the tail was re-spread.
    Rescheduled { installment: usize, tail: usize },
    /// The balance reached zero; the loan is now `Paid`.
    Closed { installment: Option<usize> },
}

impl Loan {
    /// `Pending -> Approved`.
    pub(crate) fn approve(&mut self) -> Result<(), EngineError> {
        self.expect_status(LoanStatus::Pending)?;
        self.status = LoanStatus::Approved;
        Ok(())
    }

    /// Apply a tendered payment made on `date`.
    ///
    /// Nothing is modified when an error is returned.
    pub(crate) fn repay(&mut self, amount: Amount, date: NaiveDate) -> Result<Repayment, EngineError> {
        self.expect_status(LoanStatus::Approved)?;

        let balance = self.remaining_balance - amount;
        let head = self.head_position();

        if !balance.is_positive() {
            self.remaining_balance = balance;
            self.close(head, amount);
            return Ok(Repayment::Closed { installment: head });
        }

        let head = head.ok_or(EngineError::ScheduleExhausted(self.id, self.remaining_balance))?;
        if self.payments[head].amount == amount {
            self.remaining_balance = balance;
            self.payments[head].status = PaymentStatus::Paid;
            return Ok(Repayment::Settled { installment: head });
        }

        let tail = self.rescheduled_tail(head, balance, date)?;
        let left = tail.len();
        self.remaining_balance = balance;
        let installment = &mut self.payments[head];
        installment.amount = amount;
        installment.status = PaymentStatus::Paid;
        self.payments.truncate(head + 1);
        self.payments.extend(tail);

        Ok(Repayment::Rescheduled {
            installment: head,
            tail: left,
        })
    }

    /// Settle the head installment (if any) with `amount`, drop every later
    /// installment and mark the loan paid.
    fn close(&mut self, head: Option<usize>, amount: Amount) {
        if let Some(head) = head {
            let installment = &mut self.payments[head];
            installment.amount = amount;
            installment.status = PaymentStatus::Paid;
            self.payments.truncate(head + 1);
        }
        self.status = LoanStatus::Paid;
    }

    /// Fresh schedule for `balance` to follow `head`, spread over the
    /// installments left in the original term.
    ///
    /// When the original term is used up the balance becomes a single
    /// installment, so the loan always keeps something to repay against.
    fn rescheduled_tail(
        &self,
        head: usize,
        balance: Amount,
        paid_on: NaiveDate,
    ) -> Result<Vec<Payment>, EngineError> {
        let left = (self.term as usize).saturating_sub(head + 1).max(1);
        let head_due = self.payments[head].due_date;

        // the new tail must still fall strictly after the installment just paid
        let anchor = match paid_on.checked_add_days(Days::new(u64::from(self.cadence_days))) {
            Some(first_due) if first_due > head_due => paid_on,
            _ => head_due,
        };

        schedule::generate(
            balance,
            u32::try_from(left).unwrap_or(u32::MAX),
            anchor,
            self.cadence_days,
        )
        .map_err(|e| RequestError::from(e).into())
    }

    fn expect_status(&self, expected: LoanStatus) -> Result<(), EngineError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(EngineError::NotEligible(self.id, self.status, expected))
        }
    }
}
