//! Installment schedule generation.

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::Amount;
use crate::model::Payment;

/// Inputs for which no schedule can be represented.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("cadence must be at least one day")]
    ZeroCadence,

    #[error("installment {installment} falls due after the last representable date")]
    DateOutOfRange { installment: u64 },

    #[error("installments of {0} overflow the amount range")]
    AmountOutOfRange(Amount),
}

/// Spread `principal` over `term` pending installments, `cadence_days` apart.
///
/// The first installment falls due one cadence after `start_date`. Each
/// installment gets `principal / term` rounded to the cent, and the rounding
/// residual is folded into the first one so the schedule sums to `principal`
/// exactly. A zero `term` yields an empty schedule.
pub fn generate(
    principal: Amount,
    term: u32,
    start_date: NaiveDate,
    cadence_days: u32,
) -> Result<Vec<Payment>, ScheduleError> {
    if cadence_days == 0 {
        return Err(ScheduleError::ZeroCadence);
    }
    if term == 0 {
        return Ok(Vec::new());
    }

    let installment = principal.split(term);
    let mut payments = (1..=u64::from(term))
        .map(|i| {
            let offset = Days::new(i * u64::from(cadence_days));
            start_date
                .checked_add_days(offset)
                .map(|due_date| Payment::new(due_date, installment))
                .ok_or(ScheduleError::DateOutOfRange { installment: i })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let out_of_range = || ScheduleError::AmountOutOfRange(principal);
    let scheduled = payments
        .iter()
        .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.amount))
        .ok_or_else(out_of_range)?;
    let residual = principal.checked_sub(scheduled).ok_or_else(out_of_range)?;
    if residual != Amount::ZERO {
        let first = &mut payments[0].amount;
        *first = first.checked_add(residual).ok_or_else(out_of_range)?;
    }

    Ok(payments)
}
