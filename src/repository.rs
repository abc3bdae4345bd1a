//! Loan storage.
//!
//! The engine only needs identifier assignment, lookup by id or predicate and
//! whole-record replacement, so any store offering those can back it.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::model::{Loan, LoanId};

pub trait LoanRepository {
    /// Reserve a fresh identifier. Identifiers start at 1 and are never reused.
    fn next_id(&self) -> LoanId;

    fn get(&self, id: LoanId) -> Option<&Loan>;

    /// Insert `loan`, or replace the stored loan with the same id.
    fn upsert(&mut self, loan: Loan);

    /// All loans in identifier order.
    fn iter(&self) -> impl Iterator<Item = &Loan>;

    /// First loan, in identifier order, matching `predicate`.
    fn find(&self, predicate: impl Fn(&Loan) -> bool) -> Option<&Loan> {
        self.iter().find(|&loan| predicate(loan))
    }
}

/// Arena of loans indexed by `id - 1`.
#[derive(Debug, Default)]
pub struct InMemoryLoans {
    slots: Vec<Option<Loan>>,
    last_id: AtomicU32,
}

impl InMemoryLoans {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(id: LoanId) -> Option<usize> {
        id.checked_sub(1).map(|index| index as usize)
    }
}

impl LoanRepository for InMemoryLoans {
    fn next_id(&self) -> LoanId {
        self.last_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn get(&self, id: LoanId) -> Option<&Loan> {
        Self::slot(id)
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    fn upsert(&mut self, loan: Loan) {
        let Some(index) = Self::slot(loan.id) else {
            return;
        };
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        // keep the counter ahead of ids assigned elsewhere
        self.last_id.fetch_max(loan.id, Ordering::Relaxed);
        self.slots[index] = Some(loan);
    }

    fn iter(&self) -> impl Iterator<Item = &Loan> {
        self.slots.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Amount;
    use crate::model::LoanStatus;
    use chrono::NaiveDate;

    fn loan(id: LoanId, owner: &str) -> Loan {
        Loan {
            id,
            owner: owner.to_string(),
            principal: Amount::from_scaled(10_000),
            remaining_balance: Amount::from_scaled(10_000),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            status: LoanStatus::Pending,
            cadence_days: 7,
            term: 1,
            payments: Vec::new(),
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let repo = InMemoryLoans::new();
        assert_eq!(repo.next_id(), 1);
        assert_eq!(repo.next_id(), 2);
        assert_eq!(repo.next_id(), 3);
    }

    #[test]
    fn upsert_then_get() {
        let mut repo = InMemoryLoans::new();
        let id = repo.next_id();
        repo.upsert(loan(id, "alice"));

        assert_eq!(repo.get(id).map(Loan::owner), Some("alice"));
        assert_eq!(repo.len(), 1);
        assert!(repo.get(0).is_none());
        assert!(repo.get(2).is_none());
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut repo = InMemoryLoans::new();
        repo.upsert(loan(1, "alice"));
        repo.upsert(loan(2, "bob"));

        let mut updated = loan(1, "alice");
        updated.status = LoanStatus::Approved;
        repo.upsert(updated);

        assert_eq!(repo.len(), 2);
        assert_eq!(repo.get(1).unwrap().status(), LoanStatus::Approved);
        let ids: Vec<_> = repo.iter().map(Loan::id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn upsert_with_gap_keeps_counter_ahead() {
        let mut repo = InMemoryLoans::new();
        repo.upsert(loan(5, "carol"));

        assert_eq!(repo.len(), 1);
        assert!(repo.get(3).is_none());
        assert_eq!(repo.next_id(), 6);
    }

    #[test]
    fn find_by_predicate_returns_first_match() {
        let mut repo = InMemoryLoans::new();
        repo.upsert(loan(1, "alice"));
        repo.upsert(loan(2, "bob"));
        repo.upsert(loan(3, "bob"));

        assert_eq!(repo.find(|l| l.owner() == "bob").map(Loan::id), Some(2));
        assert!(repo.find(|l| l.owner() == "dave").is_none());
    }

    #[test]
    fn zero_id_is_ignored() {
        let mut repo = InMemoryLoans::new();
        repo.upsert(loan(0, "nobody"));
        assert!(repo.is_empty());
    }
}
