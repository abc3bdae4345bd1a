use chrono::{Days, NaiveDate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use loan_eng::{Amount, Command, Engine, LoanId};

const TERM: u32 = 12;

/// Generates valid command sequences for benchmarking.
///
/// Per loan:
/// 1. Create 1200.00 over 12 installments
/// 2. Approve
/// 3. `repayments` repayments of either exactly 100.00 or, every
///    `mismatch_every`-th one, 90.00 (which reschedules the tail)
///
/// Tenders stay below the balance, so no loan is closed early.
pub struct CommandGenerator {
    num_loans: LoanId,
    repayments: u32,
    mismatch_every: u32,
    current_loan: LoanId,
    current_step: u32,
    start: NaiveDate,
}

impl CommandGenerator {
    pub fn new(num_loans: LoanId, repayments: u32, mismatch_every: u32) -> Self {
        assert!(repayments < TERM, "repayments must leave the loan open");
        Self {
            num_loans,
            repayments,
            mismatch_every,
            current_loan: 1,
            current_step: 0,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    /// Total number of commands this generator will produce
    pub fn total_commands(&self) -> u64 {
        self.num_loans as u64 * (self.repayments as u64 + 2)
    }

    fn owner(loan: LoanId) -> String {
        format!("borrower-{loan}@example.com")
    }
}

impl Iterator for CommandGenerator {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_loan > self.num_loans {
            return None;
        }

        let loan = self.current_loan;
        let command = match self.current_step {
            0 => Command::Create {
                owner: Self::owner(loan),
                principal: Amount::from_scaled(120_000), // 1200.00
                term: TERM,
                start_date: self.start,
            },
            1 => Command::Approve { loan },
            step => {
                let repayment = step - 1;
                let mismatched = self.mismatch_every > 0 && repayment % self.mismatch_every == 0;
                Command::Repay {
                    loan,
                    owner: Self::owner(loan),
                    amount: if mismatched {
                        Amount::from_scaled(9_000) // 90.00
                    } else {
                        Amount::from_scaled(10_000) // 100.00
                    },
                    date: self.start + Days::new(7 * u64::from(repayment)),
                }
            }
        };

        self.current_step += 1;

        // Move to next loan after all of its repayments
        if self.current_step >= self.repayments + 2 {
            self.current_step = 0;
            self.current_loan += 1;
        }

        Some(command)
    }
}

fn bench_exact_repayments(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_repayments");

    for loans in [1_000u32, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(loans), &loans, |b, &loans| {
            b.iter(|| {
                let mut engine = Engine::new();
                for command in CommandGenerator::new(loans, 10, 0) {
                    let _ = black_box(engine.apply(command));
                }
                engine
            });
        });
    }

    group.finish();
}

fn bench_rescheduling(c: &mut Criterion) {
    let mut group = c.benchmark_group("rescheduling");

    // how often a repayment misses the scheduled amount
    for mismatch_every in [1u32, 3, 10] {
        let generator = CommandGenerator::new(10_000, 10, mismatch_every);
        let label = format!("every_{}_of_{}", mismatch_every, generator.total_commands());
        group.bench_with_input(
            BenchmarkId::from_parameter(&label),
            &mismatch_every,
            |b, &mismatch_every| {
                b.iter(|| {
                    let mut engine = Engine::new();
                    for command in CommandGenerator::new(10_000, 10, mismatch_every) {
                        let _ = black_box(engine.apply(command));
                    }
                    engine
                });
            },
        );
    }

    group.finish();
}

fn bench_long_schedules(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_schedules");
    group.sample_size(10);

    // a mismatched head early in a long schedule regenerates almost all of it
    group.bench_function("360_installments", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            for loan in 1..=1_000u32 {
                let owner = format!("borrower-{loan}@example.com");
                let _ = engine.create_loan(owner.clone(), Amount::from_scaled(3_600_000), 360, start);
                let _ = engine.approve(loan);
                for week in 1..=5u64 {
                    let _ = black_box(engine.repay(
                        loan,
                        &owner,
                        Amount::from_scaled(9_999),
                        start + Days::new(7 * week),
                    ));
                }
            }
            engine
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_exact_repayments,
    bench_rescheduling,
    bench_long_schedules,
);

criterion_main!(benches);
