pub mod amount;
pub mod config;
pub mod csv;
pub mod engine;
pub mod model;
pub mod repository;
pub mod schedule;

pub use amount::Amount;
pub use config::EngineConfig;
pub use engine::{Engine, EngineError, EngineHandle};
pub use model::{Command, Loan, LoanId, LoanStatus, OwnerKey, Payment, PaymentStatus};
pub use repository::{InMemoryLoans, LoanRepository};
