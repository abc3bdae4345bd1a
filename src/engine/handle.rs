//! Shared access to an engine running on its own task.
//!
//! The task owns the engine outright and serves one request at a time, so a
//! lookup, its state transition and the write-back are never interleaved with
//! another caller's.

use chrono::NaiveDate;
use tokio::sync::{mpsc, oneshot};

use super::{Engine, EngineError};
use crate::Amount;
use crate::model::{Command, Loan, LoanId, OwnerKey};
use crate::repository::LoanRepository;

const QUEUE_DEPTH: usize = 64;

enum Request {
    Apply(Command, oneshot::Sender<Result<Loan, EngineError>>),
    Find(LoanId, OwnerKey, oneshot::Sender<Option<Loan>>),
    ListPending(oneshot::Sender<Vec<Loan>>),
    ListByOwner(OwnerKey, oneshot::Sender<Vec<Loan>>),
}

/// Cloneable handle to an engine started with [`Engine::spawn`].
///
/// Once every handle is dropped the engine task finishes.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<Request>,
}

impl<R: LoanRepository + Send + 'static> Engine<R> {
    /// Move the engine onto a tokio task and return a handle to it.
    pub fn spawn(self) -> EngineHandle {
        let (sender, receiver) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(self.serve(receiver));
        EngineHandle { sender }
    }

    async fn serve(mut self, mut receiver: mpsc::Receiver<Request>) {
        while let Some(request) = receiver.recv().await {
            // a caller that stopped waiting for its reply is not an error
            match request {
                Request::Apply(command, reply) => {
                    let _ = reply.send(self.apply(command));
                }
                Request::Find(loan, owner, reply) => {
                    let _ = reply.send(self.find_by_id(loan, &owner).cloned());
                }
                Request::ListPending(reply) => {
                    let _ = reply.send(self.list_pending().cloned().collect());
                }
                Request::ListByOwner(owner, reply) => {
                    let _ = reply.send(self.list_by_owner(&owner).cloned().collect());
                }
            }
        }
    }
}

impl EngineHandle {
    pub async fn apply(&self, command: Command) -> Result<Loan, EngineError> {
        self.request(|reply| Request::Apply(command, reply)).await?
    }

    pub async fn create_loan(
        &self,
        owner: impl Into<OwnerKey>,
        principal: Amount,
        term: u32,
        start_date: NaiveDate,
    ) -> Result<Loan, EngineError> {
        self.apply(Command::Create {
            owner: owner.into(),
            principal,
            term,
            start_date,
        })
        .await
    }

    pub async fn approve(&self, loan: LoanId) -> Result<Loan, EngineError> {
        self.apply(Command::Approve { loan }).await
    }

    pub async fn repay(
        &self,
        loan: LoanId,
        owner: impl Into<OwnerKey>,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<Loan, EngineError> {
        self.apply(Command::Repay {
            loan,
            owner: owner.into(),
            amount,
            date,
        })
        .await
    }

    pub async fn find_by_id(
        &self,
        loan: LoanId,
        owner: impl Into<OwnerKey>,
    ) -> Result<Option<Loan>, EngineError> {
        let owner = owner.into();
        self.request(|reply| Request::Find(loan, owner, reply)).await
    }

    pub async fn list_pending(&self) -> Result<Vec<Loan>, EngineError> {
        self.request(Request::ListPending).await
    }

    pub async fn list_by_owner(
        &self,
        owner: impl Into<OwnerKey>,
    ) -> Result<Vec<Loan>, EngineError> {
        let owner = owner.into();
        self.request(|reply| Request::ListByOwner(owner, reply)).await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| EngineError::Shutdown)?;
        response.await.map_err(|_| EngineError::Shutdown)
    }
}
