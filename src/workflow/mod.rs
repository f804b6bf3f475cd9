//! Contract approval workflow: the status machine, the transactional engine
//! that drives it and the read-only listings built on top of it.

use thiserror::Error;

use crate::models::{Contract, ContractVersion};

pub mod engine;
pub mod queries;
pub mod status;

pub use status::{ContractStatus, Transition};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("corrupt record: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Storage(#[from] diesel::result::Error),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A contract together with its current version.
#[derive(Debug, Clone)]
pub struct ContractSnapshot {
    pub contract: Contract,
    pub version: ContractVersion,
}

impl ContractSnapshot {
    pub fn status(&self) -> WorkflowResult<ContractStatus> {
        self.version.status.parse()
    }
}
