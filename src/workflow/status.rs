use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Submit,
    Approve,
    Reject,
}

impl ContractStatus {
    pub const ALL: [ContractStatus; 4] = [
        ContractStatus::Draft,
        ContractStatus::PendingApproval,
        ContractStatus::Approved,
        ContractStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "DRAFT",
            ContractStatus::PendingApproval => "PENDING_APPROVAL",
            ContractStatus::Approved => "APPROVED",
            ContractStatus::Rejected => "REJECTED",
        }
    }

    /// Content may only change while the author holds the contract.
    pub fn is_editable(self) -> bool {
        matches!(self, ContractStatus::Draft | ContractStatus::Rejected)
    }

    pub fn is_terminal(self) -> bool {
        self == ContractStatus::Approved
    }

    pub fn apply(self, transition: Transition) -> WorkflowResult<ContractStatus> {
        let next = match (self, transition) {
            (ContractStatus::Draft | ContractStatus::Rejected, Transition::Submit) => {
                ContractStatus::PendingApproval
            }
            (ContractStatus::PendingApproval, Transition::Approve) => ContractStatus::Approved,
            (ContractStatus::PendingApproval, Transition::Reject) => ContractStatus::Rejected,
            (from, transition) => {
                return Err(WorkflowError::InvalidState(format!(
                    "cannot {} a contract in {from} state",
                    transition.verb()
                )))
            }
        };
        Ok(next)
    }
}

impl Transition {
    fn verb(self) -> &'static str {
        match self {
            Transition::Submit => "submit",
            Transition::Approve => "approve",
            Transition::Reject => "reject",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = WorkflowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContractStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| WorkflowError::Corrupt(format!("unknown contract status '{value}'")))
    }
}
