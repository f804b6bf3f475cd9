//! State-changing workflow operations.
//!
//! Every operation runs in one transaction: the contract row is locked with
//! `SELECT ... FOR UPDATE`, the current version is checked against the status
//! machine, the change is written and the audit entry appended. Two
//! transitions on the same contract therefore serialize, while different
//! contracts never contend.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntry};
use crate::mappings;
use crate::models::{Contract, ContractVersion, NewContract, NewContractVersion};
use crate::roles::{Capability, Caller};
use crate::schema::{contract_versions, contracts};

use super::{ContractSnapshot, ContractStatus, Transition, WorkflowError, WorkflowResult};

const INITIAL_VERSION_REMARKS: &str = "Initial version";
/// Matches the `VARCHAR(255)` contract name column.
const MAX_NAME_CHARS: usize = 255;
/// `NUMERIC(19, 2)` leaves 17 integer digits.
const AMOUNT_LIMIT: i64 = 100_000_000_000_000_000;

#[derive(Debug, Clone)]
pub struct ContractInput {
    pub contract_name: String,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
}

pub fn create_contract(
    conn: &mut PgConnection,
    caller: &Caller,
    client_id: Uuid,
    input: ContractInput,
) -> WorkflowResult<ContractSnapshot> {
    caller.require(Capability::CreateContract)?;
    let contract_name = validate_input(&input)?;

    conn.transaction::<ContractSnapshot, WorkflowError, _>(|conn| {
        let mapped = mappings::resolve_mapped_clients(conn, caller.user_id)?;
        if mapped.is_empty() {
            return Err(WorkflowError::Authorization(
                "no approval mapping found for you; ask an administrator to set one up".into(),
            ));
        }
        if !mapped.iter().any(|client| client.id == client_id) {
            return Err(WorkflowError::Authorization(format!(
                "you do not have an approval mapping for client {client_id}"
            )));
        }

        let contract_id = Uuid::new_v4();
        let version_id = Uuid::new_v4();

        let contract = diesel::insert_into(contracts::table)
            .values(&NewContract {
                id: contract_id,
                contract_name,
                client_id,
                effective_date: input.effective_date,
                contract_amount: input.contract_amount,
                current_version_id: version_id,
            })
            .returning(Contract::as_returning())
            .get_result(conn)?;

        let version = diesel::insert_into(contract_versions::table)
            .values(&NewContractVersion {
                id: version_id,
                contract_id,
                version_number: 1,
                status: ContractStatus::Draft.as_str().to_string(),
                creator_id: caller.user_id,
                remarks: Some(INITIAL_VERSION_REMARKS.to_string()),
            })
            .returning(ContractVersion::as_returning())
            .get_result(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                Some(caller),
                AuditAction::CreateContract,
                format!("Contract created: {}", contract.contract_name),
            )
            .subject(contract.id, version.id),
        )?;

        info!(contract_id = %contract.id, actor = %caller.user_id, "contract created");
        Ok(ContractSnapshot { contract, version })
    })
}

/// Replaces the content of a DRAFT or REJECTED contract in place. The version
/// number and status are left untouched.
pub fn edit_contract(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
    input: ContractInput,
) -> WorkflowResult<ContractSnapshot> {
    caller.require(Capability::EditContract)?;

    conn.transaction::<ContractSnapshot, WorkflowError, _>(|conn| {
        let (contract, version) = lock_current(conn, contract_id)?;

        if version.creator_id != caller.user_id {
            return Err(refuse(
                contract_id,
                caller,
                WorkflowError::Authorization("only the author may edit this contract".into()),
            ));
        }
        let status: ContractStatus = version.status.parse()?;
        if !status.is_editable() {
            let message = if status.is_terminal() {
                format!("contract is {status} and can no longer be changed")
            } else {
                format!("contract can only be edited in DRAFT or REJECTED state, not {status}")
            };
            return Err(refuse(
                contract_id,
                caller,
                WorkflowError::InvalidState(message),
            ));
        }
        let contract_name = validate_input(&input)?;

        let contract = diesel::update(contracts::table.find(contract.id))
            .set((
                contracts::contract_name.eq(contract_name),
                contracts::effective_date.eq(input.effective_date),
                contracts::contract_amount.eq(input.contract_amount),
                contracts::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(Contract::as_returning())
            .get_result(conn)?;

        audit::record(
            conn,
            AuditEntry::new(
                Some(caller),
                AuditAction::EditContract,
                format!(
                    "Contract {} updated in {status} state (version {})",
                    contract.contract_name, version.version_number
                ),
            )
            .subject(contract.id, version.id),
        )?;

        info!(contract_id = %contract.id, actor = %caller.user_id, "contract edited");
        Ok(ContractSnapshot { contract, version })
    })
}

pub fn submit(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
) -> WorkflowResult<ContractSnapshot> {
    caller.require(Capability::SubmitContract)?;

    conn.transaction::<ContractSnapshot, WorkflowError, _>(|conn| {
        let (contract, version) = lock_current(conn, contract_id)?;
        let status: ContractStatus = version.status.parse()?;
        let next = status
            .apply(Transition::Submit)
            .map_err(|err| refuse(contract_id, caller, err))?;

        if version.creator_id != caller.user_id {
            return Err(refuse(
                contract_id,
                caller,
                WorkflowError::Authorization("only the author may submit this contract".into()),
            ));
        }

        let version = set_status(conn, &version, next, RemarksUpdate::Keep)?;
        audit::record(
            conn,
            AuditEntry::new(
                Some(caller),
                AuditAction::Submit,
                format!("Contract {} submitted for approval", contract.contract_name),
            )
            .subject(contract.id, version.id),
        )?;

        info!(contract_id = %contract.id, actor = %caller.user_id, from = %status, to = %next, "contract submitted");
        Ok(ContractSnapshot { contract, version })
    })
}

/// Approves a pending contract. Remarks are optional; blank or absent remarks
/// clear whatever the version carried before.
pub fn approve(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
    remarks: Option<&str>,
) -> WorkflowResult<ContractSnapshot> {
    review(conn, caller, contract_id, Transition::Approve, remarks)
}

/// Rejects a pending contract back to its author. Remarks are mandatory.
pub fn reject(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
    remarks: Option<&str>,
) -> WorkflowResult<ContractSnapshot> {
    review(conn, caller, contract_id, Transition::Reject, remarks)
}

fn review(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
    transition: Transition,
    remarks: Option<&str>,
) -> WorkflowResult<ContractSnapshot> {
    caller.require(Capability::ReviewContract)?;
    let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());

    conn.transaction::<ContractSnapshot, WorkflowError, _>(|conn| {
        let (contract, version) = lock_current(conn, contract_id)?;
        let status: ContractStatus = version.status.parse()?;
        let next = status
            .apply(transition)
            .map_err(|err| refuse(contract_id, caller, err))?;

        let reviewer = mappings::resolve_finance_reviewer(conn, version.creator_id)?;
        if reviewer != Some(caller.user_id) {
            return Err(refuse(
                contract_id,
                caller,
                WorkflowError::Authorization(
                    "you are not the finance reviewer mapped to this contract's author".into(),
                ),
            ));
        }

        let (action, summary) = if transition == Transition::Reject {
            if remarks.is_none() {
                return Err(WorkflowError::Validation(
                    "remarks are required when rejecting a contract".into(),
                ));
            }
            (AuditAction::Reject, "rejected")
        } else {
            (AuditAction::Approve, "approved")
        };

        let version = set_status(conn, &version, next, RemarksUpdate::Replace(remarks))?;
        audit::record(
            conn,
            AuditEntry::new(
                Some(caller),
                action,
                match remarks {
                    Some(remarks) => format!(
                        "Contract {} {summary}. Remarks: {remarks}",
                        contract.contract_name
                    ),
                    None => format!("Contract {} {summary}", contract.contract_name),
                },
            )
            .subject(contract.id, version.id),
        )?;

        info!(contract_id = %contract.id, actor = %caller.user_id, to = %next, "contract reviewed");
        Ok(ContractSnapshot { contract, version })
    })
}

/// Locks the contract row and loads its current version.
fn lock_current(
    conn: &mut PgConnection,
    contract_id: Uuid,
) -> WorkflowResult<(Contract, ContractVersion)> {
    let contract: Contract = contracts::table
        .find(contract_id)
        .select(Contract::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::NotFound(format!("contract {contract_id} not found")))?;

    let version = contract_versions::table
        .find(contract.current_version_id)
        .select(ContractVersion::as_select())
        .first(conn)?;

    Ok((contract, version))
}

/// What a status change does to the version's remarks.
#[derive(Debug, Clone, Copy)]
enum RemarksUpdate<'a> {
    Keep,
    Replace(Option<&'a str>),
}

fn set_status(
    conn: &mut PgConnection,
    version: &ContractVersion,
    status: ContractStatus,
    remarks: RemarksUpdate<'_>,
) -> WorkflowResult<ContractVersion> {
    let now = Utc::now().naive_utc();
    let target = contract_versions::table.find(version.id);
    let updated = match remarks {
        RemarksUpdate::Replace(remarks) => diesel::update(target)
            .set((
                contract_versions::status.eq(status.as_str()),
                contract_versions::remarks.eq(remarks),
                contract_versions::updated_at.eq(now),
            ))
            .returning(ContractVersion::as_returning())
            .get_result(conn)?,
        RemarksUpdate::Keep => diesel::update(target)
            .set((
                contract_versions::status.eq(status.as_str()),
                contract_versions::updated_at.eq(now),
            ))
            .returning(ContractVersion::as_returning())
            .get_result(conn)?,
    };
    Ok(updated)
}

fn validate_input(input: &ContractInput) -> WorkflowResult<String> {
    let name = input.contract_name.trim();
    if name.is_empty() {
        return Err(WorkflowError::Validation(
            "contract name must not be empty".into(),
        ));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(WorkflowError::Validation(format!(
            "contract name must be at most {MAX_NAME_CHARS} characters"
        )));
    }

    let amount = &input.contract_amount;
    if *amount < BigDecimal::from(0) {
        return Err(WorkflowError::Validation(
            "contract amount must not be negative".into(),
        ));
    }
    if *amount >= BigDecimal::from(AMOUNT_LIMIT) {
        return Err(WorkflowError::Validation(
            "contract amount must have at most 17 integer digits".into(),
        ));
    }
    if amount.with_scale(2) != *amount {
        return Err(WorkflowError::Validation(
            "contract amount must have at most 2 decimal places".into(),
        ));
    }
    Ok(name.to_string())
}

fn refuse(contract_id: Uuid, caller: &Caller, err: WorkflowError) -> WorkflowError {
    warn!(contract_id = %contract_id, actor = %caller.user_id, role = %caller.role, error = %err, "workflow transition refused");
    err
}
