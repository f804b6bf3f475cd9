//! Append-only audit trail. Entries are written inside the same transaction
//! as the change they describe; reads return insertion order.

use std::fmt;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::models::{AuditLog, NewAuditLog};
use crate::roles::{Capability, Caller};
use crate::schema::{audit_logs, users};
use crate::workflow::WorkflowResult;

pub const SYSTEM_ACTOR_ROLE: &str = "SYSTEM";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    CreateUser,
    CreateMapping,
    CreateContract,
    EditContract,
    Submit,
    Approve,
    Reject,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::CreateUser => "CREATE_USER",
            AuditAction::CreateMapping => "CREATE_MAPPING",
            AuditAction::CreateContract => "CREATE_CONTRACT",
            AuditAction::EditContract => "EDIT_CONTRACT",
            AuditAction::Submit => "SUBMIT",
            AuditAction::Approve => "APPROVE",
            AuditAction::Reject => "REJECT",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct AuditEntry<'a> {
    /// `None` for actions taken by the system itself, e.g. bootstrap seeding.
    pub actor: Option<&'a Caller>,
    pub action: AuditAction,
    pub remarks: String,
    pub contract_id: Option<Uuid>,
    pub version_id: Option<Uuid>,
}

impl<'a> AuditEntry<'a> {
    pub fn new(actor: Option<&'a Caller>, action: AuditAction, remarks: impl Into<String>) -> Self {
        Self {
            actor,
            action,
            remarks: remarks.into(),
            contract_id: None,
            version_id: None,
        }
    }

    pub fn subject(mut self, contract_id: Uuid, version_id: Uuid) -> Self {
        self.contract_id = Some(contract_id);
        self.version_id = Some(version_id);
        self
    }
}

/// Audit entry joined with the actor's username for display.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub entry: AuditLog,
    pub actor_username: Option<String>,
}

pub fn record(conn: &mut PgConnection, entry: AuditEntry<'_>) -> WorkflowResult<AuditLog> {
    let new_entry = NewAuditLog {
        actor_id: entry.actor.map(|caller| caller.user_id),
        actor_role: entry
            .actor
            .map(|caller| caller.role.as_str())
            .unwrap_or(SYSTEM_ACTOR_ROLE)
            .to_string(),
        action: entry.action.as_str().to_string(),
        remarks: entry.remarks,
        contract_id: entry.contract_id,
        version_id: entry.version_id,
    };

    let stored = diesel::insert_into(audit_logs::table)
        .values(&new_entry)
        .returning(AuditLog::as_returning())
        .get_result(conn)?;
    Ok(stored)
}

pub fn list(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<AuditRecord>> {
    caller.require(Capability::ViewAuditLog)?;

    let rows: Vec<(AuditLog, Option<String>)> = audit_logs::table
        .left_join(users::table)
        .select((AuditLog::as_select(), users::username.nullable()))
        .order(audit_logs::id.asc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(entry, actor_username)| AuditRecord {
            entry,
            actor_username,
        })
        .collect())
}

pub fn list_for_contract(conn: &mut PgConnection, contract_id: Uuid) -> WorkflowResult<Vec<AuditLog>> {
    let rows = audit_logs::table
        .filter(audit_logs::contract_id.eq(contract_id))
        .order(audit_logs::id.asc())
        .select(AuditLog::as_select())
        .load(conn)?;
    Ok(rows)
}
