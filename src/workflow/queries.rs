//! Read-only views over current contract versions. Every listing is scoped
//! to what the caller's role may see.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::mappings;
use crate::models::{AuditLog, Contract, ContractVersion, User};
use crate::roles::{Capability, Caller, Role};
use crate::schema::{contract_versions, contracts};
use crate::{audit, users};

use super::{ContractSnapshot, ContractStatus, WorkflowError, WorkflowResult};

/// Which contracts a listing is restricted to, matched on the current version.
#[derive(Debug, Clone)]
pub enum Scope {
    All,
    CreatedBy(Uuid),
    CreatedByAny(Vec<Uuid>),
    OwnedByClient(Uuid),
    /// Contracts for `client` authored by one of `authors`.
    RoutedToClient { client: Uuid, authors: Vec<Uuid> },
}

#[derive(Debug, Clone)]
pub struct ContractDetail {
    pub contract: Contract,
    pub current: ContractVersion,
    pub history: Vec<ContractVersion>,
    pub audit: Vec<AuditLog>,
}

/// Pending contracts the caller is expected to look at: a finance reviewer
/// sees those authored by the legal users mapped to them, a client sees
/// pending contracts written for them by the legal users mapped to them.
pub fn approval_queue(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<ContractSnapshot>> {
    caller.require(Capability::ViewApprovalQueue)?;

    let scope = match caller.role {
        Role::FinanceReviewer => {
            Scope::CreatedByAny(mappings::resolve_legal_users_for_finance(conn, caller.user_id)?)
        }
        _ => Scope::RoutedToClient {
            client: caller.user_id,
            authors: mappings::resolve_legal_users_for_client(conn, caller.user_id)?,
        },
    };
    load_current(conn, scope, Some(ContractStatus::PendingApproval))
}

pub fn my_contracts(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<ContractSnapshot>> {
    caller.require(Capability::ViewOwnContracts)?;
    load_current(conn, Scope::CreatedBy(caller.user_id), None)
}

pub fn all_active(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<ContractSnapshot>> {
    caller.require(Capability::ViewActiveContracts)?;

    let scope = match caller.role {
        Role::SuperAdmin => Scope::All,
        _ => Scope::OwnedByClient(caller.user_id),
    };
    load_current(conn, scope, Some(ContractStatus::Approved))
}

pub fn mapped_clients(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<User>> {
    caller.require(Capability::ViewMappedClients)?;
    mappings::resolve_mapped_clients(conn, caller.user_id)
}

/// Every contract the caller may see, in any status.
pub fn visible_contracts(
    conn: &mut PgConnection,
    caller: &Caller,
) -> WorkflowResult<Vec<ContractSnapshot>> {
    let scope = visibility_scope(conn, caller)?;
    load_current(conn, scope, None)
}

pub fn contract_detail(
    conn: &mut PgConnection,
    caller: &Caller,
    contract_id: Uuid,
) -> WorkflowResult<ContractDetail> {
    caller.require(Capability::ViewContract)?;

    let (contract, current): (Contract, ContractVersion) = contracts::table
        .inner_join(
            contract_versions::table.on(contract_versions::id.eq(contracts::current_version_id)),
        )
        .filter(contracts::id.eq(contract_id))
        .select((Contract::as_select(), ContractVersion::as_select()))
        .first(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::NotFound(format!("contract {contract_id} not found")))?;

    let visible = match visibility_scope(conn, caller)? {
        Scope::All => true,
        Scope::CreatedBy(id) => current.creator_id == id,
        Scope::CreatedByAny(ids) => ids.contains(&current.creator_id),
        Scope::OwnedByClient(id) => contract.client_id == id,
        Scope::RoutedToClient { client, authors } => {
            contract.client_id == client && authors.contains(&current.creator_id)
        }
    };
    if !visible {
        return Err(WorkflowError::Authorization(
            "you are not allowed to view this contract".into(),
        ));
    }

    let history = contract_versions::table
        .filter(contract_versions::contract_id.eq(contract_id))
        .order(contract_versions::version_number.asc())
        .select(ContractVersion::as_select())
        .load(conn)?;
    let audit = audit::list_for_contract(conn, contract_id)?;

    Ok(ContractDetail {
        contract,
        current,
        history,
        audit,
    })
}

pub fn visibility_scope(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Scope> {
    let scope = match caller.role {
        Role::SuperAdmin => Scope::All,
        Role::LegalUser => Scope::CreatedBy(caller.user_id),
        Role::FinanceReviewer => {
            Scope::CreatedByAny(mappings::resolve_legal_users_for_finance(conn, caller.user_id)?)
        }
        Role::Client => Scope::OwnedByClient(caller.user_id),
    };
    Ok(scope)
}

/// Loads contracts joined with their current version, oldest first.
pub fn load_current(
    conn: &mut PgConnection,
    scope: Scope,
    status: Option<ContractStatus>,
) -> WorkflowResult<Vec<ContractSnapshot>> {
    let mut query = contracts::table
        .inner_join(
            contract_versions::table.on(contract_versions::id.eq(contracts::current_version_id)),
        )
        .select((Contract::as_select(), ContractVersion::as_select()))
        .order((contracts::created_at.asc(), contracts::id.asc()))
        .into_boxed();

    query = match scope {
        Scope::All => query,
        Scope::CreatedBy(id) => query.filter(contract_versions::creator_id.eq(id)),
        Scope::CreatedByAny(ids) => {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query.filter(contract_versions::creator_id.eq_any(ids))
        }
        Scope::OwnedByClient(id) => query.filter(contracts::client_id.eq(id)),
        Scope::RoutedToClient { client, authors } => {
            if authors.is_empty() {
                return Ok(Vec::new());
            }
            query
                .filter(contracts::client_id.eq(client))
                .filter(contract_versions::creator_id.eq_any(authors))
        }
    };
    if let Some(status) = status {
        query = query.filter(contract_versions::status.eq(status.as_str()));
    }

    let rows: Vec<(Contract, ContractVersion)> = query.load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(contract, version)| ContractSnapshot { contract, version })
        .collect())
}

/// Username lookup for the users referenced by a set of snapshots.
pub fn usernames_for(
    conn: &mut PgConnection,
    snapshots: &[ContractSnapshot],
) -> WorkflowResult<std::collections::HashMap<Uuid, String>> {
    let mut ids: Vec<Uuid> = snapshots
        .iter()
        .flat_map(|s| [s.contract.client_id, s.version.creator_id])
        .collect();
    ids.sort();
    ids.dedup();
    users::usernames(conn, ids)
}
