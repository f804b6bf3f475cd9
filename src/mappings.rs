//! Approval mappings: (legal user, finance reviewer, client) routing triples.
//!
//! A legal user may be mapped to several clients, but all of their mappings
//! route to the same finance reviewer, so reviewer resolution is single-valued.

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntry};
use crate::models::{ApprovalMapping, NewApprovalMapping, User};
use crate::roles::{Capability, Caller, Role};
use crate::schema::{approval_mappings, users};
use crate::users::{role_of, usernames};
use crate::workflow::{WorkflowError, WorkflowResult};

/// Mapping row joined with the usernames it references.
#[derive(Debug, Clone)]
pub struct MappingRecord {
    pub mapping: ApprovalMapping,
    pub legal_username: String,
    pub finance_username: String,
    pub client_username: String,
}

pub fn create_mapping(
    conn: &mut PgConnection,
    caller: &Caller,
    legal_user_id: Uuid,
    finance_user_id: Uuid,
    client_user_id: Uuid,
) -> WorkflowResult<ApprovalMapping> {
    caller.require(Capability::ManageMappings)?;

    conn.transaction::<ApprovalMapping, WorkflowError, _>(|conn| {
        // lock the legal user so concurrent mappings see each other's routing
        let legal = users::table
            .find(legal_user_id)
            .select(User::as_select())
            .for_update()
            .first(conn)
            .optional()?;
        let legal = expect_role(legal, legal_user_id, Role::LegalUser, "legalUserId")?;
        let finance = load_user(conn, finance_user_id)?;
        let finance = expect_role(finance, finance_user_id, Role::FinanceReviewer, "financeUserId")?;
        let client = load_user(conn, client_user_id)?;
        let client = expect_role(client, client_user_id, Role::Client, "clientUserId")?;

        let existing: Vec<ApprovalMapping> = approval_mappings::table
            .filter(approval_mappings::legal_user_id.eq(legal.id))
            .select(ApprovalMapping::as_select())
            .load(conn)?;

        if existing.iter().any(|m| m.client_user_id == client.id) {
            return Err(WorkflowError::Conflict(format!(
                "{} is already mapped to client {}",
                legal.username, client.username
            )));
        }
        if let Some(other) = existing.iter().find(|m| m.finance_user_id != finance.id) {
            return Err(WorkflowError::Conflict(format!(
                "{} already routes approvals to finance reviewer {}",
                legal.username, other.finance_user_id
            )));
        }

        let new_mapping = NewApprovalMapping {
            id: Uuid::new_v4(),
            legal_user_id: legal.id,
            finance_user_id: finance.id,
            client_user_id: client.id,
        };

        let mapping = match diesel::insert_into(approval_mappings::table)
            .values(&new_mapping)
            .returning(ApprovalMapping::as_returning())
            .get_result(conn)
        {
            Ok(mapping) => mapping,
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(WorkflowError::Conflict(
                    "this approval mapping already exists".into(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        audit::record(
            conn,
            AuditEntry::new(
                Some(caller),
                AuditAction::CreateMapping,
                format!(
                    "Created approval chain: Legal({}) -> Finance({}) -> Client({})",
                    legal.username, finance.username, client.username
                ),
            ),
        )?;

        info!(
            mapping_id = %mapping.id,
            legal = %legal.username,
            finance = %finance.username,
            client = %client.username,
            "approval mapping created"
        );
        Ok(mapping)
    })
}

/// Finance reviewer that approves `legal_user_id`'s contracts. The most
/// recent mapping wins should stored rows ever disagree.
pub fn resolve_finance_reviewer(
    conn: &mut PgConnection,
    legal_user_id: Uuid,
) -> WorkflowResult<Option<Uuid>> {
    let reviewer = approval_mappings::table
        .filter(approval_mappings::legal_user_id.eq(legal_user_id))
        .order((
            approval_mappings::created_at.desc(),
            approval_mappings::id.desc(),
        ))
        .select(approval_mappings::finance_user_id)
        .first(conn)
        .optional()?;
    Ok(reviewer)
}

/// Clients a legal user may create contracts for, ordered by username.
pub fn resolve_mapped_clients(
    conn: &mut PgConnection,
    legal_user_id: Uuid,
) -> WorkflowResult<Vec<User>> {
    let clients = users::table
        .filter(
            users::id.eq_any(
                approval_mappings::table
                    .filter(approval_mappings::legal_user_id.eq(legal_user_id))
                    .select(approval_mappings::client_user_id),
            ),
        )
        .order(users::username.asc())
        .select(User::as_select())
        .load(conn)?;
    Ok(clients)
}

pub fn resolve_legal_users_for_finance(
    conn: &mut PgConnection,
    finance_user_id: Uuid,
) -> WorkflowResult<Vec<Uuid>> {
    let mut ids: Vec<Uuid> = approval_mappings::table
        .filter(approval_mappings::finance_user_id.eq(finance_user_id))
        .select(approval_mappings::legal_user_id)
        .load(conn)?;
    ids.sort();
    ids.dedup();
    Ok(ids)
}

pub fn resolve_legal_users_for_client(
    conn: &mut PgConnection,
    client_user_id: Uuid,
) -> WorkflowResult<Vec<Uuid>> {
    let mut ids: Vec<Uuid> = approval_mappings::table
        .filter(approval_mappings::client_user_id.eq(client_user_id))
        .select(approval_mappings::legal_user_id)
        .load(conn)?;
    ids.sort();
    ids.dedup();
    Ok(ids)
}

pub fn list_mappings(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<MappingRecord>> {
    caller.require(Capability::ManageMappings)?;

    let mappings: Vec<ApprovalMapping> = approval_mappings::table
        .order(approval_mappings::created_at.asc())
        .select(ApprovalMapping::as_select())
        .load(conn)?;

    let mut referenced: Vec<Uuid> = mappings
        .iter()
        .flat_map(|m| [m.legal_user_id, m.finance_user_id, m.client_user_id])
        .collect();
    referenced.sort();
    referenced.dedup();

    let names = usernames(conn, referenced)?;
    let name_of = |id: Uuid| names.get(&id).cloned().unwrap_or_default();

    Ok(mappings
        .into_iter()
        .map(|mapping| MappingRecord {
            legal_username: name_of(mapping.legal_user_id),
            finance_username: name_of(mapping.finance_user_id),
            client_username: name_of(mapping.client_user_id),
            mapping,
        })
        .collect())
}

fn load_user(conn: &mut PgConnection, user_id: Uuid) -> WorkflowResult<Option<User>> {
    let user = users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

fn expect_role(user: Option<User>, user_id: Uuid, role: Role, field: &str) -> WorkflowResult<User> {
    let user = user
        .ok_or_else(|| WorkflowError::Validation(format!("{field} {user_id} does not exist")))?;
    if role_of(&user)? != role {
        return Err(WorkflowError::Validation(format!(
            "{field} must reference a {role} user, but {} is {}",
            user.username, user.role
        )));
    }
    Ok(user)
}
