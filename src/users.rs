//! Identity & role registry.

use std::collections::HashMap;

use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::info;
use uuid::Uuid;

use crate::audit::{self, AuditAction, AuditEntry};
use crate::models::{NewUser, User};
use crate::roles::{Capability, Caller, Role};
use crate::schema::users;
use crate::workflow::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone)]
pub struct NewUserInput {
    pub username: String,
    pub email: String,
    /// Already-hashed credential; the registry never sees plaintext.
    pub password_hash: String,
    pub role: Role,
}

/// Creates a user. `actor` is `None` only for system seeding.
pub fn create_user(
    conn: &mut PgConnection,
    actor: Option<&Caller>,
    input: NewUserInput,
) -> WorkflowResult<User> {
    if let Some(caller) = actor {
        caller.require(Capability::ManageUsers)?;
    }

    let username = input.username.trim().to_string();
    let email = input.email.trim().to_string();
    if username.is_empty() {
        return Err(WorkflowError::Validation("username must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(WorkflowError::Validation("email address is invalid".into()));
    }

    conn.transaction::<User, WorkflowError, _>(|conn| {
        if find_by_username(conn, &username)?.is_some() {
            return Err(WorkflowError::Conflict(format!(
                "username '{username}' already exists"
            )));
        }

        let new_user = NewUser {
            id: Uuid::new_v4(),
            username: username.clone(),
            email,
            password_hash: input.password_hash,
            role: input.role.as_str().to_string(),
        };

        let user = match diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn)
        {
            Ok(user) => user,
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                return Err(WorkflowError::Conflict(format!(
                    "username '{username}' already exists"
                )));
            }
            Err(err) => return Err(err.into()),
        };

        audit::record(
            conn,
            AuditEntry::new(
                actor,
                AuditAction::CreateUser,
                format!("Created user {} with role {}", user.username, input.role),
            ),
        )?;

        info!(user_id = %user.id, username = %user.username, role = %input.role, "user created");
        Ok(user)
    })
}

/// Seeds a SUPER_ADMIN unless the username is already taken. Returns the
/// created user, or `None` when it existed. `hash_password` only runs when the
/// user is actually created.
pub fn ensure_super_admin<E>(
    conn: &mut PgConnection,
    username: &str,
    email: &str,
    hash_password: impl FnOnce() -> Result<String, E>,
) -> Result<Option<User>, E>
where
    E: From<WorkflowError>,
{
    if find_by_username(conn, username.trim())?.is_some() {
        return Ok(None);
    }
    let password_hash = hash_password()?;
    let user = create_user(
        conn,
        None,
        NewUserInput {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role: Role::SuperAdmin,
        },
    )?;
    Ok(Some(user))
}

pub fn get_user(conn: &mut PgConnection, user_id: Uuid) -> WorkflowResult<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| WorkflowError::NotFound(format!("user {user_id} not found")))
}

pub fn find_by_username(conn: &mut PgConnection, username: &str) -> WorkflowResult<Option<User>> {
    let user = users::table
        .filter(users::username.eq(username))
        .select(User::as_select())
        .first(conn)
        .optional()?;
    Ok(user)
}

pub fn list_users_by_role(
    conn: &mut PgConnection,
    caller: &Caller,
    role: Role,
) -> WorkflowResult<Vec<User>> {
    caller.require(Capability::ManageUsers)?;
    let rows = users::table
        .filter(users::role.eq(role.as_str()))
        .order(users::username.asc())
        .select(User::as_select())
        .load(conn)?;
    Ok(rows)
}

pub fn list_users(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<Vec<User>> {
    caller.require(Capability::ManageUsers)?;
    let rows = users::table
        .order(users::username.asc())
        .select(User::as_select())
        .load(conn)?;
    Ok(rows)
}

/// Parses the stored role of a user row.
pub fn role_of(user: &User) -> WorkflowResult<Role> {
    user.role
        .parse()
        .map_err(|_| WorkflowError::Corrupt(format!("user {} has unknown role", user.id)))
}

pub fn usernames(conn: &mut PgConnection, ids: Vec<Uuid>) -> WorkflowResult<HashMap<Uuid, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, String)> = users::table
        .filter(users::id.eq_any(ids))
        .select((users::id, users::username))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}
