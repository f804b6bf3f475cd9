pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod mappings;
pub mod models;
pub mod roles;
pub mod routes;
pub mod schema;
pub mod state;
pub mod stats;
pub mod users;
pub mod workflow;

use anyhow::Result;
use diesel::pg::PgConnection;

use crate::config::BootstrapAdmin;

/// Creates the configured bootstrap SUPER_ADMIN when it does not exist yet.
pub fn seed_bootstrap_admin(conn: &mut PgConnection, admin: &BootstrapAdmin) -> Result<bool> {
    let created = users::ensure_super_admin(conn, &admin.username, &admin.email, || {
        auth::password::hash_password(&admin.password)
    })?;
    if let Some(user) = &created {
        tracing::info!(user_id = %user.id, username = %user.username, "bootstrap admin created");
    }
    Ok(created.is_some())
}
