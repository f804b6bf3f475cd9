use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{password, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::mappings;
use crate::roles::{Capability, Role};
use crate::routes::views::{MappingView, UserView};
use crate::state::AppState;
use crate::users::{self, NewUserInput};

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMappingRequest {
    pub legal_user_id: Uuid,
    pub finance_user_id: Uuid,
    pub client_user_id: Uuid,
}

pub async fn register_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<UserView>)> {
    let caller = user.caller();
    caller.require(Capability::ManageUsers)?;

    let role: Role = payload.role.parse()?;
    if payload.password.is_empty() {
        return Err(AppError::bad_request("password must not be empty"));
    }
    let created = state
        .run(move |conn| {
            let password_hash = password::hash_password(&payload.password)?;
            let input = NewUserInput {
                username: payload.username,
                email: payload.email,
                password_hash,
                role,
            };
            Ok(users::create_user(conn, Some(&caller), input)?)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserView::from(created))))
}

pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<UserView>>> {
    let caller = user.caller();
    let role: Option<Role> = match query.role.as_deref().map(str::trim) {
        Some(role) if !role.is_empty() => Some(role.parse()?),
        _ => None,
    };
    let rows = state
        .run(move |conn| {
            let rows = match role {
                Some(role) => users::list_users_by_role(conn, &caller, role)?,
                None => users::list_users(conn, &caller)?,
            };
            Ok(rows)
        })
        .await?;

    Ok(Json(rows.into_iter().map(UserView::from).collect()))
}

pub async fn create_mapping(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateMappingRequest>,
) -> AppResult<(StatusCode, Json<MappingView>)> {
    let caller = user.caller();
    let record = state
        .run(move |conn| {
            let mapping = mappings::create_mapping(
                conn,
                &caller,
                payload.legal_user_id,
                payload.finance_user_id,
                payload.client_user_id,
            )?;

            let names = users::usernames(
                conn,
                vec![
                    mapping.legal_user_id,
                    mapping.finance_user_id,
                    mapping.client_user_id,
                ],
            )?;
            let name_of = |id: Uuid| names.get(&id).cloned().unwrap_or_default();
            Ok(mappings::MappingRecord {
                legal_username: name_of(mapping.legal_user_id),
                finance_username: name_of(mapping.finance_user_id),
                client_username: name_of(mapping.client_user_id),
                mapping,
            })
        })
        .await?;

    Ok((StatusCode::CREATED, Json(MappingView::from(record))))
}

pub async fn list_mappings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<MappingView>>> {
    let caller = user.caller();
    let records = state
        .run(move |conn| Ok(mappings::list_mappings(conn, &caller)?))
        .await?;
    Ok(Json(records.into_iter().map(MappingView::from).collect()))
}
