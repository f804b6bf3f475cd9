use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    auth::{password, AuthenticatedUser},
    error::{AppError, AppResult},
    roles::Role,
    routes::views::UserView,
    state::AppState,
    users,
    workflow::WorkflowError,
};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub username: String,
    pub role: Role,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let username = payload.username.trim().to_string();
    let user = state
        .run(move |conn| Ok(users::find_by_username(conn, &username)?))
        .await?;
    let Some(user) = user else {
        warn!(username = %payload.username, "login for unknown user");
        return Err(AppError::unauthorized());
    };

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;

    if !valid {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AppError::unauthorized());
    }

    let role = users::role_of(&user)?;
    let access_token = state
        .jwt
        .generate_token(user.id, &user.username, role)
        .map_err(AppError::from)?;

    info!(user_id = %user.id, role = %role, "user logged in");
    Ok(Json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.expiry_seconds(),
        username: user.username,
        role,
    }))
}

/// The caller's account as currently stored. A token whose user has since
/// disappeared is treated as unauthenticated.
pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<UserView>> {
    let user_id = user.user_id;
    let account = state
        .run(move |conn| match users::get_user(conn, user_id) {
            Ok(account) => Ok(account),
            Err(WorkflowError::NotFound(_)) => {
                warn!(user_id = %user_id, "token for a user that no longer exists");
                Err(AppError::unauthorized())
            }
            Err(err) => Err(err.into()),
        })
        .await?;
    Ok(Json(UserView::from(account)))
}
