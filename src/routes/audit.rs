use axum::{extract::State, Json};

use crate::audit;
use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::routes::views::AuditView;
use crate::state::AppState;

/// Full audit history, oldest entry first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<AuditView>>> {
    let caller = user.caller();
    let records = state
        .run(move |conn| Ok(audit::list(conn, &caller)?))
        .await?;
    Ok(Json(records.into_iter().map(AuditView::from).collect()))
}
