use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::roles::Role;
use crate::routes::views::{AuditView, ContractDetailView, ContractView, UserView, VersionView};
use crate::state::AppState;
use crate::stats;
use crate::users;
use crate::workflow::engine::{self, ContractInput};
use crate::workflow::{queries, ContractSnapshot};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub contract_name: String,
    pub client_id: Uuid,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContractRequest {
    pub contract_name: String,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
}

impl From<UpdateContractRequest> for ContractInput {
    fn from(payload: UpdateContractRequest) -> Self {
        ContractInput {
            contract_name: payload.contract_name,
            effective_date: payload.effective_date,
            contract_amount: payload.contract_amount,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct RemarksQuery {
    pub remarks: Option<String>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub role: Role,
    pub counters: BTreeMap<String, i64>,
}

pub async fn create_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateContractRequest>,
) -> AppResult<(StatusCode, Json<ContractView>)> {
    let caller = user.caller();
    let view = state
        .run(move |conn| {
            let input = ContractInput {
                contract_name: payload.contract_name,
                effective_date: payload.effective_date,
                contract_amount: payload.contract_amount,
            };
            let snapshot = engine::create_contract(conn, &caller, payload.client_id, input)?;
            render_one(conn, snapshot)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn update_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
    Json(payload): Json<UpdateContractRequest>,
) -> AppResult<Json<ContractView>> {
    let caller = user.caller();
    let view = state
        .run(move |conn| {
            let snapshot = engine::edit_contract(conn, &caller, contract_id, payload.into())?;
            render_one(conn, snapshot)
        })
        .await?;
    Ok(Json(view))
}

pub async fn submit_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
) -> AppResult<Json<ContractView>> {
    let caller = user.caller();
    let view = state
        .run(move |conn| {
            let snapshot = engine::submit(conn, &caller, contract_id)?;
            render_one(conn, snapshot)
        })
        .await?;
    Ok(Json(view))
}

pub async fn approve_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
    Query(query): Query<RemarksQuery>,
) -> AppResult<Json<ContractView>> {
    let caller = user.caller();
    let view = state
        .run(move |conn| {
            let snapshot =
                engine::approve(conn, &caller, contract_id, query.remarks.as_deref())?;
            render_one(conn, snapshot)
        })
        .await?;
    Ok(Json(view))
}

pub async fn reject_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
    Query(query): Query<RemarksQuery>,
) -> AppResult<Json<ContractView>> {
    let caller = user.caller();
    let view = state
        .run(move |conn| {
            let snapshot = engine::reject(conn, &caller, contract_id, query.remarks.as_deref())?;
            render_one(conn, snapshot)
        })
        .await?;
    Ok(Json(view))
}

pub async fn get_contract(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(contract_id): Path<Uuid>,
) -> AppResult<Json<ContractDetailView>> {
    let caller = user.caller();
    let detail = state
        .run(move |conn| {
            let detail = queries::contract_detail(conn, &caller, contract_id)?;

            let mut ids: Vec<Uuid> = detail
                .audit
                .iter()
                .filter_map(|entry| entry.actor_id)
                .chain([detail.contract.client_id, detail.current.creator_id])
                .collect();
            ids.sort();
            ids.dedup();
            let names = users::usernames(conn, ids)?;

            let audit = detail
                .audit
                .into_iter()
                .map(|entry| {
                    let actor = entry.actor_id.and_then(|id| names.get(&id).cloned());
                    AuditView::new(entry, actor)
                })
                .collect();
            let history = detail.history.into_iter().map(VersionView::from).collect();
            let contract = ContractView::from_snapshot(
                ContractSnapshot {
                    contract: detail.contract,
                    version: detail.current,
                },
                &names,
            );

            Ok(ContractDetailView {
                contract,
                history,
                audit,
            })
        })
        .await?;
    Ok(Json(detail))
}

pub async fn approval_queue(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ContractView>>> {
    let caller = user.caller();
    let views = state
        .run(move |conn| {
            let snapshots = queries::approval_queue(conn, &caller)?;
            render_many(conn, snapshots)
        })
        .await?;
    Ok(Json(views))
}

pub async fn my_contracts(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ContractView>>> {
    let caller = user.caller();
    let views = state
        .run(move |conn| {
            let snapshots = queries::my_contracts(conn, &caller)?;
            render_many(conn, snapshots)
        })
        .await?;
    Ok(Json(views))
}

pub async fn all_active(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<ContractView>>> {
    let caller = user.caller();
    let views = state
        .run(move |conn| {
            let snapshots = queries::all_active(conn, &caller)?;
            render_many(conn, snapshots)
        })
        .await?;
    Ok(Json(views))
}

pub async fn mapped_clients(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<UserView>>> {
    let caller = user.caller();
    let clients = state
        .run(move |conn| Ok(queries::mapped_clients(conn, &caller)?))
        .await?;
    Ok(Json(clients.into_iter().map(UserView::from).collect()))
}

pub async fn contract_stats(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    let caller = user.caller();
    let stats = state
        .run(move |conn| Ok(stats::dashboard_stats(conn, &caller)?))
        .await?;
    Ok(Json(StatsResponse {
        role: stats.role,
        counters: stats.counters,
    }))
}

fn render_one(conn: &mut PgConnection, snapshot: ContractSnapshot) -> AppResult<ContractView> {
    let names = queries::usernames_for(conn, std::slice::from_ref(&snapshot))?;
    Ok(ContractView::from_snapshot(snapshot, &names))
}

fn render_many(
    conn: &mut PgConnection,
    snapshots: Vec<ContractSnapshot>,
) -> AppResult<Vec<ContractView>> {
    let names = queries::usernames_for(conn, &snapshots)?;
    Ok(ContractView::list(snapshots, &names))
}
