//! JSON shapes returned by the API. Field names follow the camelCase
//! convention the dashboard consumes.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::audit::AuditRecord;
use crate::mappings::MappingRecord;
use crate::models::{AuditLog, ContractVersion, User};
use crate::workflow::ContractSnapshot;

pub(crate) fn utc(timestamp: NaiveDateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_naive_utc_and_offset(timestamp, Utc)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractView {
    pub id: Uuid,
    pub contract_name: String,
    pub client_id: Uuid,
    pub client_username: Option<String>,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
    pub version_id: Uuid,
    pub version_number: i32,
    pub status: String,
    pub creator_id: Uuid,
    pub creator_username: Option<String>,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContractView {
    pub fn from_snapshot(snapshot: ContractSnapshot, names: &HashMap<Uuid, String>) -> Self {
        let ContractSnapshot { contract, version } = snapshot;
        Self {
            id: contract.id,
            client_username: names.get(&contract.client_id).cloned(),
            contract_name: contract.contract_name,
            client_id: contract.client_id,
            effective_date: contract.effective_date,
            contract_amount: contract.contract_amount,
            version_id: version.id,
            version_number: version.version_number,
            status: version.status,
            creator_id: version.creator_id,
            creator_username: names.get(&version.creator_id).cloned(),
            remarks: version.remarks,
            created_at: utc(contract.created_at),
            updated_at: utc(contract.updated_at.max(version.updated_at)),
        }
    }

    pub fn list(snapshots: Vec<ContractSnapshot>, names: &HashMap<Uuid, String>) -> Vec<Self> {
        snapshots
            .into_iter()
            .map(|snapshot| Self::from_snapshot(snapshot, names))
            .collect()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionView {
    pub id: Uuid,
    pub version_number: i32,
    pub status: String,
    pub creator_id: Uuid,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContractVersion> for VersionView {
    fn from(version: ContractVersion) -> Self {
        Self {
            id: version.id,
            version_number: version.version_number,
            status: version.status,
            creator_id: version.creator_id,
            remarks: version.remarks,
            created_at: utc(version.created_at),
            updated_at: utc(version.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDetailView {
    pub contract: ContractView,
    pub history: Vec<VersionView>,
    pub audit: Vec<AuditView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditView {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub actor_id: Option<Uuid>,
    pub actor: Option<String>,
    pub actor_role: String,
    pub action: String,
    pub remarks: String,
    pub contract_id: Option<Uuid>,
    pub version_id: Option<Uuid>,
}

impl AuditView {
    pub fn new(entry: AuditLog, actor: Option<String>) -> Self {
        Self {
            id: entry.id,
            timestamp: utc(entry.created_at),
            actor_id: entry.actor_id,
            actor,
            actor_role: entry.actor_role,
            action: entry.action,
            remarks: entry.remarks,
            contract_id: entry.contract_id,
            version_id: entry.version_id,
        }
    }
}

impl From<AuditRecord> for AuditView {
    fn from(record: AuditRecord) -> Self {
        Self::new(record.entry, record.actor_username)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: utc(user.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingView {
    pub id: Uuid,
    pub legal_user_id: Uuid,
    pub legal_username: String,
    pub finance_user_id: Uuid,
    pub finance_username: String,
    pub client_user_id: Uuid,
    pub client_username: String,
    pub created_at: DateTime<Utc>,
}

impl From<MappingRecord> for MappingView {
    fn from(record: MappingRecord) -> Self {
        Self {
            id: record.mapping.id,
            legal_user_id: record.mapping.legal_user_id,
            legal_username: record.legal_username,
            finance_user_id: record.mapping.finance_user_id,
            finance_username: record.finance_username,
            client_user_id: record.mapping.client_user_id,
            client_username: record.client_username,
            created_at: utc(record.mapping.created_at),
        }
    }
}
