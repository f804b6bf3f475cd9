use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = approval_mappings)]
pub struct ApprovalMapping {
    pub id: Uuid,
    pub legal_user_id: Uuid,
    pub finance_user_id: Uuid,
    pub client_user_id: Uuid,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = approval_mappings)]
pub struct NewApprovalMapping {
    pub id: Uuid,
    pub legal_user_id: Uuid,
    pub finance_user_id: Uuid,
    pub client_user_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = contracts)]
pub struct Contract {
    pub id: Uuid,
    pub contract_name: String,
    pub client_id: Uuid,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
    pub current_version_id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contracts)]
pub struct NewContract {
    pub id: Uuid,
    pub contract_name: String,
    pub client_id: Uuid,
    pub effective_date: NaiveDate,
    pub contract_amount: BigDecimal,
    pub current_version_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = contract_versions)]
#[diesel(belongs_to(Contract))]
pub struct ContractVersion {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub version_number: i32,
    pub status: String,
    pub creator_id: Uuid,
    pub remarks: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = contract_versions)]
pub struct NewContractVersion {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub version_number: i32,
    pub status: String,
    pub creator_id: Uuid,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = audit_logs)]
pub struct AuditLog {
    pub id: i64,
    pub created_at: NaiveDateTime,
    pub actor_id: Option<Uuid>,
    pub actor_role: String,
    pub action: String,
    pub remarks: String,
    pub contract_id: Option<Uuid>,
    pub version_id: Option<Uuid>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = audit_logs)]
pub struct NewAuditLog {
    pub actor_id: Option<Uuid>,
    pub actor_role: String,
    pub action: String,
    pub remarks: String,
    pub contract_id: Option<Uuid>,
    pub version_id: Option<Uuid>,
}
