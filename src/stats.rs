//! Dashboard counters derived from the contracts a caller can see.

use std::collections::BTreeMap;

use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;

use crate::roles::{Capability, Caller, Role};
use crate::schema::users;
use crate::workflow::{queries, ContractStatus, WorkflowResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardStats {
    pub role: Role,
    pub counters: BTreeMap<String, i64>,
}

/// Builds the role-specific counters over an already-authorized contract set.
/// `user_counts` is only consulted for SUPER_ADMIN.
pub fn compute_counters<I>(
    role: Role,
    visible: I,
    user_counts: &BTreeMap<Role, i64>,
) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = ContractStatus>,
{
    let mut by_status: BTreeMap<ContractStatus, i64> = BTreeMap::new();
    let mut total = 0;
    for status in visible {
        *by_status.entry(status).or_default() += 1;
        total += 1;
    }
    let count = |status: ContractStatus| by_status.get(&status).copied().unwrap_or(0);

    let mut counters = BTreeMap::new();
    let mut put = |label: &str, value: i64| {
        counters.insert(label.to_string(), value);
    };

    match role {
        Role::SuperAdmin => {
            put("Total Contracts", total);
            put("Approved Contracts", count(ContractStatus::Approved));
            put("Waiting List", count(ContractStatus::PendingApproval));
            put("Drafts", count(ContractStatus::Draft));
            put("Rejected", count(ContractStatus::Rejected));
            for role in Role::ALL {
                let users = user_counts.get(&role).copied().unwrap_or(0);
                put(&format!("Users: {role}"), users);
            }
        }
        Role::LegalUser => {
            put("Contracts Created", total);
            put("Drafts", count(ContractStatus::Draft));
            put("Sent to Finance", count(ContractStatus::PendingApproval));
            put("Approved", count(ContractStatus::Approved));
            put("Rejected by Finance", count(ContractStatus::Rejected));
        }
        Role::FinanceReviewer => {
            put("Pending My Review", count(ContractStatus::PendingApproval));
            put("Approved by Me", count(ContractStatus::Approved));
            put("Rejected by Me", count(ContractStatus::Rejected));
        }
        Role::Client => {
            put("Total Contracts", total);
            put("Pending Approval", count(ContractStatus::PendingApproval));
            put("Approved", count(ContractStatus::Approved));
        }
    }

    counters
}

pub fn dashboard_stats(conn: &mut PgConnection, caller: &Caller) -> WorkflowResult<DashboardStats> {
    caller.require(Capability::ViewStats)?;

    let visible = queries::visible_contracts(conn, caller)?;
    let statuses = visible
        .iter()
        .map(|snapshot| snapshot.status())
        .collect::<WorkflowResult<Vec<_>>>()?;

    let mut user_counts = BTreeMap::new();
    if caller.role == Role::SuperAdmin {
        let rows: Vec<(String, i64)> = users::table
            .group_by(users::role)
            .select((users::role, count_star()))
            .load(conn)?;
        for (role, count) in rows {
            if let Ok(role) = role.parse::<Role>() {
                user_counts.insert(role, count);
            }
        }
    }

    Ok(DashboardStats {
        role: caller.role,
        counters: compute_counters(caller.role, statuses, &user_counts),
    })
}
