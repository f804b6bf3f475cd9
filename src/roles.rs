use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflow::{WorkflowError, WorkflowResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    LegalUser,
    FinanceReviewer,
    Client,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::LegalUser,
        Role::FinanceReviewer,
        Role::Client,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPER_ADMIN",
            Role::LegalUser => "LEGAL_USER",
            Role::FinanceReviewer => "FINANCE_REVIEWER",
            Role::Client => "CLIENT",
        }
    }

    /// Operations and visibility predicates granted to this role.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::SuperAdmin => &[
                ManageUsers,
                ManageMappings,
                ViewAuditLog,
                ViewActiveContracts,
                ViewStats,
                ViewContract,
            ],
            Role::LegalUser => &[
                CreateContract,
                EditContract,
                SubmitContract,
                ViewOwnContracts,
                ViewMappedClients,
                ViewStats,
                ViewContract,
            ],
            Role::FinanceReviewer => &[ReviewContract, ViewApprovalQueue, ViewStats, ViewContract],
            Role::Client => &[
                ViewApprovalQueue,
                ViewActiveContracts,
                ViewStats,
                ViewContract,
            ],
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WorkflowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "LEGAL_USER" => Ok(Role::LegalUser),
            "FINANCE_REVIEWER" => Ok(Role::FinanceReviewer),
            "CLIENT" => Ok(Role::Client),
            other => Err(WorkflowError::Validation(format!("unknown role '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageUsers,
    ManageMappings,
    ViewAuditLog,
    CreateContract,
    EditContract,
    SubmitContract,
    ReviewContract,
    ViewApprovalQueue,
    ViewOwnContracts,
    ViewActiveContracts,
    ViewMappedClients,
    ViewStats,
    ViewContract,
}

/// Identity of whoever is invoking an engine operation. Built per request
/// from the verified bearer token; never read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn require(&self, capability: Capability) -> WorkflowResult<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(WorkflowError::Authorization(format!(
                "role {} may not perform {capability:?}",
                self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_role_names_case_insensitively() {
        assert_eq!("legal_user".parse::<Role>().unwrap(), Role::LegalUser);
        assert_eq!(" CLIENT ".parse::<Role>().unwrap(), Role::Client);
        assert!(matches!(
            "auditor".parse::<Role>(),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn role_names_roundtrip_through_display() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn only_legal_users_author_contracts() {
        for role in Role::ALL {
            let expected = role == Role::LegalUser;
            assert_eq!(role.can(Capability::CreateContract), expected);
            assert_eq!(role.can(Capability::EditContract), expected);
            assert_eq!(role.can(Capability::SubmitContract), expected);
        }
    }

    #[test]
    fn only_finance_reviewers_review() {
        assert!(Role::FinanceReviewer.can(Capability::ReviewContract));
        assert!(!Role::Client.can(Capability::ReviewContract));
        assert!(!Role::SuperAdmin.can(Capability::ReviewContract));
    }

    #[test]
    fn active_contracts_visible_to_admin_and_client() {
        assert!(Role::SuperAdmin.can(Capability::ViewActiveContracts));
        assert!(Role::Client.can(Capability::ViewActiveContracts));
        assert!(!Role::LegalUser.can(Capability::ViewActiveContracts));
        assert!(!Role::FinanceReviewer.can(Capability::ViewActiveContracts));
    }

    #[test]
    fn require_reports_authorization_error() {
        let caller = Caller::new(Uuid::new_v4(), "fin", Role::FinanceReviewer);
        assert!(caller.require(Capability::ReviewContract).is_ok());
        let err = caller.require(Capability::ManageUsers).unwrap_err();
        assert!(matches!(err, WorkflowError::Authorization(_)));
    }

    #[test]
    fn serializes_in_screaming_snake_case() {
        let json = serde_json::to_string(&Role::FinanceReviewer).unwrap();
        assert_eq!(json, "\"FINANCE_REVIEWER\"");
    }
}
