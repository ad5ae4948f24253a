//! Account and role models

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account roles for authorization.
///
/// An expert account always carries the id of the expert profile it belongs
/// to; an admin account has no profile link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Administrator - full back-office access
    Admin,
    /// Therapist - owns exactly one expert profile
    Expert {
        /// Linked expert profile id
        profile_id: Uuid,
    },
}

impl Role {
    /// Discriminant without payload, for role checks and storage
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Admin => RoleKind::Admin,
            Role::Expert { .. } => RoleKind::Expert,
        }
    }

    /// Linked expert profile id, if any
    pub fn expert_profile_id(&self) -> Option<Uuid> {
        match self {
            Role::Admin => None,
            Role::Expert { profile_id } => Some(*profile_id),
        }
    }
}

/// Role discriminant as stored and compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    Admin,
    Expert,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleKind::Admin => write!(f, "admin"),
            RoleKind::Expert => write!(f, "expert"),
        }
    }
}

impl std::str::FromStr for RoleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(RoleKind::Admin),
            "expert" => Ok(RoleKind::Expert),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// A stored credential record
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique account identifier
    pub id: Uuid,
    /// Login email, compared case-insensitively
    pub email: String,
    /// Bcrypt hash of the password, never exposed outside the store layer
    pub password_hash: String,
    /// Account role, with the expert profile link when applicable
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    /// Inactive accounts are rejected at login
    pub active: bool,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Account {
    /// Create a new active account with an already-hashed password
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: Role,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into().trim().to_lowercase(),
            password_hash: password_hash.into(),
            role,
            first_name: first_name.into(),
            last_name: last_name.into(),
            active: true,
            last_login_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A server-tracked bearer token with an expiry
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    /// Owning account id
    pub account_id: Uuid,
    /// Sessions are valid strictly before this instant
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now() >= self.expires_at
    }
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub account: AccountInfo,
}

/// Account information in responses, without the password hash
#[derive(Debug, Serialize)]
pub struct AccountInfo {
    pub id: Uuid,
    pub email: String,
    pub role: RoleKind,
    pub expert_profile_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Account> for AccountInfo {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            role: account.role.kind(),
            expert_profile_id: account.role.expert_profile_id(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            last_login_at: account.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_kind() {
        assert_eq!(Role::Admin.kind(), RoleKind::Admin);
        let role = Role::Expert {
            profile_id: Uuid::new_v4(),
        };
        assert_eq!(role.kind(), RoleKind::Expert);
    }

    #[test]
    fn test_admin_has_no_profile_link() {
        assert_eq!(Role::Admin.expert_profile_id(), None);
    }

    #[test]
    fn test_account_normalizes_email() {
        let account = Account::new("  Ayse@Klinik.Com ", "hash", Role::Admin, "Ayşe", "Yılmaz");
        assert_eq!(account.email, "ayse@klinik.com");
        assert!(account.active);
        assert!(account.last_login_at.is_none());
    }

    #[test]
    fn test_account_info_hides_hash() {
        let account = Account::new("a@x.com", "hash", Role::Admin, "A", "B");
        let info = AccountInfo::from(&account);
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("hash"));
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[test]
    fn test_session_expiry() {
        let live = Session {
            token: "t".into(),
            account_id: Uuid::new_v4(),
            expires_at: chrono::Utc::now() + chrono::Duration::hours(1),
        };
        assert!(!live.is_expired());

        let stale = Session {
            expires_at: chrono::Utc::now() - chrono::Duration::seconds(1),
            ..live
        };
        assert!(stale.is_expired());
    }
}
