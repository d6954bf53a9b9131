use crate::config::PortalConfig;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Role::Student),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Admin => "Admin",
        }
    }
}

/// SHA-256 of a password. Stored credentials never keep the plain text.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; 32]);

impl Secret {
    pub fn from_password(password: &str) -> Self {
        Self(Sha256::digest(password.as_bytes()).into())
    }

    pub fn matches(&self, password: &str) -> bool {
        let other = Secret::from_password(password);
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

pub trait CredentialStore {
    /// Expected secret for `(role, id)`, or `None` if the account is unknown.
    fn lookup(&self, role: Role, id: &str) -> Option<Secret>;
}

/// Accounts fixed at startup: every roster student shares one password and
/// there is a single admin.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    accounts: HashMap<(Role, String), Secret>,
}

impl StaticCredentials {
    pub fn from_config(cfg: &PortalConfig) -> Self {
        let student_secret = Secret::from_password(&cfg.student_password);
        let mut accounts: HashMap<(Role, String), Secret> = cfg
            .roster
            .iter()
            .map(|id| ((Role::Student, id.clone()), student_secret.clone()))
            .collect();
        accounts.insert(
            (Role::Admin, cfg.admin.id.clone()),
            Secret::from_password(&cfg.admin.password),
        );
        Self { accounts }
    }
}

impl CredentialStore for StaticCredentials {
    fn lookup(&self, role: Role, id: &str) -> Option<Secret> {
        self.accounts.get(&(role, id.to_string())).cloned()
    }
}

pub fn verify(store: &dyn CredentialStore, role: Role, id: &str, password: &str) -> bool {
    store
        .lookup(role, id)
        .map(|secret| secret.matches(password))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_students_share_one_password() {
        let store = StaticCredentials::from_config(&PortalConfig::default());
        assert!(verify(&store, Role::Student, "Adams", "123456"));
        assert!(verify(&store, Role::Student, "Ngozi", "123456"));
        assert!(!verify(&store, Role::Student, "Adams", "admin123"));
        assert!(!verify(&store, Role::Student, "Stranger", "123456"));
    }

    #[test]
    fn roles_do_not_cross() {
        let store = StaticCredentials::from_config(&PortalConfig::default());
        assert!(verify(&store, Role::Admin, "admin", "admin123"));
        assert!(!verify(&store, Role::Student, "admin", "admin123"));
        assert!(!verify(&store, Role::Admin, "Adams", "123456"));
    }

    #[test]
    fn role_names_are_case_insensitive() {
        assert_eq!(Role::parse("Student"), Some(Role::Student));
        assert_eq!(Role::parse(" ADMIN "), Some(Role::Admin));
        assert_eq!(Role::parse("principal"), None);
    }
}
