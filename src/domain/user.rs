use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// A staff or superuser account. Every account registered through the API is
/// staff; superusers are only created from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            is_staff: true,
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    pub fn new_superuser(username: String, email: String, password_hash: String) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(username, email, password_hash)
        }
    }

    /// Staff and superusers may hold tokens and manage vouchers.
    pub fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_users_are_staff() {
        let user = User::new("alice".into(), "a@example.com".into(), "hash".into());
        assert!(user.is_staff);
        assert!(!user.is_superuser);
        assert!(user.is_admin());
    }

    #[test]
    fn test_superuser() {
        let user = User::new_superuser("root".into(), "".into(), "hash".into());
        assert!(user.is_superuser);
        assert!(user.is_admin());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("alice".into(), "".into(), "secret-hash".into());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
