use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::User;
use crate::storage::Repository;

use super::AppError;

/// Account registration and token issuance. Tokens live in the database and
/// are resolved per request; there is no process-global token store.
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
}

impl AuthService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Register a new staff account.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".into(),
            ));
        }
        if self.repo.get_user_by_username(username).await?.is_some() {
            return Err(AppError::UsernameTaken(username.to_string()));
        }

        let user = User::new(
            username.to_string(),
            email.to_string(),
            hash_password(password),
        );
        self.repo.save_user(&user).await?;
        tracing::info!(username = %user.username, "registered staff account");
        Ok(user)
    }

    /// Create a superuser account (CLI only, never exposed over HTTP).
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".into(),
            ));
        }
        if self.repo.get_user_by_username(username).await?.is_some() {
            return Err(AppError::UsernameTaken(username.to_string()));
        }

        let user = User::new_superuser(
            username.to_string(),
            email.to_string(),
            hash_password(password),
        );
        self.repo.save_user(&user).await?;
        Ok(user)
    }

    /// Verify credentials and return the user's API token, creating one on
    /// first issuance. Only staff and superusers hold tokens.
    pub async fn issue_token(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, User), AppError> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".into(),
            ));
        }

        let user = self
            .repo
            .get_user_by_username(username)
            .await?
            .filter(|u| verify_password(password, &u.password_hash))
            .filter(|u| u.is_admin())
            .ok_or(AppError::InvalidCredentials)?;

        let key = match self.repo.get_token_for_user(user.id).await? {
            Some(key) => key,
            None => {
                let key = generate_token_key();
                self.repo.save_token(user.id, &key).await?;
                key
            }
        };

        Ok((key, user))
    }

    /// Resolve a token key to its user.
    pub async fn authenticate(&self, key: &str) -> Result<User, AppError> {
        self.repo
            .get_user_by_token(key)
            .await?
            .ok_or(AppError::InvalidToken)
    }
}

/// Salted SHA-256, stored as `salt$digest` in hex. A deliberate seam: swap
/// the scheme here without touching the rest of the crate.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    hex::encode(salted_digest(&salt, password)) == digest_hex
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

/// 40 hex chars from the OS RNG.
pub fn generate_token_key() -> String {
    let mut bytes = [0u8; 20];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let stored = hash_password("s3cret");
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("wrong", &stored));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-valid-record"));
        assert!(!verify_password("anything", "zz$zz"));
    }

    #[test]
    fn test_token_key_shape() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }
}
