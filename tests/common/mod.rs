// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use buono::application::{AuthService, VoucherService};
use buono::domain::User;
use buono::storage::Repository;
use tempfile::TempDir;

/// Helper to create the application services over a temporary database
pub async fn test_services() -> Result<(AuthService, VoucherService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Repository::init(&db_url).await?;
    Ok((
        AuthService::new(repo.clone()),
        VoucherService::new(repo),
        temp_dir,
    ))
}

/// Register a staff account with a fixed password.
pub async fn staff_user(auth: &AuthService, username: &str) -> Result<User> {
    Ok(auth.register(username, "", "password").await?)
}

/// Create a superuser account with a fixed password.
pub async fn superuser(auth: &AuthService, username: &str) -> Result<User> {
    Ok(auth.create_superuser(username, "", "password").await?)
}
