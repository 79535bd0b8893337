mod common;

use anyhow::Result;
use buono::application::AppError;

use common::test_services;

#[tokio::test]
async fn test_register_creates_staff_account() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;

    let user = auth.register("alice", "alice@example.com", "s3cret").await?;
    assert!(user.is_staff);
    assert!(!user.is_superuser);
    assert_eq!(user.email, "alice@example.com");

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_duplicates_and_blank_fields() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;

    auth.register("alice", "", "s3cret").await?;
    let err = auth.register("alice", "", "other").await.unwrap_err();
    assert!(matches!(err, AppError::UsernameTaken(_)));

    let err = auth.register("", "", "s3cret").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = auth.register("bob", "", "").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_token_issuance() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;
    auth.register("alice", "", "s3cret").await?;

    let (token, user) = auth.issue_token("alice", "s3cret").await?;
    assert_eq!(token.len(), 40);
    assert_eq!(user.username, "alice");

    // Token is stable across issuances
    let (again, _) = auth.issue_token("alice", "s3cret").await?;
    assert_eq!(token, again);

    // And resolves back to the user
    let resolved = auth.authenticate(&token).await?;
    assert_eq!(resolved.id, user.id);

    Ok(())
}

#[tokio::test]
async fn test_token_rejects_bad_credentials() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;
    auth.register("alice", "", "s3cret").await?;

    let err = auth.issue_token("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    let err = auth.issue_token("nobody", "s3cret").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    Ok(())
}

#[tokio::test]
async fn test_authenticate_rejects_unknown_token() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;

    let err = auth.authenticate("deadbeef").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidToken));

    Ok(())
}

#[tokio::test]
async fn test_superuser_gets_tokens_too() -> Result<()> {
    let (auth, _vouchers, _temp) = test_services().await?;
    auth.create_superuser("root", "", "s3cret").await?;

    let (_token, user) = auth.issue_token("root", "s3cret").await?;
    assert!(user.is_superuser);

    Ok(())
}
