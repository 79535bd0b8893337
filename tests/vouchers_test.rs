mod common;

use anyhow::Result;
use buono::application::AppError;
use buono::domain::VoucherScope;

use common::{staff_user, superuser, test_services};

#[tokio::test]
async fn test_disable_is_idempotent() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;
    let detail = vouchers.create_voucher(&user, 10000).await?;

    let first = vouchers.disable_voucher(&user, detail.voucher.id).await?;
    assert!(first.is_disabled());

    // Second disable succeeds; the timestamp may move forward.
    let second = vouchers.disable_voucher(&user, detail.voucher.id).await?;
    assert!(second.is_disabled());
    assert!(second.disabled_at >= first.disabled_at);

    Ok(())
}

#[tokio::test]
async fn test_enable_requires_disabled_state() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;
    let detail = vouchers.create_voucher(&user, 10000).await?;

    // Enabling an active voucher reads as not found
    let err = vouchers.enable_voucher(detail.voucher.id).await.unwrap_err();
    assert!(matches!(err, AppError::VoucherNotFound(_)));

    vouchers.disable_voucher(&user, detail.voucher.id).await?;
    let enabled = vouchers.enable_voucher(detail.voucher.id).await?;
    assert!(enabled.is_active());
    assert!(enabled.disabled_at.is_none());

    // Payments work again after re-enabling
    vouchers.pay(&detail.voucher.code, 100).await?;

    Ok(())
}

#[tokio::test]
async fn test_mark_sold_rules() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;

    // Selling twice fails
    let detail = vouchers.create_voucher(&user, 10000).await?;
    let sold = vouchers.mark_voucher_sold(detail.voucher.id).await?;
    assert!(sold.is_sold());
    let err = vouchers
        .mark_voucher_sold(detail.voucher.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VoucherNotFound(_)));

    // A disabled voucher cannot be sold
    let detail = vouchers.create_voucher(&user, 10000).await?;
    vouchers.disable_voucher(&user, detail.voucher.id).await?;
    let err = vouchers
        .mark_voucher_sold(detail.voucher.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VoucherNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_list_scoping_by_creator_and_state() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let alice = staff_user(&auth, "alice").await?;
    let bob = staff_user(&auth, "bob").await?;
    let root = superuser(&auth, "root").await?;

    let a1 = vouchers.create_voucher(&alice, 10000).await?;
    let a2 = vouchers.create_voucher(&alice, 20000).await?;
    let b1 = vouchers.create_voucher(&bob, 30000).await?;

    vouchers.disable_voucher(&alice, a1.voucher.id).await?;
    vouchers.mark_voucher_sold(b1.voucher.id).await?;

    // Staff see only their own vouchers, split by state
    let active = vouchers.list_vouchers(&alice, VoucherScope::Active).await?;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].voucher.id, a2.voucher.id);

    let disabled = vouchers
        .list_vouchers(&alice, VoucherScope::Disabled)
        .await?;
    assert_eq!(disabled.len(), 1);
    assert_eq!(disabled[0].voucher.id, a1.voucher.id);

    assert!(vouchers
        .list_vouchers(&bob, VoucherScope::Active)
        .await?
        .is_empty());
    let sold = vouchers.list_vouchers(&bob, VoucherScope::Sold).await?;
    assert_eq!(sold.len(), 1);

    // Superusers see everything
    assert_eq!(
        vouchers.list_vouchers(&root, VoucherScope::Active).await?.len(),
        1
    );
    assert_eq!(
        vouchers.list_vouchers(&root, VoucherScope::Sold).await?.len(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_detail_access_control() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let alice = staff_user(&auth, "alice").await?;
    let bob = staff_user(&auth, "bob").await?;
    let root = superuser(&auth, "root").await?;

    let detail = vouchers.create_voucher(&alice, 10000).await?;

    // Another staff user is rejected, the superuser is not
    let err = vouchers.get_voucher(&bob, detail.voucher.id).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied));
    vouchers.get_voucher(&root, detail.voucher.id).await?;

    // Disabled vouchers disappear from the detail view, even for the owner
    vouchers.disable_voucher(&alice, detail.voucher.id).await?;
    let err = vouchers
        .get_voucher(&alice, detail.voucher.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::VoucherNotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_recharge_ownership() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let alice = staff_user(&auth, "alice").await?;
    let bob = staff_user(&auth, "bob").await?;
    let root = superuser(&auth, "root").await?;

    let detail = vouchers.create_voucher(&alice, 10000).await?;
    let code = &detail.voucher.code;

    let err = vouchers.recharge(&bob, code, 10000).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied));

    // Ownership is checked before the amount: a non-owner with a bad
    // denomination still gets the permission error.
    let err = vouchers.recharge(&bob, code, 12345).await.unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied));

    vouchers.recharge(&root, code, 20000).await?;
    let (voucher, _) = vouchers.check_balance(code).await?;
    assert_eq!(voucher.balance, 30000);

    Ok(())
}

#[tokio::test]
async fn test_voucher_codes_are_unique() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;

    let mut codes = std::collections::HashSet::new();
    for _ in 0..20 {
        let detail = vouchers.create_voucher(&user, 100).await?;
        assert_eq!(detail.voucher.code.len(), 8);
        assert!(codes.insert(detail.voucher.code));
    }

    Ok(())
}

#[tokio::test]
async fn test_statistics() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;

    let v1 = vouchers.create_voucher(&user, 10000).await?;
    let _v2 = vouchers.create_voucher(&user, 20000).await?;
    let v3 = vouchers.create_voucher(&user, 30000).await?;

    vouchers.disable_voucher(&user, v1.voucher.id).await?;
    vouchers.mark_voucher_sold(v3.voucher.id).await?;

    let stats = vouchers.statistics().await?;
    assert_eq!(stats.total_vouchers, 3);
    // Only disabling removes a voucher from the active count; the sold one
    // still counts.
    assert_eq!(stats.active_vouchers, 2);
    assert_eq!(stats.disabled_vouchers, 1);
    assert_eq!(stats.sold_vouchers, 1);
    // Disabled balances are excluded; sold ones are not.
    assert_eq!(stats.total_balance, 50000);

    Ok(())
}

#[tokio::test]
async fn test_statistics_count_sold_vouchers_as_active() -> Result<()> {
    let (auth, vouchers, _temp) = test_services().await?;
    let user = staff_user(&auth, "alice").await?;

    let detail = vouchers.create_voucher(&user, 10000).await?;
    vouchers.mark_voucher_sold(detail.voucher.id).await?;

    let stats = vouchers.statistics().await?;
    assert_eq!(stats.active_vouchers, 1);
    assert_eq!(stats.sold_vouchers, 1);
    assert_eq!(stats.total_balance, 10000);

    Ok(())
}
