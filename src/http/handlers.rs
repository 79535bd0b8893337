use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{json, Value};

use crate::application::{parse_voucher_id, AppError};
use crate::domain::{cents_to_units, format_cents, Amount, Cents, VoucherScope, VoucherStatus};

use super::error::ApiResult;
use super::extract::AuthUser;
use super::types::*;
use super::AppState;

fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

fn amount_field(value: Option<Amount>, field: &str) -> Result<Cents, AppError> {
    require(value, field)?
        .into_cents()
        .map_err(|e| AppError::InvalidAmount(e.to_string()))
}

// ========================
// Accounts
// ========================

/// POST /api/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let username = require(req.username, "username")?;
    let password = require(req.password, "password")?;
    let email = req.email.unwrap_or_default();

    let user = state.auth.register(&username, &email, &password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user_id": user.id,
            "username": user.username,
        })),
    ))
}

/// POST /api/get-token
pub async fn get_token(
    State(state): State<AppState>,
    Json(req): Json<TokenRequest>,
) -> ApiResult<Json<Value>> {
    let username = require(req.username, "username")?;
    let password = require(req.password, "password")?;

    let (token, user) = state.auth.issue_token(&username, &password).await?;
    Ok(Json(json!({
        "token": token,
        "user_id": user.id,
        "username": user.username,
        "is_superuser": user.is_superuser,
    })))
}

// ========================
// Voucher management
// ========================

/// GET /api/vouchers
pub async fn list_vouchers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<VoucherPayload>>> {
    let details = state
        .vouchers
        .list_vouchers(&user, VoucherScope::Active)
        .await?;
    Ok(Json(details.iter().map(VoucherPayload::from).collect()))
}

/// POST /api/vouchers
pub async fn create_voucher(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateVoucherRequest>,
) -> ApiResult<(StatusCode, Json<VoucherPayload>)> {
    let initial_value = amount_field(req.initial_value, "initial_value")?;
    let detail = state.vouchers.create_voucher(&user, initial_value).await?;
    Ok((StatusCode::CREATED, Json(VoucherPayload::from(&detail))))
}

/// GET /api/vouchers/{id}
pub async fn voucher_detail(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Json<VoucherPayload>> {
    let id = parse_voucher_id(&key)?;
    let detail = state.vouchers.get_voucher(&user, id).await?;
    Ok(Json(VoucherPayload::from(&detail)))
}

/// DELETE /api/vouchers/{id}. Soft-disable, not removal.
pub async fn disable_voucher(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_voucher_id(&key)?;
    let voucher = state.vouchers.disable_voucher(&user, id).await?;
    Ok(Json(json!({
        "message": format!("Voucher {} has been disabled successfully", voucher.code),
        "voucher_code": voucher.code,
        "disabled_at": voucher.disabled_at,
    })))
}

/// POST /api/vouchers/{id}/enable
pub async fn enable_voucher(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_voucher_id(&key)?;
    let voucher = state.vouchers.enable_voucher(id).await?;
    Ok(Json(json!({
        "message": format!("Voucher {} has been enabled successfully", voucher.code),
        "voucher_code": voucher.code,
    })))
}

/// POST /api/vouchers/{id}/mark-sold
pub async fn mark_voucher_sold(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(key): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_voucher_id(&key)?;
    let voucher = state.vouchers.mark_voucher_sold(id).await?;
    Ok(Json(json!({
        "message": format!("Voucher {} has been marked as sold", voucher.code),
        "voucher_code": voucher.code,
        "sold_at": voucher.sold_at,
    })))
}

/// GET /api/vouchers/disabled
pub async fn disabled_vouchers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<VoucherPayload>>> {
    let details = state
        .vouchers
        .list_vouchers(&user, VoucherScope::Disabled)
        .await?;
    Ok(Json(details.iter().map(VoucherPayload::from).collect()))
}

/// GET /api/vouchers/sold
pub async fn sold_vouchers(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<VoucherPayload>>> {
    let details = state
        .vouchers
        .list_vouchers(&user, VoucherScope::Sold)
        .await?;
    Ok(Json(details.iter().map(VoucherPayload::from).collect()))
}

/// POST /api/vouchers/{code}/recharge
pub async fn recharge(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(code): Path<String>,
    Json(req): Json<RechargeRequest>,
) -> ApiResult<Json<Value>> {
    let amount = amount_field(req.amount, "amount")?;
    let receipt = state.vouchers.recharge(&user, &code, amount).await?;
    Ok(Json(json!({
        "message": format!(
            "Voucher {} recharged with Rs {}",
            receipt.voucher.code,
            format_cents(receipt.entry.amount)
        ),
        "new_balance": format_cents(receipt.voucher.balance),
        "transaction": EntryPayload::from(&receipt.entry),
    })))
}

// ========================
// Public endpoints
// ========================

/// POST /api/pay. Anonymous redemption at the point of sale.
pub async fn pay(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> ApiResult<Json<Value>> {
    let code = require(req.voucher_code, "voucher_code")?;
    let amount = amount_field(req.amount, "amount")?;

    let receipt = state.vouchers.pay(&code, amount).await?;
    Ok(Json(json!({
        "message": format!("Payment of Rs {} successful", format_cents(receipt.entry.amount)),
        "voucher_code": receipt.voucher.code,
        "remaining_balance": cents_to_units(receipt.voucher.balance),
        "transaction_id": receipt.entry.id,
    })))
}

/// GET /api/vouchers/{code}/balance. Anonymous balance check.
pub async fn check_balance(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> ApiResult<Json<Value>> {
    let (voucher, status) = state.vouchers.check_balance(&code).await?;
    let message = match status {
        VoucherStatus::Active => "Voucher is active and ready for use",
        VoucherStatus::Disabled => "Voucher is disabled",
        VoucherStatus::Sold => "Voucher has been sold",
    };
    Ok(Json(json!({
        "voucher_code": voucher.code,
        "balance": cents_to_units(voucher.balance),
        "status": status,
        "message": message,
    })))
}

/// GET /api/statistics
pub async fn statistics(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> ApiResult<Json<Value>> {
    let stats = state.vouchers.statistics().await?;
    Ok(Json(json!({
        "total_vouchers": stats.total_vouchers,
        "active_vouchers": stats.active_vouchers,
        "disabled_vouchers": stats.disabled_vouchers,
        "sold_vouchers": stats.sold_vouchers,
        "total_balance": cents_to_units(stats.total_balance),
    })))
}
