use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::VoucherDetail;
use crate::domain::{format_cents, Amount, LedgerEntry, User};

// ========================
// Requests
// ========================

/// Request fields arrive as Options so missing-field failures surface as the
/// API's own 400 validation errors instead of body-rejection responses.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVoucherRequest {
    pub initial_value: Option<Amount>,
}

#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub amount: Option<Amount>,
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub voucher_code: Option<String>,
    pub amount: Option<Amount>,
}

// ========================
// Responses
// ========================

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntryPayload {
    pub id: Uuid,
    pub amount: String,
    pub transaction_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<&LedgerEntry> for EntryPayload {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id,
            amount: format_cents(entry.amount),
            transaction_type: entry.kind.as_str().to_string(),
            description: entry.description.clone(),
            created_at: entry.created_at,
        }
    }
}

/// Voucher object as the admin endpoints serialize it: money as two-decimal
/// strings, creator summary and ledger history embedded.
#[derive(Debug, Serialize)]
pub struct VoucherPayload {
    pub id: Uuid,
    pub code: String,
    pub current_balance: String,
    pub total_loaded: String,
    pub creator: UserPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub transactions: Vec<EntryPayload>,
}

impl From<&VoucherDetail> for VoucherPayload {
    fn from(detail: &VoucherDetail) -> Self {
        Self {
            id: detail.voucher.id,
            code: detail.voucher.code.clone(),
            current_balance: format_cents(detail.voucher.balance),
            total_loaded: format_cents(detail.voucher.total_loaded),
            creator: UserPayload::from(&detail.creator),
            created_at: detail.voucher.created_at,
            updated_at: detail.voucher.updated_at,
            transactions: detail.entries.iter().map(EntryPayload::from).collect(),
        }
    }
}
