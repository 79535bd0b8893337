use thiserror::Error;

use crate::domain::{format_cents, Cents, LedgerRuleError, VoucherStatus};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Invalid credentials or insufficient permissions")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided")]
    AuthenticationRequired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("You can only manage your own vouchers")]
    PermissionDenied,

    #[error("Voucher not found: {0}")]
    VoucherNotFound(String),

    #[error("Invalid voucher code")]
    InvalidVoucherCode,

    #[error("Voucher is {status} and cannot be used for payments")]
    VoucherInactive { status: VoucherStatus },

    #[error(
        "Insufficient balance. Available: Rs {}, Required: Rs {}",
        format_cents(*.available),
        format_cents(*.requested)
    )]
    InsufficientBalance { available: Cents, requested: Cents },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<LedgerRuleError> for AppError {
    fn from(err: LedgerRuleError) -> Self {
        match err {
            LedgerRuleError::NonPositiveAmount { .. }
            | LedgerRuleError::InvalidDenomination { .. } => AppError::InvalidAmount(err.to_string()),
            LedgerRuleError::VoucherInactive { status } => AppError::VoucherInactive { status },
            LedgerRuleError::InsufficientBalance {
                available,
                requested,
            } => AppError::InsufficientBalance {
                available,
                requested,
            },
        }
    }
}
