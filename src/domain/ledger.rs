use super::{format_cents, Cents, EntryKind, LedgerEntry, Voucher, VoucherStatus};

/// Denominations accepted by the authenticated recharge path, in cents.
/// The initial load at voucher creation is exempt from this set.
pub const RECHARGE_DENOMINATIONS: [Cents; 3] = [10_000, 20_000, 50_000];

pub fn is_recharge_denomination(amount: Cents) -> bool {
    RECHARGE_DENOMINATIONS.contains(&amount)
}

/// Validate a payment against the current voucher state. Checked in order:
/// amount positivity, lifecycle flags, affordability.
pub fn validate_payment(voucher: &Voucher, amount: Cents) -> Result<(), LedgerRuleError> {
    if amount <= 0 {
        return Err(LedgerRuleError::NonPositiveAmount { amount });
    }
    if !voucher.is_active() {
        return Err(LedgerRuleError::VoucherInactive {
            status: voucher.status(),
        });
    }
    if !voucher.can_afford(amount) {
        return Err(LedgerRuleError::InsufficientBalance {
            available: voucher.balance,
            requested: amount,
        });
    }
    Ok(())
}

/// Validate a recharge through the authenticated endpoint: must be one of
/// the fixed denominations.
pub fn validate_recharge(amount: Cents) -> Result<(), LedgerRuleError> {
    if amount <= 0 {
        return Err(LedgerRuleError::NonPositiveAmount { amount });
    }
    if !is_recharge_denomination(amount) {
        return Err(LedgerRuleError::InvalidDenomination { amount });
    }
    Ok(())
}

/// Validate the initial load applied at voucher creation: any strictly
/// positive amount.
pub fn validate_initial_load(amount: Cents) -> Result<(), LedgerRuleError> {
    if amount <= 0 {
        return Err(LedgerRuleError::NonPositiveAmount { amount });
    }
    Ok(())
}

/// Apply an entry to the voucher's cached balance. Callers must have
/// validated the entry first; this is the single place the balance math
/// lives.
pub fn apply(voucher: &mut Voucher, entry: &LedgerEntry) {
    match entry.kind {
        EntryKind::Recharge => {
            voucher.balance += entry.amount;
            voucher.total_loaded += entry.amount;
        }
        EntryKind::Payment => {
            voucher.balance -= entry.amount;
        }
    }
    voucher.updated_at = entry.created_at;
}

/// Recompute a balance from scratch: sum of recharges minus sum of payments.
/// The cached voucher balance must always equal this.
pub fn compute_balance(entries: &[LedgerEntry]) -> Cents {
    entries.iter().fold(0, |balance, entry| match entry.kind {
        EntryKind::Recharge => balance + entry.amount,
        EntryKind::Payment => balance - entry.amount,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerRuleError {
    NonPositiveAmount {
        amount: Cents,
    },
    InvalidDenomination {
        amount: Cents,
    },
    VoucherInactive {
        status: VoucherStatus,
    },
    InsufficientBalance {
        available: Cents,
        requested: Cents,
    },
}

impl std::fmt::Display for LedgerRuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerRuleError::NonPositiveAmount { amount } => {
                write!(f, "Amount must be positive, got {}", format_cents(*amount))
            }
            LedgerRuleError::InvalidDenomination { amount } => {
                write!(
                    f,
                    "Recharge amount must be 100, 200, or 500, got {}",
                    format_cents(*amount)
                )
            }
            LedgerRuleError::VoucherInactive { status } => {
                write!(f, "Voucher is {status} and cannot be used for payments")
            }
            LedgerRuleError::InsufficientBalance {
                available,
                requested,
            } => {
                write!(
                    f,
                    "Insufficient balance. Available: Rs {}, Required: Rs {}",
                    format_cents(*available),
                    format_cents(*requested)
                )
            }
        }
    }
}

impl std::error::Error for LedgerRuleError {}
