use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

pub type VoucherId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Active,
    Disabled,
    Sold,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Active => "active",
            VoucherStatus::Disabled => "disabled",
            VoucherStatus::Sold => "sold",
        }
    }
}

impl std::fmt::Display for VoucherStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which slice of the voucher population a listing query wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoucherScope {
    /// Neither disabled nor sold.
    Active,
    Disabled,
    Sold,
}

/// A prepaid voucher. The balance is a cache over the voucher's ledger
/// entries and is only ever mutated together with an entry append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub balance: Cents,
    pub total_loaded: Cents,
    pub creator: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub disabled_at: Option<DateTime<Utc>>,
    pub sold_at: Option<DateTime<Utc>>,
}

impl Voucher {
    /// A new voucher starts empty; the initial value arrives as the first
    /// recharge entry.
    pub fn new(creator: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code: generate_code(),
            balance: 0,
            total_loaded: 0,
            creator,
            created_at: now,
            updated_at: now,
            disabled_at: None,
            sold_at: None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_at.is_some()
    }

    pub fn is_sold(&self) -> bool {
        self.sold_at.is_some()
    }

    /// Disabled and sold are independent flags; active means neither is set.
    pub fn is_active(&self) -> bool {
        !self.is_disabled() && !self.is_sold()
    }

    /// Reported status. When both flags are set, disabled wins.
    pub fn status(&self) -> VoucherStatus {
        if self.is_disabled() {
            VoucherStatus::Disabled
        } else if self.is_sold() {
            VoucherStatus::Sold
        } else {
            VoucherStatus::Active
        }
    }

    pub fn can_afford(&self, amount: Cents) -> bool {
        self.balance >= amount
    }
}

/// Generate an 8-character uppercase voucher code from a fresh random
/// identifier. Uniqueness is enforced at creation time with a retry loop.
pub fn generate_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_shape() {
        let code = generate_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_new_voucher_is_empty_and_active() {
        let voucher = Voucher::new(Uuid::new_v4());
        assert_eq!(voucher.balance, 0);
        assert_eq!(voucher.total_loaded, 0);
        assert!(voucher.is_active());
        assert_eq!(voucher.status(), VoucherStatus::Active);
    }

    #[test]
    fn test_can_afford() {
        let mut voucher = Voucher::new(Uuid::new_v4());
        voucher.balance = 7000;
        assert!(voucher.can_afford(7000));
        assert!(voucher.can_afford(1));
        assert!(!voucher.can_afford(7001));
    }

    #[test]
    fn test_status_disabled_wins_over_sold() {
        let mut voucher = Voucher::new(Uuid::new_v4());
        voucher.sold_at = Some(Utc::now());
        assert_eq!(voucher.status(), VoucherStatus::Sold);
        voucher.disabled_at = Some(Utc::now());
        assert_eq!(voucher.status(), VoucherStatus::Disabled);
        assert!(!voucher.is_active());
    }
}
