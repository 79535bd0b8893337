use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, VoucherId};

pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Credit: increases balance and total_loaded.
    Recharge,
    /// Debit: decreases balance.
    Payment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Recharge => "recharge",
            EntryKind::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "recharge" => Some(EntryKind::Recharge),
            "payment" => Some(EntryKind::Payment),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable ledger record of a balance change. The amount is always
/// strictly positive; direction comes from the kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub voucher_id: VoucherId,
    pub amount: Cents,
    pub kind: EntryKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        voucher_id: VoucherId,
        amount: Cents,
        kind: EntryKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            voucher_id,
            amount,
            kind,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
