use chrono::Utc;
use uuid::Uuid;

use crate::domain::{
    format_cents, generate_code, validate_initial_load, validate_payment, validate_recharge,
    Cents, EntryKind, LedgerEntry, User, Voucher, VoucherId, VoucherScope, VoucherStatus,
};
use crate::storage::{Repository, VoucherStats};

use super::AppError;

/// How many fresh codes to try when a generated voucher code collides.
const CODE_RETRY_LIMIT: usize = 5;

/// A voucher joined with its creator and ledger history, the shape the API
/// serializes.
#[derive(Debug)]
pub struct VoucherDetail {
    pub voucher: Voucher,
    pub creator: User,
    pub entries: Vec<LedgerEntry>,
}

/// Result of a balance-affecting operation: the entry plus the voucher as it
/// stands after the write.
#[derive(Debug)]
pub struct EntryReceipt {
    pub entry: LedgerEntry,
    pub voucher: Voucher,
}

/// High-level voucher operations. This is the primary interface for any
/// client (HTTP, CLI, tests).
#[derive(Clone)]
pub struct VoucherService {
    repo: Repository,
}

impl VoucherService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    // ========================
    // Creation and lookup
    // ========================

    /// Create a voucher with an initial load. The voucher is persisted
    /// empty, then the initial recharge entry applies; the initial load is
    /// exempt from the denomination set.
    pub async fn create_voucher(
        &self,
        creator: &User,
        initial_value: Cents,
    ) -> Result<VoucherDetail, AppError> {
        validate_initial_load(initial_value)?;

        let mut voucher = Voucher::new(creator.id);
        // Random codes collide rarely; retry a few times rather than trust
        // luck. Past the limit the unique index still catches it.
        for _ in 0..CODE_RETRY_LIMIT {
            if self.repo.get_voucher_by_code(&voucher.code).await?.is_none() {
                break;
            }
            voucher.code = generate_code();
        }
        self.repo.save_voucher(&voucher).await?;

        let entry = LedgerEntry::new(
            voucher.id,
            initial_value,
            EntryKind::Recharge,
            format!(
                "Initial voucher creation with Rs {}",
                format_cents(initial_value)
            ),
        );
        let voucher = self
            .repo
            .append_entry(&entry)
            .await?
            .ok_or_else(|| AppError::Database(anyhow::anyhow!("initial load was not applied")))?;

        tracing::info!(code = %voucher.code, "voucher created");
        Ok(VoucherDetail {
            voucher,
            creator: creator.clone(),
            entries: vec![entry],
        })
    }

    /// Fetch a voucher for an admin. Disabled vouchers are invisible here;
    /// staff only see their own.
    pub async fn get_voucher(&self, user: &User, id: VoucherId) -> Result<VoucherDetail, AppError> {
        let voucher = self
            .repo
            .get_voucher(id)
            .await?
            .filter(|v| !v.is_disabled())
            .ok_or_else(|| AppError::VoucherNotFound(id.to_string()))?;

        if !user.is_superuser && voucher.creator != user.id {
            return Err(AppError::PermissionDenied);
        }

        self.with_detail(voucher).await
    }

    /// List vouchers in a scope: superusers see all, staff only their own.
    pub async fn list_vouchers(
        &self,
        user: &User,
        scope: VoucherScope,
    ) -> Result<Vec<VoucherDetail>, AppError> {
        let creator = if user.is_superuser { None } else { Some(user.id) };
        let vouchers = self.repo.list_vouchers(creator, scope).await?;

        let mut details = Vec::with_capacity(vouchers.len());
        for voucher in vouchers {
            details.push(self.with_detail(voucher).await?);
        }
        Ok(details)
    }

    // ========================
    // Lifecycle
    // ========================

    /// Soft-delete: set the disabled flag. Prior state is not checked, so a
    /// second disable just refreshes the timestamp.
    pub async fn disable_voucher(&self, user: &User, id: VoucherId) -> Result<Voucher, AppError> {
        let voucher = self
            .repo
            .get_voucher(id)
            .await?
            .ok_or_else(|| AppError::VoucherNotFound(id.to_string()))?;

        if !user.is_superuser && voucher.creator != user.id {
            return Err(AppError::PermissionDenied);
        }

        self.repo.disable_voucher(id, Utc::now()).await?;
        self.require_voucher(id).await
    }

    /// Re-activate a disabled voucher. Not-disabled reads as not found, like
    /// the lookup it replaces.
    pub async fn enable_voucher(&self, id: VoucherId) -> Result<Voucher, AppError> {
        if !self.repo.enable_voucher(id).await? {
            return Err(AppError::VoucherNotFound(id.to_string()));
        }
        self.require_voucher(id).await
    }

    /// Mark a voucher as sold. Fails as not-found when the voucher is
    /// missing, disabled, or already sold.
    pub async fn mark_voucher_sold(&self, id: VoucherId) -> Result<Voucher, AppError> {
        if !self.repo.mark_voucher_sold(id, Utc::now()).await? {
            return Err(AppError::VoucherNotFound(id.to_string()));
        }
        self.require_voucher(id).await
    }

    // ========================
    // Balance-affecting operations
    // ========================

    /// Recharge by code with a fixed denomination. Ownership is checked
    /// before the amount so a forbidden caller learns nothing about the
    /// denomination rules. Disabled/sold state does not block recharges.
    pub async fn recharge(
        &self,
        user: &User,
        code: &str,
        amount: Cents,
    ) -> Result<EntryReceipt, AppError> {
        let voucher = self
            .repo
            .get_voucher_by_code(code)
            .await?
            .ok_or_else(|| AppError::VoucherNotFound(code.to_string()))?;

        if !user.is_superuser && voucher.creator != user.id {
            return Err(AppError::PermissionDenied);
        }

        validate_recharge(amount)?;

        let entry = LedgerEntry::new(
            voucher.id,
            amount,
            EntryKind::Recharge,
            format!("Recharge of Rs {}", format_cents(amount)),
        );
        let voucher = self
            .repo
            .append_entry(&entry)
            .await?
            .ok_or_else(|| AppError::Database(anyhow::anyhow!("recharge was not applied")))?;

        tracing::info!(code = %voucher.code, amount = %format_cents(amount), "voucher recharged");
        Ok(EntryReceipt { entry, voucher })
    }

    /// Public redemption by code. No authentication: this is the
    /// point-of-sale path. Validation order: amount, code, lifecycle,
    /// affordability; the storage-level balance guard re-checks
    /// affordability atomically with the write.
    pub async fn pay(&self, code: &str, amount: Cents) -> Result<EntryReceipt, AppError> {
        if amount <= 0 {
            return Err(AppError::InvalidAmount("Amount must be positive".into()));
        }

        let voucher = self
            .repo
            .get_voucher_by_code(code)
            .await?
            .ok_or(AppError::InvalidVoucherCode)?;

        validate_payment(&voucher, amount)?;

        let entry = LedgerEntry::new(
            voucher.id,
            amount,
            EntryKind::Payment,
            format!("Payment of Rs {}", format_cents(amount)),
        );
        match self.repo.append_entry(&entry).await? {
            Some(voucher) => {
                tracing::info!(code = %voucher.code, amount = %format_cents(amount), "payment accepted");
                Ok(EntryReceipt { entry, voucher })
            }
            // Lost a race with a concurrent debit: the guard held the
            // invariant, report it as an ordinary insufficient balance.
            None => Err(AppError::InsufficientBalance {
                available: voucher.balance,
                requested: amount,
            }),
        }
    }

    // ========================
    // Public balance check and statistics
    // ========================

    /// Public lookup by code, reporting balance and lifecycle status.
    pub async fn check_balance(&self, code: &str) -> Result<(Voucher, VoucherStatus), AppError> {
        let voucher = self
            .repo
            .get_voucher_by_code(code)
            .await?
            .ok_or_else(|| AppError::VoucherNotFound(code.to_string()))?;
        let status = voucher.status();
        Ok((voucher, status))
    }

    /// Global voucher counters plus the summed balance of non-disabled
    /// vouchers.
    pub async fn statistics(&self) -> Result<VoucherStats, AppError> {
        Ok(self.repo.voucher_stats().await?)
    }

    // ========================
    // Helpers
    // ========================

    async fn require_voucher(&self, id: VoucherId) -> Result<Voucher, AppError> {
        self.repo
            .get_voucher(id)
            .await?
            .ok_or_else(|| AppError::VoucherNotFound(id.to_string()))
    }

    async fn with_detail(&self, voucher: Voucher) -> Result<VoucherDetail, AppError> {
        let creator = self
            .repo
            .get_user(voucher.creator)
            .await?
            .ok_or_else(|| AppError::Database(anyhow::anyhow!("voucher creator missing")))?;
        let entries = self.repo.list_entries_for_voucher(voucher.id).await?;
        Ok(VoucherDetail {
            voucher,
            creator,
            entries,
        })
    }
}

/// Parse a path segment that must be a voucher id.
pub fn parse_voucher_id(raw: &str) -> Result<VoucherId, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::VoucherNotFound(raw.to_string()))
}
