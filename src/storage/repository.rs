use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Cents, EntryKind, LedgerEntry, User, UserId, Voucher, VoucherId, VoucherScope,
};

use super::MIGRATION_001_INITIAL;

/// Aggregate counters for the statistics endpoint.
#[derive(Debug, Clone)]
pub struct VoucherStats {
    pub total_vouchers: i64,
    /// Non-disabled vouchers; sold ones still count here.
    pub active_vouchers: i64,
    pub disabled_vouchers: i64,
    pub sold_vouchers: i64,
    /// Summed balance of non-disabled vouchers.
    pub total_balance: Cents,
}

/// Repository for persisting users, tokens, vouchers and ledger entries.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // User operations
    // ========================

    pub async fn save_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_staff, is_superuser, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .bind(user.is_superuser)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save user")?;
        Ok(())
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_staff, is_superuser, created_at FROM users WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash, is_staff, is_superuser, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by username")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    // ========================
    // Token operations
    // ========================

    /// Get the persisted token key for a user, if one was ever issued.
    pub async fn get_token_for_user(&self, user_id: UserId) -> Result<Option<String>> {
        let row = sqlx::query("SELECT key FROM auth_tokens WHERE user_id = ?")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch token")?;

        Ok(row.map(|r| r.get("key")))
    }

    pub async fn save_token(&self, user_id: UserId, key: &str) -> Result<()> {
        sqlx::query("INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(user_id.to_string())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save token")?;
        Ok(())
    }

    /// Resolve a token key to its user in one query.
    pub async fn get_user_by_token(&self, key: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.is_staff, u.is_superuser, u.created_at
            FROM users u
            JOIN auth_tokens t ON t.user_id = u.id
            WHERE t.key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by token")?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    // ========================
    // Voucher operations
    // ========================

    pub async fn save_voucher(&self, voucher: &Voucher) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO vouchers (id, code, balance, total_loaded, creator_id, created_at, updated_at, disabled_at, sold_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(voucher.id.to_string())
        .bind(&voucher.code)
        .bind(voucher.balance)
        .bind(voucher.total_loaded)
        .bind(voucher.creator.to_string())
        .bind(voucher.created_at.to_rfc3339())
        .bind(voucher.updated_at.to_rfc3339())
        .bind(voucher.disabled_at.map(|dt| dt.to_rfc3339()))
        .bind(voucher.sold_at.map(|dt| dt.to_rfc3339()))
        .execute(&self.pool)
        .await
        .context("Failed to save voucher")?;
        Ok(())
    }

    pub async fn get_voucher(&self, id: VoucherId) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!("{VOUCHER_SELECT} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch voucher")?;

        row.as_ref().map(Self::row_to_voucher).transpose()
    }

    pub async fn get_voucher_by_code(&self, code: &str) -> Result<Option<Voucher>> {
        let row = sqlx::query(&format!("{VOUCHER_SELECT} WHERE code = ?"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch voucher by code")?;

        row.as_ref().map(Self::row_to_voucher).transpose()
    }

    /// List vouchers in a lifecycle scope, newest first, optionally limited
    /// to a single creator.
    pub async fn list_vouchers(
        &self,
        creator: Option<UserId>,
        scope: VoucherScope,
    ) -> Result<Vec<Voucher>> {
        let state_clause = match scope {
            VoucherScope::Active => "disabled_at IS NULL AND sold_at IS NULL",
            VoucherScope::Disabled => "disabled_at IS NOT NULL",
            VoucherScope::Sold => "sold_at IS NOT NULL",
        };

        let rows = match creator {
            Some(creator_id) => {
                sqlx::query(&format!(
                    "{VOUCHER_SELECT} WHERE {state_clause} AND creator_id = ? ORDER BY created_at DESC"
                ))
                .bind(creator_id.to_string())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "{VOUCHER_SELECT} WHERE {state_clause} ORDER BY created_at DESC"
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .context("Failed to list vouchers")?;

        rows.iter().map(Self::row_to_voucher).collect()
    }

    /// Set the disabled flag unconditionally. Re-disabling an already
    /// disabled voucher just moves the timestamp. Returns false when the
    /// voucher does not exist.
    pub async fn disable_voucher(&self, id: VoucherId, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE vouchers SET disabled_at = ?, updated_at = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(at.to_rfc3339())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to disable voucher")?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the disabled flag. Returns false unless the voucher exists and
    /// was disabled.
    pub async fn enable_voucher(&self, id: VoucherId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE vouchers SET disabled_at = NULL, updated_at = ? WHERE id = ? AND disabled_at IS NOT NULL",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to enable voucher")?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark as sold. Returns false unless the voucher exists and is neither
    /// disabled nor already sold.
    pub async fn mark_voucher_sold(&self, id: VoucherId, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE vouchers SET sold_at = ?, updated_at = ?
            WHERE id = ? AND disabled_at IS NULL AND sold_at IS NULL
            "#,
        )
        .bind(at.to_rfc3339())
        .bind(at.to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to mark voucher sold")?;
        Ok(result.rows_affected() > 0)
    }

    // ========================
    // Ledger operations
    // ========================

    /// Append a ledger entry and update the voucher's cached balance as a
    /// single transaction. For payments the debit is a conditional UPDATE
    /// guarded on the current balance, so two racing debits can never drive
    /// it negative; `Ok(None)` means the guard rejected the debit and
    /// nothing was written.
    pub async fn append_entry(&self, entry: &LedgerEntry) -> Result<Option<Voucher>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, voucher_id, amount, kind, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.voucher_id.to_string())
        .bind(entry.amount)
        .bind(entry.kind.as_str())
        .bind(&entry.description)
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .context("Failed to insert ledger entry")?;

        let updated = match entry.kind {
            EntryKind::Recharge => sqlx::query(
                r#"
                UPDATE vouchers
                SET balance = balance + ?, total_loaded = total_loaded + ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(entry.amount)
            .bind(entry.amount)
            .bind(entry.created_at.to_rfc3339())
            .bind(entry.voucher_id.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to apply recharge")?,
            EntryKind::Payment => sqlx::query(
                r#"
                UPDATE vouchers
                SET balance = balance - ?, updated_at = ?
                WHERE id = ? AND balance >= ?
                "#,
            )
            .bind(entry.amount)
            .bind(entry.created_at.to_rfc3339())
            .bind(entry.voucher_id.to_string())
            .bind(entry.amount)
            .execute(&mut *tx)
            .await
            .context("Failed to apply payment")?,
        };

        if updated.rows_affected() == 0 {
            tx.rollback().await.context("Failed to roll back entry")?;
            return Ok(None);
        }

        let row = sqlx::query(&format!("{VOUCHER_SELECT} WHERE id = ?"))
            .bind(entry.voucher_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .context("Failed to re-read voucher")?;
        let voucher = Self::row_to_voucher(&row)?;

        tx.commit().await.context("Failed to commit entry")?;
        Ok(Some(voucher))
    }

    /// List a voucher's ledger entries, newest first.
    pub async fn list_entries_for_voucher(&self, voucher_id: VoucherId) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, voucher_id, amount, kind, description, created_at
            FROM ledger_entries
            WHERE voucher_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(voucher_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list ledger entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    // ========================
    // Statistics
    // ========================

    pub async fn voucher_stats(&self) -> Result<VoucherStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) as total,
                COALESCE(SUM(CASE WHEN disabled_at IS NULL THEN 1 ELSE 0 END), 0) as active,
                COALESCE(SUM(CASE WHEN disabled_at IS NOT NULL THEN 1 ELSE 0 END), 0) as disabled,
                COALESCE(SUM(CASE WHEN sold_at IS NOT NULL THEN 1 ELSE 0 END), 0) as sold,
                COALESCE(SUM(CASE WHEN disabled_at IS NULL THEN balance ELSE 0 END), 0) as total_balance
            FROM vouchers
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute voucher statistics")?;

        Ok(VoucherStats {
            total_vouchers: row.get("total"),
            active_vouchers: row.get("active"),
            disabled_vouchers: row.get("disabled"),
            sold_vouchers: row.get("sold"),
            total_balance: row.get("total_balance"),
        })
    }

    // ========================
    // Row mapping
    // ========================

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            username: row.get("username"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            is_staff: row.get::<i32, _>("is_staff") != 0,
            is_superuser: row.get::<i32, _>("is_superuser") != 0,
            created_at: parse_ts(row.get("created_at"))?,
        })
    }

    fn row_to_voucher(row: &sqlx::sqlite::SqliteRow) -> Result<Voucher> {
        let id_str: String = row.get("id");
        let creator_str: String = row.get("creator_id");
        Ok(Voucher {
            id: Uuid::parse_str(&id_str).context("Invalid voucher ID")?,
            code: row.get("code"),
            balance: row.get("balance"),
            total_loaded: row.get("total_loaded"),
            creator: Uuid::parse_str(&creator_str).context("Invalid creator ID")?,
            created_at: parse_ts(row.get("created_at"))?,
            updated_at: parse_ts(row.get("updated_at"))?,
            disabled_at: parse_opt_ts(row.get("disabled_at"))?,
            sold_at: parse_opt_ts(row.get("sold_at"))?,
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let voucher_str: String = row.get("voucher_id");
        let kind_str: String = row.get("kind");
        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            voucher_id: Uuid::parse_str(&voucher_str).context("Invalid voucher ID")?,
            amount: row.get("amount"),
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            description: row.get("description"),
            created_at: parse_ts(row.get("created_at"))?,
        })
    }
}

const VOUCHER_SELECT: &str = "SELECT id, code, balance, total_loaded, creator_id, created_at, updated_at, disabled_at, sold_at FROM vouchers";

fn parse_ts(raw: String) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&raw)
        .context("Invalid timestamp")?
        .with_timezone(&Utc))
}

fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}
