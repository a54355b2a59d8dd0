//! Repository for the `credit_accounts` table.
//!
//! The reserve path is a single conditional UPDATE so that two
//! concurrent reservations against a balance of 1 are serialized by the
//! row lock: exactly one sees `credits > 0` and wins.

use sqlx::PgPool;

use reelgen_core::types::DbId;

use crate::models::account::CreditAccount;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "user_id, credits, created_at, updated_at";

/// Result of attempting to reserve one credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// One credit was debited; `remaining` is the post-debit balance.
    Reserved { remaining: i32 },
    /// The account exists but its balance is zero.
    Insufficient,
    /// No account row exists for this user.
    NotFound,
}

/// Provides ledger operations for credit accounts.
pub struct CreditRepo;

impl CreditRepo {
    /// Create an account with an opening balance, returning the row.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        credits: i32,
    ) -> Result<CreditAccount, sqlx::Error> {
        let query = format!(
            "INSERT INTO credit_accounts (user_id, credits)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CreditAccount>(&query)
            .bind(user_id)
            .bind(credits)
            .fetch_one(pool)
            .await
    }

    /// Find an account by user ID.
    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<CreditAccount>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM credit_accounts WHERE user_id = $1");
        sqlx::query_as::<_, CreditAccount>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically debit one credit if the balance allows it.
    ///
    /// The debit is a single `UPDATE ... WHERE credits > 0 RETURNING`
    /// statement, so no two callers can both win the last credit. When
    /// the UPDATE matches no row, a follow-up existence check
    /// distinguishes an empty balance from a missing account -- that
    /// check is for error classification only and takes no part in the
    /// atomicity argument.
    pub async fn reserve(pool: &PgPool, user_id: DbId) -> Result<ReserveOutcome, sqlx::Error> {
        let debited: Option<(i32,)> = sqlx::query_as(
            "UPDATE credit_accounts
             SET credits = credits - 1, updated_at = now()
             WHERE user_id = $1 AND credits > 0
             RETURNING credits",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        if let Some((remaining,)) = debited {
            return Ok(ReserveOutcome::Reserved { remaining });
        }

        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM credit_accounts WHERE user_id = $1)")
                .bind(user_id)
                .fetch_one(pool)
                .await?;

        if exists.0 {
            Ok(ReserveOutcome::Insufficient)
        } else {
            Ok(ReserveOutcome::NotFound)
        }
    }

    /// Unconditionally credit one unit back to the account.
    ///
    /// Compensation for a failed workflow; not transactional with the
    /// original debit. Returns `false` if no account row was matched.
    pub async fn refund(pool: &PgPool, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE credit_accounts
             SET credits = credits + 1, updated_at = now()
             WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
