//! Credit account model.

use serde::Serialize;
use sqlx::FromRow;

use reelgen_core::types::{DbId, Timestamp};

/// Full row from the `credit_accounts` table.
///
/// One row per user. `credits` is the number of generation attempts the
/// user may still start; the table carries a `CHECK (credits >= 0)`
/// constraint so a committed balance can never go negative.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CreditAccount {
    pub user_id: DbId,
    pub credits: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
