//! Repository for the append-only `appointment_history` table.

use sqlx::PgPool;
use slotbook_core::history::HistoryDraft;
use slotbook_core::types::DbId;

use crate::models::history::{AppointmentHistory, HistoryQuery};

/// Column list for appointment_history queries.
const COLUMNS: &str = "id, appointment_id, branch_id, action, user_id, changes, source, changed_at";

/// Default page size for history listings.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for history listings.
const MAX_LIMIT: i64 = 200;

pub struct HistoryRepo;

impl HistoryRepo {
    /// Append a history entry inside the caller's transaction.
    ///
    /// Drafts missing the appointment id or the action are skipped and
    /// `Ok(None)` is returned.
    pub async fn record(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        draft: HistoryDraft,
    ) -> Result<Option<AppointmentHistory>, sqlx::Error> {
        let Some(entry) = draft.into_entry() else {
            tracing::debug!("Skipping incomplete appointment history entry");
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO appointment_history
                (appointment_id, branch_id, action, user_id, changes, source)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, AppointmentHistory>(&query)
            .bind(entry.appointment_id)
            .bind(entry.branch_id)
            .bind(entry.action.as_str())
            .bind(entry.actor_id)
            .bind(&entry.changes)
            .bind(&entry.source)
            .fetch_one(&mut **tx)
            .await?;
        Ok(Some(row))
    }

    /// History of one appointment, newest first. Still available after the
    /// appointment itself is deleted.
    pub async fn list_for_appointment(
        pool: &PgPool,
        appointment_id: DbId,
        params: &HistoryQuery,
    ) -> Result<Vec<AppointmentHistory>, sqlx::Error> {
        let (limit, offset) = page(params);
        let query = format!(
            "SELECT {COLUMNS} FROM appointment_history
             WHERE appointment_id = $1
               AND ($2::TEXT IS NULL OR action = $2)
             ORDER BY changed_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, AppointmentHistory>(&query)
            .bind(appointment_id)
            .bind(params.action.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Branch-wide history feed, newest first.
    pub async fn list_for_branch(
        pool: &PgPool,
        branch_id: DbId,
        params: &HistoryQuery,
    ) -> Result<Vec<AppointmentHistory>, sqlx::Error> {
        let (limit, offset) = page(params);
        let query = format!(
            "SELECT {COLUMNS} FROM appointment_history
             WHERE branch_id = $1
               AND ($2::TEXT IS NULL OR action = $2)
             ORDER BY changed_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, AppointmentHistory>(&query)
            .bind(branch_id)
            .bind(params.action.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}

fn page(params: &HistoryQuery) -> (i64, i64) {
    (
        params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        params.offset.unwrap_or(0).max(0),
    )
}
