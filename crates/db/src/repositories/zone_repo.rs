//! Repository for the `zones` table.

use sqlx::PgPool;
use slotbook_core::types::DbId;

use crate::models::zone::Zone;

/// Column list for zones queries.
const COLUMNS: &str = "id, branch_id, name, capacity, can_merge, is_booking_available, \
    working_from, working_to, created_at, updated_at";

/// Read and lock access to zones.
pub struct ZoneRepo;

impl ZoneRepo {
    /// Find a zone by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Zone>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM zones WHERE id = $1");
        sqlx::query_as::<_, Zone>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Row-lock the given zones of a branch for the rest of the transaction.
    ///
    /// Locks are taken in ascending id order so two bookings over
    /// overlapping zone sets cannot deadlock. Zones of other branches are
    /// not returned; callers compare the result against the requested ids.
    pub async fn lock_for_booking(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        branch_id: DbId,
        zone_ids: &[DbId],
    ) -> Result<Vec<Zone>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM zones
             WHERE branch_id = $1 AND id = ANY($2)
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, Zone>(&query)
            .bind(branch_id)
            .bind(zone_ids)
            .fetch_all(&mut **tx)
            .await
    }
}
