//! Repository for `appointments` and its satellite tables
//! (`appointment_zones`, `appointment_meta`).

use sqlx::PgPool;
use slotbook_core::availability::AvailabilityQuery;
use slotbook_core::booking::{BookingPlan, DEFAULT_META_COLOR};
use slotbook_core::types::DbId;

use crate::models::appointment::{Appointment, AppointmentMeta, AppointmentView, ConflictRow};

/// Column list for appointments queries.
const COLUMNS: &str = "id, public_code, branch_id, client_id, created_by, service_id, \
    start_time, end_time, duration_minutes, participants_count, price, prepayment, \
    status, is_paid, payment_method, comment, created_at, updated_at";

/// Select list and joins for [`AppointmentView`].
const VIEW_SELECT: &str = "SELECT a.id, a.public_code, a.branch_id, a.client_id,
        c.name AS client_name, c.phone AS client_phone,
        a.service_id, s.name AS service_name,
        a.start_time, a.end_time, a.duration_minutes, a.participants_count,
        a.price, a.prepayment, a.status, a.is_paid, a.payment_method, a.comment,
        COALESCE(
            array_agg(az.zone_id ORDER BY az.zone_id) FILTER (WHERE az.zone_id IS NOT NULL),
            '{}'::BIGINT[]
        ) AS zone_ids,
        m.color, m.category, m.extra
    FROM appointments a
    LEFT JOIN clients c ON c.id = a.client_id
    LEFT JOIN services s ON s.id = a.service_id
    LEFT JOIN appointment_meta m ON m.appointment_id = a.id
    LEFT JOIN appointment_zones az ON az.appointment_id = a.id";

/// Group-by clause matching [`VIEW_SELECT`].
const VIEW_GROUP_BY: &str = "GROUP BY a.id, c.id, s.id, m.appointment_id";

/// Bookings returned by the journal when no date is given.
const JOURNAL_RECENT_LIMIT: i64 = 200;

pub struct AppointmentRepo;

impl AppointmentRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find an appointment and row-lock it for the rest of the transaction.
    pub async fn find_for_update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<Appointment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM appointments WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Appointment>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Appointment joined with client, service, zones and meta.
    pub async fn find_view(pool: &PgPool, id: DbId) -> Result<Option<AppointmentView>, sqlx::Error> {
        let query = format!("{VIEW_SELECT} WHERE a.id = $1 {VIEW_GROUP_BY}");
        sqlx::query_as::<_, AppointmentView>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Branch journal: one day ascending, or the most recent bookings
    /// descending when no date is given.
    pub async fn list_journal(
        pool: &PgPool,
        branch_id: DbId,
        date: Option<chrono::NaiveDate>,
    ) -> Result<Vec<AppointmentView>, sqlx::Error> {
        match date {
            Some(date) => {
                let query = format!(
                    "{VIEW_SELECT}
                     WHERE a.branch_id = $1 AND a.start_time::DATE = $2
                     {VIEW_GROUP_BY}
                     ORDER BY a.start_time ASC, a.id ASC"
                );
                sqlx::query_as::<_, AppointmentView>(&query)
                    .bind(branch_id)
                    .bind(date)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "{VIEW_SELECT}
                     WHERE a.branch_id = $1
                     {VIEW_GROUP_BY}
                     ORDER BY a.start_time DESC, a.id DESC
                     LIMIT $2"
                );
                sqlx::query_as::<_, AppointmentView>(&query)
                    .bind(branch_id)
                    .bind(JOURNAL_RECENT_LIMIT)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Whether a public code is already taken.
    pub async fn public_code_exists(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        code: &str,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM appointments WHERE public_code = $1)")
            .bind(code)
            .fetch_one(&mut **tx)
            .await
    }

    /// Meta record of an appointment.
    pub async fn find_meta(
        pool: &PgPool,
        appointment_id: DbId,
    ) -> Result<Option<AppointmentMeta>, sqlx::Error> {
        sqlx::query_as::<_, AppointmentMeta>(
            "SELECT appointment_id, color, category, extra
             FROM appointment_meta WHERE appointment_id = $1",
        )
        .bind(appointment_id)
        .fetch_optional(pool)
        .await
    }

    /// Bookings in the query's branch that share a zone with it and overlap
    /// its window, excluding `query.exclude_id`. `zone_ids` holds only the
    /// shared zones. Ordered by start time.
    ///
    /// Accepts either the pool (standalone check) or a transaction
    /// (enforcement during create/update).
    pub async fn find_conflicts<'e, E>(
        executor: E,
        query: &AvailabilityQuery,
    ) -> Result<Vec<ConflictRow>, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, ConflictRow>(
            "SELECT a.id, a.start_time, a.end_time,
                    array_agg(DISTINCT az.zone_id ORDER BY az.zone_id) AS zone_ids
             FROM appointments a
             JOIN appointment_zones az ON az.appointment_id = a.id
             WHERE a.branch_id = $1
               AND az.zone_id = ANY($2)
               AND a.start_time < $3
               AND a.end_time > $4
               AND ($5::BIGINT IS NULL OR a.id <> $5)
             GROUP BY a.id, a.start_time, a.end_time
             ORDER BY a.start_time ASC, a.id ASC",
        )
        .bind(query.branch_id)
        .bind(&query.zone_ids)
        .bind(query.window.end)
        .bind(query.window.start)
        .bind(query.exclude_id)
        .fetch_all(executor)
        .await
    }

    // -----------------------------------------------------------------------
    // Writes (transaction-scoped)
    // -----------------------------------------------------------------------

    /// Insert a new appointment row from a validated plan.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        plan: &BookingPlan,
        public_code: &str,
        client_id: Option<DbId>,
        created_by: Option<DbId>,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            "INSERT INTO appointments
                (public_code, branch_id, client_id, created_by, service_id,
                 start_time, end_time, duration_minutes, participants_count,
                 price, prepayment, status, is_paid, payment_method, comment)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(public_code)
            .bind(plan.branch_id)
            .bind(client_id)
            .bind(created_by)
            .bind(plan.totals.main_service_id)
            .bind(plan.window.start)
            .bind(plan.window.end)
            .bind(plan.window.duration_minutes())
            .bind(plan.totals.participants)
            .bind(plan.totals.final_price)
            .bind(plan.totals.prepaid)
            .bind(plan.status.as_str())
            .bind(plan.payment.is_paid)
            .bind(plan.payment.method.map(|m| m.as_str()))
            .bind(&plan.comment)
            .fetch_one(&mut **tx)
            .await
    }

    /// Overwrite an appointment's booking fields from a validated plan.
    pub async fn update(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        plan: &BookingPlan,
        client_id: Option<DbId>,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET
                client_id = $1,
                service_id = $2,
                start_time = $3,
                end_time = $4,
                duration_minutes = $5,
                participants_count = $6,
                price = $7,
                prepayment = $8,
                status = $9,
                is_paid = $10,
                payment_method = $11,
                comment = $12
             WHERE id = $13
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(client_id)
            .bind(plan.totals.main_service_id)
            .bind(plan.window.start)
            .bind(plan.window.end)
            .bind(plan.window.duration_minutes())
            .bind(plan.totals.participants)
            .bind(plan.totals.final_price)
            .bind(plan.totals.prepaid)
            .bind(plan.status.as_str())
            .bind(plan.payment.is_paid)
            .bind(plan.payment.method.map(|m| m.as_str()))
            .bind(&plan.comment)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Set the payment columns only.
    pub async fn set_payment(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        is_paid: bool,
        payment_method: &str,
    ) -> Result<Appointment, sqlx::Error> {
        let query = format!(
            "UPDATE appointments SET is_paid = $1, payment_method = $2
             WHERE id = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Appointment>(&query)
            .bind(is_paid)
            .bind(payment_method)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete an appointment. Zone links and meta go with it via cascade;
    /// history rows are kept.
    ///
    /// Returns `true` if a row was deleted, `false` if not found.
    pub async fn delete(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the zone links of an appointment.
    pub async fn set_zones(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        appointment_id: DbId,
        zone_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM appointment_zones WHERE appointment_id = $1")
            .bind(appointment_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO appointment_zones (appointment_id, zone_id)
             SELECT $1, UNNEST($2::BIGINT[])",
        )
        .bind(appointment_id)
        .bind(zone_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Insert or replace the meta record. A `None` color keeps the stored
    /// one (or the default on insert); the category is never touched.
    pub async fn upsert_meta(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        appointment_id: DbId,
        color: Option<&str>,
        extra: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO appointment_meta (appointment_id, color, extra)
             VALUES ($1, COALESCE($2, $4), $3)
             ON CONFLICT (appointment_id) DO UPDATE SET
                color = COALESCE($2, appointment_meta.color),
                extra = EXCLUDED.extra",
        )
        .bind(appointment_id)
        .bind(color)
        .bind(extra)
        .bind(DEFAULT_META_COLOR)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
