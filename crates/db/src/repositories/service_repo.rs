//! Repository for `services`, `service_zones` and `service_prices`.

use sqlx::PgPool;
use slotbook_core::pricing::{DayType, PriceRuleDraft};
use slotbook_core::types::DbId;

use crate::models::service::{CreateService, Service, ServicePrice, UpdateService, ZoneService};

/// Column list for services queries.
const COLUMNS: &str = "id, category_id, branch_id, name, description, duration_minutes, \
    max_participants, is_online_available, is_active, created_at, updated_at";

/// Column list for service_prices queries.
const PRICE_COLUMNS: &str =
    "id, service_id, zone_id, branch_id, day_type, time_from, time_to, price, priority";

pub struct ServiceRepo;

impl ServiceRepo {
    /// Find a service by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Service>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM services WHERE id = $1");
        sqlx::query_as::<_, Service>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Return the ids from `ids` that do not exist.
    pub async fn missing_ids(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT wanted.id
             FROM UNNEST($1::BIGINT[]) AS wanted(id)
             LEFT JOIN services s ON s.id = wanted.id
             WHERE s.id IS NULL
             ORDER BY wanted.id",
        )
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
    }

    /// Zone ids linked to a service.
    pub async fn zone_ids(pool: &PgPool, service_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT zone_id FROM service_zones WHERE service_id = $1 ORDER BY zone_id",
        )
        .bind(service_id)
        .fetch_all(pool)
        .await
    }

    /// All price rules of a service, highest priority first.
    pub async fn list_prices(
        pool: &PgPool,
        service_id: DbId,
    ) -> Result<Vec<ServicePrice>, sqlx::Error> {
        let query = format!(
            "SELECT {PRICE_COLUMNS} FROM service_prices
             WHERE service_id = $1
             ORDER BY priority DESC, price ASC, id ASC"
        );
        sqlx::query_as::<_, ServicePrice>(&query)
            .bind(service_id)
            .fetch_all(pool)
            .await
    }

    /// Price rules of the given services that can apply in a zone/branch on
    /// a day type. Time windows are left to the resolver.
    pub async fn price_candidates(
        pool: &PgPool,
        service_ids: &[DbId],
        zone_id: Option<DbId>,
        branch_id: Option<DbId>,
        day_type: DayType,
    ) -> Result<Vec<ServicePrice>, sqlx::Error> {
        let query = format!(
            "SELECT {PRICE_COLUMNS} FROM service_prices
             WHERE service_id = ANY($1)
               AND (zone_id IS NULL OR zone_id = $2)
               AND (branch_id IS NULL OR branch_id = $3)
               AND day_type = $4"
        );
        sqlx::query_as::<_, ServicePrice>(&query)
            .bind(service_ids)
            .bind(zone_id)
            .bind(branch_id)
            .bind(day_type.as_str())
            .fetch_all(pool)
            .await
    }

    /// Active services linked to a zone whose category belongs to the branch.
    pub async fn list_for_zone(
        pool: &PgPool,
        branch_id: DbId,
        zone_id: DbId,
    ) -> Result<Vec<ZoneService>, sqlx::Error> {
        sqlx::query_as::<_, ZoneService>(
            "SELECT s.id, s.category_id, c.name AS category_name, s.name, s.description,
                    s.duration_minutes, s.max_participants, s.is_online_available
             FROM services s
             JOIN service_zones sz ON sz.service_id = s.id
             JOIN service_categories c ON c.id = s.category_id
             WHERE sz.zone_id = $2 AND c.branch_id = $1 AND s.is_active
             ORDER BY c.name ASC, s.name ASC, s.id ASC",
        )
        .bind(branch_id)
        .bind(zone_id)
        .fetch_all(pool)
        .await
    }

    /// Create a service with its zone links and price rules in one
    /// transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateService,
        rules: &[PriceRuleDraft],
    ) -> Result<Service, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO services
                (category_id, branch_id, name, description, duration_minutes,
                 max_participants, is_online_available, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, false), COALESCE($8, true))
             RETURNING {COLUMNS}"
        );
        let service = sqlx::query_as::<_, Service>(&query)
            .bind(input.category_id)
            .bind(input.branch_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.duration_minutes)
            .bind(input.max_participants)
            .bind(input.is_online_available)
            .bind(input.is_active)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_zones_inner(&mut tx, service.id, &input.zone_ids).await?;
        Self::set_prices_inner(&mut tx, service.id, service.branch_id, rules).await?;

        tx.commit().await?;
        Ok(service)
    }

    /// Update a service. `zone_ids`/`rules` replace the stored sets when
    /// present. Returns `None` if the service does not exist.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateService,
        rules: Option<&[PriceRuleDraft]>,
    ) -> Result<Option<Service>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE services SET
                category_id = COALESCE($1, category_id),
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration_minutes = COALESCE($4, duration_minutes),
                max_participants = COALESCE($5, max_participants),
                is_online_available = COALESCE($6, is_online_available),
                is_active = COALESCE($7, is_active)
             WHERE id = $8
             RETURNING {COLUMNS}"
        );
        let Some(service) = sqlx::query_as::<_, Service>(&query)
            .bind(input.category_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.duration_minutes)
            .bind(input.max_participants)
            .bind(input.is_online_available)
            .bind(input.is_active)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if let Some(zone_ids) = &input.zone_ids {
            Self::set_zones_inner(&mut tx, id, zone_ids).await?;
        }
        if let Some(rules) = rules {
            Self::set_prices_inner(&mut tx, id, service.branch_id, rules).await?;
        }

        tx.commit().await?;
        Ok(Some(service))
    }

    /// Replace zone links within an existing transaction.
    async fn set_zones_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        service_id: DbId,
        zone_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM service_zones WHERE service_id = $1")
            .bind(service_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO service_zones (service_id, zone_id)
             SELECT $1, z FROM (SELECT DISTINCT UNNEST($2::BIGINT[]) AS z) ids",
        )
        .bind(service_id)
        .bind(zone_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Replace price rules within an existing transaction. Rules inherit the
    /// service's branch.
    async fn set_prices_inner(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        service_id: DbId,
        branch_id: Option<DbId>,
        rules: &[PriceRuleDraft],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM service_prices WHERE service_id = $1")
            .bind(service_id)
            .execute(&mut **tx)
            .await?;

        for rule in rules {
            sqlx::query(
                "INSERT INTO service_prices
                    (service_id, zone_id, branch_id, day_type, time_from, time_to, price, priority)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(service_id)
            .bind(rule.zone_id)
            .bind(branch_id)
            .bind(rule.day_type.as_str())
            .bind(rule.time_from)
            .bind(rule.time_to)
            .bind(rule.price)
            .bind(rule.priority)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}
