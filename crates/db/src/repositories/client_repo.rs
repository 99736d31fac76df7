//! Repository for the `clients` table: lookup-by-contact, ledger postings
//! and visit statistics.

use sqlx::PgPool;
use slotbook_core::booking::VISIT_STATUSES;
use slotbook_core::client_match::{ClientIdentity, ClientMatch, MatchKey};
use slotbook_core::ledger::LedgerPosting;
use slotbook_core::types::DbId;

use crate::models::client::Client;

/// Column list for clients queries.
const COLUMNS: &str = "id, branch_id, name, phone, email, spent, paid, discount, \
    first_visit, last_visit, visits_count, comment, agreed_to_mailing, \
    agreed_to_personal_data, created_at, updated_at";

/// Default page size for client listings.
const DEFAULT_LIMIT: i64 = 50;

/// Maximum page size for client listings.
const MAX_LIMIT: i64 = 200;

pub struct ClientRepo;

impl ClientRepo {
    /// Find a client by its primary key.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Client>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a branch's clients by name, optionally filtered by a search term.
    pub async fn list_by_branch(
        pool: &PgPool,
        branch_id: DbId,
        search: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Client>, sqlx::Error> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let query = format!(
            "SELECT {COLUMNS} FROM clients
             WHERE branch_id = $1
               AND ($2::TEXT IS NULL
                    OR name ILIKE $2 OR phone ILIKE $2 OR email ILIKE $2)
             ORDER BY name ASC, id ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Client>(&query)
            .bind(branch_id)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find or create the client identified by a booking's contact data.
    ///
    /// Lookups on the same (branch, key) are serialized with a transaction
    /// advisory lock, so concurrent bookings cannot create duplicates. On
    /// several matches the lowest id wins.
    pub async fn match_or_create(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        branch_id: DbId,
        identity: &ClientIdentity,
    ) -> Result<ClientMatch, sqlx::Error> {
        let lock_key = match &identity.key {
            MatchKey::Phone(digits) => format!("client:{branch_id}:phone:{digits}"),
            MatchKey::Email(email) => format!("client:{branch_id}:email:{email}"),
        };
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(&lock_key)
            .execute(&mut **tx)
            .await?;

        let existing: Option<DbId> = match &identity.key {
            MatchKey::Phone(digits) => {
                sqlx::query_scalar(
                    "SELECT id FROM clients
                     WHERE branch_id = $1
                       AND regexp_replace(COALESCE(phone, ''), '[^0-9]', '', 'g') = $2
                     ORDER BY id
                     LIMIT 1",
                )
                .bind(branch_id)
                .bind(digits)
                .fetch_optional(&mut **tx)
                .await?
            }
            MatchKey::Email(email) => {
                sqlx::query_scalar(
                    "SELECT id FROM clients
                     WHERE branch_id = $1 AND email = $2
                     ORDER BY id
                     LIMIT 1",
                )
                .bind(branch_id)
                .bind(email)
                .fetch_optional(&mut **tx)
                .await?
            }
        };

        if let Some(id) = existing {
            return Ok(ClientMatch::found(id));
        }

        let id: DbId = sqlx::query_scalar(
            "INSERT INTO clients (branch_id, name, phone, email)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(branch_id)
        .bind(&identity.name)
        .bind(&identity.phone)
        .bind(&identity.email)
        .fetch_one(&mut **tx)
        .await?;

        tracing::debug!(client_id = id, branch_id, "Created client from booking contact");
        Ok(ClientMatch::created(id))
    }

    /// Move a client's `paid` and `spent` totals by a signed amount.
    pub async fn apply_posting(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        posting: &LedgerPosting,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE clients
             SET paid = paid + $2, spent = spent + $2
             WHERE id = $1",
        )
        .bind(posting.client_id)
        .bind(posting.amount)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Recompute first/last visit and visit count from the client's
    /// appointments in a visit status. A full rescan, so it self-heals.
    pub async fn recalc_visits(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        client_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE clients c
             SET first_visit = v.first_visit,
                 last_visit = v.last_visit,
                 visits_count = v.visits_count
             FROM (
                 SELECT MIN(start_time) AS first_visit,
                        MAX(start_time) AS last_visit,
                        COUNT(*)::INTEGER AS visits_count
                 FROM appointments
                 WHERE client_id = $1 AND status = ANY($2)
             ) v
             WHERE c.id = $1",
        )
        .bind(client_id)
        .bind(VISIT_STATUSES)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
