//! Handlers for services, their price rules and price lookups.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveTime;
use serde::Serialize;
use slotbook_core::error::CoreError;
use slotbook_core::pricing::{self, DayType, PriceQuery, PriceRule};
use slotbook_core::types::{DbId, Money};
use slotbook_db::models::service::{
    CreateService, PriceContextQuery, PricedService, ServiceDetail, ServicePrice, UpdateService,
};
use slotbook_db::repositories::{ServiceRepo, ZoneRepo};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Result of a single price lookup. `price` is `null` when no rule applies.
#[derive(Debug, Serialize)]
pub struct PriceLookup {
    pub service_id: DbId,
    pub price: Option<Money>,
}

/// POST /api/v1/services
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateService>,
) -> AppResult<(StatusCode, Json<DataResponse<ServiceDetail>>)> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("name must not be empty".to_string()).into());
    }
    let rules = pricing::sanitize_price_rules(&input.price_rules)?;

    let service = ServiceRepo::create(&state.pool, &input, &rules).await?;
    tracing::info!(service_id = service.id, rules = rules.len(), "Service created");

    let detail = load_detail(&state.pool, service.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(detail))))
}

/// GET /api/v1/services/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ServiceDetail>>> {
    let detail = load_detail(&state.pool, id).await?;
    Ok(Json(DataResponse::new(detail)))
}

/// PUT /api/v1/services/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateService>,
) -> AppResult<Json<DataResponse<ServiceDetail>>> {
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("name must not be empty".to_string()).into());
    }
    let rules = input
        .price_rules
        .as_deref()
        .map(pricing::sanitize_price_rules)
        .transpose()?;

    ServiceRepo::update(&state.pool, id, &input, rules.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found("Service", id))?;
    tracing::info!(service_id = id, "Service updated");

    let detail = load_detail(&state.pool, id).await?;
    Ok(Json(DataResponse::new(detail)))
}

/// GET /api/v1/services/{id}/prices
pub async fn list_prices(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ServicePrice>>>> {
    ensure_service(&state.pool, id).await?;
    let prices = ServiceRepo::list_prices(&state.pool, id).await?;
    Ok(Json(DataResponse::new(prices)))
}

/// GET /api/v1/services/{id}/price?zone_id&branch_id&day_type&date&time
pub async fn resolve_price(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PriceContextQuery>,
) -> AppResult<Json<DataResponse<PriceLookup>>> {
    let (day_type, time) = price_context(&params)?;
    ensure_service(&state.pool, id).await?;

    let rules: Vec<PriceRule> =
        ServiceRepo::price_candidates(&state.pool, &[id], params.zone_id, params.branch_id, day_type)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();

    let price = pricing::resolve_price(
        &rules,
        &PriceQuery {
            service_id: id,
            zone_id: params.zone_id,
            branch_id: params.branch_id,
            day_type,
            time,
        },
    );
    Ok(Json(DataResponse::new(PriceLookup {
        service_id: id,
        price,
    })))
}

/// GET /api/v1/branches/{branch_id}/zones/{zone_id}/services?day_type&date&time
///
/// Active services offered in the zone, each with the price for the given
/// context.
pub async fn list_for_zone(
    State(state): State<AppState>,
    Path((branch_id, zone_id)): Path<(DbId, DbId)>,
    Query(params): Query<PriceContextQuery>,
) -> AppResult<Json<DataResponse<Vec<PricedService>>>> {
    let (day_type, time) = price_context(&params)?;

    let zone = ZoneRepo::find_by_id(&state.pool, zone_id)
        .await?
        .ok_or_else(|| AppError::not_found("Zone", zone_id))?;
    if zone.branch_id != branch_id {
        return Err(CoreError::CrossBranch(format!(
            "Zone {zone_id} belongs to branch {}, not {branch_id}",
            zone.branch_id
        ))
        .into());
    }

    let services = ServiceRepo::list_for_zone(&state.pool, branch_id, zone_id).await?;
    let ids: Vec<DbId> = services.iter().map(|s| s.id).collect();
    let rules: Vec<PriceRule> = ServiceRepo::price_candidates(
        &state.pool,
        &ids,
        Some(zone_id),
        Some(branch_id),
        day_type,
    )
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    let priced = services
        .into_iter()
        .map(|service| {
            let price = pricing::resolve_price(
                &rules,
                &PriceQuery {
                    service_id: service.id,
                    zone_id: Some(zone_id),
                    branch_id: Some(branch_id),
                    day_type,
                    time,
                },
            );
            PricedService { service, price }
        })
        .collect();
    Ok(Json(DataResponse::new(priced)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn price_context(params: &PriceContextQuery) -> Result<(DayType, Option<NaiveTime>), CoreError> {
    let day_type = DayType::resolve(params.day_type.as_deref(), params.date)?;
    let time = params
        .time
        .as_deref()
        .map(pricing::parse_time_of_day)
        .transpose()?;
    Ok((day_type, time))
}

async fn ensure_service(pool: &PgPool, id: DbId) -> AppResult<()> {
    ServiceRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Service", id))?;
    Ok(())
}

async fn load_detail(pool: &PgPool, id: DbId) -> AppResult<ServiceDetail> {
    let service = ServiceRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Service", id))?;
    let zone_ids = ServiceRepo::zone_ids(pool, id).await?;
    let price_rules = ServiceRepo::list_prices(pool, id).await?;
    Ok(ServiceDetail {
        service,
        zone_ids,
        price_rules,
    })
}
