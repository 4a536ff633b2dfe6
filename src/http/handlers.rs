use log::{debug, error, info};
use serde::Deserialize;
use warp::Rejection;

use crate::db::models::Listing;
use crate::http::error::ApiError;
use crate::http::AppContext;
use crate::report::{can_manage_market_data, can_view_reports, EntityReport, Role};
use crate::snapshot::{recompute_all, AggregationParams, EntityScope, Period};

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Period label "YYYY-MM"; defaults to the current month.
    pub period: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunSnapshotsRequest {
    /// "buildings", "areas" or "all" (default).
    pub scope: Option<String>,
    /// Period label "YYYY-MM"; defaults to the current month.
    pub period: Option<String>,
}

fn parse_period(label: Option<&str>) -> Result<Period, Rejection> {
    match label {
        Some(l) => Period::parse(l).ok_or_else(|| {
            warp::reject::custom(ApiError::bad_request(format!(
                "Invalid period '{}', expected YYYY-MM",
                l
            )))
        }),
        None => Ok(Period::month_of(chrono::Utc::now().date_naive())),
    }
}

fn require(allowed: bool) -> Result<(), Rejection> {
    if allowed {
        Ok(())
    } else {
        Err(warp::reject::custom(ApiError::forbidden(
            "Insufficient permissions",
        )))
    }
}

pub async fn get_building_report(
    building_id: i64,
    query: ReportQuery,
    role: Role,
    ctx: AppContext,
) -> Result<impl warp::Reply, Rejection> {
    require(can_view_reports(role))?;
    let period = parse_period(query.period.as_deref())?;

    let cache_key = format!("building:{}:{}", building_id, period);
    if let Some(cached) = ctx.report_cache.get(&cache_key).await {
        debug!("Report cache hit for {}", cache_key);
        return Ok(warp::reply::json(&cached));
    }

    info!("Building report for building {} period {}", building_id, period);

    let building = ctx
        .db
        .postgres
        .get_building(building_id)
        .await
        .map_err(|e| {
            error!("Failed to load building {}: {:#}", building_id, e);
            warp::reject::custom(ApiError::database_error(e.to_string()))
        })?
        .ok_or_else(|| {
            warp::reject::custom(ApiError::not_found(format!(
                "Building {} not found",
                building_id
            )))
        })?;

    let current = ctx
        .db
        .postgres
        .get_building_snapshots(building_id, period.start)
        .await
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;
    let previous = ctx
        .db
        .postgres
        .get_building_snapshots(building_id, period.previous().start)
        .await
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;

    let report = EntityReport::build(building_id, building.name, period, current, previous);
    let payload = serde_json::to_value(&report)
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;

    ctx.report_cache.insert(cache_key, payload.clone()).await;
    Ok(warp::reply::json(&payload))
}

pub async fn get_area_report(
    area_id: i64,
    query: ReportQuery,
    role: Role,
    ctx: AppContext,
) -> Result<impl warp::Reply, Rejection> {
    require(can_view_reports(role))?;
    let period = parse_period(query.period.as_deref())?;

    let cache_key = format!("area:{}:{}", area_id, period);
    if let Some(cached) = ctx.report_cache.get(&cache_key).await {
        debug!("Report cache hit for {}", cache_key);
        return Ok(warp::reply::json(&cached));
    }

    info!("Building report for area {} period {}", area_id, period);

    let area = ctx
        .db
        .postgres
        .get_area(area_id)
        .await
        .map_err(|e| {
            error!("Failed to load area {}: {:#}", area_id, e);
            warp::reject::custom(ApiError::database_error(e.to_string()))
        })?
        .ok_or_else(|| {
            warp::reject::custom(ApiError::not_found(format!("Area {} not found", area_id)))
        })?;

    let current = ctx
        .db
        .postgres
        .get_area_snapshots(area_id, period.start)
        .await
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;
    let previous = ctx
        .db
        .postgres
        .get_area_snapshots(area_id, period.previous().start)
        .await
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;

    let report = EntityReport::build(area_id, area.name, period, current, previous);
    let payload = serde_json::to_value(&report)
        .map_err(|e| warp::reject::custom(ApiError::database_error(e.to_string())))?;

    ctx.report_cache.insert(cache_key, payload.clone()).await;
    Ok(warp::reply::json(&payload))
}

/// Admin trigger: recompute snapshots synchronously and report the outcome.
pub async fn run_snapshots(
    request: RunSnapshotsRequest,
    role: Role,
    ctx: AppContext,
) -> Result<impl warp::Reply, Rejection> {
    require(can_manage_market_data(role))?;

    let scope = match request.scope.as_deref() {
        None | Some("all") => EntityScope::All,
        Some("buildings") => EntityScope::Buildings,
        Some("areas") => EntityScope::Areas,
        Some(other) => {
            return Err(warp::reject::custom(ApiError::bad_request(format!(
                "Unknown scope '{}', expected buildings|areas|all",
                other
            ))))
        },
    };
    let period = parse_period(request.period.as_deref())?;

    info!("Admin-triggered snapshot run: scope {:?}, period {}", scope, period);

    let params = AggregationParams::from(&ctx.settings.market);
    let result = recompute_all(&ctx.db, params, scope, period)
        .await
        .map_err(|e| {
            error!("Snapshot recomputation failed: {:#}", e);
            warp::reject::custom(ApiError::database_error(e.to_string()))
        })?;

    // Recomputed rows make every cached report stale
    ctx.report_cache.invalidate_all();

    Ok(warp::reply::json(&result))
}

/// Admin ingest: bulk upsert of raw listings from the import pipeline.
pub async fn ingest_listings(
    listings: Vec<Listing>,
    role: Role,
    ctx: AppContext,
) -> Result<impl warp::Reply, Rejection> {
    require(can_manage_market_data(role))?;

    if listings.is_empty() {
        return Err(warp::reject::custom(ApiError::bad_request(
            "Empty listing batch",
        )));
    }

    let count = listings.len();
    ctx.db.postgres.set_listings(&listings).await.map_err(|e| {
        error!("Failed to ingest {} listings: {:#}", count, e);
        warp::reject::custom(ApiError::database_error(e.to_string()))
    })?;

    info!("Ingested {} listings", count);
    Ok(warp::reply::json(&serde_json::json!({
        "imported": count,
    })))
}
