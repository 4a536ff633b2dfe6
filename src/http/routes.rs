use std::convert::Infallible;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::http::error::ApiError;
use crate::http::handlers;
use crate::http::AppContext;
use crate::report::Role;

// Map our custom errors to JSON responses
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if err.find::<warp::filters::body::BodyDeserializeError>().is_some() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = "Invalid request body".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    ctx: AppContext,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let ctx_filter = {
        let ctx = ctx.clone();
        warp::any().map(move || ctx.clone())
    };

    // Resolve the caller's role from the API key header
    let role_filter = {
        let settings = ctx.settings.clone();
        warp::header::optional::<String>("x-api-key")
            .map(move |key: Option<String>| Role::from_api_key(&settings.http, key.as_deref()))
    };

    let building_report_route = warp::path!("api" / "v1" / "buildings" / i64 / "report")
        .and(warp::get())
        .and(warp::query::<handlers::ReportQuery>())
        .and(role_filter.clone())
        .and(ctx_filter.clone())
        .and_then(handlers::get_building_report);

    let area_report_route = warp::path!("api" / "v1" / "areas" / i64 / "report")
        .and(warp::get())
        .and(warp::query::<handlers::ReportQuery>())
        .and(role_filter.clone())
        .and(ctx_filter.clone())
        .and_then(handlers::get_area_report);

    let run_snapshots_route = warp::path!("api" / "v1" / "snapshots" / "run")
        .and(warp::post())
        .and(warp::body::json())
        .and(role_filter.clone())
        .and(ctx_filter.clone())
        .and_then(handlers::run_snapshots);

    let ingest_listings_route = warp::path!("api" / "v1" / "listings")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024 * 1024))
        .and(warp::body::json())
        .and(role_filter.clone())
        .and(ctx_filter.clone())
        .and_then(handlers::ingest_listings);

    info!("All routes configured successfully.");

    building_report_route
        .or(area_report_route)
        .or(run_snapshots_route)
        .or(ingest_listings_route)
        .recover(handle_rejection)
}
