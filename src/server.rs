/// HTTP server exposing the dashboard sections as JSON
use actix_web::http::StatusCode;
use actix_web::{middleware, web, App, HttpResponse, HttpServer};
use log::{error, info};
use serde::Deserialize;

use crate::dashboard::{
    attributes, commercial, density_map, filter_bounds, overview, price_map, AttributeFilter,
    CommercialFilter, OverviewFilter,
};
use crate::dataset::DataHandle;
use crate::error::Error;

/// Shared state for all workers
pub struct AppState {
    pub data: DataHandle,
}

impl AppState {
    pub fn new(data: DataHandle) -> Self {
        AppState { data }
    }
}

fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::MissingColumn(_) | Error::TypeMismatch { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({ "error": message.to_string() }))
}

fn respond(result: crate::error::Result<serde_json::Value>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Request failed: {}", e);
            }
            error_response(status, e)
        }
    }
}

/// Comma-separated lists, as sent by a multiselect widget
#[derive(Debug, Default, Deserialize)]
pub struct OverviewQuery {
    pub columns: Option<String>,
    pub zipcodes: Option<String>,
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl OverviewQuery {
    pub fn to_filter(&self) -> Result<OverviewFilter, String> {
        let zipcodes = split_list(self.zipcodes.as_deref())
            .map(|z| z.parse::<i64>().map_err(|_| format!("invalid zipcode '{}'", z)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OverviewFilter {
            columns: split_list(self.columns.as_deref()).map(str::to_string).collect(),
            zipcodes,
        })
    }
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.data.snapshot();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "houses": snapshot.houses().len(),
        "regions": snapshot.regions().len(),
    }))
}

async fn bounds(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.data.snapshot();
    respond(filter_bounds(snapshot.houses()).and_then(|b| Ok(serde_json::to_value(b)?)))
}

async fn overview_section(
    state: web::Data<AppState>,
    query: web::Query<OverviewQuery>,
) -> HttpResponse {
    let selection = match query.to_filter() {
        Ok(selection) => selection,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    let snapshot = state.data.snapshot();
    respond(overview(snapshot.houses(), &selection).map(|s| s.to_json()))
}

async fn density(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.data.snapshot();
    respond(density_map(snapshot.houses()).and_then(|m| Ok(serde_json::to_value(m)?)))
}

async fn price(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.data.snapshot();
    respond(
        price_map(snapshot.houses(), snapshot.regions()).and_then(|m| Ok(serde_json::to_value(m)?)),
    )
}

async fn commercial_section(
    state: web::Data<AppState>,
    query: web::Query<CommercialFilter>,
) -> HttpResponse {
    let snapshot = state.data.snapshot();
    respond(commercial(snapshot.houses(), &query).map(|s| s.to_json()))
}

async fn attributes_section(
    state: web::Data<AppState>,
    query: web::Query<AttributeFilter>,
) -> HttpResponse {
    let snapshot = state.data.snapshot();
    respond(attributes(snapshot.houses(), &query).and_then(|s| Ok(serde_json::to_value(s)?)))
}

/// Re-read the input files; the previous data keeps serving on failure
async fn reload(state: web::Data<AppState>) -> HttpResponse {
    match web::block(move || state.data.reload()).await {
        Ok(Ok(dataset)) => HttpResponse::Ok().json(serde_json::json!({
            "status": "reloaded",
            "houses": dataset.houses().len(),
            "regions": dataset.regions().len(),
        })),
        Ok(Err(e)) => {
            error!("Reload failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// Register every route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/bounds", web::get().to(bounds))
        .route("/overview", web::get().to(overview_section))
        .route("/maps/density", web::get().to(density))
        .route("/maps/price", web::get().to(price))
        .route("/commercial", web::get().to(commercial_section))
        .route("/attributes", web::get().to(attributes_section))
        .route("/reload", web::post().to(reload));
}

/// Start the HTTP server
pub async fn run_server(data: DataHandle) -> std::io::Result<()> {
    let host = data.config().host.clone();
    let port = data.config().port;
    let state = web::Data::new(AppState::new(data));

    info!("House Rocket dashboard API on http://{}:{}", host, port);
    info!("Health check: http://{}:{}/health", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            // Enable logger
            .wrap(middleware::Logger::default())
            // CORS for development
            .wrap(
                actix_cors::Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
