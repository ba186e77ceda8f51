//! HTTP surface: one GET route per query function, JSON in and out.
//! Handlers recover locally from bad parameters and missing optional
//! columns; anything else falls through to the rejection handler, which
//! logs and answers with a uniform error payload.

use serde::Serialize;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::error;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::data::{Dataset, Table};
use crate::forecast::{self, ModelStore};
use crate::report;
use crate::security;

const DEFAULT_FORECAST_DAYS: usize = 7;
const MAX_FORECAST_DAYS: usize = 365;

type QueryParams = Vec<(String, String)>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForecastResponse {
    results: Vec<forecast::DistrictForecast>,
}

fn json_reply<T: Serialize>(value: &T) -> Response {
    warp::reply::json(value).into_response()
}

fn bad_request(message: String) -> Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: message,
            details: None,
        }),
        StatusCode::BAD_REQUEST,
    )
    .into_response()
}

/// Collect every `year=` value into a filter set; `None` = no filter.
fn year_filter(params: &QueryParams) -> Result<Option<HashSet<i32>>, String> {
    let mut years = HashSet::new();
    for (key, value) in params {
        if key == "year" {
            let year: i32 = value
                .parse()
                .map_err(|_| format!("invalid year value `{}`", value))?;
            years.insert(year);
        }
    }
    Ok((!years.is_empty()).then_some(years))
}

/// The engagement endpoint takes at most one `year=`.
fn single_year(params: &QueryParams) -> Result<Option<i32>, String> {
    for (key, value) in params {
        if key == "year" {
            return value
                .parse()
                .map(Some)
                .map_err(|_| format!("invalid year value `{}`", value));
        }
    }
    Ok(None)
}

fn forecast_days(params: &QueryParams) -> Result<usize, String> {
    for (key, value) in params {
        if key == "forecast_days" {
            return value
                .parse::<usize>()
                .ok()
                .filter(|d| (1..=MAX_FORECAST_DAYS).contains(d))
                .ok_or_else(|| {
                    format!(
                        "forecast_days must be an integer in 1..={}, got `{}`",
                        MAX_FORECAST_DAYS, value
                    )
                });
        }
    }
    Ok(DEFAULT_FORECAST_DAYS)
}

/// A query needed a column the loaded CSV did not carry: answer with the
/// explicit error payload instead of computing garbage.
fn require_columns<T>(table: &Table<T>, table_label: &str, required: &[&str]) -> Option<Response> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        None
    } else {
        Some(bad_request(format!(
            "{} column missing in {}",
            missing.join(", "),
            table_label
        )))
    }
}

async fn health_check() -> Result<Response, Rejection> {
    Ok(json_reply(&serde_json::json!({
        "status": "healthy",
        "service": "dashmetrics"
    })))
}

async fn summary_handler(params: QueryParams, data: Arc<Dataset>) -> Result<Response, Rejection> {
    let years = match year_filter(&params) {
        Ok(years) => years,
        Err(msg) => return Ok(bad_request(msg)),
    };
    Ok(json_reply(&report::summary(&data, years.as_ref())))
}

async fn available_years_handler(data: Arc<Dataset>) -> Result<Response, Rejection> {
    Ok(json_reply(&report::available_years(&data)))
}

async fn revenue_gva_yoy_handler(
    params: QueryParams,
    data: Arc<Dataset>,
) -> Result<Response, Rejection> {
    let years = match year_filter(&params) {
        Ok(years) => years,
        Err(msg) => return Ok(bad_request(msg)),
    };
    Ok(json_reply(&report::revenue_gva_yoy(&data, years.as_ref())))
}

async fn output_vs_gva_handler(
    params: QueryParams,
    data: Arc<Dataset>,
) -> Result<Response, Rejection> {
    let years = match year_filter(&params) {
        Ok(years) => years,
        Err(msg) => return Ok(bad_request(msg)),
    };
    Ok(json_reply(&report::output_vs_gva(&data, years.as_ref())))
}

async fn revenue_by_division_quarter_handler(
    params: QueryParams,
    data: Arc<Dataset>,
) -> Result<Response, Rejection> {
    let years = match year_filter(&params) {
        Ok(years) => years,
        Err(msg) => return Ok(bad_request(msg)),
    };
    if let Some(resp) = require_columns(&data.financial, "financial data", &["Division"]) {
        return Ok(resp);
    }
    Ok(json_reply(&report::revenue_by_division_quarter(
        &data,
        years.as_ref(),
    )))
}

async fn revenue_by_division_handler(
    params: QueryParams,
    data: Arc<Dataset>,
) -> Result<Response, Rejection> {
    let years = match year_filter(&params) {
        Ok(years) => years,
        Err(msg) => return Ok(bad_request(msg)),
    };
    if let Some(resp) = require_columns(&data.financial, "financial data", &["Division"]) {
        return Ok(resp);
    }
    Ok(json_reply(&report::revenue_by_division(&data, years.as_ref())))
}

async fn employee_distribution_handler(data: Arc<Dataset>) -> Result<Response, Rejection> {
    Ok(json_reply(&report::employee_distribution(&data)))
}

async fn supply_performance_handler(data: Arc<Dataset>) -> Result<Response, Rejection> {
    if let Some(resp) = require_columns(
        &data.supply,
        "supply chain data",
        &["Region", "Delivery_Time_Days"],
    ) {
        return Ok(resp);
    }
    Ok(json_reply(&report::supply_performance(&data)))
}

async fn rd_status_handler(data: Arc<Dataset>) -> Result<Response, Rejection> {
    if let Some(resp) = require_columns(&data.rd, "R&D portfolio data", &["Status"]) {
        return Ok(resp);
    }
    Ok(json_reply(&report::rd_status(&data)))
}

async fn rd_patents_trend_handler(data: Arc<Dataset>) -> Result<Response, Rejection> {
    if let Some(resp) = require_columns(
        &data.rd,
        "R&D portfolio data",
        &["Year", "Patent_Applications"],
    ) {
        return Ok(resp);
    }
    Ok(json_reply(&report::rd_patents_trend(&data)))
}

async fn security_forecasts_handler(
    params: QueryParams,
    data: Arc<Dataset>,
    store: Arc<ModelStore>,
) -> Result<Response, Rejection> {
    let horizon = match forecast_days(&params) {
        Ok(horizon) => horizon,
        Err(msg) => return Ok(bad_request(msg)),
    };
    Ok(json_reply(&ForecastResponse {
        results: forecast::district_forecasts(&data, &store, horizon),
    }))
}

async fn engagement_handler(
    params: QueryParams,
    data: Arc<Dataset>,
) -> Result<Response, Rejection> {
    let year = match single_year(&params) {
        Ok(year) => year,
        Err(msg) => return Ok(bad_request(msg)),
    };
    Ok(json_reply(&security::engagement_effectiveness(&data, year)))
}

fn with_data(
    data: Arc<Dataset>,
) -> impl Filter<Extract = (Arc<Dataset>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&data))
}

fn with_store(
    store: Arc<ModelStore>,
) -> impl Filter<Extract = (Arc<ModelStore>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&store))
}

/// Every route of the service. CORS and rejection recovery are applied
/// by the caller so tests can drive this filter directly.
pub fn routes(
    data: Arc<Dataset>,
    store: Arc<ModelStore>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let health = warp::path!("health")
        .and(warp::get())
        .and_then(health_check);

    let summary = warp::path!("api" / "summary")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and_then(summary_handler);

    let available_years = warp::path!("api" / "available-years")
        .and(warp::get())
        .and(with_data(Arc::clone(&data)))
        .and_then(available_years_handler);

    let revenue_gva_yoy = warp::path!("api" / "revenue-gva-yoy")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and_then(revenue_gva_yoy_handler);

    let output_vs_gva = warp::path!("api" / "output-vs-gva")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and_then(output_vs_gva_handler);

    let revenue_by_division_quarter = warp::path!("api" / "revenue-by-division-quarter")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and_then(revenue_by_division_quarter_handler);

    let revenue_by_division = warp::path!("api" / "revenue-by-division")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and_then(revenue_by_division_handler);

    let employee_distribution = warp::path!("api" / "employee-distribution")
        .and(warp::get())
        .and(with_data(Arc::clone(&data)))
        .and_then(employee_distribution_handler);

    let supply_performance = warp::path!("api" / "supply-performance")
        .and(warp::get())
        .and(with_data(Arc::clone(&data)))
        .and_then(supply_performance_handler);

    let rd_status = warp::path!("api" / "rd-status")
        .and(warp::get())
        .and(with_data(Arc::clone(&data)))
        .and_then(rd_status_handler);

    let rd_patents_trend = warp::path!("api" / "rd-patents-trend")
        .and(warp::get())
        .and(with_data(Arc::clone(&data)))
        .and_then(rd_patents_trend_handler);

    let security_forecasts = warp::path!("api" / "security-forecasts")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(Arc::clone(&data)))
        .and(with_store(Arc::clone(&store)))
        .and_then(security_forecasts_handler);

    let engagement = warp::path!("api" / "community-engagement-vs-effectiveness")
        .and(warp::get())
        .and(warp::query::<QueryParams>())
        .and(with_data(data))
        .and_then(engagement_handler);

    health
        .or(summary)
        .unify()
        .or(available_years)
        .unify()
        .or(revenue_gva_yoy)
        .unify()
        .or(output_vs_gva)
        .unify()
        .or(revenue_by_division_quarter)
        .unify()
        .or(revenue_by_division)
        .unify()
        .or(employee_distribution)
        .unify()
        .or(supply_performance)
        .unify()
        .or(rd_status)
        .unify()
        .or(rd_patents_trend)
        .unify()
        .or(security_forecasts)
        .unify()
        .or(engagement)
        .unify()
}

/// Permissive CORS, mirroring what the dashboard frontend expects.
pub fn cors() -> warp::filters::cors::Builder {
    warp::cors().allow_any_origin().allow_methods(vec!["GET"])
}

/// Boundary for anything the handlers did not answer themselves: log it
/// and reply with a uniform JSON error.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&ErrorResponse {
                error: "not found".to_string(),
                details: None,
            }),
            StatusCode::NOT_FOUND,
        )
        .into_response());
    }

    error!("unhandled rejection: {:?}", err);
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: "internal server error".to_string(),
            details: None,
        }),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .into_response())
}
