//! JSON API over the latest exchange snapshot.

use crate::core::exchange::format_fixed;
use crate::core::{CacheError, ConversionError, Exchange, LatestExchange, RateType};
use crate::store::{RateUpdater, RefreshStatus};
use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub rates: Arc<dyn LatestExchange>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ConversionRequest {
    pub value: Decimal,
    pub currency: String,
    pub rate: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ConversionResponse {
    pub result: String,
    pub currency: String,
    pub rate: String,
    pub date: NaiveDate,
}

#[derive(Debug)]
enum ApiError {
    Unavailable(CacheError),
    Conversion(ConversionError),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unavailable(e) => (StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            ApiError::Conversion(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<CacheError> for ApiError {
    fn from(e: CacheError) -> Self {
        warn!(error = %e, "Exchange rates unavailable");
        ApiError::Unavailable(e)
    }
}

impl From<ConversionError> for ApiError {
    fn from(e: ConversionError) -> Self {
        ApiError::Conversion(e)
    }
}

/// Routes serving any [`LatestExchange`].
pub fn router(rates: Arc<dyn LatestExchange>) -> Router {
    Router::new()
        .route("/", get(rates_handler))
        .route("/rates", get(rates_handler))
        .route("/convert", post(convert_handler))
        .with_state(AppState { rates })
}

/// [`router`] plus the `/status` refresh report of a [`RateUpdater`].
pub fn updater_router(updater: Arc<RateUpdater>) -> Router {
    let status_routes = Router::new()
        .route("/status", get(status_handler))
        .with_state(Arc::clone(&updater));
    router(updater).merge(status_routes)
}

async fn rates_handler(State(state): State<AppState>) -> Result<Json<Arc<Exchange>>, ApiError> {
    let exchange = state.rates.latest_exchange()?;
    debug!(date = %exchange.date, "Serving exchange rates");
    Ok(Json(exchange))
}

async fn convert_handler(
    State(state): State<AppState>,
    payload: Result<Json<ConversionRequest>, JsonRejection>,
) -> Result<Json<ConversionResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let rate_type: RateType = request.rate.parse()?;

    let exchange = state.rates.latest_exchange()?;
    let result = exchange.convert(request.value, &request.currency, rate_type)?;
    debug!(
        value = %request.value,
        currency = %request.currency,
        rate = %rate_type,
        %result,
        "Converted value"
    );

    Ok(Json(ConversionResponse {
        result: format_fixed(result),
        currency: request.currency.to_uppercase(),
        rate: rate_type.to_string(),
        date: exchange.date,
    }))
}

async fn status_handler(State(updater): State<Arc<RateUpdater>>) -> Json<RefreshStatus> {
    Json(updater.status())
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server stopped");
    Ok(())
}
