//! HTTP routes.
//!
//! Every route answers 200; an empty store shows up as `null` or `[]`.

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::StatisticRecord;
use crate::error::AppError;
use crate::query::StatisticsQuery;

pub fn router(query: StatisticsQuery) -> Router {
    Router::new()
        .route("/api/daily", get(daily))
        .route("/api/weekly", get(weekly))
        .route("/api/monthly", get(monthly))
        .with_state(query)
}

pub async fn daily(State(query): State<StatisticsQuery>) -> Json<Option<StatisticRecord>> {
    Json(query.daily().await)
}

pub async fn weekly(State(query): State<StatisticsQuery>) -> Json<Vec<StatisticRecord>> {
    Json(query.weekly().await)
}

pub async fn monthly(State(query): State<StatisticsQuery>) -> Json<Vec<StatisticRecord>> {
    Json(query.monthly().await)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    query: StatisticsQuery,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::server(format!("Failed to bind {addr}: {e}")))?;

    eprintln!("[server] Listening on http://{addr}");

    axum::serve(listener, router(query))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::server(format!("Server error: {e}")))
}
