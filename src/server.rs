//! HTTP surface of the quote service: routing, request orchestration, and
//! outcome-to-status mapping.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};

use crate::core::deadline::Deadline;
use crate::core::quote::ExchangeRateProvider;
use crate::core::store::QuoteStore;

/// Shared per-process state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn ExchangeRateProvider>,
    pub store: Arc<dyn QuoteStore>,
    pub request_ceiling: Duration,
}

/// Build the service router. The canonical route and the bare root serve the
/// same handler.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/cotacao", get(current_quote))
        .route("/", get(current_quote))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// One request: fetch under a derived deadline, persist under another, answer
/// with the quote itself. A failed fetch means persistence is never
/// attempted; a failed persist shadows a successful fetch.
async fn current_quote(State(state): State<AppState>) -> Response {
    let deadline = Deadline::after(state.request_ceiling);

    let quote = match state.provider.fetch(deadline).await {
        Ok(quote) => quote,
        Err(err) => {
            warn!(error = %err, "Exchange provider call failed");
            return failure(StatusCode::EXPECTATION_FAILED);
        }
    };

    match state.store.insert(deadline, quote.clone()).await {
        Ok(stored) => {
            debug!(id = stored.id, bid = %quote.bid, "Quote served");
            (StatusCode::OK, Json(quote)).into_response()
        }
        Err(err) => {
            error!(error = %err, "Quote fetched but not persisted");
            failure(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Failure responses carry a JSON `null` body and no error detail.
fn failure(status: StatusCode) -> Response {
    (status, Json(Value::Null)).into_response()
}
