use crate::state::AppState;
use api_shared::{HealthRes, HealthService};
use axum::{extract::State, response::Json};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Always answers 200; `ok` is false when the store cannot be opened.
#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> Json<HealthRes> {
    let store_ok = match state.cfg.open_db() {
        Ok(_) => true,
        Err(e) => {
            tracing::error!(error = %e, "health check could not open the store");
            false
        }
    };
    Json(HealthService::check_health(store_ok))
}
