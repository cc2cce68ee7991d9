//! # API REST
//!
//! REST API implementation for SkinHub.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON and multipart decoding, CORS, preflight, static uploads)
//!
//! Business rules live in `skinhub-core`; this crate only validates request shape, calls the
//! services, and maps their errors onto status codes (see [`error`]).

#![warn(rust_2018_idioms)]

pub mod error;
pub mod routes;
pub mod state;

#[cfg(test)]
mod tests;

pub use error::{ApiError, ApiJson};
pub use state::AppState;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::*;

/// Request body cap: the largest accepted image plus room for multipart framing.
pub const BODY_LIMIT_BYTES: usize = skinhub_files::MAX_UPLOAD_BYTES + 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::auth::signup,
        routes::auth::login,
        routes::appointments::book,
        routes::appointments::list,
        routes::appointments::update_status,
        routes::appointments::pending_reviews,
        routes::reviews::add,
        routes::reviews::list,
        routes::users::doctors,
        routes::users::profile,
        routes::users::update_profile,
        routes::predict::upload,
        routes::predict::analyze,
        routes::predict::save,
        routes::predict::history,
        routes::heatmap::stats,
        routes::heatmap::diseases,
        routes::heatmap::save,
        routes::calls::schedule,
        routes::calls::list,
    ),
    components(schemas(
        HealthRes,
        MessageRes,
        CreatedRes,
        SignupReq,
        LoginReq,
        LoginRes,
        AuthUser,
        DoctorRes,
        ProfileRes,
        UpdateProfileReq,
        BookAppointmentReq,
        UpdateStatusReq,
        AppointmentRes,
        PendingReviewRes,
        AddReviewReq,
        ReviewRes,
        UploadRes,
        AnalyzeRes,
        SavePredictionReq,
        PredictionRes,
        StateCases,
        HeatmapStatsRes,
        SaveHeatmapReq,
        ScheduleCallReq,
        ScheduleCallRes,
        ScheduledCallRes,
    ))
)]
pub struct ApiDoc;

/// Answers any `OPTIONS` request with an empty 200.
///
/// Proper CORS preflights are already handled by the CORS layer outside this one.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

/// Build the REST router with every endpoint, the OpenAPI document and static uploads.
pub fn router(state: AppState) -> Router {
    let uploads_root = state.cfg.public_dir().join("uploads");
    let expose_error_details = state.expose_error_details;

    let mut app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/auth/signup", post(routes::auth::signup))
        .route("/auth/login", post(routes::auth::login))
        .route("/appointments", get(routes::appointments::list))
        .route("/appointments/book", post(routes::appointments::book))
        .route(
            "/appointments/update_status",
            post(routes::appointments::update_status),
        )
        .route(
            "/appointments/pending_reviews",
            get(routes::appointments::pending_reviews),
        )
        .route("/reviews", get(routes::reviews::list))
        .route("/reviews/add", post(routes::reviews::add))
        .route("/users/doctors", get(routes::users::doctors))
        .route("/users/profile", get(routes::users::profile))
        .route("/users/update_profile", post(routes::users::update_profile))
        .route("/predict/upload", post(routes::predict::upload))
        .route("/predict/analyze", post(routes::predict::analyze))
        .route("/predict/save", post(routes::predict::save))
        .route("/predict/history", get(routes::predict::history))
        .route("/heatmap/stats", get(routes::heatmap::stats))
        .route("/heatmap/diseases", get(routes::heatmap::diseases))
        .route("/heatmap/save", post(routes::heatmap::save))
        .route("/calls", get(routes::calls::list))
        .route("/calls/schedule", post(routes::calls::schedule))
        .nest_service("/uploads", ServeDir::new(uploads_root))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES));

    if expose_error_details {
        app = app.layer(middleware::from_fn(error::expose_store_error_details));
    }

    app.layer(middleware::from_fn(answer_options))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
