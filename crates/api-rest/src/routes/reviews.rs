use super::{optional_text, required_id};
use crate::error::{self, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{AddReviewReq, CreatedRes, DoctorIdQuery, MessageRes, ReviewRes};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use skinhub_core::{NewReview, Rating, ReviewService};

#[utoipa::path(
    post,
    path = "/reviews/add",
    request_body = AddReviewReq,
    responses(
        (status = 201, description = "Review stored", body = CreatedRes),
        (status = 400, description = "Incomplete data, rating outside 1-5, appointment not reviewable or already reviewed", body = MessageRes),
        (status = 404, description = "No such appointment", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Rate a doctor for a completed appointment
///
/// Only the patient of a confirmed appointment dated before today may review it, once.
#[axum::debug_handler]
pub async fn add(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<AddReviewReq>,
) -> Result<(StatusCode, Json<CreatedRes>), ApiError> {
    let review = NewReview {
        appointment_id: required_id(req.appointment_id)?,
        doctor_id: required_id(req.doctor_id)?,
        user_id: required_id(req.user_id)?,
        rating: Rating::new(required_id(req.rating)?)?,
        comment: optional_text(req.comment),
    };

    let id = ReviewService::new(state.cfg.clone())
        .add(review)
        .map_err(|e| ApiError::from_core(e, "Unable to submit review."))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRes {
            message: "Review submitted successfully.".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/reviews",
    params(("doctor_id" = i64, Query, description = "Doctor account id")),
    responses(
        (status = 200, description = "Reviews of the doctor, newest first", body = [ReviewRes]),
        (status = 400, description = "Missing or malformed doctor_id", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DoctorIdQuery>,
) -> Result<Json<Vec<ReviewRes>>, ApiError> {
    let doctor_id = error::required_id(query.doctor_id.as_deref(), "doctor_id")?;
    Ok(Json(ReviewService::new(state.cfg.clone()).list(doctor_id)?))
}
