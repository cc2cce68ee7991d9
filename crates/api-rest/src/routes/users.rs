use super::{optional_text, required_id};
use crate::error::{self, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{DoctorRes, MessageRes, ProfileRes, UpdateProfileReq, UserIdQuery};
use axum::{
    extract::{Query, State},
    response::Json,
};
use skinhub_core::validation::sanitize_text;
use skinhub_core::{DoctorProfileUpdate, NonEmptyText, ProfileUpdate, UserService};

#[utoipa::path(
    get,
    path = "/users/doctors",
    responses(
        (status = 200, description = "Doctors, verified first, with rating summary", body = [DoctorRes])
    )
)]
#[axum::debug_handler]
pub async fn doctors(State(state): State<AppState>) -> Result<Json<Vec<DoctorRes>>, ApiError> {
    Ok(Json(UserService::new(state.cfg.clone()).doctors()?))
}

#[utoipa::path(
    get,
    path = "/users/profile",
    params(("user_id" = i64, Query, description = "Account id")),
    responses(
        (status = 200, description = "Account profile", body = ProfileRes),
        (status = 400, description = "Missing or malformed user_id", body = MessageRes),
        (status = 404, description = "No such user", body = MessageRes)
    )
)]
/// Profile of one account, with doctor fields for doctors
#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<ProfileRes>, ApiError> {
    let user_id = error::required_id(query.user_id.as_deref(), "user_id")?;
    Ok(Json(UserService::new(state.cfg.clone()).profile(user_id)?))
}

#[utoipa::path(
    post,
    path = "/users/update_profile",
    request_body = UpdateProfileReq,
    responses(
        (status = 200, description = "Profile updated", body = MessageRes),
        (status = 400, description = "Incomplete data, or doctor fields for a non-doctor", body = MessageRes),
        (status = 404, description = "No such user", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Update name and phone, plus doctor fields when `specialization` is present
///
/// Omitted fields keep their stored values.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateProfileReq>,
) -> Result<Json<MessageRes>, ApiError> {
    let user_id = required_id(req.user_id)?;

    let doctor = req.specialization.map(|specialization| DoctorProfileUpdate {
        specialization: sanitize_text(specialization.trim()),
        experience_years: req.experience_years.map(|y| y.get()),
        bio: optional_text(req.bio).map(|b| sanitize_text(&b)),
    });

    let update = ProfileUpdate {
        user_id,
        full_name: optional_text(req.full_name)
            .and_then(|name| NonEmptyText::new(sanitize_text(&name)).ok()),
        phone: optional_text(req.phone).map(|p| sanitize_text(&p)),
        doctor,
    };

    UserService::new(state.cfg.clone())
        .update_profile(update)
        .map_err(|e| ApiError::from_core(e, "Unable to update profile"))?;

    Ok(Json(MessageRes::new("Profile updated successfully")))
}
