use super::{incomplete, optional_text, required_id, required_text};
use crate::error::{self, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{
    AppointmentRes, AppointmentsQuery, BookAppointmentReq, CreatedRes, MessageRes,
    PendingReviewRes, UpdateStatusReq, UserIdQuery,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use skinhub_core::validation::{parse_date, parse_time};
use skinhub_core::{AppointmentService, AppointmentStatus, AppointmentView, NewAppointment};

#[utoipa::path(
    post,
    path = "/appointments/book",
    request_body = BookAppointmentReq,
    responses(
        (status = 201, description = "Appointment booked as pending", body = CreatedRes),
        (status = 400, description = "Incomplete data, malformed date or time, or unknown doctor", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Book an appointment with a doctor
///
/// New appointments start `pending`. Notes are optional and stored sanitised.
#[axum::debug_handler]
pub async fn book(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<BookAppointmentReq>,
) -> Result<(StatusCode, Json<CreatedRes>), ApiError> {
    let user_id = required_id(req.user_id)?;
    let doctor_id = required_id(req.doctor_id)?;
    let date = required_text(req.date)?;
    let time = required_text(req.time)?;

    let appointment = NewAppointment {
        user_id,
        doctor_id,
        date: parse_date(date.as_str())?,
        time: parse_time(time.as_str())?,
        notes: optional_text(req.notes),
    };

    let id = AppointmentService::new(state.cfg.clone())
        .book(appointment)
        .map_err(|e| ApiError::from_core(e, "Unable to book appointment."))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRes {
            message: "Appointment booked successfully.".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/appointments",
    params(
        ("user_id" = i64, Query, description = "Account id"),
        ("role" = Option<String>, Query, description = "`doctor` lists appointments booked with the user")
    ),
    responses(
        (status = 200, description = "Appointments, newest first", body = [AppointmentRes]),
        (status = 400, description = "Missing or malformed user_id", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AppointmentsQuery>,
) -> Result<Json<Vec<AppointmentRes>>, ApiError> {
    let user_id = error::required_id(query.user_id.as_deref(), "user_id")?;
    let view = AppointmentView::from_role_param(query.role.as_deref());

    let appointments = AppointmentService::new(state.cfg.clone()).list_for_user(user_id, view)?;
    Ok(Json(appointments))
}

#[utoipa::path(
    post,
    path = "/appointments/update_status",
    request_body = UpdateStatusReq,
    responses(
        (status = 200, description = "Status written", body = MessageRes),
        (status = 400, description = "Incomplete data or unknown status", body = MessageRes),
        (status = 404, description = "No such appointment", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Set the status of an appointment
///
/// Doctors confirm or reject; patients cancel by setting `rejected`. The write is a plain
/// overwrite, so repeating it is harmless.
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateStatusReq>,
) -> Result<Json<MessageRes>, ApiError> {
    let appointment_id = required_id(req.appointment_id)?;
    let status: AppointmentStatus = optional_text(req.status)
        .ok_or_else(incomplete)?
        .parse()?;

    AppointmentService::new(state.cfg.clone())
        .update_status(appointment_id, status)
        .map_err(|e| ApiError::from_core(e, "Unable to update appointment."))?;

    Ok(Json(MessageRes::new("Appointment status updated.")))
}

#[utoipa::path(
    get,
    path = "/appointments/pending_reviews",
    params(("user_id" = i64, Query, description = "Patient account id")),
    responses(
        (status = 200, description = "Confirmed past appointments without a review", body = [PendingReviewRes]),
        (status = 400, description = "Missing or malformed user_id", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn pending_reviews(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<PendingReviewRes>>, ApiError> {
    let user_id = error::required_id(query.user_id.as_deref(), "user_id")?;
    Ok(Json(
        AppointmentService::new(state.cfg.clone()).pending_reviews(user_id)?,
    ))
}
