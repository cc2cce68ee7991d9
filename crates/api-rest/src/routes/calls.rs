//! Reminder calls.
//!
//! A call is placed first and recorded second. If recording fails after a call was dialed the
//! request still succeeds, with `database_warning` set. A call that was only recorded and then
//! failed to record is an ordinary store failure.

use super::{optional_text, required_text};
use crate::error::{self, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{MessageRes, ScheduleCallReq, ScheduleCallRes, ScheduledCallRes, UserIdQuery};
use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::Utc;
use skinhub_core::validation::parse_scheduled_at;
use skinhub_core::{CallService, NewScheduledCall, PhoneNumber};
use skinhub_integrations::DEFAULT_CALL_MESSAGE;

#[utoipa::path(
    post,
    path = "/calls/schedule",
    request_body = ScheduleCallReq,
    responses(
        (status = 200, description = "Call placed (or recorded only) and logged", body = ScheduleCallRes),
        (status = 400, description = "Missing or malformed phone, or malformed scheduled_at", body = MessageRes),
        (status = 500, description = "Telephony provider refused the call", body = MessageRes),
        (status = 504, description = "Telephony provider timed out", body = MessageRes)
    )
)]
/// Place a reminder call and log it
///
/// Without telephony credentials nothing is dialed and a `fallback_` reference is logged
/// instead.
#[axum::debug_handler]
pub async fn schedule(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScheduleCallReq>,
) -> Result<Json<ScheduleCallRes>, ApiError> {
    let phone = required_text(req.phone)
        .map_err(|_| ApiError::bad_request("Phone number is required"))?;
    let phone = PhoneNumber::parse(phone.as_str())?;
    let scheduled_at = match optional_text(req.scheduled_at) {
        Some(raw) => parse_scheduled_at(&raw)?,
        None => Utc::now().naive_utc(),
    };
    let message = optional_text(req.message).unwrap_or_else(|| DEFAULT_CALL_MESSAGE.to_owned());
    let user_id = req.user_id.map(|id| id.get());

    let placed = state
        .calls
        .place_call(&phone, &message)
        .await
        .map_err(|e| ApiError::from_integration(e, "Failed to initiate call"))?;

    let recorded = CallService::new(state.cfg.clone()).record(NewScheduledCall {
        user_id,
        phone,
        scheduled_at,
        call_sid: placed.call_sid.clone(),
        status: placed.status.clone(),
    });

    let (database_id, database_warning) = match recorded {
        Ok(id) => (Some(id), None),
        Err(e) if !placed.dialed => return Err(ApiError::from_core(e, "Unable to schedule call.")),
        Err(e) => {
            tracing::warn!(call_sid = %placed.call_sid, error = %e, "call placed but not recorded");
            (None, Some(format!("Call initiated but database error: {e}")))
        }
    };

    let message = match (placed.dialed, database_id.is_some()) {
        (true, true) => "Call initiated and saved to database successfully",
        (true, false) => "Call initiated successfully",
        (false, _) => "Call scheduled successfully (Twilio not configured - database only)",
    };

    Ok(Json(ScheduleCallRes {
        status: "success".into(),
        message: message.into(),
        call_sid: placed.call_sid,
        call_status: placed.status,
        database_id,
        database_warning,
    }))
}

#[utoipa::path(
    get,
    path = "/calls",
    params(("user_id" = i64, Query, description = "Account id")),
    responses(
        (status = 200, description = "Logged calls, latest schedule first", body = [ScheduledCallRes]),
        (status = 400, description = "Missing or malformed user_id", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<ScheduledCallRes>>, ApiError> {
    let user_id = error::required_id(query.user_id.as_deref(), "user_id")?;
    Ok(Json(CallService::new(state.cfg.clone()).list(user_id)?))
}
