//! Request and response bodies of the REST API.
//!
//! Request fields are optional at the wire level so that a missing or blank required field can
//! be reported as `Incomplete data.` rather than a decoding failure.

use serde::{Deserialize, Serialize};
use skinhub_types::{AppointmentStatus, Role};
use utoipa::ToSchema;

use crate::flex::FlexInt;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of every error response, and of success responses that carry no data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
    /// Underlying error text; only present when the server exposes error details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageRes {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedRes {
    pub message: String,
    pub id: i64,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignupReq {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    /// `user` (default), `doctor` or `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginReq {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// The identity object a client keeps after logging in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[schema(value_type = String)]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRes {
    pub message: String,
    pub user: AuthUser,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorRes {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub specialization: Option<String>,
    pub experience_years: Option<i64>,
    pub bio: Option<String>,
    pub verified: bool,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileRes {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    #[schema(value_type = String)]
    pub role: Role,
    pub created_at: String,
    pub specialization: Option<String>,
    pub experience_years: Option<i64>,
    pub bio: Option<String>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateProfileReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<FlexInt>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    /// Presence of this field marks a doctor profile update.
    pub specialization: Option<String>,
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub experience_years: Option<FlexInt>,
    pub bio: Option<String>,
}

// ---------------------------------------------------------------------------
// Appointments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct BookAppointmentReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<FlexInt>,
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub doctor_id: Option<FlexInt>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM` or `HH:MM:SS`
    pub time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UpdateStatusReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub appointment_id: Option<FlexInt>,
    pub status: Option<String>,
}

/// One row of an appointment listing. Doctors see `patient_name`, patients see `doctor_name`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppointmentRes {
    pub id: i64,
    pub user_id: i64,
    pub doctor_id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    #[schema(value_type = String)]
    pub status: AppointmentStatus,
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingReviewRes {
    pub id: i64,
    pub doctor_id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    pub doctor_name: String,
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AddReviewReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub appointment_id: Option<FlexInt>,
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub doctor_id: Option<FlexInt>,
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<FlexInt>,
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub rating: Option<FlexInt>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewRes {
    pub id: i64,
    pub appointment_id: i64,
    pub rating: i64,
    pub comment: String,
    pub created_at: String,
    pub patient_name: String,
    pub appointment_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Predictions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub message: String,
    pub image_path: String,
}

/// Classifier output as relayed to the client; `confidence` is a percentage.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRes {
    pub predicted_class: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SavePredictionReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<FlexInt>,
    pub image_path: Option<String>,
    pub prediction_result: Option<String>,
    /// Fraction in `[0, 1]`; defaults to 0.
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PredictionRes {
    pub id: i64,
    pub user_id: i64,
    pub image_path: String,
    pub prediction_result: String,
    pub confidence_score: f64,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StateCases {
    pub state: String,
    pub cases: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HeatmapStatsRes {
    pub disease: String,
    pub data: Vec<StateCases>,
    pub total: u64,
    pub states_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SaveHeatmapReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub prediction_id: Option<FlexInt>,
    pub heatmap_image_path: Option<String>,
}

// ---------------------------------------------------------------------------
// Calls
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ScheduleCallReq {
    #[serde(deserialize_with = "crate::flex::optional")]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<FlexInt>,
    pub phone: Option<String>,
    /// Defaults to the current time.
    pub scheduled_at: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduleCallRes {
    /// Always `success`; failures use the error body.
    pub status: String,
    pub message: String,
    pub call_sid: String,
    pub call_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_id: Option<i64>,
    /// Set when the call went out but could not be recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScheduledCallRes {
    pub id: i64,
    pub user_id: Option<i64>,
    pub phone_number: String,
    pub scheduled_at: String,
    pub call_sid: String,
    pub status: String,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

/// Query parameters stay textual so a malformed id becomes a 400 with a JSON body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserIdQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct AppointmentsQuery {
    pub user_id: Option<String>,
    /// `doctor` selects the doctor view; anything else the patient view.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DoctorIdQuery {
    pub doctor_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct DiseaseQuery {
    pub disease: Option<String>,
}
