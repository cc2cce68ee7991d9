//! Route handlers, one module per resource.

pub mod appointments;
pub mod auth;
pub mod calls;
pub mod health;
pub mod heatmap;
pub mod predict;
pub mod reviews;
pub mod users;

use crate::error::ApiError;
use api_shared::FlexInt;
use skinhub_core::constants::INCOMPLETE_DATA;
use skinhub_types::NonEmptyText;

fn incomplete() -> ApiError {
    ApiError::bad_request(INCOMPLETE_DATA)
}

/// A required identifier from a request body.
fn required_id(value: Option<FlexInt>) -> Result<i64, ApiError> {
    value.map(FlexInt::get).ok_or_else(incomplete)
}

/// A required, non-blank text field from a request body.
fn required_text(value: Option<String>) -> Result<NonEmptyText, ApiError> {
    value
        .and_then(|v| NonEmptyText::new(v).ok())
        .ok_or_else(incomplete)
}

/// Trims an optional text field, treating blank as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
