//! Mapping of service failures onto HTTP responses.
//!
//! Every error body is a [`MessageRes`]. Store failures answer 503 with an operation-specific
//! message; the underlying error text is attached only when the server was started with error
//! details exposed (see [`expose_store_error_details`]).

use api_shared::MessageRes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use skinhub_core::CoreError;
use skinhub_files::FilesError;
use skinhub_integrations::IntegrationError;
use skinhub_types::ValueError;

/// Generic store failure message for operations without a more specific one.
pub const STORE_UNAVAILABLE: &str = "Unable to complete request.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// The store failed; `detail` is the underlying error text.
    #[error("{message}: {detail}")]
    Store {
        message: &'static str,
        detail: String,
    },
    /// An external service failed or rejected the request.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    UpstreamTimeout(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Converts a core error, using `store_message` if the store itself failed.
    pub fn from_core(err: CoreError, store_message: &'static str) -> Self {
        match err {
            CoreError::Validation(m) | CoreError::Conflict(m) => Self::BadRequest(m),
            CoreError::Auth(m) => Self::Unauthorized(m),
            CoreError::NotFound(m) => Self::NotFound(m),
            other => Self::Store {
                message: store_message,
                detail: other.to_string(),
            },
        }
    }

    /// Converts an adapter error; timeouts keep their own status.
    pub fn from_integration(err: IntegrationError, failure_message: &str) -> Self {
        if err.is_timeout() {
            return Self::UpstreamTimeout(format!("{failure_message} (timed out)"));
        }
        match err {
            IntegrationError::Rejected { message, .. } if !message.is_empty() => {
                Self::Upstream(message)
            }
            _ => Self::Upstream(failure_message.to_owned()),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self::from_core(err, STORE_UNAVAILABLE)
    }
}

impl From<FilesError> for ApiError {
    fn from(err: FilesError) -> Self {
        if err.is_client_error() {
            Self::BadRequest(err.to_string())
        } else {
            tracing::error!(error = %err, "failed to store upload");
            Self::Internal("Sorry, there was an error uploading your file.".into())
        }
    }
}

impl From<ValueError> for ApiError {
    fn from(err: ValueError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Store failure text carried on a 503 response so a later layer can expose it.
#[derive(Clone, Debug)]
struct StoreFailure {
    message: &'static str,
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Store { message, detail } => {
                tracing::error!(error = %detail, operation = message, "store failure");
                let mut response = (status, Json(MessageRes::new(message))).into_response();
                response
                    .extensions_mut()
                    .insert(StoreFailure { message, detail });
                response
            }
            Self::Upstream(ref m) | Self::UpstreamTimeout(ref m) | Self::Internal(ref m) => {
                tracing::error!(%status, reason = %m, "request failed");
                (status, Json(MessageRes::new(m.clone()))).into_response()
            }
            Self::BadRequest(m) | Self::Unauthorized(m) | Self::NotFound(m) => {
                (status, Json(MessageRes::new(m))).into_response()
            }
        }
    }
}

/// Rewrites store failure responses to include the underlying error text.
///
/// Only installed when the server is configured to expose error details.
pub async fn expose_store_error_details(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    match response.extensions().get::<StoreFailure>().cloned() {
        Some(failure) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(MessageRes {
                message: failure.message.to_owned(),
                error: Some(failure.detail),
            }),
        )
            .into_response(),
        None => response,
    }
}

/// JSON body extractor whose rejections use the API error shape.
///
/// A body that is not valid JSON, or whose fields have the wrong type, is a 400 rather than
/// axum's plain-text 415/422.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::warn!(error = %rejection.body_text(), "rejected request body");
                Err(ApiError::bad_request(format!(
                    "Invalid request body: {}",
                    rejection.body_text()
                )))
            }
        }
    }
}

/// Runs CPU-heavy work (password hashing) off the async workers.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await.map_err(|e| {
        tracing::error!(error = %e, "blocking task failed");
        ApiError::Internal("Unable to complete request.".into())
    })?
}

/// Parses a required identifier taken from the query string.
pub fn required_id(value: Option<&str>, name: &str) -> Result<i64, ApiError> {
    let raw = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{name} is required.")))?;
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("{name} must be an integer.")))
}
