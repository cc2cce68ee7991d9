//! Image upload, classification and stored predictions.

use super::{required_id, required_text};
use crate::error::{self, ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{
    AnalyzeRes, CreatedRes, MessageRes, PredictionRes, SavePredictionReq, UploadRes, UserIdQuery,
};
use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    response::Json,
};
use skinhub_core::{NewPrediction, PredictionService};
use skinhub_files::{validate_image, FilesError};

/// Multipart field carrying the image.
const FILE_FIELD: &str = "file";

/// Name used when the client sends the file part without a filename.
const UNNAMED_UPLOAD: &str = "upload";

/// Reads the `file` part of a multipart body as `(client file name, bytes)`.
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), ApiError> {
    let mut multipart = multipart.map_err(|_| FilesError::NoFile)?;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Err(FilesError::NoFile.into()),
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(FilesError::TooLarge.into())
            }
            Err(e) => return Err(ApiError::bad_request(e.body_text())),
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_UPLOAD)
            .to_owned();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(FilesError::TooLarge.into())
            }
            Err(e) => return Err(ApiError::bad_request(e.body_text())),
        };
        if bytes.is_empty() {
            return Err(FilesError::NoFile.into());
        }
        return Ok((file_name, bytes.to_vec()));
    }
}

#[utoipa::path(
    post,
    path = "/predict/upload",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Image stored", body = UploadRes),
        (status = 400, description = "No file, not an image, too large or disallowed type", body = MessageRes),
        (status = 500, description = "Image could not be written", body = MessageRes)
    )
)]
/// Store an image under the public uploads directory
///
/// Returns the path relative to the public root, which is what `/predict/save` expects.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadRes>, ApiError> {
    let (file_name, bytes) = read_file_field(multipart).await?;

    let stored = state.uploads.store(&file_name, &bytes).inspect_err(|e| {
        if e.is_client_error() {
            tracing::warn!(file = %file_name, error = %e, "upload rejected");
        }
    })?;

    Ok(Json(UploadRes {
        message: "File uploaded successfully".into(),
        image_path: stored.relative_path,
    }))
}

#[utoipa::path(
    post,
    path = "/predict/analyze",
    request_body(content_type = "multipart/form-data", description = "Image in the `file` field"),
    responses(
        (status = 200, description = "Classifier verdict, confidence as a percentage", body = AnalyzeRes),
        (status = 400, description = "No file, not an image, too large or disallowed type", body = MessageRes),
        (status = 500, description = "Classifier failed", body = MessageRes),
        (status = 504, description = "Classifier timed out", body = MessageRes)
    )
)]
/// Forward an image to the classifier and relay its verdict
///
/// Nothing is stored; the client saves the result through `/predict/save`.
#[axum::debug_handler]
pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeRes>, ApiError> {
    let (file_name, bytes) = read_file_field(multipart).await?;
    let media_type = validate_image(&file_name, &bytes)?;

    let classification = state
        .classifier
        .classify(&file_name, media_type, bytes)
        .await
        .map_err(|e| ApiError::from_integration(e, "Image analysis failed."))?;

    Ok(Json(AnalyzeRes {
        predicted_class: classification.predicted_class,
        confidence: classification.confidence,
    }))
}

#[utoipa::path(
    post,
    path = "/predict/save",
    request_body = SavePredictionReq,
    responses(
        (status = 201, description = "Prediction stored", body = CreatedRes),
        (status = 400, description = "Incomplete data or confidence outside 0-1", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SavePredictionReq>,
) -> Result<(StatusCode, Json<CreatedRes>), ApiError> {
    let prediction = NewPrediction {
        user_id: required_id(req.user_id)?,
        image_path: required_text(req.image_path)?,
        prediction_result: required_text(req.prediction_result)?,
        confidence_score: req.confidence_score.unwrap_or(0.0),
    };

    let id = PredictionService::new(state.cfg.clone())
        .save(prediction)
        .map_err(|e| ApiError::from_core(e, "Unable to save prediction."))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRes {
            message: "Prediction saved.".into(),
            id,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/predict/history",
    params(("user_id" = i64, Query, description = "Account id")),
    responses(
        (status = 200, description = "Stored predictions, newest first", body = [PredictionRes]),
        (status = 400, description = "Missing or malformed user_id", body = MessageRes)
    )
)]
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<UserIdQuery>,
) -> Result<Json<Vec<PredictionRes>>, ApiError> {
    let user_id = error::required_id(query.user_id.as_deref(), "user_id")?;
    Ok(Json(
        PredictionService::new(state.cfg.clone()).history(user_id)?,
    ))
}
