use super::{optional_text, required_id, required_text};
use crate::error::{ApiError, ApiJson};
use crate::state::AppState;
use api_shared::{CreatedRes, DiseaseQuery, HeatmapStatsRes, MessageRes, SaveHeatmapReq};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use skinhub_core::constants::DEFAULT_HEATMAP_DISEASE;
use skinhub_core::{heatmap, PredictionService};

#[utoipa::path(
    get,
    path = "/heatmap/stats",
    params(("disease" = Option<String>, Query, description = "Disease name, default `Acne`")),
    responses(
        (status = 200, description = "Cases per state", body = HeatmapStatsRes),
        (status = 404, description = "Unknown disease", body = MessageRes)
    )
)]
/// Regional case counts for one disease
#[axum::debug_handler]
pub async fn stats(Query(query): Query<DiseaseQuery>) -> Result<Json<HeatmapStatsRes>, ApiError> {
    let disease =
        optional_text(query.disease).unwrap_or_else(|| DEFAULT_HEATMAP_DISEASE.to_owned());
    Ok(Json(heatmap::stats(&disease)?))
}

#[utoipa::path(
    get,
    path = "/heatmap/diseases",
    responses(
        (status = 200, description = "Diseases with regional statistics", body = [String])
    )
)]
#[axum::debug_handler]
pub async fn diseases() -> Json<Vec<&'static str>> {
    Json(heatmap::diseases())
}

#[utoipa::path(
    post,
    path = "/heatmap/save",
    request_body = SaveHeatmapReq,
    responses(
        (status = 201, description = "Heatmap recorded", body = CreatedRes),
        (status = 400, description = "Incomplete data or unknown prediction", body = MessageRes),
        (status = 503, description = "Store unavailable", body = MessageRes)
    )
)]
/// Record a heatmap image generated for a stored prediction
#[axum::debug_handler]
pub async fn save(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SaveHeatmapReq>,
) -> Result<(StatusCode, Json<CreatedRes>), ApiError> {
    let prediction_id = required_id(req.prediction_id)?;
    let path = required_text(req.heatmap_image_path)?;

    let id = PredictionService::new(state.cfg.clone())
        .save_heatmap(prediction_id, &path)
        .map_err(|e| ApiError::from_core(e, "Unable to save heatmap."))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRes {
            message: "Heatmap saved.".into(),
            id,
        }),
    ))
}
