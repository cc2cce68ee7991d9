//! Stored classification results and their heatmap artifacts.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::validation::validate_confidence;
use api_shared::PredictionRes;
use rusqlite::params;
use skinhub_types::NonEmptyText;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NewPrediction {
    pub user_id: i64,
    /// Path relative to the public root, as returned by the upload endpoint.
    pub image_path: NonEmptyText,
    pub prediction_result: NonEmptyText,
    /// Fraction in `[0, 1]`.
    pub confidence_score: f64,
}

#[derive(Clone, Debug)]
pub struct PredictionService {
    cfg: Arc<CoreConfig>,
}

impl PredictionService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Stores a prediction and returns its id.
    pub fn save(&self, prediction: NewPrediction) -> CoreResult<i64> {
        let confidence = validate_confidence(prediction.confidence_score)?;
        let conn = self.cfg.open_db()?;
        conn.execute(
            "INSERT INTO predictions (user_id, image_path, prediction_result, confidence_score)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                prediction.user_id,
                prediction.image_path.as_str(),
                prediction.prediction_result.as_str(),
                confidence
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(
            prediction_id = id,
            user_id = prediction.user_id,
            result = %prediction.prediction_result,
            "prediction saved"
        );
        Ok(id)
    }

    /// Predictions of one user, newest first.
    pub fn history(&self, user_id: i64) -> CoreResult<Vec<PredictionRes>> {
        let conn = self.cfg.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, image_path, prediction_result, confidence_score, created_at
             FROM predictions
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(PredictionRes {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    image_path: row.get(2)?,
                    prediction_result: row.get(3)?,
                    confidence_score: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Records a heatmap image for an existing prediction and returns the row id.
    pub fn save_heatmap(
        &self,
        prediction_id: i64,
        heatmap_image_path: &NonEmptyText,
    ) -> CoreResult<i64> {
        let conn = self.cfg.open_db()?;
        conn.execute(
            "INSERT INTO heatmap_data (prediction_id, heatmap_image_path) VALUES (?1, ?2)",
            params![prediction_id, heatmap_image_path.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(heatmap_id = id, prediction_id, "heatmap saved");
        Ok(id)
    }
}
