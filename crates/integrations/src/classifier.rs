//! Image classification client.
//!
//! The classifier is an opaque HTTP service: it takes one image as the multipart field `file`
//! and answers `{"predicted_class": "...", "confidence": 87.5}` with confidence as a
//! percentage, or `{"error": "..."}` with a non-2xx status.

use crate::{IntegrationError, IntegrationResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "classifier";

/// Label and confidence (percentage, 0 to 100) for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub predicted_class: String,
    pub confidence: f64,
}

#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Classify one image.
    async fn classify(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> IntegrationResult<Classification>;
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// [`ImageClassifier`] talking to the inference endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    url: String,
    client: reqwest::Client,
}

impl HttpClassifier {
    /// `url` is the full prediction endpoint, e.g. `http://localhost:5000/predict`.
    pub fn new(url: &str, timeout: Duration) -> IntegrationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IntegrationError::Client)?;

        Ok(Self {
            url: url.to_owned(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ImageClassifier for HttpClassifier {
    async fn classify(
        &self,
        file_name: &str,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> IntegrationResult<Classification> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_owned())
            .mime_str(media_type)
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            tracing::error!(status = status.as_u16(), %message, "classifier rejected image");
            return Err(IntegrationError::Rejected {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        let classification: Classification =
            serde_json::from_slice(&body).map_err(|e| IntegrationError::InvalidResponse {
                service: SERVICE,
                reason: e.to_string(),
            })?;

        if !classification.confidence.is_finite()
            || !(0.0..=100.0).contains(&classification.confidence)
        {
            return Err(IntegrationError::InvalidResponse {
                service: SERVICE,
                reason: format!("confidence {} is not a percentage", classification.confidence),
            });
        }

        tracing::info!(
            predicted_class = %classification.predicted_class,
            confidence = classification.confidence,
            "image classified"
        );
        Ok(classification)
    }
}
