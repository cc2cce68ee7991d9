//! Blocking HTTP client for the SkinHub REST API.

use api_shared::*;
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Generous enough for image analysis, which waits on the classifier.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with an error status.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("could not reach SkinHub at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Message to show for an error response: the API's `message` when the body has one.
pub fn error_message(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<MessageRes>(body) {
        Ok(res) => match res.error {
            Some(detail) => format!("{}: {}", res.message, detail),
            None => res.message,
        },
        Err(_) if body.is_empty() => format!("request failed with status {status}"),
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn decode<T: DeserializeOwned>(url: &str, response: Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.bytes().map_err(|source| ClientError::Transport {
            url: url.to_owned(),
            source,
        })?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_message(status.as_u16(), &body),
            });
        }

        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> ClientResult<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(&url, response)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(&url, response)
    }

    fn post_file<T: DeserializeOwned>(&self, path: &str, file: &Path) -> ClientResult<T> {
        let form = multipart::Form::new()
            .file("file", file)
            .map_err(|source| ClientError::File {
                path: file.display().to_string(),
                source,
            })?;
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|source| ClientError::Transport {
                url: url.clone(),
                source,
            })?;
        Self::decode(&url, response)
    }

    pub fn signup(&self, req: &SignupReq) -> ClientResult<CreatedRes> {
        self.post("/auth/signup", req)
    }

    pub fn login(&self, email: &str, password: &str) -> ClientResult<LoginRes> {
        self.post(
            "/auth/login",
            &LoginReq {
                email: Some(email.to_owned()),
                password: Some(password.to_owned()),
            },
        )
    }

    pub fn doctors(&self) -> ClientResult<Vec<DoctorRes>> {
        self.get("/users/doctors", &[])
    }

    pub fn profile(&self, user_id: i64) -> ClientResult<ProfileRes> {
        self.get("/users/profile", &[("user_id", user_id.to_string())])
    }

    pub fn update_profile(&self, req: &UpdateProfileReq) -> ClientResult<MessageRes> {
        self.post("/users/update_profile", req)
    }

    pub fn book(&self, req: &BookAppointmentReq) -> ClientResult<CreatedRes> {
        self.post("/appointments/book", req)
    }

    /// `as_doctor` selects appointments booked with the user rather than by them.
    pub fn appointments(&self, user_id: i64, as_doctor: bool) -> ClientResult<Vec<AppointmentRes>> {
        let mut query = vec![("user_id", user_id.to_string())];
        if as_doctor {
            query.push(("role", "doctor".to_owned()));
        }
        self.get("/appointments", &query)
    }

    pub fn update_status(&self, appointment_id: i64, status: &str) -> ClientResult<MessageRes> {
        self.post(
            "/appointments/update_status",
            &UpdateStatusReq {
                appointment_id: Some(appointment_id.into()),
                status: Some(status.to_owned()),
            },
        )
    }

    pub fn pending_reviews(&self, user_id: i64) -> ClientResult<Vec<PendingReviewRes>> {
        self.get(
            "/appointments/pending_reviews",
            &[("user_id", user_id.to_string())],
        )
    }

    pub fn add_review(&self, req: &AddReviewReq) -> ClientResult<CreatedRes> {
        self.post("/reviews/add", req)
    }

    pub fn reviews(&self, doctor_id: i64) -> ClientResult<Vec<ReviewRes>> {
        self.get("/reviews", &[("doctor_id", doctor_id.to_string())])
    }

    pub fn upload(&self, image: &Path) -> ClientResult<UploadRes> {
        self.post_file("/predict/upload", image)
    }

    pub fn analyze(&self, image: &Path) -> ClientResult<AnalyzeRes> {
        self.post_file("/predict/analyze", image)
    }

    pub fn save_prediction(&self, req: &SavePredictionReq) -> ClientResult<CreatedRes> {
        self.post("/predict/save", req)
    }

    pub fn history(&self, user_id: i64) -> ClientResult<Vec<PredictionRes>> {
        self.get("/predict/history", &[("user_id", user_id.to_string())])
    }

    pub fn heatmap_stats(&self, disease: Option<&str>) -> ClientResult<HeatmapStatsRes> {
        let query: Vec<(&str, String)> = disease
            .map(|d| vec![("disease", d.to_owned())])
            .unwrap_or_default();
        self.get("/heatmap/stats", &query)
    }

    pub fn heatmap_diseases(&self) -> ClientResult<Vec<String>> {
        self.get("/heatmap/diseases", &[])
    }

    pub fn schedule_call(&self, req: &ScheduleCallReq) -> ClientResult<ScheduleCallRes> {
        self.post("/calls/schedule", req)
    }

    pub fn calls(&self, user_id: i64) -> ClientResult<Vec<ScheduledCallRes>> {
        self.get("/calls", &[("user_id", user_id.to_string())])
    }
}
