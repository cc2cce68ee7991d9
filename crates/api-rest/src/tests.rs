use crate::{router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use skinhub_core::CoreConfig;
use skinhub_integrations::{
    CallPlacer, Classification, ImageClassifier, IntegrationError, IntegrationResult, PlacedCall,
    RecordOnlyPlacer, TwilioClient, TwilioCredentials,
};
use skinhub_types::PhoneNumber;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

struct FixedClassifier;

#[async_trait]
impl ImageClassifier for FixedClassifier {
    async fn classify(
        &self,
        _file_name: &str,
        media_type: &str,
        _bytes: Vec<u8>,
    ) -> IntegrationResult<Classification> {
        assert_eq!(media_type, "image/png");
        Ok(Classification {
            predicted_class: "Acne".into(),
            confidence: 91.5,
        })
    }
}

struct StalledClassifier;

#[async_trait]
impl ImageClassifier for StalledClassifier {
    async fn classify(&self, _: &str, _: &str, _: Vec<u8>) -> IntegrationResult<Classification> {
        Err(IntegrationError::Timeout {
            service: "classifier",
        })
    }
}

struct DialingPlacer;

#[async_trait]
impl CallPlacer for DialingPlacer {
    async fn place_call(&self, _to: &PhoneNumber, _message: &str) -> IntegrationResult<PlacedCall> {
        Ok(PlacedCall {
            call_sid: "CA42".into(),
            status: "queued".into(),
            dialed: true,
        })
    }
}

fn cfg_at(database_path: &Path, dir: &TempDir) -> Arc<CoreConfig> {
    Arc::new(
        CoreConfig::new(database_path.to_path_buf(), dir.path().join("public"), 1_000).unwrap(),
    )
}

fn app_with(
    dir: &TempDir,
    classifier: Arc<dyn ImageClassifier>,
    calls: Arc<dyn CallPlacer>,
) -> Router {
    let cfg = cfg_at(&dir.path().join("skinhub.db"), dir);
    router(AppState::new(cfg, classifier, calls, false))
}

fn app(dir: &TempDir) -> Router {
    app_with(dir, Arc::new(FixedClassifier), Arc::new(RecordOnlyPlacer))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

fn multipart_request(uri: &str, file_name: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "skinhub-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png_of_size(size: usize) -> Vec<u8> {
    let mut bytes = PNG_SIGNATURE.to_vec();
    bytes.extend_from_slice(&[0, 0, 0, 13, b'I', b'H', b'D', b'R']);
    bytes.resize(size, 0);
    bytes
}

async fn signup(app: &Router, name: &str, email: &str, role: &str) -> i64 {
    let (status, body) = post_json(
        app,
        "/auth/signup",
        json!({"email": email, "password": "password123", "name": name, "role": role}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn signup_then_login_returns_role() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let id = signup(&app, "Dr. Meera Rao", "rao@example.com", "doctor").await;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "rao@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful.");
    assert_eq!(body["user"]["id"], id);
    assert_eq!(body["user"]["role"], "doctor");
    assert_eq!(body["user"]["name"], "Dr. Meera Rao");
}

#[tokio::test]
async fn signup_rejects_duplicates_and_missing_fields() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    signup(&app, "Asha", "asha@example.com", "user").await;

    let (status, body) = post_json(
        &app,
        "/auth/signup",
        json!({"email": "asha@example.com", "password": "other", "name": "Asha Two"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email already exists.");

    let (status, body) = post_json(
        &app,
        "/auth/signup",
        json!({"email": "new@example.com", "password": "", "name": "New"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "Incomplete data."}));
}

#[tokio::test]
async fn login_failures_are_unauthorized() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    signup(&app, "Asha", "asha@example.com", "user").await;

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "asha@example.com", "password": "wrong"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid password.");

    let (status, body) = post_json(
        &app,
        "/auth/login",
        json!({"email": "nobody@example.com", "password": "x"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "User not found.");
}

#[tokio::test]
async fn malformed_json_is_a_bad_request_with_json_body() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn booking_requires_all_fields() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;
    let doctor = signup(&app, "Dr. Rao", "rao@example.com", "doctor").await;

    let complete = json!({
        "user_id": patient,
        "doctor_id": doctor,
        "date": "2030-03-01",
        "time": "09:30",
    });
    for field in ["user_id", "doctor_id", "date", "time"] {
        let mut body = complete.clone();
        body[field] = json!("");
        let (status, res) = post_json(&app, "/appointments/book", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{field}");
        assert_eq!(res["message"], "Incomplete data.", "{field}");
    }

    let (status, body) = post_json(&app, "/appointments/book", complete).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Appointment booked successfully.");

    let (status, list) = get(&app, &format!("/appointments?user_id={patient}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list[0]["status"], "pending");
    assert_eq!(list[0]["appointment_time"], "09:30:00");
    assert_eq!(list[0]["doctor_name"], "Dr. Rao");
}

#[tokio::test]
async fn listing_depends_on_role_and_is_newest_first() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;
    let doctor = signup(&app, "Dr. Rao", "rao@example.com", "doctor").await;

    for (date, time) in [("2030-01-01", "10:00"), ("2030-02-01", "09:00"), ("2030-02-01", "15:00")] {
        let (status, _) = post_json(
            &app,
            "/appointments/book",
            json!({"user_id": patient.to_string(), "doctor_id": doctor, "date": date, "time": time}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, doctor_view) = get(&app, &format!("/appointments?user_id={doctor}&role=doctor")).await;
    let order: Vec<(String, String)> = doctor_view
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["appointment_date"].as_str().unwrap().to_owned(),
                a["appointment_time"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("2030-02-01".to_owned(), "15:00:00".to_owned()),
            ("2030-02-01".to_owned(), "09:00:00".to_owned()),
            ("2030-01-01".to_owned(), "10:00:00".to_owned()),
        ]
    );
    assert_eq!(doctor_view[0]["patient_name"], "Asha");
    assert!(doctor_view[0].get("doctor_name").is_none());

    // The doctor has booked nothing as a patient.
    let (_, patient_view) = get(&app, &format!("/appointments?user_id={doctor}")).await;
    assert_eq!(patient_view, json!([]));
}

#[tokio::test]
async fn status_updates_are_idempotent_and_validated() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;
    let doctor = signup(&app, "Dr. Rao", "rao@example.com", "doctor").await;
    let (_, booked) = post_json(
        &app,
        "/appointments/book",
        json!({"user_id": patient, "doctor_id": doctor, "date": "2030-03-01", "time": "09:30"}),
    )
    .await;
    let id = booked["id"].as_i64().unwrap();

    for _ in 0..2 {
        let (status, body) = post_json(
            &app,
            "/appointments/update_status",
            json!({"appointment_id": id, "status": "confirmed"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Appointment status updated.");
    }
    let (_, list) = get(&app, &format!("/appointments?user_id={patient}")).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["status"], "confirmed");

    let (status, _) = post_json(
        &app,
        "/appointments/update_status",
        json!({"appointment_id": id, "status": "cancelled"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app,
        "/appointments/update_status",
        json!({"appointment_id": 9999, "status": "rejected"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Appointment not found.");
}

#[tokio::test]
async fn review_flow_end_to_end() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;
    let doctor = signup(&app, "Dr. Rao", "rao@example.com", "doctor").await;

    let (status, _) = post_json(
        &app,
        "/auth/login",
        json!({"email": "asha@example.com", "password": "password123"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, booked) = post_json(
        &app,
        "/appointments/book",
        json!({"user_id": patient, "doctor_id": doctor, "date": "2020-01-15", "time": "11:00"}),
    )
    .await;
    let appointment = booked["id"].as_i64().unwrap();

    let (_, pending) = get(&app, &format!("/appointments/pending_reviews?user_id={patient}")).await;
    assert_eq!(pending, json!([]), "pending appointments are not reviewable");

    post_json(
        &app,
        "/appointments/update_status",
        json!({"appointment_id": appointment, "status": "confirmed"}),
    )
    .await;

    let (status, pending) =
        get(&app, &format!("/appointments/pending_reviews?user_id={patient}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["doctor_id"], doctor);
    assert_eq!(pending[0]["doctor_name"], "Dr. Rao");

    let review = json!({
        "appointment_id": appointment,
        "doctor_id": doctor,
        "user_id": patient,
        "rating": 5,
        "comment": "Very <b>helpful</b>",
    });
    let (status, body) = post_json(&app, "/reviews/add", review.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Review submitted successfully.");

    let (_, pending) = get(&app, &format!("/appointments/pending_reviews?user_id={patient}")).await;
    assert_eq!(pending, json!([]));

    let (status, reviews) = get(&app, &format!("/reviews?doctor_id={doctor}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 1);
    assert_eq!(reviews[0]["rating"], 5);
    assert_eq!(reviews[0]["comment"], "Very helpful");
    assert_eq!(reviews[0]["patient_name"], "Asha");

    let (status, _) = post_json(&app, "/reviews/add", review).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, doctors) = get(&app, "/users/doctors").await;
    assert_eq!(doctors[0]["average_rating"], 5.0);
    assert_eq!(doctors[0]["review_count"], 1);
}

#[tokio::test]
async fn rating_outside_range_is_rejected() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let (status, _) = post_json(
        &app,
        "/reviews/add",
        json!({"appointment_id": 1, "doctor_id": 2, "user_id": 3, "rating": 6}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_read_and_update() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let doctor = signup(&app, "Dr. Rao", "rao@example.com", "doctor").await;
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;

    let (status, body) = post_json(
        &app,
        "/users/update_profile",
        json!({
            "user_id": doctor,
            "full_name": "Dr. Meera Rao",
            "specialization": "Dermatology",
            "experience_years": "12",
            "bio": "Consultant",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Profile updated successfully");

    let (status, profile) = get(&app, &format!("/users/profile?user_id={doctor}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["full_name"], "Dr. Meera Rao");
    assert_eq!(profile["specialization"], "Dermatology");
    assert_eq!(profile["experience_years"], 12);

    let (status, _) = post_json(
        &app,
        "/users/update_profile",
        json!({"user_id": patient, "specialization": "Anything"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/users/profile?user_id=424242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = get(&app, "/users/profile").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "user_id is required.");
    let (status, _) = get(&app, "/users/profile?user_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uploaded_image_can_be_saved_and_served() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;

    let image = png_of_size(1_000_000);
    let (status, body) = send(&app, multipart_request("/predict/upload", "lesion.png", &image)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "File uploaded successfully");
    let image_path = body["image_path"].as_str().unwrap().to_owned();
    assert!(image_path.starts_with("uploads/images/"));

    let (status, body) = post_json(
        &app,
        "/predict/save",
        json!({
            "user_id": patient,
            "image_path": image_path,
            "prediction_result": "Acne",
            "confidence_score": 0.915,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Prediction saved.");

    let (_, history) = get(&app, &format!("/predict/history?user_id={patient}")).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["image_path"], image_path.as_str());
    assert_eq!(history[0]["prediction_result"], "Acne");

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/{image_path}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let served = to_bytes(response.into_body(), 2 * 1024 * 1024).await.unwrap();
    assert_eq!(served.len(), image.len());
}

#[tokio::test]
async fn upload_rejections() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        multipart_request("/predict/upload", "notes.png", b"plain text pretending"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "File is not an image.");

    let oversized = png_of_size(skinhub_files::MAX_UPLOAD_BYTES + 1);
    let (status, body) = send(&app, multipart_request("/predict/upload", "big.png", &oversized)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Sorry, your file is too large.");

    let (status, body) =
        send(&app, multipart_request("/predict/upload", "photo.bmp", &png_of_size(64))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Sorry, only JPG, JPEG, PNG & GIF files are allowed."
    );

    let (status, body) = post_json(&app, "/predict/upload", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No file uploaded");
}

#[tokio::test]
async fn save_prediction_validates_confidence() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;
    let (status, _) = post_json(
        &app,
        "/predict/save",
        json!({"user_id": patient, "image_path": "uploads/images/x.png", "prediction_result": "Acne", "confidence_score": 91.5}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_relays_classifier_and_maps_timeout() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let (status, body) = send(
        &app,
        multipart_request("/predict/analyze", "lesion.png", &png_of_size(256)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"predicted_class": "Acne", "confidence": 91.5}));

    let stalled = app_with(&dir, Arc::new(StalledClassifier), Arc::new(RecordOnlyPlacer));
    let (status, _) = send(
        &stalled,
        multipart_request("/predict/analyze", "lesion.png", &png_of_size(256)),
    )
    .await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

    let (status, _) = send(
        &app,
        multipart_request("/predict/analyze", "notes.png", b"not an image at all"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn heatmap_endpoints() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = get(&app, "/heatmap/stats?disease=Acne").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["states_count"], 20);
    assert_eq!(body["data"].as_array().unwrap().len(), 20);
    let sum: u64 = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["cases"].as_u64().unwrap())
        .sum();
    assert_eq!(body["total"], sum);

    let (_, default) = get(&app, "/heatmap/stats").await;
    assert_eq!(default["disease"], "Acne");

    let (status, body) = get(&app, "/heatmap/stats?disease=Unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Disease not found");

    let (_, diseases) = get(&app, "/heatmap/diseases").await;
    assert_eq!(diseases.as_array().unwrap().len(), 7);

    let (status, _) = post_json(
        &app,
        "/heatmap/save",
        json!({"prediction_id": 77, "heatmap_image_path": "uploads/images/h.png"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unknown prediction");
}

#[tokio::test]
async fn calls_without_telephony_are_recorded_only() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;

    let (status, body) = post_json(
        &app,
        "/calls/schedule",
        json!({"user_id": patient, "phone": "+14155552671", "scheduled_at": "2030-05-01 09:00:00"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Call scheduled successfully (Twilio not configured - database only)"
    );
    assert_eq!(body["call_status"], "scheduled");
    assert!(body["call_sid"].as_str().unwrap().starts_with("fallback_"));

    let (status, calls) = get(&app, &format!("/calls?user_id={patient}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.as_array().unwrap().len(), 1);
    assert_eq!(calls[0]["phone_number"], "+14155552671");
    assert_eq!(calls[0]["scheduled_at"], "2030-05-01 09:00:00");

    let (status, body) =
        post_json(&app, "/calls/schedule", json!({"user_id": patient, "phone": "12"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid phone number format. Use E.164 format (e.g., +1234567890)"
    );

    let (status, body) = post_json(&app, "/calls/schedule", json!({"user_id": patient})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Phone number is required");
}

#[tokio::test]
async fn dialed_call_reports_database_id() {
    let dir = TempDir::new().unwrap();
    let app = app_with(&dir, Arc::new(FixedClassifier), Arc::new(DialingPlacer));

    let (status, body) =
        post_json(&app, "/calls/schedule", json!({"phone": "+14155552671"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        "Call initiated and saved to database successfully"
    );
    assert_eq!(body["call_sid"], "CA42");
    assert_eq!(body["call_status"], "queued");
    assert!(body["database_id"].as_i64().is_some());
    assert!(body.get("database_warning").is_none());
}

#[tokio::test]
async fn accepted_call_with_unreadable_reply_is_still_logged() {
    let telephony = Router::new().route(
        "/2010-04-01/Accounts/:sid/Calls.json",
        axum::routing::post(|| async { (StatusCode::CREATED, "<html>accepted</html>") }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, telephony).await.unwrap();
    });

    let credentials = TwilioCredentials::from_values(
        Some("AC1".into()),
        Some("secret".into()),
        Some("+15005550006".into()),
    )
    .unwrap();
    let twilio = TwilioClient::new(&base, credentials, Duration::from_secs(5)).unwrap();

    let dir = TempDir::new().unwrap();
    let app = app_with(&dir, Arc::new(FixedClassifier), Arc::new(twilio));
    let patient = signup(&app, "Asha", "asha@example.com", "user").await;

    let (status, body) = post_json(
        &app,
        "/calls/schedule",
        json!({"user_id": patient, "phone": "+14155552671"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(
        body["message"],
        "Call initiated and saved to database successfully"
    );
    assert_eq!(body["call_sid"], "unknown");
    assert_eq!(body["call_status"], "unknown");

    let (status, calls) = get(&app, &format!("/calls?user_id={patient}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(calls.as_array().unwrap().len(), 1);
    assert_eq!(calls[0]["call_sid"], "unknown");
}

#[tokio::test]
async fn dialed_call_survives_store_failure_with_warning() {
    let dir = TempDir::new().unwrap();
    // A directory where the database file should be makes every open fail.
    let cfg = cfg_at(dir.path(), &dir);
    let app = router(AppState::new(
        cfg,
        Arc::new(FixedClassifier),
        Arc::new(DialingPlacer),
        false,
    ));

    let (status, body) =
        post_json(&app, "/calls/schedule", json!({"phone": "+14155552671"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Call initiated successfully");
    assert!(body["database_warning"]
        .as_str()
        .unwrap()
        .starts_with("Call initiated but database error"));
}

#[tokio::test]
async fn store_failure_is_503_with_optional_detail() {
    let dir = TempDir::new().unwrap();
    let broken = cfg_at(dir.path(), &dir);

    let hidden = router(AppState::new(
        broken.clone(),
        Arc::new(FixedClassifier),
        Arc::new(RecordOnlyPlacer),
        false,
    ));
    let (status, body) = get(&hidden, "/users/doctors").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({"message": "Unable to complete request."}));

    let exposed = router(AppState::new(
        broken,
        Arc::new(FixedClassifier),
        Arc::new(RecordOnlyPlacer),
        true,
    ));
    let (status, body) = get(&exposed, "/users/doctors").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["message"], "Unable to complete request.");
    assert!(body["error"].is_string());

    let (status, body) = get(&exposed, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn health_and_preflight() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "message": "SkinHub is alive"}));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/appointments/book")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert!(body.is_empty());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/auth/login")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn openapi_document_lists_every_route() {
    use utoipa::OpenApi;

    let doc = crate::ApiDoc::openapi();
    for path in [
        "/auth/signup",
        "/appointments/pending_reviews",
        "/predict/analyze",
        "/heatmap/stats",
        "/calls/schedule",
        "/health",
    ] {
        assert!(doc.paths.paths.contains_key(path), "{path} missing");
    }
}
