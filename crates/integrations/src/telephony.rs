//! Reminder calls.
//!
//! With credentials, calls are placed through the Twilio REST API, which reads the message out
//! with text-to-speech. Without them, [`RecordOnlyPlacer`] hands back a synthetic reference so
//! the request can still be logged.

use crate::{IntegrationError, IntegrationResult};
use async_trait::async_trait;
use serde::Deserialize;
use skinhub_types::PhoneNumber;
use std::time::Duration;

const SERVICE: &str = "telephony";

/// Read out when the caller supplies no message.
pub const DEFAULT_CALL_MESSAGE: &str = "Hello! This is a reminder for your upcoming appointment at Skin Health Hub. Please call us if you need to reschedule. Thank you!";

/// Outcome of a call request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub call_sid: String,
    /// Provider status (e.g. `queued`), or `scheduled` when nothing was dialed.
    pub status: String,
    pub dialed: bool,
}

#[async_trait]
pub trait CallPlacer: Send + Sync {
    async fn place_call(&self, to: &PhoneNumber, message: &str) -> IntegrationResult<PlacedCall>;
}

/// Stand-in used when telephony is not configured: never dials.
#[derive(Debug, Clone, Default)]
pub struct RecordOnlyPlacer;

#[async_trait]
impl CallPlacer for RecordOnlyPlacer {
    async fn place_call(&self, to: &PhoneNumber, _message: &str) -> IntegrationResult<PlacedCall> {
        let call_sid = format!("fallback_{}", uuid::Uuid::new_v4().simple());
        tracing::warn!(
            to = %to,
            %call_sid,
            "telephony not configured; call recorded without dialing"
        );
        Ok(PlacedCall {
            call_sid,
            status: "scheduled".into(),
            dialed: false,
        })
    }
}

#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioCredentials {
    /// All three values must be present and non-blank; otherwise telephony is unconfigured.
    pub fn from_values(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Option<Self> {
        let non_blank =
            |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        Some(Self {
            account_sid: non_blank(account_sid)?,
            auth_token: non_blank(auth_token)?,
            from_number: non_blank(from_number)?,
        })
    }
}

#[derive(Deserialize)]
struct CallResource {
    sid: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct TwilioError {
    message: Option<String>,
    code: Option<i64>,
}

/// [`CallPlacer`] backed by the Twilio Calls API.
#[derive(Debug, Clone)]
pub struct TwilioClient {
    base_url: String,
    credentials: TwilioCredentials,
    client: reqwest::Client,
}

impl TwilioClient {
    /// `base_url` is normally `https://api.twilio.com`.
    pub fn new(
        base_url: &str,
        credentials: TwilioCredentials,
        timeout: Duration,
    ) -> IntegrationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(IntegrationError::Client)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            credentials,
            client,
        })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.credentials.account_sid
        )
    }
}

#[async_trait]
impl CallPlacer for TwilioClient {
    async fn place_call(&self, to: &PhoneNumber, message: &str) -> IntegrationResult<PlacedCall> {
        let twiml = format!(
            "<Response><Say voice='alice'>{}</Say></Response>",
            xml_escape(message)
        );
        let form = [
            ("To", to.as_str()),
            ("From", self.credentials.from_number.as_str()),
            ("Twiml", twiml.as_str()),
        ];

        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(
                &self.credentials.account_sid,
                Some(&self.credentials.auth_token),
            )
            .form(&form)
            .send()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| IntegrationError::from_reqwest(SERVICE, e))?;

        if !status.is_success() {
            let parsed = serde_json::from_slice::<TwilioError>(&body).ok();
            let message = match parsed {
                Some(TwilioError {
                    message: Some(m),
                    code,
                }) => match code {
                    Some(code) => format!("{m} (code {code})"),
                    None => m,
                },
                _ => "Failed to initiate call".to_owned(),
            };
            tracing::error!(status = status.as_u16(), %message, "call rejected by telephony API");
            return Err(IntegrationError::Rejected {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        // A 2xx means the call went out, whatever the body looks like.
        let call = match serde_json::from_slice::<CallResource>(&body) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(
                    status = status.as_u16(),
                    error = %e,
                    "telephony API accepted the call with an unreadable body"
                );
                CallResource {
                    sid: None,
                    status: None,
                }
            }
        };

        let placed = PlacedCall {
            call_sid: call.sid.unwrap_or_else(|| "unknown".into()),
            status: call.status.unwrap_or_else(|| "unknown".into()),
            dialed: true,
        };
        tracing::info!(call_sid = %placed.call_sid, status = %placed.status, "call placed");
        Ok(placed)
    }
}

/// Escape text for inclusion in an XML element.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(String, HashMap<String, String>, bool)>>>;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn credentials() -> TwilioCredentials {
        TwilioCredentials::from_values(
            Some("AC123".into()),
            Some("secret".into()),
            Some("+15005550006".into()),
        )
        .unwrap()
    }

    #[test]
    fn credentials_need_all_three_values() {
        let missing = TwilioCredentials::from_values(Some("AC".into()), Some("t".into()), None);
        assert!(missing.is_none());

        let blank = TwilioCredentials::from_values(
            Some("AC".into()),
            Some(" ".into()),
            Some("+1".into()),
        );
        assert!(blank.is_none());

        assert_eq!(credentials().account_sid, "AC123");
    }

    #[test]
    fn xml_escape_handles_markup() {
        assert_eq!(
            xml_escape(r#"Tom & Jerry's <"show">"#),
            "Tom &amp; Jerry&apos;s &lt;&quot;show&quot;&gt;"
        );
    }

    #[tokio::test]
    async fn record_only_placer_never_dials() {
        let phone = PhoneNumber::parse("+14155552671").unwrap();
        let placed = RecordOnlyPlacer.place_call(&phone, "hi").await.unwrap();
        assert!(placed.call_sid.starts_with("fallback_"));
        assert_eq!(placed.status, "scheduled");
        assert!(!placed.dialed);
    }

    #[tokio::test]
    async fn twilio_call_posts_form_with_basic_auth() {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route(
                "/2010-04-01/Accounts/:sid/Calls.json",
                post(
                    |State(captured): State<Captured>,
                     Path(sid): Path<String>,
                     headers: HeaderMap,
                     Form(form): Form<HashMap<String, String>>| async move {
                        let basic = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .is_some_and(|v| v.starts_with("Basic "));
                        captured.lock().unwrap().push((sid, form, basic));
                        (
                            StatusCode::CREATED,
                            Json(json!({"sid": "CA42", "status": "queued"})),
                        )
                    },
                ),
            )
            .with_state(captured.clone());
        let base = serve(app).await;

        let client = TwilioClient::new(&base, credentials(), Duration::from_secs(5)).unwrap();
        let phone = PhoneNumber::parse("+14155552671").unwrap();
        let placed = client.place_call(&phone, "See you <soon>").await.unwrap();

        assert_eq!(
            placed,
            PlacedCall {
                call_sid: "CA42".into(),
                status: "queued".into(),
                dialed: true
            }
        );

        let calls = captured.lock().unwrap();
        let (sid, form, basic) = &calls[0];
        assert_eq!(sid, "AC123");
        assert!(basic);
        assert_eq!(form["To"], "+14155552671");
        assert_eq!(form["From"], "+15005550006");
        assert_eq!(
            form["Twiml"],
            "<Response><Say voice='alice'>See you &lt;soon&gt;</Say></Response>"
        );
    }

    #[tokio::test]
    async fn accepted_call_with_unreadable_body_still_counts_as_dialed() {
        let app = Router::new().route(
            "/2010-04-01/Accounts/:sid/Calls.json",
            post(|| async { (StatusCode::CREATED, "<html>accepted</html>") }),
        );
        let base = serve(app).await;

        let client = TwilioClient::new(&base, credentials(), Duration::from_secs(5)).unwrap();
        let phone = PhoneNumber::parse("+14155552671").unwrap();
        let placed = client.place_call(&phone, "hi").await.unwrap();

        assert_eq!(
            placed,
            PlacedCall {
                call_sid: "unknown".into(),
                status: "unknown".into(),
                dialed: true
            }
        );
    }

    #[tokio::test]
    async fn twilio_error_message_is_surfaced() {
        let app = Router::new().route(
            "/2010-04-01/Accounts/:sid/Calls.json",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json::<Value>(json!({"message": "The 'To' number is not valid", "code": 21211})),
                )
            }),
        );
        let base = serve(app).await;

        let client = TwilioClient::new(&base, credentials(), Duration::from_secs(5)).unwrap();
        let phone = PhoneNumber::parse("+14155552671").unwrap();
        let err = client.place_call(&phone, "hi").await.unwrap_err();

        match err {
            IntegrationError::Rejected {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The 'To' number is not valid (code 21211)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
