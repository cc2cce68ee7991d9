use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use skinhub_core::config::{flag_from_env_value, iterations_from_env_value};
use skinhub_core::constants::{
    DEFAULT_DATABASE_PATH, DEFAULT_PASSWORD_HASH_ITERATIONS, DEFAULT_PUBLIC_DIR,
};
use skinhub_core::CoreConfig;
use skinhub_integrations::{
    CallPlacer, HttpClassifier, RecordOnlyPlacer, TwilioClient, TwilioCredentials,
};

const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:5000/predict";
const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;

/// Main entry point for the SkinHub server
///
/// Resolves configuration from the environment (and `.env`), applies store migrations, then
/// serves the REST API until the process is stopped.
///
/// # Environment Variables
/// - `SKINHUB_REST_ADDR`: listen address (default: "0.0.0.0:3000")
/// - `SKINHUB_DATABASE_PATH`: SQLite database file (default: "skinhub.db")
/// - `SKINHUB_PUBLIC_DIR`: public static root holding `uploads/images` (default: "public")
/// - `SKINHUB_PASSWORD_HASH_ITERATIONS`: PBKDF2 cost (default: 600000)
/// - `SKINHUB_EXPOSE_ERROR_DETAILS`: include store error text in 503 bodies (default: off)
/// - `SKINHUB_CLASSIFIER_URL`: image classifier endpoint
/// - `SKINHUB_UPSTREAM_TIMEOUT_SECS`: classifier and telephony request timeout (default: 30)
/// - `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`: telephony credentials;
///   calls are only logged unless all three are set
/// - `TWILIO_API_BASE`: telephony API base URL
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - a configuration value is malformed,
/// - the store cannot be opened or migrated,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("skinhub_run=info".parse()?)
                .add_directive("skinhub_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("SKINHUB_REST_ADDR").unwrap_or_else(|_| DEFAULT_REST_ADDR.into());

    let database_path = std::env::var("SKINHUB_DATABASE_PATH")
        .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.into());
    let public_dir =
        std::env::var("SKINHUB_PUBLIC_DIR").unwrap_or_else(|_| DEFAULT_PUBLIC_DIR.into());
    let iterations = iterations_from_env_value(
        std::env::var("SKINHUB_PASSWORD_HASH_ITERATIONS").ok(),
        DEFAULT_PASSWORD_HASH_ITERATIONS,
    )?;
    let expose_error_details =
        flag_from_env_value(std::env::var("SKINHUB_EXPOSE_ERROR_DETAILS").ok());

    let cfg = Arc::new(CoreConfig::new(
        PathBuf::from(database_path),
        PathBuf::from(public_dir),
        iterations,
    )?);

    // Fail fast on a bad database path and bring the schema up to date.
    cfg.open_db()?;
    std::fs::create_dir_all(cfg.uploads_dir())?;

    let timeout = Duration::from_secs(
        std::env::var("SKINHUB_UPSTREAM_TIMEOUT_SECS")
            .ok()
            .map(|v| v.trim().parse::<u64>())
            .transpose()?
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT_SECS),
    );

    let classifier_url =
        std::env::var("SKINHUB_CLASSIFIER_URL").unwrap_or_else(|_| DEFAULT_CLASSIFIER_URL.into());
    let classifier = Arc::new(HttpClassifier::new(&classifier_url, timeout)?);

    let credentials = TwilioCredentials::from_values(
        std::env::var("TWILIO_ACCOUNT_SID").ok(),
        std::env::var("TWILIO_AUTH_TOKEN").ok(),
        std::env::var("TWILIO_PHONE_NUMBER").ok(),
    );
    let calls: Arc<dyn CallPlacer> = match credentials {
        Some(credentials) => {
            let base = std::env::var("TWILIO_API_BASE")
                .unwrap_or_else(|_| DEFAULT_TWILIO_API_BASE.into());
            Arc::new(TwilioClient::new(&base, credentials, timeout)?)
        }
        None => {
            tracing::warn!("Twilio credentials not configured; calls will be logged without dialing");
            Arc::new(RecordOnlyPlacer)
        }
    };

    tracing::info!(
        database = %cfg.database_path().display(),
        public_dir = %cfg.public_dir().display(),
        classifier = %classifier.url(),
        "-- Starting SkinHub REST API on {}",
        rest_addr
    );

    let app = api_rest::router(AppState::new(cfg, classifier, calls, expose_error_details));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
