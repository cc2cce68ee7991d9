//! # SkinHub Integrations
//!
//! Adapters for the two external services SkinHub depends on:
//! - an image classifier reached over HTTP ([`ImageClassifier`], [`HttpClassifier`])
//! - a telephony API that places reminder calls ([`CallPlacer`], [`TwilioClient`]), with a
//!   record-only stand-in when no credentials are configured ([`RecordOnlyPlacer`])
//!
//! Every request carries a bounded timeout and nothing is retried.

pub mod classifier;
pub mod telephony;

pub use classifier::{Classification, HttpClassifier, ImageClassifier};
pub use telephony::{
    CallPlacer, PlacedCall, RecordOnlyPlacer, TwilioClient, TwilioCredentials,
    DEFAULT_CALL_MESSAGE,
};

/// Errors from external service calls.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// The service did not answer within the configured timeout.
    #[error("{service} did not respond in time")]
    Timeout { service: &'static str },

    /// The request could not be sent or the connection failed.
    #[error("{service} request failed: {reason}")]
    Transport {
        service: &'static str,
        reason: String,
    },

    /// The service answered with an error.
    #[error("{service} rejected the request ({status}): {message}")]
    Rejected {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The service answered successfully but the body was not what we expect.
    #[error("{service} returned an unexpected response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl IntegrationError {
    pub(crate) fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout { service }
        } else {
            Self::Transport {
                service,
                reason: err.to_string(),
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type IntegrationResult<T> = std::result::Result<T, IntegrationError>;
