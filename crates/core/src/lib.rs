//! # SkinHub Core
//!
//! Core business logic for the SkinHub telehealth service.
//!
//! This crate owns the relational store and every operation on it:
//! - Accounts, login and profiles (`repositories::users`)
//! - Appointment booking, status changes and pending-review detection
//! - Reviews, predictions, heatmap artifacts and the scheduled-call log
//! - The static disease incidence table (`heatmap`)
//! - Doctor seeding from YAML (`seed`)
//!
//! **No API concerns**: HTTP routing, multipart handling and external service calls belong in
//! `api-rest`, `skinhub_files` and `skinhub-integrations`.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod heatmap;
pub mod password;
pub mod repositories;
pub mod seed;
pub mod validation;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use repositories::appointments::{AppointmentService, AppointmentView, NewAppointment};
pub use repositories::calls::{CallService, NewScheduledCall};
pub use repositories::predictions::{NewPrediction, PredictionService};
pub use repositories::reviews::{NewReview, ReviewService};
pub use repositories::users::{DoctorProfileUpdate, NewUser, ProfileUpdate, UserService};
pub use seed::{DoctorSeed, SeedReport, SeedService};

pub use skinhub_types::{AppointmentStatus, NonEmptyText, PhoneNumber, Rating, Role, ValueError};
