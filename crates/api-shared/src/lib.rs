//! # API Shared
//!
//! Shared definitions for the SkinHub REST server and its clients.
//!
//! Contains:
//! - Request/response bodies (`types` module)
//! - Lenient integer decoding for browser-submitted ids (`flex` module)
//! - `HealthService`
//!
//! Used by `api-rest`, `skinhub-core` and the `skinhub` terminal client.

pub mod flex;
pub mod health;
pub mod types;

pub use flex::FlexInt;
pub use health::HealthService;
pub use types::*;
