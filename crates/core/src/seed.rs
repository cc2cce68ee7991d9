//! Bulk loading of verified doctor accounts from a YAML file.
//!
//! The file is a list of entries:
//!
//! ```yaml
//! - email: dr.rao@example.com
//!   password: change-me
//!   full_name: Dr. Meera Rao
//!   phone: "+919812345678"
//!   specialization: Dermatology
//!   experience_years: 12
//!   bio: Consultant dermatologist.
//! ```
//!
//! Entries whose email is already registered are skipped. The whole file is applied in one
//! transaction.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::password::hash_password;
use crate::validation::validate_email;
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use skinhub_types::NonEmptyText;
use std::path::Path;
use std::sync::Arc;

#[derive(Clone, Debug, Deserialize)]
pub struct DoctorSeed {
    pub email: String,
    pub password: NonEmptyText,
    pub full_name: NonEmptyText,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience_years: Option<i64>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub skipped: usize,
}

/// Parse a doctor seed file.
pub fn read_seed_file(path: &Path) -> CoreResult<Vec<DoctorSeed>> {
    let raw = std::fs::read_to_string(path).map_err(CoreError::FileRead)?;
    serde_yaml::from_str(&raw).map_err(CoreError::YamlDeserialization)
}

#[derive(Clone, Debug)]
pub struct SeedService {
    cfg: Arc<CoreConfig>,
}

impl SeedService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Inserts every doctor whose email is not yet registered, as a verified doctor.
    pub fn seed_doctors(&self, doctors: &[DoctorSeed]) -> CoreResult<SeedReport> {
        let mut conn = self.cfg.open_db()?;
        let tx = conn.transaction()?;
        let mut report = SeedReport::default();

        for doctor in doctors {
            let email = validate_email(&doctor.email)?;
            let exists = tx
                .query_row(
                    "SELECT id FROM users WHERE email = ?1",
                    params![email],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?
                .is_some();
            if exists {
                report.skipped += 1;
                continue;
            }

            let password_hash = hash_password(
                doctor.password.as_str(),
                self.cfg.password_hash_iterations(),
            );
            tx.execute(
                "INSERT INTO users (full_name, email, password_hash, phone, role)
                 VALUES (?1, ?2, ?3, ?4, 'doctor')",
                params![doctor.full_name.as_str(), email, password_hash, doctor.phone],
            )?;
            let user_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO doctor_profiles
                     (user_id, specialization, experience_years, bio, is_verified)
                 VALUES (?1, ?2, ?3, ?4, 1)",
                params![
                    user_id,
                    doctor.specialization,
                    doctor.experience_years,
                    doctor.bio
                ],
            )?;
            report.inserted += 1;
        }

        tx.commit()?;
        tracing::info!(
            inserted = report.inserted,
            skipped = report.skipped,
            "doctors seeded"
        );
        Ok(report)
    }
}
