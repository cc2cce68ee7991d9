//! User accounts, authentication and profiles.
//!
//! Doctor-only fields live in `doctor_profiles`, one row per doctor, and are flattened into the
//! profile and doctor listing responses. Signing up a doctor creates the (empty) profile row in
//! the same transaction as the account.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::password::{hash_password, verify_password};
use crate::repositories::parse_column;
use crate::validation::validate_email;
use api_shared::{AuthUser, DoctorRes, ProfileRes};
use rusqlite::{params, OptionalExtension};
use skinhub_types::{NonEmptyText, Role};
use std::sync::Arc;

/// A new account as submitted at signup.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password: NonEmptyText,
    pub full_name: NonEmptyText,
    pub phone: Option<String>,
    pub role: Role,
}

/// Doctor-only fields of a profile update.
#[derive(Clone, Debug, Default)]
pub struct DoctorProfileUpdate {
    pub specialization: String,
    pub experience_years: Option<i64>,
    pub bio: Option<String>,
}

/// A profile update. Absent fields keep their stored value.
#[derive(Clone, Debug)]
pub struct ProfileUpdate {
    pub user_id: i64,
    pub full_name: Option<NonEmptyText>,
    pub phone: Option<String>,
    pub doctor: Option<DoctorProfileUpdate>,
}

/// Service for user accounts.
#[derive(Clone, Debug)]
pub struct UserService {
    cfg: Arc<CoreConfig>,
}

impl UserService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Registers a new account and returns its id.
    ///
    /// # Errors
    ///
    /// - `CoreError::Conflict` if the email is already registered
    /// - `CoreError::Validation` if the email is malformed
    /// - `CoreError::Store` on any other database failure
    pub fn signup(&self, user: NewUser) -> CoreResult<i64> {
        let email = validate_email(&user.email)?;
        let mut conn = self.cfg.open_db()?;

        let exists = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(CoreError::Conflict("Email already exists.".into()));
        }

        let password_hash =
            hash_password(user.password.as_str(), self.cfg.password_hash_iterations());

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO users (full_name, email, password_hash, phone, role)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.full_name.as_str(),
                email,
                password_hash,
                user.phone,
                user.role.as_str()
            ],
        )
        .map_err(|e| match CoreError::from(e) {
            CoreError::Conflict(_) => CoreError::Conflict("Email already exists.".into()),
            other => other,
        })?;
        let id = tx.last_insert_rowid();

        if user.role == Role::Doctor {
            tx.execute(
                "INSERT INTO doctor_profiles (user_id) VALUES (?1)",
                params![id],
            )?;
        }
        tx.commit()?;

        tracing::info!(user_id = id, role = %user.role, "user created");
        Ok(id)
    }

    /// Verifies credentials and returns the identity the client keeps.
    ///
    /// # Errors
    ///
    /// `CoreError::Auth` with `User not found.` or `Invalid password.`.
    pub fn login(&self, email: &str, password: &str) -> CoreResult<AuthUser> {
        let conn = self.cfg.open_db()?;

        let row = conn
            .query_row(
                "SELECT id, full_name, email, password_hash, role FROM users WHERE email = ?1",
                params![email.trim()],
                |row| {
                    Ok((
                        AuthUser {
                            id: row.get(0)?,
                            name: row.get(1)?,
                            email: row.get(2)?,
                            role: parse_column(4, row.get(4)?)?,
                        },
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((user, password_hash)) = row else {
            return Err(CoreError::Auth("User not found.".into()));
        };

        if !verify_password(password, &password_hash) {
            tracing::warn!(user_id = user.id, "login rejected: invalid password");
            return Err(CoreError::Auth("Invalid password.".into()));
        }

        Ok(user)
    }

    /// Role of the given user, `None` if the account does not exist.
    pub fn role_of(&self, user_id: i64) -> CoreResult<Option<Role>> {
        let conn = self.cfg.open_db()?;
        let role = conn
            .query_row(
                "SELECT role FROM users WHERE id = ?1",
                params![user_id],
                |row| parse_column::<Role>(0, row.get(0)?),
            )
            .optional()?;
        Ok(role)
    }

    /// All doctors, verified first and then by name, with their rating summary.
    pub fn doctors(&self) -> CoreResult<Vec<DoctorRes>> {
        let conn = self.cfg.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.full_name, u.email,
                    dp.specialization, dp.experience_years, dp.bio,
                    COALESCE(dp.is_verified, 0) AS verified,
                    (SELECT AVG(r.rating) FROM reviews r WHERE r.doctor_id = u.id),
                    (SELECT COUNT(*) FROM reviews r WHERE r.doctor_id = u.id)
             FROM users u
             LEFT JOIN doctor_profiles dp ON dp.user_id = u.id
             WHERE u.role = 'doctor'
             ORDER BY verified DESC, u.full_name ASC",
        )?;

        let doctors = stmt
            .query_map([], |row| {
                Ok(DoctorRes {
                    id: row.get(0)?,
                    full_name: row.get(1)?,
                    email: row.get(2)?,
                    specialization: row.get(3)?,
                    experience_years: row.get(4)?,
                    bio: row.get(5)?,
                    verified: row.get::<_, i64>(6)? != 0,
                    average_rating: row.get(7)?,
                    review_count: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(doctors)
    }

    /// Profile of one user, with doctor fields when present.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if no such user exists.
    pub fn profile(&self, user_id: i64) -> CoreResult<ProfileRes> {
        let conn = self.cfg.open_db()?;
        conn.query_row(
            "SELECT u.id, u.email, u.full_name, u.phone, u.role, u.created_at,
                    dp.specialization, dp.experience_years, dp.bio, dp.is_verified
             FROM users u
             LEFT JOIN doctor_profiles dp ON u.id = dp.user_id
             WHERE u.id = ?1",
            params![user_id],
            |row| {
                Ok(ProfileRes {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    full_name: row.get(2)?,
                    phone: row.get(3)?,
                    role: parse_column(4, row.get(4)?)?,
                    created_at: row.get(5)?,
                    specialization: row.get(6)?,
                    experience_years: row.get(7)?,
                    bio: row.get(8)?,
                    is_verified: row.get::<_, Option<i64>>(9)?.map(|v| v != 0),
                })
            },
        )
        .optional()?
        .ok_or_else(|| CoreError::not_found("User not found"))
    }

    /// Applies a profile update in a single transaction.
    ///
    /// Doctor fields are only accepted for doctor accounts.
    pub fn update_profile(&self, update: ProfileUpdate) -> CoreResult<()> {
        let mut conn = self.cfg.open_db()?;
        let tx = conn.transaction()?;

        let role = tx
            .query_row(
                "SELECT role FROM users WHERE id = ?1",
                params![update.user_id],
                |row| parse_column::<Role>(0, row.get(0)?),
            )
            .optional()?
            .ok_or_else(|| CoreError::not_found("User not found"))?;

        tx.execute(
            "UPDATE users
             SET full_name = COALESCE(?1, full_name),
                 phone = COALESCE(?2, phone)
             WHERE id = ?3",
            params![
                update.full_name.as_ref().map(NonEmptyText::as_str),
                update.phone,
                update.user_id
            ],
        )?;

        if let Some(doctor) = update.doctor {
            if role != Role::Doctor {
                return Err(CoreError::validation(
                    "Only doctor accounts have a doctor profile.",
                ));
            }
            tx.execute(
                "INSERT INTO doctor_profiles (user_id, specialization, experience_years, bio)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     specialization = excluded.specialization,
                     experience_years = excluded.experience_years,
                     bio = excluded.bio",
                params![
                    update.user_id,
                    doctor.specialization,
                    doctor.experience_years,
                    doctor.bio
                ],
            )?;
        }

        tx.commit()?;
        tracing::info!(user_id = update.user_id, "profile updated");
        Ok(())
    }
}
