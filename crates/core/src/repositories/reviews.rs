//! Doctor reviews.
//!
//! A patient may review an appointment once, and only after it was confirmed and its date has
//! passed. The same rule drives the pending-review listing in
//! [`AppointmentService::pending_reviews`](crate::repositories::appointments::AppointmentService::pending_reviews).

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::repositories::parse_column;
use crate::validation::{sanitize_optional, DATE_FORMAT};
use api_shared::ReviewRes;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use skinhub_types::{AppointmentStatus, Rating};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NewReview {
    pub appointment_id: i64,
    pub doctor_id: i64,
    pub user_id: i64,
    pub rating: Rating,
    /// Raw comment; sanitised before storage.
    pub comment: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ReviewService {
    cfg: Arc<CoreConfig>,
}

impl ReviewService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Stores a review and returns its id.
    pub fn add(&self, review: NewReview) -> CoreResult<i64> {
        self.add_on(review, Utc::now().date_naive())
    }

    /// As [`add`](Self::add), with "today" supplied by the caller.
    ///
    /// # Errors
    ///
    /// - `CoreError::NotFound` if the appointment does not exist
    /// - `CoreError::Validation` if the appointment belongs to someone else, names a different
    ///   doctor, is not confirmed, or is not yet in the past
    /// - `CoreError::Conflict` if the appointment already has a review
    pub fn add_on(&self, review: NewReview, today: NaiveDate) -> CoreResult<i64> {
        let mut conn = self.cfg.open_db()?;
        let tx = conn.transaction()?;

        let appointment = tx
            .query_row(
                "SELECT user_id, doctor_id, status, appointment_date
                 FROM appointments WHERE id = ?1",
                params![review.appointment_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        parse_column::<AppointmentStatus>(2, row.get(2)?)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((owner, doctor, status, appointment_date)) = appointment else {
            return Err(CoreError::not_found("Appointment not found."));
        };

        if owner != review.user_id || doctor != review.doctor_id {
            return Err(CoreError::validation(
                "Appointment does not match this patient and doctor.",
            ));
        }
        if status != AppointmentStatus::Confirmed {
            return Err(CoreError::validation(
                "Only confirmed appointments can be reviewed.",
            ));
        }
        if appointment_date >= today.format(DATE_FORMAT).to_string() {
            return Err(CoreError::validation(
                "Appointments can only be reviewed after they have taken place.",
            ));
        }

        let comment = sanitize_optional(review.comment.as_deref());
        tx.execute(
            "INSERT INTO reviews (appointment_id, doctor_id, user_id, rating, comment)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                review.appointment_id,
                review.doctor_id,
                review.user_id,
                review.rating.value(),
                comment
            ],
        )
        .map_err(|e| match CoreError::from(e) {
            CoreError::Conflict(_) => {
                CoreError::Conflict("This appointment has already been reviewed.".into())
            }
            other => other,
        })?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(
            review_id = id,
            appointment_id = review.appointment_id,
            doctor_id = review.doctor_id,
            "review added"
        );
        Ok(id)
    }

    /// Reviews of one doctor, newest first.
    pub fn list(&self, doctor_id: i64) -> CoreResult<Vec<ReviewRes>> {
        let conn = self.cfg.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.appointment_id, r.rating, r.comment, r.created_at,
                    u.full_name, a.appointment_date
             FROM reviews r
             JOIN users u ON r.user_id = u.id
             LEFT JOIN appointments a ON r.appointment_id = a.id
             WHERE r.doctor_id = ?1
             ORDER BY r.created_at DESC, r.id DESC",
        )?;

        let rows = stmt
            .query_map(params![doctor_id], |row| {
                Ok(ReviewRes {
                    id: row.get(0)?,
                    appointment_id: row.get(1)?,
                    rating: row.get(2)?,
                    comment: row.get(3)?,
                    created_at: row.get(4)?,
                    patient_name: row.get(5)?,
                    appointment_date: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
