//! Appointment booking and lifecycle.
//!
//! Status moves `pending` to `confirmed` or `rejected`, and a patient cancelling a confirmed
//! appointment also sets `rejected`. Status writes are plain overwrites with no transition
//! check, so repeating one is harmless.

use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::repositories::parse_column;
use crate::validation::{sanitize_optional, DATE_FORMAT, TIME_FORMAT};
use api_shared::{AppointmentRes, PendingReviewRes};
use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, OptionalExtension};
use skinhub_types::{AppointmentStatus, Role};
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NewAppointment {
    pub user_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Raw notes; sanitised before storage.
    pub notes: Option<String>,
}

/// Which side of an appointment a listing is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppointmentView {
    /// Appointments the user booked, annotated with the doctor's name.
    Patient,
    /// Appointments booked with the user, annotated with the patient's name.
    Doctor,
}

impl AppointmentView {
    /// `doctor` selects the doctor view; any other value the patient view.
    pub fn from_role_param(role: Option<&str>) -> Self {
        match role.map(str::trim) {
            Some(r) if r == Role::Doctor.as_str() => Self::Doctor,
            _ => Self::Patient,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppointmentService {
    cfg: Arc<CoreConfig>,
}

impl AppointmentService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Books an appointment in `pending` state and returns its id.
    ///
    /// # Errors
    ///
    /// `CoreError::Validation` if `doctor_id` does not name a doctor account or `user_id` does
    /// not exist.
    pub fn book(&self, appt: NewAppointment) -> CoreResult<i64> {
        let conn = self.cfg.open_db()?;

        let doctor_role = conn
            .query_row(
                "SELECT role FROM users WHERE id = ?1",
                params![appt.doctor_id],
                |row| parse_column::<Role>(0, row.get(0)?),
            )
            .optional()?;
        if doctor_role != Some(Role::Doctor) {
            return Err(CoreError::validation("Selected doctor does not exist."));
        }

        let notes = sanitize_optional(appt.notes.as_deref());
        conn.execute(
            "INSERT INTO appointments
                 (user_id, doctor_id, appointment_date, appointment_time, notes, status)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending')",
            params![
                appt.user_id,
                appt.doctor_id,
                appt.date.format(DATE_FORMAT).to_string(),
                appt.time.format(TIME_FORMAT).to_string(),
                notes
            ],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(
            appointment_id = id,
            user_id = appt.user_id,
            doctor_id = appt.doctor_id,
            "appointment booked"
        );
        Ok(id)
    }

    /// Appointments for one user, newest date and time first.
    pub fn list_for_user(
        &self,
        user_id: i64,
        view: AppointmentView,
    ) -> CoreResult<Vec<AppointmentRes>> {
        let conn = self.cfg.open_db()?;

        let sql = match view {
            AppointmentView::Doctor => {
                "SELECT a.id, a.user_id, a.doctor_id, a.appointment_date, a.appointment_time,
                        a.status, a.notes, u.full_name
                 FROM appointments a
                 JOIN users u ON a.user_id = u.id
                 WHERE a.doctor_id = ?1
                 ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC"
            }
            AppointmentView::Patient => {
                "SELECT a.id, a.user_id, a.doctor_id, a.appointment_date, a.appointment_time,
                        a.status, a.notes, u.full_name
                 FROM appointments a
                 JOIN users u ON a.doctor_id = u.id
                 WHERE a.user_id = ?1
                 ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                let other_name: String = row.get(7)?;
                let (patient_name, doctor_name) = match view {
                    AppointmentView::Doctor => (Some(other_name), None),
                    AppointmentView::Patient => (None, Some(other_name)),
                };
                Ok(AppointmentRes {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    doctor_id: row.get(2)?,
                    appointment_date: row.get(3)?,
                    appointment_time: row.get(4)?,
                    status: parse_column(5, row.get(5)?)?,
                    notes: row.get(6)?,
                    patient_name,
                    doctor_name,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Overwrites the status of an appointment.
    ///
    /// # Errors
    ///
    /// `CoreError::NotFound` if the appointment does not exist.
    pub fn update_status(&self, appointment_id: i64, status: AppointmentStatus) -> CoreResult<()> {
        let conn = self.cfg.open_db()?;
        let changed = conn.execute(
            "UPDATE appointments SET status = ?1 WHERE id = ?2",
            params![status.as_str(), appointment_id],
        )?;

        if changed == 0 {
            return Err(CoreError::not_found("Appointment not found."));
        }

        tracing::info!(appointment_id, status = %status, "appointment status updated");
        Ok(())
    }

    /// Confirmed appointments before today that the user has not reviewed yet.
    pub fn pending_reviews(&self, user_id: i64) -> CoreResult<Vec<PendingReviewRes>> {
        self.pending_reviews_on(user_id, Utc::now().date_naive())
    }

    /// As [`pending_reviews`](Self::pending_reviews), with "today" supplied by the caller.
    pub fn pending_reviews_on(
        &self,
        user_id: i64,
        today: NaiveDate,
    ) -> CoreResult<Vec<PendingReviewRes>> {
        let conn = self.cfg.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.doctor_id, a.appointment_date, a.appointment_time, u.full_name
             FROM appointments a
             JOIN users u ON a.doctor_id = u.id
             WHERE a.user_id = ?1
               AND a.status = 'confirmed'
               AND a.appointment_date < ?2
               AND NOT EXISTS (
                   SELECT 1 FROM reviews r WHERE r.appointment_id = a.id AND r.user_id = ?1
               )
             ORDER BY a.appointment_date DESC, a.appointment_time DESC",
        )?;

        let rows = stmt
            .query_map(
                params![user_id, today.format(DATE_FORMAT).to_string()],
                |row| {
                    Ok(PendingReviewRes {
                        id: row.get(0)?,
                        doctor_id: row.get(1)?,
                        appointment_date: row.get(2)?,
                        appointment_time: row.get(3)?,
                        doctor_name: row.get(4)?,
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::test_support::{book, confirm, create_user, date, test_cfg};
    use tempfile::TempDir;

    #[test]
    fn booking_starts_pending_with_sanitised_notes() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let patient = create_user(&cfg, "Pat", Role::User);
        let doctor = create_user(&cfg, "Dr Rao", Role::Doctor);

        let svc = AppointmentService::new(cfg);
        let id = svc
            .book(NewAppointment {
                user_id: patient,
                doctor_id: doctor,
                date: date("2030-03-04"),
                time: NaiveTime::from_hms_opt(14, 15, 0).unwrap(),
                notes: Some("<i>rash</i> on arm & neck".into()),
            })
            .unwrap();

        let listed = svc.list_for_user(patient, AppointmentView::Patient).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].status, AppointmentStatus::Pending);
        assert_eq!(listed[0].notes, "rash on arm &amp; neck");
        assert_eq!(listed[0].appointment_time, "14:15:00");
        assert_eq!(listed[0].doctor_name.as_deref(), Some("Dr Rao"));
        assert!(listed[0].patient_name.is_none());
    }

    #[test]
    fn booking_requires_a_doctor_account() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let patient = create_user(&cfg, "Pat", Role::User);
        let other = create_user(&cfg, "Not A Doctor", Role::User);

        let svc = AppointmentService::new(cfg);
        for doctor_id in [other, 999] {
            let err = svc
                .book(NewAppointment {
                    user_id: patient,
                    doctor_id,
                    date: date("2030-03-04"),
                    time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                    notes: None,
                })
                .unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)));
        }
    }

    #[test]
    fn booking_for_unknown_patient_is_rejected() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let doctor = create_user(&cfg, "Dr Rao", Role::Doctor);

        let err = AppointmentService::new(cfg)
            .book(NewAppointment {
                user_id: 12345,
                doctor_id: doctor,
                date: date("2030-03-04"),
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                notes: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn listing_filters_by_role_and_orders_newest_first() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let pat = create_user(&cfg, "Pat", Role::User);
        let sam = create_user(&cfg, "Sam", Role::User);
        let doc = create_user(&cfg, "Dr Rao", Role::Doctor);

        let early = book(&cfg, pat, doc, "2030-01-01", "09:00");
        let late_morning = book(&cfg, pat, doc, "2030-02-01", "09:00");
        let late_evening = book(&cfg, sam, doc, "2030-02-01", "17:30");

        let svc = AppointmentService::new(cfg);

        let doctor_view = svc.list_for_user(doc, AppointmentView::Doctor).unwrap();
        let ids: Vec<_> = doctor_view.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![late_evening, late_morning, early]);
        assert_eq!(doctor_view[0].patient_name.as_deref(), Some("Sam"));
        assert!(doctor_view.iter().all(|a| a.doctor_name.is_none()));

        let patient_view = svc.list_for_user(pat, AppointmentView::Patient).unwrap();
        let ids: Vec<_> = patient_view.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![late_morning, early]);

        // A patient asking for the doctor view sees nothing booked with them.
        assert!(svc.list_for_user(pat, AppointmentView::Doctor).unwrap().is_empty());
    }

    #[test]
    fn update_status_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let pat = create_user(&cfg, "Pat", Role::User);
        let doc = create_user(&cfg, "Dr Rao", Role::Doctor);
        let id = book(&cfg, pat, doc, "2030-01-01", "09:00");

        let svc = AppointmentService::new(cfg.clone());
        svc.update_status(id, AppointmentStatus::Confirmed).unwrap();
        svc.update_status(id, AppointmentStatus::Confirmed).unwrap();

        let listed = svc.list_for_user(pat, AppointmentView::Patient).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, AppointmentStatus::Confirmed);

        // Cancellation after confirmation is allowed.
        svc.update_status(id, AppointmentStatus::Rejected).unwrap();
        let listed = svc.list_for_user(pat, AppointmentView::Patient).unwrap();
        assert_eq!(listed[0].status, AppointmentStatus::Rejected);
    }

    #[test]
    fn update_status_of_unknown_appointment_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = AppointmentService::new(test_cfg(dir.path()));
        let err = svc.update_status(5, AppointmentStatus::Confirmed).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn pending_reviews_only_lists_confirmed_past_appointments() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let pat = create_user(&cfg, "Pat", Role::User);
        let doc = create_user(&cfg, "Dr Rao", Role::Doctor);

        let past_confirmed = book(&cfg, pat, doc, "2024-01-10", "09:00");
        confirm(&cfg, past_confirmed);
        let _past_pending = book(&cfg, pat, doc, "2024-01-11", "09:00");
        let today_confirmed = book(&cfg, pat, doc, "2024-02-01", "09:00");
        confirm(&cfg, today_confirmed);
        let future_confirmed = book(&cfg, pat, doc, "2024-03-01", "09:00");
        confirm(&cfg, future_confirmed);

        let pending = AppointmentService::new(cfg)
            .pending_reviews_on(pat, date("2024-02-01"))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, past_confirmed);
        assert_eq!(pending[0].doctor_id, doc);
        assert_eq!(pending[0].doctor_name, "Dr Rao");
    }

    #[test]
    fn view_from_role_param() {
        assert_eq!(
            AppointmentView::from_role_param(Some("doctor")),
            AppointmentView::Doctor
        );
        assert_eq!(
            AppointmentView::from_role_param(Some("user")),
            AppointmentView::Patient
        );
        assert_eq!(AppointmentView::from_role_param(None), AppointmentView::Patient);
    }
}
