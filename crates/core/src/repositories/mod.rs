//! Store-backed services, one per entity.
//!
//! Each service holds the shared `CoreConfig` and opens its own connection per operation; no
//! connection or other mutable state is shared between requests.

pub mod appointments;
pub mod calls;
pub mod predictions;
pub mod reviews;
pub mod users;

use std::str::FromStr;

/// Parse a text column into a validated type, reporting failures as a column conversion error.
pub(crate) fn parse_column<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::CoreConfig;
    use crate::repositories::appointments::{AppointmentService, NewAppointment};
    use crate::repositories::users::{NewUser, UserService};
    use chrono::{NaiveDate, NaiveTime};
    use skinhub_types::{AppointmentStatus, NonEmptyText, Role};
    use std::path::Path;
    use std::sync::Arc;

    pub(crate) fn test_cfg(dir: &Path) -> Arc<CoreConfig> {
        Arc::new(
            CoreConfig::new(dir.join("skinhub.db"), dir.join("public"), 1_000)
                .expect("CoreConfig::new should succeed"),
        )
    }

    pub(crate) fn create_user(cfg: &Arc<CoreConfig>, name: &str, role: Role) -> i64 {
        UserService::new(cfg.clone())
            .signup(NewUser {
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                password: NonEmptyText::new("password123").unwrap(),
                full_name: NonEmptyText::new(name).unwrap(),
                phone: None,
                role,
            })
            .expect("signup should succeed")
    }

    pub(crate) fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(crate) fn book(
        cfg: &Arc<CoreConfig>,
        patient: i64,
        doctor: i64,
        day: &str,
        time: &str,
    ) -> i64 {
        AppointmentService::new(cfg.clone())
            .book(NewAppointment {
                user_id: patient,
                doctor_id: doctor,
                date: date(day),
                time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
                notes: None,
            })
            .expect("booking should succeed")
    }

    pub(crate) fn confirm(cfg: &Arc<CoreConfig>, appointment_id: i64) {
        AppointmentService::new(cfg.clone())
            .update_status(appointment_id, AppointmentStatus::Confirmed)
            .expect("status update should succeed");
    }
}
