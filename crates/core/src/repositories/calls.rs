//! Log of reminder calls, whether dialed or only recorded.

use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::validation::TIMESTAMP_FORMAT;
use api_shared::ScheduledCallRes;
use chrono::NaiveDateTime;
use rusqlite::params;
use skinhub_types::PhoneNumber;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct NewScheduledCall {
    pub user_id: Option<i64>,
    pub phone: PhoneNumber,
    pub scheduled_at: NaiveDateTime,
    /// Telephony reference, or a synthetic one when the call was not dialed.
    pub call_sid: String,
    pub status: String,
}

#[derive(Clone, Debug)]
pub struct CallService {
    cfg: Arc<CoreConfig>,
}

impl CallService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Records a call and returns the row id.
    pub fn record(&self, call: NewScheduledCall) -> CoreResult<i64> {
        let conn = self.cfg.open_db()?;
        conn.execute(
            "INSERT INTO scheduled_calls (user_id, phone_number, scheduled_at, call_sid, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                call.user_id,
                call.phone.as_str(),
                call.scheduled_at.format(TIMESTAMP_FORMAT).to_string(),
                call.call_sid,
                call.status
            ],
        )?;
        let id = conn.last_insert_rowid();
        tracing::info!(call_id = id, call_sid = %call.call_sid, "scheduled call recorded");
        Ok(id)
    }

    /// Calls logged for one user, latest schedule first.
    pub fn list(&self, user_id: i64) -> CoreResult<Vec<ScheduledCallRes>> {
        let conn = self.cfg.open_db()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, phone_number, scheduled_at, call_sid, status, created_at
             FROM scheduled_calls
             WHERE user_id = ?1
             ORDER BY scheduled_at DESC, id DESC",
        )?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(ScheduledCallRes {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    phone_number: row.get(2)?,
                    scheduled_at: row.get(3)?,
                    call_sid: row.get(4)?,
                    status: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::repositories::test_support::{create_user, test_cfg};
    use crate::validation::parse_scheduled_at;
    use skinhub_types::Role;
    use tempfile::TempDir;

    fn call(user_id: Option<i64>, at: &str, sid: &str) -> NewScheduledCall {
        NewScheduledCall {
            user_id,
            phone: PhoneNumber::parse("+14155552671").unwrap(),
            scheduled_at: parse_scheduled_at(at).unwrap(),
            call_sid: sid.into(),
            status: "scheduled".into(),
        }
    }

    #[test]
    fn recorded_calls_are_listed_per_user() {
        let dir = TempDir::new().unwrap();
        let cfg = test_cfg(dir.path());
        let user = create_user(&cfg, "Pat", Role::User);
        let svc = CallService::new(cfg);

        svc.record(call(Some(user), "2030-01-01 10:00", "fallback_a")).unwrap();
        svc.record(call(Some(user), "2030-02-01T08:30:00", "CA123")).unwrap();
        svc.record(call(None, "2030-03-01 10:00", "fallback_b")).unwrap();

        let listed = svc.list(user).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].call_sid, "CA123");
        assert_eq!(listed[0].scheduled_at, "2030-02-01 08:30:00");
        assert_eq!(listed[1].phone_number, "+14155552671");
    }

    #[test]
    fn unknown_user_is_rejected() {
        let dir = TempDir::new().unwrap();
        let svc = CallService::new(test_cfg(dir.path()));
        let err = svc
            .record(call(Some(42), "2030-01-01 10:00", "fallback_a"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
