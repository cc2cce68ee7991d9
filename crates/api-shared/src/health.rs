use crate::types::HealthRes;

/// Liveness reporting shared by the server and its tests.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Builds the health response.
    ///
    /// `store_ok` reports whether the relational store could be opened; the service is only
    /// considered healthy when it could.
    pub fn check_health(store_ok: bool) -> HealthRes {
        if store_ok {
            HealthRes {
                ok: true,
                message: "SkinHub is alive".into(),
            }
        } else {
            HealthRes {
                ok: false,
                message: "SkinHub store is unavailable".into(),
            }
        }
    }
}
