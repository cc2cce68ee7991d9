use skinhub_core::CoreConfig;
use skinhub_files::UploadsService;
use skinhub_integrations::{CallPlacer, ImageClassifier};
use std::sync::Arc;

/// Application state for the REST API server
///
/// Everything here is resolved once at startup. Handlers build the per-entity services from
/// `cfg` on demand; each of those opens its own store connection.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub uploads: UploadsService,
    pub classifier: Arc<dyn ImageClassifier>,
    pub calls: Arc<dyn CallPlacer>,
    /// Include store error text in 503 bodies.
    pub expose_error_details: bool,
}

impl AppState {
    /// Builds state whose uploads land in the configured public directory.
    pub fn new(
        cfg: Arc<CoreConfig>,
        classifier: Arc<dyn ImageClassifier>,
        calls: Arc<dyn CallPlacer>,
        expose_error_details: bool,
    ) -> Self {
        let uploads = UploadsService::new(
            &cfg.uploads_dir(),
            skinhub_core::constants::UPLOADS_RELATIVE_DIR,
        );
        Self {
            cfg,
            uploads,
            classifier,
            calls,
            expose_error_details,
        }
    }
}
