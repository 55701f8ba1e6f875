use std::sync::Arc;

use crate::config::Config;
use crate::recorder::SubmissionStore;
use crate::render::RenderOptions;
use crate::uploads::UploadPolicy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable store. Default: PgSubmissionStore.
    pub store: Arc<dyn SubmissionStore>,
    pub config: Config,
    pub uploads: UploadPolicy,
    pub render_options: RenderOptions,
}

impl AppState {
    pub fn new(store: Arc<dyn SubmissionStore>, config: Config) -> Self {
        let uploads = UploadPolicy::from_config(&config);
        let render_options = RenderOptions {
            organization_name: config.organization_name.clone(),
            missing_value: config.missing_field_placeholder.clone(),
            ..RenderOptions::default()
        };
        Self {
            store,
            config,
            uploads,
            render_options,
        }
    }
}
