//! Submission recorder: persists one schema-less record per submission.
//!
//! `AppState` holds an `Arc<dyn SubmissionStore>`; production uses
//! `PgSubmissionStore`, tests swap in an in-memory store.

pub mod postgres;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::application::ApplicationRecord;
use crate::models::attachment::Attachments;
use crate::models::submission::Submission;

pub use postgres::PgSubmissionStore;

/// Writes submissions verbatim. No validation, no coercion, no retry:
/// a failed write is returned to the caller as-is.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn record(
        &self,
        submission: &Submission,
        attachments: &Attachments,
    ) -> Result<ApplicationRecord, AppError>;
}
