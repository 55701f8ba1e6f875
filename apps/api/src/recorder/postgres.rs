use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::ApplicationRecord;
use crate::models::attachment::Attachments;
use crate::models::submission::Submission;
use crate::recorder::SubmissionStore;

const CREATE_APPLICATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS applications (
        id          UUID PRIMARY KEY,
        document    JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    )
"#;

/// Stores each submission as one JSONB document in the `applications` table.
pub struct PgSubmissionStore {
    pool: PgPool,
    schema_ready: OnceCell<()>,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema_ready: OnceCell::new(),
        }
    }

    /// Creates the table if needed. Succeeds at most once per process; a failed
    /// attempt is retried on the next call.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        self.schema_ready
            .get_or_try_init(|| async {
                sqlx::query(CREATE_APPLICATIONS_TABLE)
                    .execute(&self.pool)
                    .await?;
                info!("applications table ready");
                Ok::<(), sqlx::Error>(())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn record(
        &self,
        submission: &Submission,
        attachments: &Attachments,
    ) -> Result<ApplicationRecord, AppError> {
        self.ensure_schema().await?;

        let document = Value::Object(submission.to_document(attachments));
        let record: ApplicationRecord = sqlx::query_as(
            r#"
            INSERT INTO applications (id, document)
            VALUES ($1, $2)
            RETURNING id, document, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(Json(document))
        .fetch_one(&self.pool)
        .await?;

        debug!(record_id = %record.id, fields = submission.len(), "Application stored");
        Ok(record)
    }
}
