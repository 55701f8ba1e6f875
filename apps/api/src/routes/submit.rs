use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::attachment::AttachmentKind;
use crate::render::{render_application, RenderAssets};
use crate::state::AppState;
use crate::uploads::ApplicationForm;

pub const PDF_DISPOSITION: &str = "attachment; filename=ApplicationForm.pdf";

/// POST /submit
///
/// Records the submission, then renders it. The two steps are not transactional:
/// a render failure leaves the record in place.
pub async fn handle_submit(
    State(state): State<AppState>,
    form: ApplicationForm,
) -> Result<Response, AppError> {
    let ApplicationForm {
        submission,
        attachments,
    } = form;

    for attachment in attachments.iter() {
        debug!(
            kind = attachment.kind.field_name(),
            original_name = %attachment.original_name,
            content_type = %attachment.content_type,
            size_bytes = attachment.size_bytes,
            "Attachment received"
        );
    }

    let record = state.store.record(&submission, &attachments).await?;
    info!(
        record_id = %record.id,
        created_at = %record.created_at,
        photo = record.field(AttachmentKind::Photo.field_name()),
        resume = record.field(AttachmentKind::Resume.field_name()),
        "Application recorded"
    );

    let assets = RenderAssets::resolve(&state.config.public_dir, &attachments);
    let options = state.render_options.clone();

    // Rendered into memory first so a failure still produces a clean 500.
    let pdf = tokio::task::spawn_blocking(move || {
        let mut buffer = Vec::new();
        render_application(&submission, &assets, &options, &mut buffer).map(|()| buffer)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    info!(record_id = %record.id, bytes = pdf.len(), "Application PDF rendered");

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, PDF_DISPOSITION),
        ],
        pdf,
    )
        .into_response())
}
