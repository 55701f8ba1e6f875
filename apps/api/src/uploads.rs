//! Upload layer: turns a `multipart/form-data` body into a `Submission` plus
//! the attachments written to disk.
//!
//! Runs as an extractor, so a rejected upload (disallowed type, oversize file,
//! unknown file field) never reaches the handler and nothing is recorded.
//! Urlencoded and JSON bodies are accepted too; they carry no attachments. Any
//! other body is ignored and yields an empty submission.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::{
    async_trait,
    extract::{
        multipart::{Field, MultipartError},
        FromRequest, Multipart, Request,
    },
    http::header,
    Form, Json,
};
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::models::attachment::{AttachmentKind, Attachments, StoredAttachment};
use crate::models::submission::Submission;
use crate::state::AppState;

/// Where uploads go and which ones are accepted.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub dir: PathBuf,
    /// `None` accepts files of any size.
    pub max_file_bytes: Option<u64>,
    pub mime_filter: bool,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        UploadPolicy {
            dir: config.upload_dir.clone(),
            max_file_bytes: config.upload_max_file_bytes,
            mime_filter: config.upload_mime_filter,
        }
    }
}

/// A parsed application form, attachments already on disk.
#[derive(Debug)]
pub struct ApplicationForm {
    pub submission: Submission,
    pub attachments: Attachments,
}

#[async_trait]
impl FromRequest<AppState> for ApplicationForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = media_type(&req);

        let submission = match content_type.as_str() {
            "multipart/form-data" => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?;
                return collect_form(multipart, &state.uploads).await;
            }
            "application/x-www-form-urlencoded" => {
                let Form(submission) = Form::<Submission>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?;
                submission
            }
            "application/json" => {
                let Json(object) = Json::<Map<String, Value>>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::Upload(e.body_text()))?;
                submission_from_json(object)
            }
            other => {
                debug!(content_type = other, "Request body ignored");
                Submission::new()
            }
        };

        debug!(
            fields = submission.len(),
            content_type = %content_type,
            "Application form received"
        );
        Ok(ApplicationForm {
            submission,
            attachments: Attachments::default(),
        })
    }
}

/// Lowercased `type/subtype` of the request body, `""` when absent.
fn media_type(req: &Request) -> String {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Strings are kept verbatim, numbers and booleans as their JSON text.
/// Nulls, arrays and objects have no single-line form and are dropped.
fn submission_from_json(object: Map<String, Value>) -> Submission {
    object
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(text) => Some((name, text)),
            Value::Number(_) | Value::Bool(_) => Some((name, value.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => {
                debug!(field = %name, "Non-scalar JSON field dropped");
                None
            }
        })
        .collect()
}

/// Reads every part. On rejection, files already written for this request are removed.
pub async fn collect_form(
    mut multipart: Multipart,
    policy: &UploadPolicy,
) -> Result<ApplicationForm, AppError> {
    let mut submission = Submission::new();
    let mut attachments = Attachments::default();

    if let Err(e) = read_parts(&mut multipart, policy, &mut submission, &mut attachments).await {
        attachments.discard().await;
        return Err(e);
    }

    debug!(
        fields = submission.len(),
        files = attachments.iter().count(),
        "Application form received"
    );
    Ok(ApplicationForm {
        submission,
        attachments,
    })
}

async fn read_parts(
    multipart: &mut Multipart,
    policy: &UploadPolicy,
    submission: &mut Submission,
    attachments: &mut Attachments,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            let value = field.text().await.map_err(upload_error)?;
            submission.insert(name, value);
            continue;
        };

        let kind = AttachmentKind::from_field_name(&name)
            .ok_or_else(|| AppError::Upload(format!("Unexpected field: {name}")))?;

        // A file input left empty is still posted, with no filename.
        if file_name.is_empty() {
            continue;
        }
        if attachments.get(kind).is_some() {
            warn!(field = %name, file = %file_name, "Extra file for slot ignored");
            continue;
        }

        let stored = store_file(field, kind, &file_name, policy).await?;
        attachments.set(stored);
    }
    Ok(())
}

async fn store_file(
    mut field: Field<'_>,
    kind: AttachmentKind,
    file_name: &str,
    policy: &UploadPolicy,
) -> Result<StoredAttachment, AppError> {
    let original_name = sanitize_file_name(file_name);
    let content_type = field
        .content_type()
        .map(str::to_owned)
        .unwrap_or_else(|| {
            mime_guess::from_path(&original_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

    if policy.mime_filter && !kind.accepts(&content_type) {
        return Err(AppError::Upload(format!(
            "{} of type {content_type} is not allowed",
            kind.field_name()
        )));
    }

    let (mut file, stored_name, path) =
        create_upload_file(&policy.dir, Utc::now().timestamp_millis(), &original_name).await?;

    let size_bytes = match copy_field(&mut field, &mut file, policy.max_file_bytes, kind).await {
        Ok(size) => size,
        Err(e) => {
            drop(file);
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                warn!(path = %path.display(), "Failed to remove partial upload: {remove_err}");
            }
            return Err(e);
        }
    };

    debug!(
        field = kind.field_name(),
        stored_name = %stored_name,
        size_bytes,
        "Attachment stored"
    );
    Ok(StoredAttachment {
        kind,
        original_name,
        stored_name,
        content_type,
        size_bytes,
        path,
    })
}

/// Streams the part into `file`, enforcing the size limit as chunks arrive.
async fn copy_field(
    field: &mut Field<'_>,
    file: &mut File,
    limit: Option<u64>,
    kind: AttachmentKind,
) -> Result<u64, AppError> {
    let mut size: u64 = 0;
    while let Some(chunk) = field.chunk().await.map_err(upload_error)? {
        size += chunk.len() as u64;
        if let Some(limit) = limit {
            if size > limit {
                return Err(AppError::Upload(format!(
                    "{} exceeds the {limit} byte limit",
                    kind.field_name()
                )));
            }
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

/// Bounds the search for a free name when uploads share a millisecond.
const MAX_NAME_ATTEMPTS: i64 = 1000;

/// Creates `<millis>-<name>` without touching an existing upload. When the name
/// is taken the timestamp is bumped by one until a free name turns up.
async fn create_upload_file(
    dir: &Path,
    timestamp_millis: i64,
    original_name: &str,
) -> Result<(File, String, PathBuf), AppError> {
    for offset in 0..MAX_NAME_ATTEMPTS {
        let stored_name = stored_file_name(timestamp_millis + offset, original_name);
        let path = dir.join(&stored_name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, stored_name, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(AppError::Upload(format!(
        "no free upload name for {original_name}"
    )))
}

fn upload_error(e: MultipartError) -> AppError {
    AppError::Upload(e.body_text())
}

/// Final path component of a client-supplied filename, so uploads stay inside
/// the upload directory. Windows-style separators are treated as separators too.
pub fn sanitize_file_name(raw: &str) -> String {
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match Path::new(last).file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "upload".to_string(),
    }
}

/// `<unix-millis>-<original name>`.
pub fn stored_file_name(timestamp_millis: i64, original_name: &str) -> String {
    format!("{timestamp_millis}-{original_name}")
}
