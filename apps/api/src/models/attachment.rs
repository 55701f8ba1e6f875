use std::path::PathBuf;

use tracing::warn;

/// The two file slots the application form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Photo,
    Resume,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 2] = [AttachmentKind::Photo, AttachmentKind::Resume];

    /// Multipart field name, also the key the stored filename is recorded under.
    pub fn field_name(self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Resume => "resume",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field_name() == name)
    }

    /// MIME types allowed when upload filtering is switched on.
    pub fn allowed_types(self) -> &'static [&'static str] {
        match self {
            AttachmentKind::Photo => &["image/jpeg", "image/png"],
            AttachmentKind::Resume => &["image/jpeg", "image/png", "application/pdf"],
        }
    }

    /// Parameters (`; charset=...`) and case are ignored.
    pub fn accepts(self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_types().contains(&essence.as_str())
    }
}

/// A file written to the upload directory.
#[derive(Debug, Clone)]
pub struct StoredAttachment {
    pub kind: AttachmentKind,
    pub original_name: String,
    /// `<unix-millis>-<original_name>`; the only part persisted with the record.
    pub stored_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

/// At most one stored file per slot.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    photo: Option<StoredAttachment>,
    resume: Option<StoredAttachment>,
}

impl Attachments {
    pub fn get(&self, kind: AttachmentKind) -> Option<&StoredAttachment> {
        match kind {
            AttachmentKind::Photo => self.photo.as_ref(),
            AttachmentKind::Resume => self.resume.as_ref(),
        }
    }

    /// Fills the slot named by `attachment.kind`, replacing any previous file.
    pub fn set(&mut self, attachment: StoredAttachment) {
        match attachment.kind {
            AttachmentKind::Photo => self.photo = Some(attachment),
            AttachmentKind::Resume => self.resume = Some(attachment),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredAttachment> {
        self.photo.iter().chain(self.resume.iter())
    }

    /// Removes every stored file. Used when a later part of the same upload is rejected.
    pub async fn discard(self) {
        for attachment in self.iter() {
            if let Err(e) = tokio::fs::remove_file(&attachment.path).await {
                warn!(
                    path = %attachment.path.display(),
                    "Failed to remove rejected upload: {e}"
                );
            }
        }
    }
}
