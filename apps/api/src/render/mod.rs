//! Form Renderer: lays out a submitted application as an A4 PDF.
//!
//! The draw sequence is linear and never backtracks: logo, photo box, title,
//! then every block of `sections::FORM_LAYOUT` in order. Rendering is
//! CPU-bound; handlers run it inside `tokio::task::spawn_blocking`.

pub mod composer;
pub mod font_metrics;
pub mod sections;

#[cfg(test)]
pub mod inspect;

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::attachment::{AttachmentKind, Attachments};
use crate::models::submission::Submission;
use composer::{Align, PdfComposer};
use font_metrics::StandardFont;
use sections::{LayoutBlock, SectionSpec, FORM_LAYOUT};

pub const LOGO_FILE_NAME: &str = "logo.png";
pub const DOCUMENT_TITLE: &str = "Application Form";

// Fixed positions, top-left origin, in points.
const LOGO_X: f32 = 40.0;
const LOGO_Y: f32 = 30.0;
const LOGO_WIDTH: f32 = 80.0;
pub const PHOTO_BOX: (f32, f32, f32, f32) = (450.0, 30.0, 100.0, 120.0);
const PHOTO_INSET: f32 = 5.0;

const TITLE_OFFSET_LINES: f32 = 4.0;
const ORGANIZATION_FONT_SIZE: f32 = 16.0;
const TITLE_FONT_SIZE: f32 = 14.0;
const BODY_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("cannot decode image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Files drawn onto the form, already resolved to paths.
#[derive(Debug, Clone, Default)]
pub struct RenderAssets {
    pub logo: Option<PathBuf>,
    pub photo: Option<PathBuf>,
}

impl RenderAssets {
    /// The logo is used only when `<public_dir>/logo.png` exists.
    pub fn resolve(public_dir: &Path, attachments: &Attachments) -> Self {
        let logo = public_dir.join(LOGO_FILE_NAME);
        RenderAssets {
            logo: logo.is_file().then_some(logo),
            photo: attachments
                .get(AttachmentKind::Photo)
                .map(|photo| photo.path.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub organization_name: String,
    pub document_title: String,
    /// Drawn after `Label: ` when the field was not posted at all.
    pub missing_value: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            organization_name: "7S IQ PRIVATE LIMITED".to_string(),
            document_title: DOCUMENT_TITLE.to_string(),
            missing_value: String::new(),
        }
    }
}

/// Renders `submission` and writes the finished PDF to `out`.
///
/// Any drawing failure (e.g. an undecodable photo) aborts before a single byte
/// reaches `out`; the document is serialized only once layout has completed.
pub fn render_application<W: Write>(
    submission: &Submission,
    assets: &RenderAssets,
    options: &RenderOptions,
    out: &mut W,
) -> Result<(), RenderError> {
    let mut pdf = PdfComposer::new();

    if let Some(logo_path) = &assets.logo {
        let logo = pdf.embed_image(logo_path)?;
        let height = LOGO_WIDTH * logo.aspect_ratio();
        pdf.draw_image(&logo, LOGO_X, LOGO_Y, LOGO_WIDTH, height);
    }

    if let Some(photo_path) = &assets.photo {
        let photo = pdf.embed_image(photo_path)?;
        let (x, y, width, height) = PHOTO_BOX;
        pdf.stroke_rect(x, y, width, height);
        pdf.draw_image(
            &photo,
            x + PHOTO_INSET,
            y + PHOTO_INSET,
            width - 2.0 * PHOTO_INSET,
            height - 2.0 * PHOTO_INSET,
        );
    }

    pdf.move_down(TITLE_OFFSET_LINES);
    pdf.set_font(StandardFont::Helvetica, ORGANIZATION_FONT_SIZE);
    pdf.text(&options.organization_name, Align::Center)?;
    pdf.set_font(StandardFont::Helvetica, TITLE_FONT_SIZE);
    pdf.text(&options.document_title, Align::Center)?;

    for block in FORM_LAYOUT {
        match block {
            LayoutBlock::Section(section) => {
                render_section(&mut pdf, section, submission, &options.missing_value)?
            }
            LayoutBlock::PageBreak => pdf.add_page()?,
        }
    }

    debug!(pages = pdf.page_count(), "Application layout complete");
    pdf.finish(&options.document_title, out)
}

fn render_section(
    pdf: &mut PdfComposer,
    section: &SectionSpec,
    submission: &Submission,
    missing_value: &str,
) -> Result<(), RenderError> {
    pdf.move_down(1.0);
    pdf.set_font(StandardFont::HelveticaBold, BODY_FONT_SIZE);
    pdf.text(section.heading, Align::Left)?;
    pdf.move_down(0.5);
    pdf.set_font(StandardFont::Helvetica, BODY_FONT_SIZE);

    for field in section.fields {
        let value = submission.value_of(field.keys).unwrap_or(missing_value);
        pdf.text(&format!("{}: {}", field.label, value), Align::Left)?;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
