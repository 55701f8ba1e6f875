//! A small flow-layout PDF writer on top of `lopdf`.
//!
//! Coordinates passed in are top-left based (y grows downward) and converted to
//! PDF user space on emission. Text flows from a vertical cursor; when a line
//! would cross the bottom margin a new page starts. Fonts are the standard
//! Helvetica pair, referenced (never embedded) with WinAnsiEncoding.

use std::io::Write;
use std::path::Path;

use flate2::{write::ZlibEncoder, Compression};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageError, ImageReader};
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream,
};

use crate::render::font_metrics::{encode_text, StandardFont, ASCENDER_EM, LINE_HEIGHT_EM};
use crate::render::RenderError;

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 40.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const DEFAULT_FONT_SIZE: f32 = 12.0;
/// Images larger than this on either side are downsampled before embedding.
const MAX_IMAGE_PX: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// An image registered in the page resources, ready to be drawn any number of times.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    name: String,
    width_px: u32,
    height_px: u32,
}

impl ImageHandle {
    /// Height / width.
    pub fn aspect_ratio(&self) -> f32 {
        self.height_px as f32 / self.width_px.max(1) as f32
    }
}

pub struct PdfComposer {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    operations: Vec<Operation>,
    xobjects: Dictionary,
    image_count: usize,
    font: StandardFont,
    font_size: f32,
    y: f32,
}

impl Default for PdfComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfComposer {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            operations: Vec::new(),
            xobjects: Dictionary::new(),
            image_count: 0,
            font: StandardFont::Helvetica,
            font_size: DEFAULT_FONT_SIZE,
            y: MARGIN,
        }
    }

    /// Pages started so far, including the one being written.
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + 1
    }

    pub fn set_font(&mut self, font: StandardFont, size: f32) {
        self.font = font;
        self.font_size = size;
    }

    pub fn line_height(&self) -> f32 {
        self.font_size * LINE_HEIGHT_EM
    }

    /// Advances the cursor by `lines` lines of the current font.
    pub fn move_down(&mut self, lines: f32) {
        self.y += self.line_height() * lines;
    }

    /// Writes `text` at the cursor, wrapping to the content width and
    /// continuing on a fresh page when the bottom margin is reached.
    pub fn text(&mut self, text: &str, align: Align) -> Result<(), RenderError> {
        let metrics = self.font.metrics();
        for line in metrics.wrap(text, self.font_size, CONTENT_WIDTH) {
            if self.y + self.line_height() > PAGE_HEIGHT - MARGIN {
                self.add_page()?;
            }
            let x = match align {
                Align::Left => MARGIN,
                Align::Center => {
                    MARGIN + (CONTENT_WIDTH - metrics.measure(&line, self.font_size)) / 2.0
                }
            };
            if !line.is_empty() {
                self.show_text(x, self.y, &line);
            }
            self.y += self.line_height();
        }
        Ok(())
    }

    fn show_text(&mut self, x: f32, top: f32, line: &str) {
        let baseline = PAGE_HEIGHT - top - ASCENDER_EM * self.font_size;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(self.font.resource_name().as_bytes().to_vec()),
                    self.font_size.into(),
                ],
            ),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::string_literal(encode_text(line))]),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Strokes a 1pt rectangle whose top-left corner is at (`x`, `y`).
    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new(
                "re",
                vec![
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                    width.into(),
                    height.into(),
                ],
            ),
            Operation::new("S", vec![]),
        ]);
    }

    /// Decodes the image at `path` and adds it to the document resources.
    pub fn embed_image(&mut self, path: &Path) -> Result<ImageHandle, RenderError> {
        let decoded = ImageReader::open(path)
            .and_then(ImageReader::with_guessed_format)
            .map_err(ImageError::IoError)
            .and_then(ImageReader::decode)
            .map_err(|source| RenderError::Image {
                path: path.to_path_buf(),
                source,
            })?;
        self.embed_decoded(decoded)
    }

    fn embed_decoded(&mut self, image: DynamicImage) -> Result<ImageHandle, RenderError> {
        let image = if image.width() > MAX_IMAGE_PX || image.height() > MAX_IMAGE_PX {
            image.resize(MAX_IMAGE_PX, MAX_IMAGE_PX, FilterType::Triangle)
        } else {
            image
        };
        let (width, height) = image.dimensions();

        let mut info = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };

        if image.color().has_alpha() {
            let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(width),
                    "Height" => i64::from(height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            );
            let mask_id = self.doc.add_object(mask);
            info.set("SMask", mask_id);
        }

        let pixels = deflate(image.to_rgb8().as_raw())?;
        let image_id = self.doc.add_object(Stream::new(info, pixels));

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        self.xobjects.set(name.clone(), image_id);

        Ok(ImageHandle {
            name,
            width_px: width,
            height_px: height,
        })
    }

    /// Draws a previously embedded image scaled into the given box (top-left origin).
    pub fn draw_image(&mut self, image: &ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        self.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    width.into(),
                    0.into(),
                    0.into(),
                    height.into(),
                    x.into(),
                    (PAGE_HEIGHT - y - height).into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image.name.as_bytes().to_vec())]),
            Operation::new("Q", vec![]),
        ]);
    }

    /// Closes the current page and starts a new one with the cursor at the top margin.
    pub fn add_page(&mut self) -> Result<(), RenderError> {
        let content = Content {
            operations: std::mem::take(&mut self.operations),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => self.resources_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);
        self.y = MARGIN;
        Ok(())
    }

    /// Closes the last page, writes the page tree and catalog, and serializes
    /// the finished document into `out`.
    pub fn finish<W: Write>(mut self, title: &str, out: &mut W) -> Result<(), RenderError> {
        self.add_page()?;

        let mut fonts = Dictionary::new();
        for font in StandardFont::ALL {
            let font_id = self.doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }
        self.doc.objects.insert(
            self.resources_id,
            Object::Dictionary(dictionary! {
                "Font" => fonts,
                "XObject" => self.xobjects,
            }),
        );

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| id.into()).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(title),
            "Producer" => Object::string_literal(env!("CARGO_PKG_NAME")),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        self.doc.save_to(out)?;
        out.flush()?;
        Ok(())
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, RenderError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
