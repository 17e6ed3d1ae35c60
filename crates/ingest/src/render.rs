use std::io::Cursor;
use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

use crate::error::IngestError;

/// Produces one OCR-ready image per PDF page.
///
/// Implementations are synchronous; callers run them on a blocking thread.
pub trait PdfPageRenderer: Send + Sync {
    /// PNG bytes for every page in document order, `None` for pages that
    /// carry no image.
    fn render_pages(&self, path: &Path) -> Result<Vec<Option<Vec<u8>>>, IngestError>;
}

/// Pulls the largest embedded image XObject off each page with `lopdf`
/// and re-encodes it as PNG. Covers scanner output, where every page is a
/// single JPEG or raw-pixel image.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfPageRenderer;

impl PdfPageRenderer for LopdfPageRenderer {
    fn render_pages(&self, path: &Path) -> Result<Vec<Option<Vec<u8>>>, IngestError> {
        let doc = Document::load(path)
            .map_err(|e| IngestError::unreadable(path, format!("PDF parsing failed: {e}")))?;

        let page_ids: Vec<ObjectId> = doc.page_iter().collect();
        let mut pages = Vec::with_capacity(page_ids.len());

        for (index, page_id) in page_ids.into_iter().enumerate() {
            let png = largest_page_image(&doc, page_id).and_then(|found| to_png(&doc, found));
            match png {
                Some(png) => {
                    debug!(page = index + 1, png_size = png.len(), "Extracted page image");
                    pages.push(Some(png));
                }
                None => {
                    debug!(page = index + 1, "No usable image on page");
                    pages.push(None);
                }
            }
        }
        Ok(pages)
    }
}

struct PageImage<'a> {
    stream: &'a Stream,
    content: Vec<u8>,
}

/// Largest `/Subtype /Image` XObject in the page resources.
fn largest_page_image(doc: &Document, page_id: ObjectId) -> Option<PageImage<'_>> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let resources = resolve_dict(doc, page, b"Resources")?;
    let xobjects = resolve_dict(doc, resources, b"XObject")?;

    let mut largest: Option<PageImage<'_>> = None;
    for (_name, obj) in xobjects.iter() {
        let Object::Stream(stream) = resolve(doc, obj) else {
            continue;
        };
        if !has_name(&stream.dict, b"Subtype", b"Image") {
            continue;
        }

        let content = if has_filter(&stream.dict, b"DCTDecode") {
            // A DCT stream is a complete JPEG file
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone())
        };

        if largest.as_ref().is_none_or(|prev| content.len() > prev.content.len()) {
            largest = Some(PageImage { stream, content });
        }
    }
    largest
}

fn to_png(doc: &Document, page_image: PageImage<'_>) -> Option<Vec<u8>> {
    let decoded = match image::load_from_memory(&page_image.content) {
        Ok(decoded) => decoded,
        Err(_) => raw_pixels(doc, &page_image.stream.dict, page_image.content)?,
    };

    let mut png = Cursor::new(Vec::new());
    decoded.write_to(&mut png, image::ImageFormat::Png).ok()?;
    Some(png.into_inner())
}

/// Rebuild an 8-bit gray or RGB image from an unfiltered pixel buffer.
fn raw_pixels(doc: &Document, dict: &Dictionary, pixels: Vec<u8>) -> Option<image::DynamicImage> {
    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
    let bits = dict.get(b"BitsPerComponent").ok().and_then(|o| o.as_i64().ok()).unwrap_or(8);
    if bits != 8 {
        return None;
    }

    let gray = match dict.get(b"ColorSpace").ok().map(|o| resolve(doc, o)) {
        Some(Object::Name(name)) => name == b"DeviceGray",
        _ => false,
    };

    if gray {
        image::GrayImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageLuma8)
    } else {
        image::RgbImage::from_raw(width, height, pixels).map(image::DynamicImage::ImageRgb8)
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    resolve(doc, dict.get(key).ok()?).as_dict().ok()
}

fn has_name(dict: &Dictionary, key: &[u8], value: &[u8]) -> bool {
    matches!(dict.get(key), Ok(Object::Name(name)) if name == value)
}

fn has_filter(dict: &Dictionary, filter: &[u8]) -> bool {
    match dict.get(b"Filter") {
        Ok(Object::Name(name)) => name == filter,
        Ok(Object::Array(filters)) => filters
            .iter()
            .any(|f| matches!(f, Object::Name(name) if name == filter)),
        _ => false,
    }
}
