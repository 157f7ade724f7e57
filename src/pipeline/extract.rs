//! Page-image extraction: the embedded rasters of one source page.
//!
//! A scanned PDF page is normally a single full-page raster wrapped in a
//! content stream, but multi-feed scanners sometimes emit several image
//! objects per page (front/back, colour/bitonal). The scanner gateway wants
//! all of them, so this stage walks the page's object list rather than
//! rendering the page: the embedded raster is exactly what the scanning
//! device produced, at its native resolution, which is what barcode decoders
//! do best on.
//!
//! A page with no image objects (e.g. a blank separator page generated by the
//! device software) yields an empty list — "no barcode possible", never an
//! error.

use image::GrayImage;
use pdfium_render::prelude::*;

/// Extract every embedded raster image of one page as a grayscale buffer.
///
/// `index` is 0-based. Errors (missing page, undecodable image stream) are
/// page-level: the caller isolates them, they never abort the document.
pub fn page_images(document: &PdfDocument, index: u16) -> Result<Vec<GrayImage>, PdfiumError> {
    let page = document.pages().get(index)?;

    let mut images = Vec::new();
    for object in page.objects().iter() {
        if let Some(image_object) = object.as_image_object() {
            let image = image_object.get_raw_image()?;
            images.push(image.to_luma8());
        }
    }

    Ok(images)
}
