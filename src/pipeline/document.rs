//! Output-document lifecycle: create at a destination path, receive pages
//! verbatim, save on close.
//!
//! An [`OutputDocument`] is only ever created when a page is about to be
//! imported into it, so a closed document always holds at least one page.
//! Pages are copied through pdfium's document-to-document import, which
//! preserves the source page's content stream, size, and orientation — no
//! re-rasterisation happens on the way out.

use crate::error::SplitError;
use chrono::Utc;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use crate::output::ClosedOutput;

/// Bind to the pdfium library: a copy next to the executable wins, otherwise
/// the system-wide installation is used.
pub(crate) fn bind_pdfium() -> Result<Pdfium, SplitError> {
    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| SplitError::PdfiumBindingFailed(format!("{e:?}")))
}

/// The output document currently receiving pages.
///
/// Exclusively owned by the segmentation engine; becomes immutable once
/// [`close`](OutputDocument::close) saves it to its destination path.
pub struct OutputDocument<'a> {
    document: PdfDocument<'a>,
    path: PathBuf,
    pages: usize,
}

impl<'a> OutputDocument<'a> {
    /// Open a fresh, empty document destined for `path`.
    pub fn create(pdfium: &'a Pdfium, path: PathBuf) -> Result<Self, SplitError> {
        let document = pdfium
            .create_new_pdf()
            .map_err(|e| SplitError::OutputWriteFailed {
                path: path.clone(),
                detail: format!("{e:?}"),
            })?;
        trace!("created new output document: {}", path.display());
        Ok(Self {
            document,
            path,
            pages: 0,
        })
    }

    /// Destination path chosen at creation time.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages imported so far.
    pub fn page_count(&self) -> usize {
        self.pages
    }

    /// Append one source page verbatim. `index` is 0-based in the source;
    /// `page_num` is the 1-based number used in logs and errors.
    pub fn import_page(
        &mut self,
        source: &PdfDocument,
        index: u16,
        page_num: usize,
    ) -> Result<(), SplitError> {
        let at = self.pages as u16;
        self.document
            .pages_mut()
            .copy_page_from_document(source, index, at)
            .map_err(|e| SplitError::PageImportFailed {
                page: page_num,
                path: self.path.clone(),
                detail: format!("{e:?}"),
            })?;
        self.pages += 1;
        Ok(())
    }

    /// Save the accumulated pages to the destination path and report what was
    /// written.
    pub fn close(self) -> Result<ClosedOutput, SplitError> {
        self.document
            .save_to_file(&self.path)
            .map_err(|e| SplitError::OutputWriteFailed {
                path: self.path.clone(),
                detail: format!("{e:?}"),
            })?;
        debug!(
            "closed output document {} ({} pages)",
            self.path.display(),
            self.pages
        );
        Ok(ClosedOutput {
            path: self.path,
            pages: self.pages,
        })
    }
}

/// Copy one page of `source` into a standalone single-page document at
/// `path`. Used for the per-page error documents kept for manual inspection.
pub fn export_single_page(
    pdfium: &Pdfium,
    source: &PdfDocument,
    index: u16,
    page_num: usize,
    path: PathBuf,
) -> Result<ClosedOutput, SplitError> {
    let mut doc = OutputDocument::create(pdfium, path)?;
    doc.import_page(source, index, page_num)?;
    doc.close()
}

/// Copy an inclusive 1-based page range of a PDF into a new time-stamped
/// sibling file, leaving the original untouched.
///
/// This is the `split` CLI convenience, not part of the segmentation
/// pipeline.
pub fn export_page_range(
    source_path: &Path,
    first_page: usize,
    last_page: usize,
) -> Result<ClosedOutput, SplitError> {
    if first_page < 1 || first_page > last_page {
        return Err(SplitError::InvalidConfig(format!(
            "invalid page range {first_page}-{last_page}: pages are 1-indexed and start ≤ end"
        )));
    }

    let pdfium = bind_pdfium()?;
    let source =
        pdfium
            .load_pdf_from_file(source_path, None)
            .map_err(|e| SplitError::CorruptPdf {
                path: source_path.to_path_buf(),
                detail: format!("{e:?}"),
            })?;

    let total = source.pages().len() as usize;
    if last_page > total {
        return Err(SplitError::PageOutOfRange {
            page: last_page,
            total,
        });
    }

    let stem = source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "split".to_string());
    let name = format!("{stem}-split-{}.pdf", Utc::now().format("%H%M%S"));
    let path = source_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name);

    let mut doc = OutputDocument::create(&pdfium, path)?;
    for page_num in first_page..=last_page {
        doc.import_page(&source, (page_num - 1) as u16, page_num)?;
    }
    doc.close()
}
