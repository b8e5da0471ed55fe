//! PDF text extraction.
//!
//! Page text comes from `pdf-extract`, one page at a time so that a page it
//! cannot handle only costs that page; chapters are then guessed from heading
//! lines (see [`resolve_chapters`]).

mod headings;

pub use headings::{is_heading, resolve as resolve_chapters};

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use pdf_extract::{Document, OutputError, PlainTextOutput};

use crate::cancel::{self, CancellationToken};
use crate::error::{Error, Result};
use crate::io::{ByteSource, FileSource};
use crate::model::Chapter;

/// Reads the text of every page of a PDF.
///
/// A page whose text cannot be extracted is logged and read as empty; only a
/// document that cannot be loaded at all is an error.
#[derive(Default)]
pub struct PageReader<'a> {
    cancel: Option<&'a CancellationToken>,
    progress: Option<Box<dyn FnMut(usize, usize) + 'a>>,
}

impl<'a> PageReader<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `token` before each page.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Call `progress(done, total)` after each page.
    pub fn with_progress(mut self, progress: impl FnMut(usize, usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn read(&mut self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let bytes = FileSource::open(path)?.read_all()?;
        self.read_bytes(&bytes)
    }

    pub fn read_bytes(&mut self, bytes: &[u8]) -> Result<Vec<String>> {
        let mut doc = Document::load_mem(bytes).map_err(|e| Error::Pdf(e.to_string()))?;
        if doc.is_encrypted() {
            doc.decrypt("")
                .map_err(|e| Error::Pdf(format!("encrypted document: {e}")))?;
        }

        let pages = doc.get_pages();
        let total = pages.len();
        let mut texts = Vec::with_capacity(total);
        for (i, &number) in pages.keys().enumerate() {
            cancel::checkpoint(self.cancel)?;
            texts.push(page_text(&doc, number));
            if let Some(progress) = self.progress.as_mut() {
                progress(i + 1, total);
            }
        }

        log::debug!("read {total} PDF pages");
        Ok(texts)
    }
}

/// Text of page `number` (1-based), empty when extraction fails.
///
/// pdf-extract panics on some malformed pages (a missing MediaBox, for
/// one), so the panic is contained here.
fn page_text(doc: &Document, number: u32) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| render_page(doc, number))) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            log::warn!("page {number}: {e}, reading it as empty");
            String::new()
        }
        Err(_) => {
            log::warn!("page {number}: text extraction panicked, reading it as empty");
            String::new()
        }
    }
}

fn render_page(doc: &Document, number: u32) -> std::result::Result<String, OutputError> {
    let mut text = String::new();
    pdf_extract::output_doc_page(doc, &mut PlainTextOutput::new(&mut text), number)?;
    Ok(text)
}

/// Text of every page, in order. Pages without a text layer are empty.
pub fn read_pages(path: impl AsRef<Path>) -> Result<Vec<String>> {
    PageReader::new().read(path)
}

pub fn pages_from_bytes(bytes: &[u8]) -> Result<Vec<String>> {
    PageReader::new().read_bytes(bytes)
}

/// Read a PDF and split it into chapters.
pub fn read_chapters(path: impl AsRef<Path>) -> Result<Vec<Chapter>> {
    let pages = read_pages(path)?;
    Ok(resolve_chapters(&pages))
}

/// All page text, pages separated by a newline.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    let pages = read_pages(path)?;
    Ok(join_pages(&pages))
}

/// Non-empty pages, trimmed and separated by a newline.
pub fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
