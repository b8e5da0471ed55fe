//! Format dispatch for input documents.
//!
//! Each supported format has an [`Extractor`]; [`extract`] tries them in a
//! fixed order (PDF, then EPUB) and uses the first that accepts the path.
//! [`extract_with_progress`] also reports `(done, total)` per unit of work:
//! pages for PDF, chapters for EPUB.

use std::ffi::OsStr;
use std::path::Path;

use crate::cancel::CancellationToken;
use crate::epub::{ChapterResolver, EpubArchive, parse_package};
use crate::error::{Error, Result};
use crate::model::Extraction;
use crate::render::{ClassListDetector, DEFAULT_STRUCTURED_CLASSES, HtmlRenderer};
use crate::pdf::{self, PageReader};

/// Options shared by all extractors.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Return chapters instead of one joined text.
    pub split_chapters: bool,
    /// Class names that switch HTML rendering to structured mode.
    pub structured_classes: Vec<String>,
    pub cancel: Option<CancellationToken>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            split_chapters: false,
            structured_classes: DEFAULT_STRUCTURED_CLASSES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            cancel: None,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_split_chapters(mut self, split: bool) -> Self {
        self.split_chapters = split;
        self
    }

    pub fn with_structured_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.structured_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn renderer(&self) -> HtmlRenderer {
        HtmlRenderer::with_detector(ClassListDetector::new(&self.structured_classes))
    }
}

/// Text extraction for one document format.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this extractor handles `path`, judged by extension.
    fn supports(&self, path: &Path) -> bool;

    /// Extract `path`, calling `progress(done, total)` as pages or chapters
    /// are finished.
    fn extract(
        &self,
        path: &Path,
        options: &ExtractOptions,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Extraction>;
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// PDF documents, chapters guessed from heading lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl Extractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, "pdf")
    }

    fn extract(
        &self,
        path: &Path,
        options: &ExtractOptions,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Extraction> {
        let mut reader = PageReader::new().with_progress(progress);
        if let Some(token) = &options.cancel {
            reader = reader.with_cancellation(token);
        }
        let pages = reader.read(path)?;

        if options.split_chapters {
            Ok(Extraction::Chapters(pdf::resolve_chapters(&pages)))
        } else {
            Ok(Extraction::Text(pdf::join_pages(&pages)))
        }
    }
}

/// EPUB documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct EpubExtractor;

impl Extractor for EpubExtractor {
    fn name(&self) -> &'static str {
        "epub"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, "epub")
    }

    fn extract(
        &self,
        path: &Path,
        options: &ExtractOptions,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Extraction> {
        let mut archive = EpubArchive::open(path)?;
        let package = parse_package(&mut archive)?;
        let renderer = options.renderer();

        let mut resolver = ChapterResolver::new(&renderer).with_progress(progress);
        if let Some(token) = &options.cancel {
            resolver = resolver.with_cancellation(token);
        }
        let chapters = Extraction::Chapters(resolver.resolve(&mut archive, &package)?);

        if options.split_chapters {
            Ok(chapters)
        } else {
            Ok(Extraction::Text(chapters.into_text()))
        }
    }
}

static EXTRACTORS: [&dyn Extractor; 2] = [&PdfExtractor, &EpubExtractor];

/// Registered extractors in the order they are tried.
pub fn extractors() -> &'static [&'static dyn Extractor] {
    &EXTRACTORS
}

pub fn find_extractor(path: &Path) -> Option<&'static dyn Extractor> {
    EXTRACTORS.iter().copied().find(|e| e.supports(path))
}

/// Extract `path` with the first extractor that supports it.
pub fn extract(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<Extraction> {
    extract_with_progress(path, options, |_, _| {})
}

/// Like [`extract`], reporting `progress(done, total)` per page or chapter.
pub fn extract_with_progress(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
    mut progress: impl FnMut(usize, usize),
) -> Result<Extraction> {
    let path = path.as_ref();
    let extractor =
        find_extractor(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    log::debug!("extracting {} with the {} extractor", path.display(), extractor.name());
    extractor.extract(path, options, &mut progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_extension() {
        assert_eq!(find_extractor(Path::new("a/b.PDF")).unwrap().name(), "pdf");
        assert_eq!(find_extractor(Path::new("book.Epub")).unwrap().name(), "epub");
        assert!(find_extractor(Path::new("notes.txt")).is_none());
        assert!(find_extractor(Path::new("epub")).is_none());
    }

    #[test]
    fn test_registry_order() {
        let names: Vec<_> = extractors().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["pdf", "epub"]);
    }

    #[test]
    fn test_unsupported_format() {
        let err = extract("notes.docx", &ExtractOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
        assert_eq!(err.to_string(), "no extractor available for notes.docx");
    }

    #[test]
    fn test_options_builders() {
        let options = ExtractOptions::new()
            .with_split_chapters(true)
            .with_structured_classes(["quiz"]);
        assert!(options.split_chapters);
        assert_eq!(options.structured_classes, vec!["quiz"]);
        assert!(options.cancel.is_none());
    }
}
