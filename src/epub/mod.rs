//! EPUB reading: container, package and chapter resolution.
//!
//! ```no_run
//! use voxbook::epub::read_chapters;
//!
//! let chapters = read_chapters("book.epub")?;
//! for chapter in &chapters {
//!     println!("{}: {} chars", chapter.title, chapter.content.len());
//! }
//! # Ok::<(), voxbook::Error>(())
//! ```

mod archive;
mod parser;
mod resolver;

pub use archive::EpubArchive;
pub use parser::{
    CONTAINER_PATH, ManifestEntry, NCX_MEDIA_TYPE, NavPoint, Package, parse_container_xml,
    parse_ncx, parse_opf, parse_package, read_navigation,
};
pub use resolver::{
    CandidateSource, ChapterResolver, TocCandidate, navigation_candidate, normalize_title,
    raw_file_candidate, select_candidate, spine_candidate,
};

use std::path::Path;

use crate::error::Result;
use crate::model::Chapter;
use crate::render::HtmlRenderer;

/// Open an EPUB and resolve its chapters with the default renderer.
pub fn read_chapters(path: impl AsRef<Path>) -> Result<Vec<Chapter>> {
    let mut archive = EpubArchive::open(path)?;
    let package = parse_package(&mut archive)?;
    let renderer = HtmlRenderer::new();
    ChapterResolver::new(&renderer).resolve(&mut archive, &package)
}
