//! # voxbook
//!
//! Chapter text extraction from EPUB and PDF documents, and conversion of
//! that text into audiobook files through a text-to-speech backend.
//!
//! ## Features
//!
//! - EPUB chapters resolved from the table of contents, the spine or the raw
//!   HTML files, whichever describes the book best
//! - PDF chapters guessed from heading lines
//! - Plain-text rendering of HTML chapters, keeping the layout of exercises
//!   and worksheets
//! - Text cleanup and chunking sized for synthesis requests
//! - Pausable, cancellable conversion with one audio file per chapter
//!
//! ## Quick Start
//!
//! ```no_run
//! use voxbook::{ExtractOptions, extract};
//!
//! let options = ExtractOptions::new().with_split_chapters(true);
//! let chapters = extract("book.epub", &options)?.into_chapters("book");
//! for (i, chapter) in chapters.iter().enumerate() {
//!     println!("{:>3}. {}", i + 1, chapter.title);
//! }
//! # Ok::<(), voxbook::Error>(())
//! ```
//!
//! ## Converting
//!
//! ```no_run
//! use voxbook::convert::{CommandSynthesizer, ConvertConfig, Converter};
//!
//! let config = ConvertConfig::new("es-ES-AlvaroNeural").with_split_chapters(true);
//! let converter = Converter::new(CommandSynthesizer::default(), config);
//! let files = converter.convert_file("book.epub", "out/book.mp3", |done, total| {
//!     eprintln!("{done}/{total}");
//! })?;
//! # Ok::<(), voxbook::Error>(())
//! ```

pub mod cancel;
pub mod convert;
pub mod dom;
pub mod epub;
pub mod error;
pub mod extract;
pub mod io;
pub mod model;
pub mod pdf;
pub mod render;
pub mod text;
pub(crate) mod util;

pub use cancel::CancellationToken;
pub use error::{Error, Result};
pub use extract::{ExtractOptions, Extractor, extract, extract_with_progress};
pub use model::{Chapter, Extraction, Metadata};
pub use render::{HtmlRenderer, render_html};
pub use text::{normalize, split_chunks};
