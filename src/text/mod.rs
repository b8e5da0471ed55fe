//! Text cleanup and chunking for synthesis.

pub mod chunk;
mod normalize;

pub use chunk::split as split_chunks;
pub use normalize::{normalize, normalize_paragraphs};
