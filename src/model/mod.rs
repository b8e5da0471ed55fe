//! Core data model shared by the extractors and the conversion layer.
//!
//! This module contains:
//! - Chapter records produced by the EPUB and PDF resolvers
//! - The extraction result handed to the conversion layer
//! - Book metadata read from the EPUB package

mod chapter;
mod metadata;

pub use chapter::{Chapter, Extraction};
pub use metadata::Metadata;
