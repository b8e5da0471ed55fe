use serde::Serialize;

/// One logical chapter of a document.
///
/// `title` is never empty: resolvers fall back to a generated label such as
/// `Chapter 003` or `Página 4`. `content` is whitespace-cleaned plain text and
/// may be empty when nothing could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chapter {
    pub title: String,
    pub content: String,
    /// Archive path (EPUB) or page label (PDF) the chapter starts in.
    pub source_file: String,
    /// Further files that belong to the same logical chapter, in reading order.
    pub additional_files: Vec<String>,
}

impl Chapter {
    /// Create a chapter with no content yet.
    pub fn new(title: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            source_file: source_file.into(),
            additional_files: Vec::new(),
        }
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the additional files.
    pub fn with_additional_files(mut self, files: Vec<String>) -> Self {
        self.additional_files = files;
        self
    }

    /// Every file this chapter is read from, primary first.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.source_file.as_str())
            .chain(self.additional_files.iter().map(String::as_str))
    }

    /// Whether extraction produced any text for this chapter.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Result of extracting a document.
///
/// Callers select on the variant: chapter-split conversions write one audio
/// file per chapter, plain text conversions write a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Text(String),
    Chapters(Vec<Chapter>),
}

impl Extraction {
    /// Collapse the extraction into a single text, chapters separated by a blank line.
    pub fn into_text(self) -> String {
        match self {
            Extraction::Text(text) => text,
            Extraction::Chapters(chapters) => chapters
                .into_iter()
                .filter(|c| !c.is_empty())
                .map(|c| c.content)
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    /// View the extraction as chapters; plain text becomes a single chapter.
    pub fn into_chapters(self, title: &str) -> Vec<Chapter> {
        match self {
            Extraction::Chapters(chapters) => chapters,
            Extraction::Text(text) => vec![Chapter::new(title, "").with_content(text)],
        }
    }
}
