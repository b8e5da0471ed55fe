//! HTML chapter rendering.
//!
//! Converts one HTML/XHTML content document into plain text. Documents that
//! look like exercises or worksheets keep their layout (underlined headers,
//! one numbered item per line, indented lists); everything else is reduced to
//! the text of its blocks, one paragraph per block.
//!
//! ```
//! use voxbook::render::HtmlRenderer;
//!
//! let renderer = HtmlRenderer::new();
//! let text = renderer.render(b"<html><body><h1>Uno</h1><p>Hola.</p></body></html>");
//! assert_eq!(text, "Uno\n\nHola.");
//! ```

mod blocks;
mod detect;
mod generic;
mod structured;

pub use detect::{ClassListDetector, DEFAULT_STRUCTURED_CLASSES, StructureDetector};

use crate::dom::{ArenaDom, parse_html};

/// Elements removed before any text is collected.
const NON_CONTENT_TAGS: &[&str] = &[
    "head", "script", "style", "nav", "noscript", "template", "iframe", "object", "embed", "form",
    "button", "input", "select", "textarea",
];

/// Renders content documents to plain text.
pub struct HtmlRenderer {
    detector: Box<dyn StructureDetector>,
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlRenderer {
    /// Renderer using [`ClassListDetector::default`].
    pub fn new() -> Self {
        Self::with_detector(ClassListDetector::default())
    }

    pub fn with_detector(detector: impl StructureDetector + 'static) -> Self {
        Self {
            detector: Box::new(detector),
        }
    }

    /// Render a document. Never fails; unparsable input yields whatever
    /// text html5ever recovers, possibly nothing.
    pub fn render(&self, html: &[u8]) -> String {
        let mut dom = parse_html(html);
        strip_non_content(&mut dom);

        let root = dom.find_by_tag("body").unwrap_or(dom.document());
        let blocks = blocks::collect_blocks(&dom, root);

        let text = if self.detector.is_structured(&dom, root) {
            log::trace!("rendering {} blocks in structured mode", blocks.len());
            structured::render(&blocks)
        } else {
            generic::render(&blocks)
        };

        clean_whitespace(&text)
    }
}

/// Render with the default renderer.
pub fn render_html(html: &[u8]) -> String {
    HtmlRenderer::new().render(html)
}

fn strip_non_content(dom: &mut ArenaDom) {
    let doomed: Vec<_> = dom
        .descendants(dom.document())
        .filter(|&id| {
            dom.tag_name(id)
                .is_some_and(|tag| NON_CONTENT_TAGS.contains(&tag))
        })
        .collect();
    for id in doomed {
        dom.detach(id);
    }
}

/// Collapse spaces inside lines, drop trailing whitespace, keep at most one
/// blank line in a row and trim the result. Leading spaces are list
/// indentation and are kept.
pub fn clean_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;

    for line in text.lines() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        let words = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if words.is_empty() {
            blank_run = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run {
                out.push('\n');
            }
        }
        blank_run = false;
        out.extend(std::iter::repeat_n(' ', indent));
        out.push_str(&words);
    }

    out
}
