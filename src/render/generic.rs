use super::blocks::Block;

/// Render blocks as paragraphs separated by a blank line.
///
/// Empty blocks and blocks repeating the previous one verbatim (running
/// headers, duplicated captions) are skipped.
pub(crate) fn render(blocks: &[Block]) -> String {
    let mut paragraphs: Vec<&str> = Vec::new();
    for block in blocks {
        let text = block.text();
        if text.is_empty() || paragraphs.last() == Some(&text) {
            continue;
        }
        paragraphs.push(text);
    }
    paragraphs.join("\n\n")
}
