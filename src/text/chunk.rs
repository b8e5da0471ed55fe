//! Splitting chapter text into segments a synthesis backend accepts.

use std::sync::LazyLock;

use regex::Regex;

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph regex"));

const SENTENCE_BREAK: &str = ". ";

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Paragraphs are packed greedily and joined with a blank line. A paragraph
/// that does not fit on its own is split into sentences at `". "`, which are
/// packed with single spaces. A sentence longer than `max_chars` becomes a
/// chunk by itself. Chunk order follows the text.
///
/// Whitespace-only input yields no chunks.
pub fn split(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if char_len(text) <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in PARAGRAPH_BREAK.split(text) {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }

        if char_len(paragraph) > max_chars {
            flush(&mut chunks, &mut current);
            pack_sentences(paragraph, max_chars, &mut chunks);
            continue;
        }

        if current.is_empty() {
            current.push_str(paragraph);
        } else if char_len(&current) + 2 + char_len(paragraph) <= max_chars {
            current.push_str("\n\n");
            current.push_str(paragraph);
        } else {
            flush(&mut chunks, &mut current);
            current.push_str(paragraph);
        }
    }
    flush(&mut chunks, &mut current);

    chunks
}

fn pack_sentences(paragraph: &str, max_chars: usize, chunks: &mut Vec<String>) {
    let mut current = String::new();
    for sentence in sentences(paragraph) {
        if current.is_empty() {
            current = sentence;
        } else if char_len(&current) + 1 + char_len(&sentence) <= max_chars {
            current.push(' ');
            current.push_str(&sentence);
        } else {
            chunks.push(std::mem::replace(&mut current, sentence));
        }
    }
    flush(chunks, &mut current);
}

/// Sentences of a paragraph, with the period consumed by the split put back.
fn sentences(paragraph: &str) -> Vec<String> {
    let parts: Vec<&str> = paragraph.split(SENTENCE_BREAK).collect();
    let last = parts.len().saturating_sub(1);
    parts
        .into_iter()
        .enumerate()
        .filter_map(|(i, part)| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            Some(if i < last {
                format!("{part}.")
            } else {
                part.to_string()
            })
        })
        .collect()
}

fn flush(chunks: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        chunks.push(std::mem::take(current));
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
