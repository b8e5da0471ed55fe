//! Layout for exercise and worksheet documents.
//!
//! Headers are upper-cased and underlined, numbered items keep one item per
//! line with stray continuation paragraphs folded back into them, and lists
//! keep their markers and nesting.

use std::sync::LazyLock;

use regex::Regex;

use super::blocks::{Block, Marker};

static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{1,3}[.)](\s|$)").expect("numbered item regex"));

const TERMINAL_PUNCTUATION: &[char] = &['.', '!', '?', ':', ';', '…'];
const CLOSING: &[char] = &['"', '\'', ')', ']', '»', '”', '’'];

pub(crate) fn render(blocks: &[Block]) -> String {
    let mut out: Vec<String> = Vec::new();
    // Whether the last line of `out` is a numbered paragraph.
    let mut after_numbered = false;
    let mut in_list = false;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let title = text.to_uppercase();
                let rule = if *level <= 2 { "=" } else { "-" };
                let underline = rule.repeat(title.chars().count());
                out.push(format!("{title}\n{underline}"));
                after_numbered = false;
                in_list = false;
            }
            Block::ListItem {
                depth,
                marker,
                text,
                starts_run,
            } => {
                let prefix = match marker {
                    Marker::Bullet => "•".to_string(),
                    Marker::Number(n) => format!("{n}."),
                };
                let line = format!("{}{prefix} {text}", "  ".repeat(*depth));
                match out.last_mut() {
                    Some(last) if in_list && !starts_run => {
                        last.push('\n');
                        last.push_str(&line);
                    }
                    _ => out.push(line),
                }
                after_numbered = false;
                in_list = true;
            }
            Block::Paragraph(text) => {
                in_list = false;
                let numbered = NUMBERED_ITEM.is_match(text);
                match out.last_mut() {
                    Some(last) if after_numbered && numbered => {
                        last.push('\n');
                        last.push_str(text);
                    }
                    Some(last) if after_numbered && is_continuation(last.as_str(), text) => {
                        last.push(' ');
                        last.push_str(text);
                        continue;
                    }
                    _ => out.push(text.clone()),
                }
                after_numbered = numbered;
            }
        }
    }

    out.join("\n\n")
}

/// Whether `text` continues the numbered item that ends `previous`.
fn is_continuation(previous: &str, text: &str) -> bool {
    let starts_lowercase = text.chars().next().is_some_and(char::is_lowercase);
    let previous_closed = previous
        .trim_end()
        .trim_end_matches(CLOSING)
        .ends_with(TERMINAL_PUNCTUATION);
    starts_lowercase || !previous_closed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::Paragraph(text.to_string())
    }

    fn item(depth: usize, marker: Marker, text: &str, starts_run: bool) -> Block {
        Block::ListItem {
            depth,
            marker,
            text: text.to_string(),
            starts_run,
        }
    }

    #[test]
    fn test_headers_underlined() {
        let blocks = vec![
            Block::Heading {
                level: 1,
                text: "Unidad uno".into(),
            },
            Block::Heading {
                level: 3,
                text: "Parte".into(),
            },
        ];
        assert_eq!(render(&blocks), "UNIDAD UNO\n==========\n\nPARTE\n-----");
    }

    #[test]
    fn test_numbered_items_one_per_line() {
        let blocks = vec![para("Answer the questions."), para("1. First?"), para("2) Second?")];
        assert_eq!(
            render(&blocks),
            "Answer the questions.\n\n1. First?\n2) Second?"
        );
    }

    #[test]
    fn test_continuations_folded_into_item() {
        let blocks = vec![
            para("1. Complete the sentence"),
            para("With Capital letter"),
            para("2. Done."),
            para("and lowercase continuation."),
            para("New paragraph."),
        ];
        assert_eq!(
            render(&blocks),
            "1. Complete the sentence With Capital letter\n2. Done. and lowercase continuation.\n\nNew paragraph."
        );
    }

    #[test]
    fn test_plain_paragraphs_not_folded() {
        let blocks = vec![para("Intro without period"), para("lowercase start")];
        assert_eq!(render(&blocks), "Intro without period\n\nlowercase start");
    }

    #[test]
    fn test_lists_with_nesting_and_runs() {
        let blocks = vec![
            para("Lead"),
            item(0, Marker::Number(1), "One", true),
            item(1, Marker::Bullet, "Sub", false),
            item(0, Marker::Number(2), "Two", false),
            item(0, Marker::Bullet, "Other list", true),
        ];
        assert_eq!(
            render(&blocks),
            "Lead\n\n1. One\n  • Sub\n2. Two\n\n• Other list"
        );
    }

    #[test]
    fn test_is_continuation() {
        assert!(is_continuation("1. Fill in", "The blank"));
        assert!(is_continuation("1. Fill in.", "the blank"));
        assert!(!is_continuation("1. Fill in (page 3).", "Next"));
        assert!(!is_continuation("1. «Who?»", "Next"));
    }
}
