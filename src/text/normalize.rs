//! Plain-text cleanup applied to extracted chapter text before synthesis.

use std::sync::LazyLock;

use regex::Regex;

/// Runs of two or more `=`, `_` or `-`, with the horizontal whitespace around them.
static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]*[=_\-]{2,}[^\S\n]*").expect("separator regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex"));

static SEPARATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[=_\-\s]+$").expect("separator line regex"));

static NON_WORD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\W+$").expect("non-word line regex"));

/// A run of sentence punctuation and the whitespace around it.
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*([.,;:!?]+)\s*").expect("punctuation regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[^\S\n]*\n").expect("paragraph regex"));

/// Length of a run of identical characters that marks a line as an
/// encoding or OCR artifact.
const ARTIFACT_RUN: usize = 4;

/// Normalize raw extracted text into a single line of clean prose.
///
/// Separator rules (`=====`, `-----`), lines without any word character and
/// lines containing a run of four identical characters are dropped; the
/// remaining lines are joined with single spaces and punctuation is followed
/// by exactly one space.
///
/// `normalize(normalize(x)) == normalize(x)` for every input.
pub fn normalize(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = SEPARATOR_RUN.replace_all(raw, " ");
    let text = WHITESPACE_RUN.replace_all(&text, " ");

    let kept: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !SEPARATOR_LINE.is_match(line))
        .filter(|line| !NON_WORD_LINE.is_match(line))
        .filter(|line| !has_repeated_run(line, ARTIFACT_RUN))
        .collect();

    let joined = kept.join(" ");
    let spaced = PUNCTUATION.replace_all(&joined, "$1 ");

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize each blank-line separated block of `text` on its own and join
/// the non-empty results with a blank line.
///
/// Used on chapter content right before chunking so that paragraph
/// boundaries survive for the splitter.
pub fn normalize_paragraphs(text: &str) -> String {
    PARAGRAPH_BREAK
        .split(text)
        .map(normalize)
        .filter(|block| !block.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Whether `line` contains `run` or more consecutive copies of one character.
fn has_repeated_run(line: &str, run: usize) -> bool {
    let mut previous = None;
    let mut count = 0;
    for c in line.chars() {
        if Some(c) == previous {
            count += 1;
            if count >= run {
                return true;
            }
        } else {
            previous = Some(c);
            count = 1;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("  \n\t \n"), "");
    }

    #[test]
    fn test_separator_rules_removed() {
        let raw = "Title\n=====\nFirst line -- continued\n___ ___\nEnd";
        assert_eq!(normalize(raw), "Title First line continued End");
    }

    #[test]
    fn test_single_hyphen_kept() {
        assert_eq!(normalize("a well-known fact"), "a well-known fact");
    }

    #[test]
    fn test_non_word_lines_dropped() {
        assert_eq!(normalize("Intro\n* * *\n...\nBody"), "Intro Body");
    }

    #[test]
    fn test_artifact_lines_dropped() {
        let raw = "Good line\nBaaaad encoding\nAnother good line";
        assert_eq!(normalize(raw), "Good line Another good line");
    }

    #[test]
    fn test_punctuation_spacing() {
        assert_eq!(normalize("Hello ,world .How are you ?Fine"), "Hello, world. How are you? Fine");
        assert_eq!(normalize("Wait ... what"), "Wait... what");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("  one\t\ttwo   three  "), "one two three");
    }

    #[test]
    fn test_has_repeated_run() {
        assert!(has_repeated_run("xxxx", 4));
        assert!(has_repeated_run("a....b", 4));
        assert!(!has_repeated_run("aaa b aaa", 4));
        assert!(!has_repeated_run("", 4));
    }

    #[test]
    fn test_normalize_paragraphs_keeps_blocks() {
        let text = "First  paragraph ,here.\n\n-----\n\nSecond\nparagraph.";
        assert_eq!(
            normalize_paragraphs(text),
            "First paragraph, here.\n\nSecond paragraph."
        );
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,200}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_normalize_idempotent_on_noisy_text(
            raw in "([a-zA-Z]{1,8}|[ \\n\\t]{1,3}|[=_\\-]{1,5}|[.,;:!?]{1,3}|x{4,6})*"
        ) {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(!has_repeated_run(&once, ARTIFACT_RUN));
        }

        #[test]
        fn prop_paragraphs_idempotent(raw in "([a-z]{1,6}|[ .,]|\\n\\n|\\n){0,60}") {
            let once = normalize_paragraphs(&raw);
            prop_assert_eq!(normalize_paragraphs(&once), once);
        }
    }
}
