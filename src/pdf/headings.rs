//! Chapter boundaries in a flat stream of PDF pages.
//!
//! A PDF carries no reading structure that survives text extraction, so
//! chapters are guessed from lines that look like headings. A page whose
//! first few lines contain a heading starts a chapter; any heading text found
//! further down a page that was not seen before starts one too. Without a
//! single heading every page becomes its own chapter.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::Chapter;
use crate::render::clean_whitespace;

/// Non-empty lines at the top of a page that may hold its title.
const TITLE_WINDOW: usize = 5;

/// Heading patterns, tried in order against a trimmed line.
static HEADING_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("chapter", r"(?i)^chapter\s+\d+\b"),
        ("number", r"^\d{1,3}\.?$"),
        ("roman", r"^[IVXLCDM]+\.?$"),
        ("all-caps", r#"^\p{Lu}[\p{Lu}\d\s.,:;!¡?¿'"()\-]{3,79}$"#),
        ("capitulo", r"(?i)^cap[íi]tulo\s+(\d+|[ivxlcdm]+)\b"),
        ("parte", r"(?i)^parte\s+[ivxlcdm]+\b"),
        ("seccion", r"(?i)^secci[óo]n\s+\d+\b"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).expect("heading regex")))
    .collect()
});

/// Name of the first heading pattern `line` matches.
fn heading_kind(line: &str) -> Option<&'static str> {
    HEADING_PATTERNS
        .iter()
        .find(|(_, regex)| regex.is_match(line))
        .map(|(name, _)| *name)
}

pub fn is_heading(line: &str) -> bool {
    heading_kind(line.trim()).is_some()
}

/// Position of a line: page index, then line index within the page.
type Position = (usize, usize);

#[derive(Debug)]
struct Boundary {
    at: Position,
    title: String,
}

/// Partition pages into chapters.
///
/// Chapter text runs from the line after its heading up to the line before
/// the next heading, across pages. Text ahead of the first heading becomes a
/// leading `Página 1` chapter.
pub fn resolve(pages: &[String]) -> Vec<Chapter> {
    let lines: Vec<Vec<&str>> = pages.iter().map(|page| page.lines().collect()).collect();
    let boundaries = find_boundaries(&lines);

    if boundaries.is_empty() {
        log::debug!("no headings in {} pages, one chapter per page", pages.len());
        return lines
            .iter()
            .enumerate()
            .map(|(page, page_lines)| {
                Chapter::new(page_title(page), page_label(page))
                    .with_content(clean_whitespace(&page_lines.join("\n")))
            })
            .collect();
    }

    let end = (lines.len(), 0);
    let mut chapters = Vec::with_capacity(boundaries.len() + 1);

    let leading = slice(&lines, (0, 0), boundaries[0].at);
    if !leading.is_empty() {
        chapters.push(Chapter::new(page_title(0), page_label(0)).with_content(leading));
    }

    for (i, boundary) in boundaries.iter().enumerate() {
        let (page, line) = boundary.at;
        let next = boundaries.get(i + 1).map_or(end, |b| b.at);
        let content = slice(&lines, (page, line + 1), next);
        chapters.push(Chapter::new(boundary.title.clone(), page_label(page)).with_content(content));
    }

    chapters
}

fn find_boundaries(pages: &[Vec<&str>]) -> Vec<Boundary> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut boundaries = Vec::new();

    for (page, lines) in pages.iter().enumerate() {
        let anchor = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (i, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .take(TITLE_WINDOW)
            .find_map(|(i, line)| heading_kind(line).map(|kind| (i, line, kind)));

        if let Some((i, title, kind)) = anchor {
            log::debug!("page {}: {kind} heading '{title}'", page + 1);
            seen.insert(title);
            boundaries.push(Boundary {
                at: (page, i),
                title: title.to_string(),
            });
        }

        for (i, line) in lines.iter().enumerate() {
            let line = line.trim();
            if anchor.is_some_and(|(a, _, _)| a == i) || line.is_empty() {
                continue;
            }
            if let Some(kind) = heading_kind(line)
                && seen.insert(line)
            {
                log::debug!("page {}: {kind} heading '{line}' inside page", page + 1);
                boundaries.push(Boundary {
                    at: (page, i),
                    title: line.to_string(),
                });
            }
        }
    }

    boundaries.sort_by_key(|b| b.at);
    boundaries
}

/// Text from `start` (inclusive) to `end` (exclusive), pages separated by a
/// blank line.
fn slice(pages: &[Vec<&str>], start: Position, end: Position) -> String {
    let mut parts = Vec::new();
    for page in start.0..pages.len().min(end.0 + 1) {
        let lines = &pages[page];
        let from = if page == start.0 { start.1 } else { 0 };
        let to = if page == end.0 { end.1 } else { lines.len() };
        if from < to && from < lines.len() {
            parts.push(lines[from..to.min(lines.len())].join("\n"));
        }
    }
    clean_whitespace(&parts.join("\n\n"))
}

fn page_title(page: usize) -> String {
    format!("Página {}", page + 1)
}

fn page_label(page: usize) -> String {
    format!("page {}", page + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    fn titles(chapters: &[Chapter]) -> Vec<&str> {
        chapters.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_heading_patterns() {
        for line in [
            "Chapter 3",
            "CHAPTER 12: The End",
            "7",
            "XIV",
            "EL PRINCIPIO",
            "Capítulo 4",
            "capitulo iv",
            "Parte II",
            "Sección 2",
        ] {
            assert!(is_heading(line), "{line}");
        }
        for line in ["It was late.", "1234", "Chapter one", "AB", "Part 2", "el CAPÍTULO"] {
            assert!(!is_heading(line), "{line}");
        }
    }

    #[test]
    fn test_no_headings_one_chapter_per_page() {
        let chapters = resolve(&pages(&["first page.", "", "third page."]));
        assert_eq!(titles(&chapters), vec!["Página 1", "Página 2", "Página 3"]);
        assert_eq!(chapters[0].content, "first page.");
        assert_eq!(chapters[1].content, "");
        assert_eq!(chapters[2].source_file, "page 3");
    }

    #[test]
    fn test_chapters_span_pages() {
        let chapters = resolve(&pages(&[
            "Prólogo del editor.\nsin título.",
            "Capítulo 1\nEl comienzo.\nsigue aquí.",
            "más texto en la página tres.",
            "\n  Capítulo 2  \nOtro comienzo.",
        ]));

        assert_eq!(titles(&chapters), vec!["Página 1", "Capítulo 1", "Capítulo 2"]);
        assert_eq!(chapters[0].content, "Prólogo del editor.\nsin título.");
        assert_eq!(
            chapters[1].content,
            "El comienzo.\nsigue aquí.\n\nmás texto en la página tres."
        );
        assert_eq!(chapters[1].source_file, "page 2");
        assert_eq!(chapters[2].content, "Otro comienzo.");
    }

    #[test]
    fn test_heading_below_title_window() {
        let chapters = resolve(&pages(&[
            "uno.\ndos.\ntres.\ncuatro.\ncinco.\nseis.\nLA SEGUNDA PARTE\nsiete.",
        ]));
        assert_eq!(titles(&chapters), vec!["Página 1", "LA SEGUNDA PARTE"]);
        assert_eq!(chapters[0].content, "uno.\ndos.\ntres.\ncuatro.\ncinco.\nseis.");
        assert_eq!(chapters[1].content, "siete.");
    }

    #[test]
    fn test_repeated_heading_below_window_ignored() {
        let chapters = resolve(&pages(&[
            "Chapter 1\na.\nb.\nc.\nd.\ne.\nf.\nChapter 1",
            "g.",
        ]));
        assert_eq!(titles(&chapters), vec!["Chapter 1"]);
        assert_eq!(chapters[0].content, "a.\nb.\nc.\nd.\ne.\nf.\nChapter 1\n\ng.");
    }

    #[test]
    fn test_empty_document() {
        assert!(resolve(&[]).is_empty());
    }
}
