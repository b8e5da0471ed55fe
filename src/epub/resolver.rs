//! Chapter list resolution for EPUB packages.
//!
//! An EPUB has three competing descriptions of its reading order: the NCX
//! navigation map, the OPF spine and the raw set of HTML files in the archive.
//! Each yields a [`TocCandidate`]; the one with the most chapters wins, ties
//! going to the spine, then navigation, then raw files. Only the winner is
//! rendered.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::archive::EpubArchive;
use super::parser::{NavPoint, Package, read_navigation};
use crate::cancel::{self, CancellationToken};
use crate::error::{Error, Result};
use crate::model::Chapter;
use crate::render::HtmlRenderer;
use crate::util::{file_name, file_stem, is_html_path};

/// `0001_0000`: chapter number and part.
static NUMBERED_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})_(\d+)$").expect("numbered stem regex"));

/// `capitulo0001_0000`: name, chapter number and part.
static NAMED_STEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\D)(\d{4})_(\d+)$").expect("named stem regex"));

/// Strategy a candidate chapter list was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateSource {
    Spine,
    Navigation,
    RawFiles,
}

impl CandidateSource {
    /// Tie-break rank, higher wins.
    fn priority(self) -> u8 {
        match self {
            CandidateSource::Spine => 3,
            CandidateSource::Navigation => 2,
            CandidateSource::RawFiles => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CandidateSource::Spine => "spine",
            CandidateSource::Navigation => "navigation",
            CandidateSource::RawFiles => "raw-html",
        }
    }
}

/// A chapter list produced by one strategy. Chapters carry no content yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocCandidate {
    pub source: CandidateSource,
    pub chapters: Vec<Chapter>,
}

/// Pick the candidate with the most chapters; ties go to the higher
/// priority source. Empty candidates never win.
pub fn select_candidate(candidates: Vec<TocCandidate>) -> Option<TocCandidate> {
    candidates
        .into_iter()
        .filter(|c| !c.chapters.is_empty())
        .max_by_key(|c| (c.chapters.len(), c.source.priority()))
}

// ----------------------------------------------------------------------------
// Candidates
// ----------------------------------------------------------------------------

/// Grouping key of a content file and, when its name is numbered, the title
/// that numbering implies.
fn chapter_key(path: &str) -> (String, Option<String>) {
    let stem = file_stem(path);

    if let Some(caps) = NUMBERED_STEM.captures(stem) {
        let number = caps[1].parse::<u32>().unwrap_or(0);
        return (caps[1].to_string(), Some(format!("Chapter {number:02}")));
    }

    if let Some(caps) = NAMED_STEM.captures(stem) {
        let number = caps[2].parse::<u32>().unwrap_or(0);
        let name = title_case(&caps[1]);
        let title = if name.is_empty() {
            format!("Chapter {number:02}")
        } else {
            format!("{name} {number:02}")
        };
        return (caps[2].to_string(), Some(title));
    }

    (file_name(path).to_string(), None)
}

/// Accumulates the files of one logical chapter.
#[derive(Debug)]
struct ChapterGroup {
    files: Vec<String>,
    pattern_title: Option<String>,
    label: Option<String>,
}

impl ChapterGroup {
    fn into_chapter(mut self) -> Chapter {
        self.files.sort();
        self.files.dedup();
        let mut files = self.files.into_iter();
        let primary = files.next().unwrap_or_default();
        let title = self
            .pattern_title
            .or(self.label)
            .unwrap_or_else(|| normalize_title(file_name(&primary)));
        Chapter::new(title, primary).with_additional_files(files.collect())
    }
}

/// Chapters from the NCX, grouped by file-name chapter key.
pub fn navigation_candidate(points: &[NavPoint]) -> TocCandidate {
    let mut groups: Vec<ChapterGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for point in points {
        let (key, pattern_title) = chapter_key(&point.target);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(ChapterGroup {
                files: Vec::new(),
                pattern_title,
                label: None,
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        group.files.push(point.target.clone());
        if group.label.is_none() && !point.label.is_empty() {
            group.label = Some(point.label.clone());
        }
    }

    let mut chapters: Vec<Chapter> = groups.into_iter().map(ChapterGroup::into_chapter).collect();
    chapters.sort_by(|a, b| a.source_file.cmp(&b.source_file));

    TocCandidate {
        source: CandidateSource::Navigation,
        chapters,
    }
}

/// One chapter per spine entry.
pub fn spine_candidate(package: &Package) -> TocCandidate {
    TocCandidate {
        source: CandidateSource::Spine,
        chapters: numbered(package.spine_items().map(|item| item.href.clone())),
    }
}

/// One chapter per HTML file in the archive, in lexical order.
pub fn raw_file_candidate(files: &[String]) -> TocCandidate {
    let mut html: Vec<String> = files.iter().filter(|f| is_html_path(f)).cloned().collect();
    html.sort();
    TocCandidate {
        source: CandidateSource::RawFiles,
        chapters: numbered(html),
    }
}

fn numbered(files: impl IntoIterator<Item = String>) -> Vec<Chapter> {
    files
        .into_iter()
        .enumerate()
        .map(|(i, file)| Chapter::new(format!("Chapter {:03}", i + 1), file))
        .collect()
}

// ----------------------------------------------------------------------------
// Resolution
// ----------------------------------------------------------------------------

/// Resolves and renders the chapters of an opened EPUB.
pub struct ChapterResolver<'a> {
    renderer: &'a HtmlRenderer,
    cancel: Option<&'a CancellationToken>,
    progress: Option<Box<dyn FnMut(usize, usize) + 'a>>,
}

impl<'a> ChapterResolver<'a> {
    pub fn new(renderer: &'a HtmlRenderer) -> Self {
        Self {
            renderer,
            cancel: None,
            progress: None,
        }
    }

    /// Check `token` before rendering each chapter.
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Call `progress(done, total)` after each rendered chapter.
    pub fn with_progress(mut self, progress: impl FnMut(usize, usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Build all candidates, select one and render its chapters.
    ///
    /// Files that cannot be read or render to nothing are skipped with a
    /// warning; a chapter left without text is kept with empty content.
    pub fn resolve(&mut self, archive: &mut EpubArchive, package: &Package) -> Result<Vec<Chapter>> {
        let points = match read_navigation(archive, package) {
            Ok(points) => points,
            Err(e) => {
                log::warn!("ignoring table of contents: {e}");
                Vec::new()
            }
        };

        let candidates = vec![
            navigation_candidate(&points),
            spine_candidate(package),
            raw_file_candidate(archive.files()),
        ];
        for candidate in &candidates {
            log::debug!(
                "{} candidate: {} chapters",
                candidate.source.name(),
                candidate.chapters.len()
            );
        }

        let selected = select_candidate(candidates)
            .ok_or_else(|| Error::NoChapters(package.opf_path.clone()))?;
        log::debug!("selected {} candidate", selected.source.name());

        let total = selected.chapters.len();
        let mut chapters = Vec::with_capacity(total);
        for (i, chapter) in selected.chapters.into_iter().enumerate() {
            cancel::checkpoint(self.cancel)?;
            chapters.push(self.render_chapter(archive, chapter));
            if let Some(progress) = self.progress.as_mut() {
                progress(i + 1, total);
            }
        }

        Ok(chapters)
    }

    fn render_chapter(&self, archive: &mut EpubArchive, chapter: Chapter) -> Chapter {
        let mut fragments = Vec::new();
        for file in chapter.files() {
            match archive.read(file) {
                Ok(bytes) => {
                    let text = self.renderer.render(&bytes);
                    if text.is_empty() {
                        log::debug!("{file}: no text");
                    } else {
                        fragments.push(text);
                    }
                }
                Err(e) => log::warn!("skipping {file}: {e}"),
            }
        }
        if fragments.is_empty() {
            log::warn!("chapter '{}' has no readable content", chapter.title);
        }
        let content = fragments.join("\n\n");
        chapter.with_content(content)
    }
}

// ----------------------------------------------------------------------------
// Titles
// ----------------------------------------------------------------------------

/// Human title from a file name: extension, trailing digits and number-only
/// words removed, separators turned into spaces.
pub fn normalize_title(file_name: &str) -> String {
    let stem = file_stem(file_name).trim_end_matches(|c: char| c.is_ascii_digit());
    let words: Vec<&str> = stem
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty() && !w.chars().all(|c| c.is_ascii_digit()))
        .collect();
    if words.is_empty() {
        "Untitled".to_string()
    } else {
        words.join(" ")
    }
}

/// `my_story-` -> `My Story`.
fn title_case(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
