//! Document to audio conversion.
//!
//! The [`Converter`] drives the whole pipeline: extraction, normalization,
//! chunking, synthesis of each chunk and assembly of the chunk audio into one
//! file per document or per chapter. Work can be paused, resumed and
//! cancelled from another thread through the converter's
//! [`CancellationToken`].

mod audio;
mod synth;
mod voices;

pub use audio::{AudioAssembler, Mp3Assembler};
pub use synth::{CommandSynthesizer, Synthesizer};
pub use voices::{DEFAULT_LANGUAGES, Voice, VoiceCatalog};

pub use crate::cancel::CancellationToken;

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::extract::{ExtractOptions, extract_with_progress};
use crate::model::{Chapter, Extraction};
use crate::text::{normalize_paragraphs, split_chunks};

/// Default upper bound for one synthesis request, in characters.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 5000;

/// Characters removed from chapter titles before they go into file names.
const FORBIDDEN_FILE_CHARS: &[char] = &['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Settings for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertConfig {
    /// Voice passed to the synthesizer.
    pub voice: String,
    pub max_chunk_chars: usize,
    /// Write one file per chapter instead of a single file.
    pub split_chapters: bool,
    /// 1-based chapter numbers to convert; `None` converts all of them.
    pub selected_chapters: Option<Vec<usize>>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            voice: String::new(),
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            split_chapters: false,
            selected_chapters: None,
        }
    }
}

impl ConvertConfig {
    pub fn new(voice: impl Into<String>) -> Self {
        Self {
            voice: voice.into(),
            ..Self::default()
        }
    }

    pub fn with_max_chunk_chars(mut self, max: usize) -> Self {
        self.max_chunk_chars = max;
        self
    }

    pub fn with_split_chapters(mut self, split: bool) -> Self {
        self.split_chapters = split;
        self
    }

    pub fn with_selected_chapters(mut self, chapters: Vec<usize>) -> Self {
        self.selected_chapters = Some(chapters);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.voice.trim().is_empty() {
            return Err(Error::InvalidInput("no voice selected".into()));
        }
        if self.max_chunk_chars == 0 {
            return Err(Error::InvalidInput("chunk size must be positive".into()));
        }
        Ok(())
    }
}

/// Output path of chapter `number` (1-based): `<base>_CapNN_<title><ext>`.
pub fn chapter_output_path(output: &Path, number: usize, title: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = output
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let title: String = title
        .trim()
        .chars()
        .filter(|c| !FORBIDDEN_FILE_CHARS.contains(c))
        .collect();
    output.with_file_name(format!("{stem}_Cap{number:02}_{}{ext}", title.trim()))
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Runs conversions with one synthesizer and assembler.
pub struct Converter<S> {
    synthesizer: S,
    assembler: Box<dyn AudioAssembler>,
    config: ConvertConfig,
    token: CancellationToken,
}

impl<S: Synthesizer> Converter<S> {
    /// Converter writing MP3 through `synthesizer`.
    pub fn new(synthesizer: S, config: ConvertConfig) -> Self {
        Self {
            synthesizer,
            assembler: Box::new(Mp3Assembler),
            config,
            token: CancellationToken::new(),
        }
    }

    pub fn with_assembler(mut self, assembler: impl AudioAssembler + 'static) -> Self {
        self.assembler = Box::new(assembler);
        self
    }

    /// Use an existing token, e.g. one shared with a UI.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Handle for pausing, resuming and cancelling this converter.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Extract `input` and convert it.
    ///
    /// Returns the files written: `output` itself, or one file per converted
    /// chapter when chapter splitting is on. An `output` without an extension
    /// gets the assembler's.
    pub fn convert_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();
        let output = self.output_path(output.as_ref());
        self.config.validate()?;

        let options = ExtractOptions::new()
            .with_split_chapters(self.config.split_chapters)
            .with_cancellation(self.token.clone());

        let extraction = extract_with_progress(input, &options, |done, total| {
            log::debug!("extracted {done}/{total} of {}", input.display());
        })?;
        match extraction {
            Extraction::Text(text) => {
                self.convert_text(&text, &output, &mut progress)?;
                Ok(vec![output])
            }
            Extraction::Chapters(chapters) => {
                if chapters.is_empty() {
                    return Err(Error::NoChapters(input.display().to_string()));
                }
                self.convert_chapters(&chapters, &output, progress)
            }
        }
    }

    fn output_path(&self, output: &Path) -> PathBuf {
        if output.extension().is_some() {
            output.to_path_buf()
        } else {
            output.with_extension(self.assembler.extension())
        }
    }

    /// Convert the selected chapters into one file each.
    ///
    /// `progress(chapter_number, total)` is reported before each chapter and
    /// `(total, total)` at the end. Chapters without text are skipped. File
    /// names follow [`chapter_output_path`].
    pub fn convert_chapters(
        &self,
        chapters: &[Chapter],
        output: impl AsRef<Path>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<Vec<PathBuf>> {
        let output = self.output_path(output.as_ref());
        self.config.validate()?;

        let selected: Vec<(usize, &Chapter)> = chapters
            .iter()
            .enumerate()
            .map(|(i, chapter)| (i + 1, chapter))
            .filter(|(number, _)| {
                self.config
                    .selected_chapters
                    .as_ref()
                    .is_none_or(|selection| selection.contains(number))
            })
            .collect();
        let total = selected.len();

        let mut written = Vec::with_capacity(total);
        for (number, chapter) in selected {
            self.token.checkpoint()?;
            progress(number, total);

            if chapter.is_empty() {
                log::warn!("chapter {number} '{}' has no text, skipping", chapter.title);
                continue;
            }
            let path = chapter_output_path(&output, number, &chapter.title);
            log::info!("chapter {number}/{}: {}", chapters.len(), path.display());
            self.convert_text(&chapter.content, &path, |_, _| {})?;
            written.push(path);
        }

        progress(total, total);
        Ok(written)
    }

    /// Synthesize `text` into `output`, chunk by chunk.
    ///
    /// Nothing is written unless every chunk succeeds; the audio goes to a
    /// `.part` file first and is renamed into place.
    pub fn convert_text(
        &self,
        text: &str,
        output: impl AsRef<Path>,
        mut progress: impl FnMut(usize, usize),
    ) -> Result<()> {
        let output = output.as_ref();
        self.config.validate()?;
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("text is empty".into()));
        }

        let chunks = split_chunks(&normalize_paragraphs(text), self.config.max_chunk_chars);
        if chunks.is_empty() {
            return Err(Error::InvalidInput("no speakable text after cleanup".into()));
        }

        let total = chunks.len();
        let mut segments = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            let index = i + 1;
            self.token.checkpoint()?;

            let audio = self
                .synthesizer
                .synthesize(chunk, &self.config.voice)
                .map_err(|e| Error::Synthesis {
                    index,
                    total,
                    message: e.to_string(),
                })?;
            if audio.is_empty() {
                return Err(Error::Synthesis {
                    index,
                    total,
                    message: "no audio received".into(),
                });
            }
            log::debug!("chunk {index}/{total}: {} bytes of audio", audio.len());
            segments.push(audio);
            progress(index, total);
        }

        self.token.checkpoint()?;
        let audio = self.assembler.assemble(&segments);
        write_atomically(output, &audio)
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    let part = part_path(path);
    if let Err(e) = fs::write(&part, data).and_then(|()| fs::rename(&part, path)) {
        let _ = fs::remove_file(&part);
        return Err(e.into());
    }
    Ok(())
}
