//! Text-to-speech backends.

use std::io;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Turns one chunk of text into encoded audio.
pub trait Synthesizer {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;
}

impl<S: Synthesizer + ?Sized> Synthesizer for &S {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        (**self).synthesize(text, voice)
    }
}

impl<S: Synthesizer + ?Sized> Synthesizer for Box<S> {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        (**self).synthesize(text, voice)
    }
}

const VOICE_PLACEHOLDER: &str = "{voice}";
const TEXT_PLACEHOLDER: &str = "{text}";

/// Runs an external program per chunk and reads the audio from its stdout.
///
/// Arguments are a template: `{voice}` and `{text}` are substituted in each
/// argument. The default is `edge-tts --voice {voice} --text {text}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl Default for CommandSynthesizer {
    fn default() -> Self {
        Self::new("edge-tts", ["--voice", VOICE_PLACEHOLDER, "--text", TEXT_PLACEHOLDER])
    }
}

impl CommandSynthesizer {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Same arguments, different program.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for one invocation.
    pub fn render_args(&self, text: &str, voice: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| {
                arg.replace(VOICE_PLACEHOLDER, voice)
                    .replace(TEXT_PLACEHOLDER, text)
            })
            .collect()
    }
}

impl Synthesizer for CommandSynthesizer {
    fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        log::trace!("{} for {} chars", self.program, text.chars().count());
        let output = Command::new(&self.program)
            .args(self.render_args(text, voice))
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Io(io::Error::other(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            ))));
        }
        Ok(output.stdout)
    }
}
