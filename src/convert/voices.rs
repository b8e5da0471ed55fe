//! Voice catalog of the synthesis service.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Languages kept by [`VoiceCatalog::filter_languages`] when none are given.
pub const DEFAULT_LANGUAGES: &[&str] = &["es", "en"];

/// One voice record as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ShortName")]
    pub short_name: String,
    #[serde(rename = "Gender", default)]
    pub gender: String,
    #[serde(rename = "Language", alias = "Locale", default)]
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        Self { voices }
    }

    /// Parse a JSON array of voice records.
    pub fn from_json(json: &str) -> Result<Self> {
        let voices: Vec<Voice> = serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("voice catalog: {e}")))?;
        Ok(Self::new(voices))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// Voices whose lower-cased short name contains any of `languages`.
    pub fn filter_languages<S: AsRef<str>>(&self, languages: &[S]) -> VoiceCatalog {
        let languages: Vec<String> = languages
            .iter()
            .map(|l| l.as_ref().to_lowercase())
            .collect();
        let voices = self
            .voices
            .iter()
            .filter(|v| {
                let short = v.short_name.to_lowercase();
                languages.iter().any(|lang| short.contains(lang.as_str()))
            })
            .cloned()
            .collect();
        VoiceCatalog::new(voices)
    }

    /// Look a voice up by full name or short name.
    pub fn find_by_name(&self, name: &str) -> Option<&Voice> {
        self.voices
            .iter()
            .find(|v| v.name == name)
            .or_else(|| self.voices.iter().find(|v| v.short_name == name))
    }

    /// Like [`find_by_name`](Self::find_by_name), failing with
    /// [`Error::VoiceNotFound`].
    pub fn require(&self, name: &str) -> Result<&Voice> {
        self.find_by_name(name)
            .ok_or_else(|| Error::VoiceNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"[
        {"Name": "Microsoft Server Speech Text to Speech Voice (es-ES, AlvaroNeural)",
         "ShortName": "es-ES-AlvaroNeural", "Gender": "Male", "Locale": "es-ES"},
        {"Name": "Microsoft Server Speech Text to Speech Voice (en-US, AriaNeural)",
         "ShortName": "en-US-AriaNeural", "Gender": "Female", "Language": "en-US"},
        {"Name": "Microsoft Server Speech Text to Speech Voice (fr-FR, DeniseNeural)",
         "ShortName": "fr-FR-DeniseNeural", "Gender": "Female", "Locale": "fr-FR",
         "SuggestedCodec": "audio-24khz-48kbitrate-mono-mp3"}
    ]"#;

    #[test]
    fn test_parse_catalog() {
        let catalog = VoiceCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.voices().len(), 3);
        assert_eq!(catalog.voices()[0].language, "es-ES");
        assert_eq!(catalog.voices()[1].language, "en-US");
        assert_eq!(catalog.voices()[1].gender, "Female");
    }

    #[test]
    fn test_filter_languages() {
        let catalog = VoiceCatalog::from_json(CATALOG).unwrap();
        let filtered = catalog.filter_languages(DEFAULT_LANGUAGES);
        let names: Vec<_> = filtered.voices().iter().map(|v| v.short_name.as_str()).collect();
        assert_eq!(names, vec!["es-ES-AlvaroNeural", "en-US-AriaNeural"]);

        assert_eq!(catalog.filter_languages(&["FR"]).voices().len(), 1);
        assert!(catalog.filter_languages(&["de"]).is_empty());
    }

    #[test]
    fn test_find_by_name() {
        let catalog = VoiceCatalog::from_json(CATALOG).unwrap();
        assert_eq!(
            catalog.find_by_name("en-US-AriaNeural").unwrap().gender,
            "Female"
        );
        assert!(catalog
            .find_by_name("Microsoft Server Speech Text to Speech Voice (es-ES, AlvaroNeural)")
            .is_some());
        assert!(matches!(
            catalog.require("xx-XX-Nobody"),
            Err(Error::VoiceNotFound(name)) if name == "xx-XX-Nobody"
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            VoiceCatalog::from_json("{not json"),
            Err(Error::InvalidInput(_))
        ));
    }
}
