use crate::dom::{ArenaDom, NodeId};

/// Class names that mark exercise and worksheet content.
pub const DEFAULT_STRUCTURED_CLASSES: &[&str] = &[
    "exercise",
    "worksheet",
    "question",
    "activity",
    "ejercicio",
    "pregunta",
    "enunciado",
    "actividad",
];

/// Decides whether a document is rendered in structured mode.
pub trait StructureDetector: Send + Sync {
    fn is_structured(&self, dom: &ArenaDom, root: NodeId) -> bool;
}

/// Detects structured content by element class names.
///
/// A class token matches when it starts with one of the configured names,
/// compared case-insensitively, so `Exercise`, `exercise-2` and `ejercicios`
/// all count.
#[derive(Debug, Clone)]
pub struct ClassListDetector {
    classes: Vec<String>,
}

impl ClassListDetector {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            classes: classes
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl Default for ClassListDetector {
    fn default() -> Self {
        Self::new(DEFAULT_STRUCTURED_CLASSES)
    }
}

impl StructureDetector for ClassListDetector {
    fn is_structured(&self, dom: &ArenaDom, root: NodeId) -> bool {
        dom.descendants(root).any(|id| {
            dom.classes(id)
                .iter()
                .any(|token| self.classes.iter().any(|c| token.starts_with(c.as_str())))
        })
    }
}
