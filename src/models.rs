use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::TempPath;

// ── Image reference ──────────────────────────────────────────────────────────

/// Local handle to a captured or selected photo.
#[derive(Debug, Clone)]
pub struct ImageRef {
    path: PathBuf,
    mime_type: String,
    file_name: String,
    // Camera captures live in a temp file that goes away with the last handle.
    backing: Option<Arc<TempPath>>,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            file_name: file_name.into(),
            backing: None,
        }
    }

    /// Builds a reference from a path, inferring MIME type and file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = mime_for_path(&path).to_string();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.jpg".to_string());
        Self::new(path, mime_type, file_name)
    }

    pub(crate) fn with_backing(mut self, temp: TempPath) -> Self {
        self.backing = Some(Arc::new(temp));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("heic") => "image/heic",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

// ── Server payload ───────────────────────────────────────────────────────────

/// Structured per-word detail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordInfo {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antonyms: Option<Vec<String>>,
}

impl WordInfo {
    pub fn from_definition(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            pos: None,
            example: None,
            synonyms: None,
            antonyms: None,
        }
    }
}

/// A `complex_words` entry: older backends send a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition {
    Text(String),
    Info(WordInfo),
}

/// Words in the order the server listed them, which is reading order.
pub type WordMap<T> = IndexMap<String, T>;

/// Unmodified server response to `process-image`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complex_words: Option<WordMap<Definition>>,
    /// Deprecated response field, read only when `complex_words` is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<WordMap<Definition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

impl RawPayload {
    pub fn has_words(&self) -> bool {
        let non_empty = |m: &Option<WordMap<Definition>>| m.as_ref().is_some_and(|m| !m.is_empty());
        non_empty(&self.complex_words) || non_empty(&self.definitions)
    }
}

// ── Normalized result ────────────────────────────────────────────────────────

/// Client-canonical shape of a processed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub original_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
    pub words: WordMap<WordInfo>,
}

impl NormalizedResult {
    pub fn word(&self, word: &str) -> Option<&WordInfo> {
        self.words.get(word)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Re-wraps the result as a payload with structured entries only.
    pub fn into_raw(self) -> RawPayload {
        RawPayload {
            original_text: Some(self.original_text),
            complex_words: Some(
                self.words
                    .into_iter()
                    .map(|(word, info)| (word, Definition::Info(info)))
                    .collect(),
            ),
            definitions: None,
            processing_time: self.processing_time,
        }
    }
}
