use tracing::warn;

use crate::models::{Definition, NormalizedResult, RawPayload, WordInfo, WordMap};

impl Definition {
    pub fn into_info(self) -> WordInfo {
        match self {
            Definition::Text(definition) => WordInfo::from_definition(definition),
            Definition::Info(info) => info,
        }
    }
}

/// Coerces a server payload into the canonical `word -> WordInfo` shape.
///
/// `complex_words` is the canonical field. The legacy `definitions` map is
/// read only when `complex_words` is absent or empty. Word keys are kept
/// exactly as the server sent them.
pub fn normalize(payload: RawPayload) -> NormalizedResult {
    let RawPayload {
        original_text,
        complex_words,
        definitions,
        processing_time,
    } = payload;

    let entries = match complex_words {
        Some(words) if !words.is_empty() => words,
        _ => match definitions {
            Some(legacy) if !legacy.is_empty() => {
                warn!(count = legacy.len(), "response uses deprecated `definitions` field");
                legacy
            }
            _ => WordMap::new(),
        },
    };

    NormalizedResult {
        original_text: original_text.unwrap_or_default(),
        processing_time,
        words: entries
            .into_iter()
            .map(|(word, definition)| (word, definition.into_info()))
            .collect(),
    }
}
