//! The mutable accumulator behind a compose request.
//!
//! Each successfully parsed chunk extraction is merged into a [`GuideDraft`]
//! by plain concatenation — deduplication and conflict resolution are
//! deliberately deferred to the single finalization call, where the provider
//! can weigh all sources at once instead of chunk-by-chunk.
//!
//! Extraction replies come from a generative model, so parsing is defensive:
//! prose around the JSON object is tolerated, and fields that are not arrays
//! are ignored rather than failing the whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::RiteError;

/// Where one merged chunk came from.
#[derive(Clone, Debug, Serialize)]
pub struct DraftSource {
    pub book: String,
    pub chunk_index: usize,
}

/// Accumulated per-chunk extractions for one compose request.
///
/// Owned by the pipeline for the lifetime of a single request and discarded
/// once the final guide is produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct GuideDraft {
    pub materials: Vec<Value>,
    pub steps: Vec<Value>,
    pub timings: Vec<Value>,
    pub dos: Vec<Value>,
    pub donts: Vec<Value>,
    pub mantras: Vec<Value>,
    pub notes: Vec<Value>,
    pub sources: Vec<DraftSource>,
}

impl GuideDraft {
    /// Merge one extraction's list fields by concatenation. No deduplication.
    pub fn absorb(&mut self, extraction: ChunkExtraction) {
        self.materials.extend(extraction.materials);
        self.steps.extend(extraction.steps);
        self.timings.extend(extraction.timings);
        self.dos.extend(extraction.dos);
        self.donts.extend(extraction.donts);
        self.mantras.extend(extraction.mantras);
        self.notes.extend(extraction.notes);
    }

    /// Record the provenance of one processed chunk.
    pub fn record_source(&mut self, book: impl Into<String>, chunk_index: usize) {
        self.sources.push(DraftSource {
            book: book.into(),
            chunk_index,
        });
    }
}

/// One chunk's structured extraction as returned by the provider.
#[derive(Debug, Default, Deserialize)]
pub struct ChunkExtraction {
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub materials: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub steps: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub timings: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub dos: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub donts: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub mantras: Vec<Value>,
    #[serde(default, deserialize_with = "list_or_ignored")]
    pub notes: Vec<Value>,
}

/// Accept an array, silently ignore any other shape.
fn list_or_ignored<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Parse a provider reply into a [`ChunkExtraction`].
///
/// Models sometimes wrap the requested JSON in prose; when both braces are
/// present, only the outermost `{…}` span is parsed.
pub fn parse_extraction(raw: &str) -> Result<ChunkExtraction, RiteError> {
    let payload = json_object_span(raw)
        .ok_or_else(|| RiteError::Parse("no JSON object in response".to_string()))?;
    serde_json::from_str(payload).map_err(|err| RiteError::Parse(err.to_string()))
}

/// The outermost `{…}` span of `raw`, if any.
pub fn json_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recovers_object_from_surrounding_prose() {
        let raw = r#"Sure! Here is the extraction you asked for:
{"steps": ["light the lamp"], "materials": [{"name": "diya", "why": "light"}]}
Let me know if you need anything else."#;
        let extraction = parse_extraction(raw).unwrap();
        assert_eq!(extraction.steps, vec![json!("light the lamp")]);
        assert_eq!(extraction.materials.len(), 1);
    }

    #[test]
    fn non_list_fields_are_ignored_not_fatal() {
        let raw = r#"{"steps": "not a list", "timings": ["at dawn"], "notes": 42}"#;
        let extraction = parse_extraction(raw).unwrap();
        assert!(extraction.steps.is_empty());
        assert!(extraction.notes.is_empty());
        assert_eq!(extraction.timings, vec![json!("at dawn")]);
    }

    #[test]
    fn missing_braces_fail_to_parse() {
        assert!(parse_extraction("no structure here").is_err());
        assert!(parse_extraction("}{").is_err());
    }

    #[test]
    fn absorb_concatenates_without_dedup() {
        let mut draft = GuideDraft::default();
        let first = parse_extraction(r#"{"mantras": ["om namah"], "steps": ["a"]}"#).unwrap();
        let second = parse_extraction(r#"{"mantras": ["om namah"], "steps": ["b"]}"#).unwrap();
        draft.absorb(first);
        draft.absorb(second);
        draft.record_source("siva.pdf", 0);
        draft.record_source("siva.pdf", 1);

        assert_eq!(draft.mantras, vec![json!("om namah"), json!("om namah")]);
        assert_eq!(draft.steps, vec![json!("a"), json!("b")]);
        assert_eq!(draft.sources.len(), 2);
    }

    #[test]
    fn draft_serializes_with_all_sections() {
        let draft = GuideDraft::default();
        let value = serde_json::to_value(&draft).unwrap();
        for key in ["materials", "steps", "timings", "dos", "donts", "mantras", "notes", "sources"] {
            assert!(value.get(key).is_some(), "missing section {key}");
        }
    }
}
