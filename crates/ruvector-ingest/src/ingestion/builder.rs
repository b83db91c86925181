//! Conversion of extracted payloads into document records

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::DocumentRecord;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalize a user supplied type: punctuation becomes spaces, whitespace
/// runs become single hyphens. Blank input means "store default".
pub fn sanitize_type(doc_type: &str) -> Option<String> {
    if doc_type.trim().is_empty() {
        return None;
    }
    let spaced = NON_WORD.replace_all(doc_type, " ");
    Some(SPACE_RUN.replace_all(&spaced, "-").into_owned())
}

/// Pick a record identifier.
///
/// The explicit override only applies to the first file of a run; after
/// that a URL found in the content wins over the relative path.
pub fn resolve_id(
    file_index: usize,
    id_override: Option<&str>,
    url: Option<&str>,
    relative_path: &str,
) -> Result<String> {
    let candidates = [
        id_override.filter(|_| file_index == 0),
        url,
        Some(relative_path),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|id| !id.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::validation(format!("no identifier for file #{}", file_index)))
}

/// Builds normalized records from payload fields and an identifier
#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    doc_type: Option<String>,
    encode_ids: bool,
}

impl ObjectBuilder {
    /// Create a builder; `doc_type` is sanitized once here
    pub fn new(doc_type: Option<&str>, encode_ids: bool) -> Self {
        Self {
            doc_type: doc_type.and_then(sanitize_type),
            encode_ids,
        }
    }

    /// Storage key for an identifier
    pub fn storage_key(&self, id: &str) -> String {
        if self.encode_ids {
            STANDARD.encode(id.as_bytes())
        } else {
            id.to_string()
        }
    }

    /// Build one record
    pub fn build(&self, fields: Map<String, Value>, id: &str) -> Result<DocumentRecord> {
        if id.trim().is_empty() {
            return Err(Error::validation("record identifier is empty"));
        }
        Ok(DocumentRecord {
            id: self.storage_key(id),
            name: id.to_string(),
            doc_type: self.doc_type.clone(),
            fields,
            chunk_index: None,
        })
    }

    /// Build one chunk record of an oversized document
    pub fn build_chunk(
        &self,
        fields: &Map<String, Value>,
        base_id: &str,
        chunk_index: u32,
        text: &str,
    ) -> Result<DocumentRecord> {
        let mut chunk_fields = fields.clone();
        chunk_fields.insert("text".into(), Value::String(text.to_string()));
        let mut record = self.build(chunk_fields, &chunk_id(base_id, chunk_index))?;
        record.chunk_index = Some(chunk_index);
        Ok(record)
    }

    /// Build the records held by a parsed JSON file.
    ///
    /// A single object keeps `id`. Array elements use their own string `id`
    /// field when present, otherwise `{id}_{n}` with `n` starting at 1.
    pub fn build_json(&self, value: Value, id: &str, filename: &str) -> Result<Vec<DocumentRecord>> {
        match value {
            Value::Object(fields) => Ok(vec![self.build(fields, id)?]),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(fields) => {
                        let element_id = own_id(&fields)
                            .unwrap_or_else(|| format!("{}_{}", id, i + 1));
                        self.build(fields, &element_id)
                    }
                    _ => Err(Error::file_parse(
                        filename,
                        format!("array element {} is not an object", i),
                    )),
                })
                .collect(),
            _ => Err(Error::file_parse(filename, "expected a JSON object or an array of objects")),
        }
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new(None, true)
    }
}

/// Identifier of the n-th chunk of `base_id`
pub fn chunk_id(base_id: &str, chunk_index: u32) -> String {
    format!("{}_chunk{}", base_id, chunk_index)
}

/// Non-empty string `id` carried by a JSON object
pub fn own_id(fields: &Map<String, Value>) -> Option<String> {
    fields
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_type() {
        assert_eq!(sanitize_type("blog post").as_deref(), Some("blog-post"));
        assert_eq!(sanitize_type("a/b.c").as_deref(), Some("a-b-c"));
        assert_eq!(sanitize_type("news!").as_deref(), Some("news-"));
        assert_eq!(sanitize_type("   "), None);
    }

    #[test]
    fn test_resolve_id_fallbacks() {
        assert_eq!(resolve_id(0, Some("custom"), Some("http://u"), "a.txt").unwrap(), "custom");
        assert_eq!(resolve_id(1, Some("custom"), Some("http://u"), "a.txt").unwrap(), "http://u");
        assert_eq!(resolve_id(0, None, None, "docs/readme.txt").unwrap(), "docs/readme.txt");
        assert_eq!(resolve_id(0, Some(""), Some(" "), "b.txt").unwrap(), "b.txt");
        assert!(matches!(resolve_id(2, None, None, ""), Err(Error::Validation(_))));
    }

    #[test]
    fn test_build_encodes_id() {
        let record = ObjectBuilder::default()
            .build(Map::new(), "docs/readme.txt")
            .unwrap();
        assert_eq!(record.id, "ZG9jcy9yZWFkbWUudHh0");
        assert_eq!(record.name, "docs/readme.txt");
        assert_eq!(record.doc_type, None);
    }

    #[test]
    fn test_build_raw_id_and_type() {
        let record = ObjectBuilder::new(Some("my type"), false)
            .build(Map::new(), "docs/readme.txt")
            .unwrap();
        assert_eq!(record.id, "docs/readme.txt");
        assert_eq!(record.doc_type.as_deref(), Some("my-type"));
    }

    #[test]
    fn test_build_rejects_empty_id() {
        let result = ObjectBuilder::default().build(Map::new(), "  ");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_build_chunk() {
        let mut fields = Map::new();
        fields.insert("url".into(), json!("http://x"));
        fields.insert("text".into(), json!("full text"));
        let record = ObjectBuilder::new(None, false)
            .build_chunk(&fields, "big.txt", 3, "part")
            .unwrap();
        assert_eq!(record.id, "big.txt_chunk3");
        assert_eq!(record.chunk_index, Some(3));
        assert_eq!(record.text(), Some("part"));
        assert_eq!(record.fields["url"], "http://x");
    }

    #[test]
    fn test_build_json_array() {
        let builder = ObjectBuilder::new(None, false);
        let records = builder
            .build_json(json!([{"id": "own", "a": 1}, {"a": 2}]), "list.json", "list.json")
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "own");
        assert_eq!(records[1].id, "list.json_2");

        let err = builder.build_json(json!([1]), "x.json", "x.json").unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
    }
}
