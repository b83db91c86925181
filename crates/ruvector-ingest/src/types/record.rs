//! Document records and extraction results

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the store owns; everything else on a wire object is a field
const RESERVED_KEYS: [&str; 4] = ["id", "name", "type", "chunkid"];

/// A structured unit submitted to the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Storage key (base64 of `name` unless encoding is disabled)
    pub id: String,
    /// Identifier before encoding
    pub name: String,
    /// Object type; `None` means the store default
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Extracted or parsed content
    #[serde(default)]
    pub fields: Map<String, Value>,
    /// 1-based sequence number for chunks of an oversized document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
}

impl DocumentRecord {
    /// Text field, if any
    pub fn text(&self) -> Option<&str> {
        self.fields.get("text").and_then(Value::as_str)
    }

    /// Flatten into the store's object shape: fields at top level, with the
    /// record's own keys taking precedence
    pub fn to_wire(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".into(), Value::String(self.id.clone()));
        object.insert("name".into(), Value::String(self.name.clone()));
        match &self.doc_type {
            Some(t) => {
                object.insert("type".into(), Value::String(t.clone()));
            }
            None => {
                object.remove("type");
            }
        }
        match self.chunk_index {
            Some(index) => {
                object.insert("chunkid".into(), Value::from(index));
            }
            None => {
                object.remove("chunkid");
            }
        }
        Value::Object(object)
    }

    /// Rebuild a record from a store object
    pub fn from_wire(value: Value) -> Self {
        let mut object = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        };

        let id = take_string(&mut object, "id").unwrap_or_default();
        let name = take_string(&mut object, "name").unwrap_or_else(|| id.clone());
        let doc_type = take_string(&mut object, "type");
        let chunk_index = object
            .remove("chunkid")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32);

        for key in RESERVED_KEYS {
            object.remove(key);
        }

        Self {
            id,
            name,
            doc_type,
            fields: object,
            chunk_index,
        }
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

/// Title, url and text pulled out of a text or HTML file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub title: Option<String>,
    pub url: Option<String>,
    pub text: String,
}

impl ExtractionResult {
    /// Plain text with no title or url
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            title: None,
            url: None,
            text: text.into(),
        }
    }

    /// Record fields: `name` (title), `url`, `text`
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(title) = &self.title {
            fields.insert("name".into(), Value::String(title.clone()));
        }
        if let Some(url) = &self.url {
            fields.insert("url".into(), Value::String(url.clone()));
        }
        fields.insert("text".into(), Value::String(self.text.clone()));
        fields
    }
}

/// What the extractor produced for one file
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// HTML or plain text
    Text(ExtractionResult),
    /// Parsed JSON: one object or an array of objects
    Json(Value),
}
