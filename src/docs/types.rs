use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker written into the `source` field of documents saved from a live fetch.
pub const AUTO_FETCHED: &str = "auto_fetched";

/// Where a document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    LocalKb,
    FetchedLive,
}

/// Document content, decided once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum DocBody {
    /// A JSON object entry: `{"title": ..., "endpoint": ..., ...}`.
    Structured(Map<String, Value>),
    /// Anything else (strings, numbers, arrays).
    Freeform(String),
}

impl DocBody {
    /// Text used for both scoring and prompting.
    pub fn text(&self) -> String {
        match self {
            DocBody::Structured(fields) => {
                serde_json::to_string_pretty(fields).unwrap_or_default()
            }
            DocBody::Freeform(text) => text.clone(),
        }
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        match self {
            DocBody::Structured(fields) => fields.get(name).and_then(Value::as_str),
            DocBody::Freeform(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub body: DocBody,
    pub origin: Origin,
}

impl Document {
    /// Build a document from one `key -> value` entry of a knowledge-base file.
    pub fn from_entry(key: &str, value: Value) -> Self {
        match value {
            Value::Object(fields) => {
                let title = fields
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string();
                let description = fields
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                let origin = match fields.get("source").and_then(Value::as_str) {
                    Some(AUTO_FETCHED) => Origin::FetchedLive,
                    _ => Origin::LocalKb,
                };
                Self {
                    key: key.to_string(),
                    title,
                    description,
                    body: DocBody::Structured(fields),
                    origin,
                }
            }
            Value::String(text) => Self::freeform(key, text),
            other => Self::freeform(key, other.to_string()),
        }
    }

    fn freeform(key: &str, text: String) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            description: None,
            body: DocBody::Freeform(text),
            origin: Origin::LocalKb,
        }
    }

    /// Build the document for a freshly fetched page, in exactly the shape
    /// it takes once saved to and reloaded from the dynamic store.
    pub fn fetched(title: &str, url: &str, content: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("title".into(), Value::String(title.to_string()));
        fields.insert("url".into(), Value::String(url.to_string()));
        fields.insert("content".into(), Value::String(content.to_string()));
        fields.insert("source".into(), Value::String(AUTO_FETCHED.to_string()));
        fields.insert("last_updated".into(), Value::String("auto".to_string()));
        Self {
            key: dynamic_key(title),
            title: title.to_string(),
            description: None,
            body: DocBody::Structured(fields),
            origin: Origin::FetchedLive,
        }
    }

    /// JSON value written back to a knowledge-base file.
    pub fn to_value(&self) -> Value {
        match &self.body {
            DocBody::Structured(fields) => Value::Object(fields.clone()),
            DocBody::Freeform(text) => Value::String(text.clone()),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.body.field_str("url")
    }

    /// Title followed by the body text, as embedded in prompts.
    pub fn context_text(&self) -> String {
        format!("{}\n{}", self.title, self.body.text())
    }
}

/// Store key derived from a page title: "Cancel Api" -> "cancel_api".
pub fn dynamic_key(title: &str) -> String {
    title.to_lowercase().replace(' ', "_")
}

/// A document that scored above zero for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub document_key: String,
    pub title: String,
    pub content: String,
    pub score: u32,
    pub source_file: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_object_entry_is_structured() {
        let doc = Document::from_entry(
            "cancel_api",
            json!({"title": "Cancel API", "description": "Cancel a booking", "method": "POST"}),
        );
        assert_eq!(doc.title, "Cancel API");
        assert_eq!(doc.description.as_deref(), Some("Cancel a booking"));
        assert!(matches!(doc.body, DocBody::Structured(_)));
        assert_eq!(doc.origin, Origin::LocalKb);
    }

    #[test]
    fn test_scalar_entry_is_freeform() {
        let doc = Document::from_entry("base_url", json!("https://api.example.com"));
        assert_eq!(doc.title, "base_url");
        assert_eq!(doc.body, DocBody::Freeform("https://api.example.com".into()));

        let doc = Document::from_entry("version", json!(3));
        assert_eq!(doc.body.text(), "3");
    }

    #[test]
    fn test_fetched_roundtrips_through_entry() {
        let fresh = Document::fetched("Cancel Api", "https://docs/cancel-api", "Cancel text");
        assert_eq!(fresh.key, "cancel_api");
        let reloaded = Document::from_entry(&fresh.key, fresh.to_value());
        assert_eq!(reloaded, fresh);
        assert_eq!(reloaded.url(), Some("https://docs/cancel-api"));
    }
}
