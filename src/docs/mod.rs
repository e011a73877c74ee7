pub mod score;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use types::{Document, Origin, ScoredMatch};

/// One knowledge-base file and the documents it holds, in file order.
pub struct KnowledgeBase {
    pub source_file: String,
    pub documents: Vec<Document>,
}

/// Flat-file document collections searched for local answers.
///
/// Files are re-read on every search so documents appended to the dynamic
/// store by a live fetch are visible to the next query.
pub struct ContentStore {
    paths: Vec<PathBuf>,
    dynamic_path: PathBuf,
}

impl ContentStore {
    /// `paths` are searched in order; `dynamic_path` is searched last and is
    /// the only file ever written.
    pub fn new(paths: Vec<PathBuf>, dynamic_path: PathBuf) -> Self {
        Self {
            paths,
            dynamic_path,
        }
    }

    fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths
            .iter()
            .chain(std::iter::once(&self.dynamic_path))
            .filter({
                let mut seen = std::collections::HashSet::new();
                move |p| seen.insert(p.as_path())
            })
    }

    /// Load every readable store. Missing or corrupt files are skipped.
    pub fn load(&self) -> Vec<KnowledgeBase> {
        let mut stores = Vec::new();
        for path in self.all_paths() {
            match read_store(path) {
                Ok(Some(entries)) => {
                    let documents = entries
                        .into_iter()
                        .map(|(key, value)| Document::from_entry(&key, value))
                        .collect::<Vec<_>>();
                    let fetched = documents
                        .iter()
                        .filter(|d| d.origin == Origin::FetchedLive)
                        .count();
                    debug!(
                        path = %path.display(),
                        count = documents.len(),
                        fetched,
                        "store loaded"
                    );
                    stores.push(KnowledgeBase {
                        source_file: file_label(path),
                        documents,
                    });
                }
                Ok(None) => debug!(path = %path.display(), "store file not found, skipping"),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable store: {:#}", e),
            }
        }
        stores
    }

    /// Score every document against `query` and return the best `limit`
    /// matches, highest first. Equal scores keep store/document order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<ScoredMatch> {
        let mut matches = Vec::new();
        for store in self.load() {
            for doc in &store.documents {
                let score = score::score(query, doc);
                if score == 0 {
                    continue;
                }
                matches.push(ScoredMatch {
                    document_key: doc.key.clone(),
                    title: doc.title.clone(),
                    content: doc.context_text(),
                    score,
                    source_file: store.source_file.clone(),
                    url: doc.url().map(str::to_string),
                });
            }
        }

        // sort_by is stable
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(limit);
        debug!(query, hits = matches.len(), "local search complete");
        matches
    }

    /// Save a fetched document into the dynamic store, replacing any entry
    /// with the same key.
    pub fn save_fetched(&self, doc: &Document) -> Result<()> {
        let mut entries = match read_store(&self.dynamic_path) {
            Ok(Some(entries)) => entries,
            Ok(None) => Map::new(),
            Err(e) => {
                warn!(path = %self.dynamic_path.display(), "Dynamic store unreadable, starting fresh: {:#}", e);
                Map::new()
            }
        };
        entries.insert(doc.key.clone(), doc.to_value());
        crate::persist::write_json_atomic(&self.dynamic_path, &entries)?;
        info!(key = %doc.key, title = %doc.title, "saved fetched document to dynamic store");
        Ok(())
    }
}

/// `Ok(None)` when the file does not exist.
fn read_store(path: &Path) -> Result<Option<Map<String, Value>>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    let entries: Map<String, Value> = serde_json::from_str(&text)
        .with_context(|| format!("parse {} as a JSON object", path.display()))?;
    Ok(Some(entries))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: Value) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_cancel_query_selects_cancel_api() {
        let dir = tempfile::tempdir().unwrap();
        let kb = write(
            dir.path(),
            "knowledge-base.json",
            json!({
                "search_api": {"title": "Search API", "description": "Search hotels"},
                "cancel_api": {"title": "Cancel API", "description": "Cancel a booking"}
            }),
        );
        let store = ContentStore::new(vec![kb], dir.path().join("dynamic.json"));

        let results = store.search("how to cancel a booking", 3);
        assert!(!results.is_empty());
        assert_eq!(results[0].document_key, "cancel_api");
        assert_eq!(results[0].source_file, "knowledge-base.json");
        if results.len() > 1 {
            assert!(results[0].score > results[1].score);
        }
    }

    #[test]
    fn test_corrupt_store_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("broken.json");
        std::fs::write(&bad, "{ not json").unwrap();
        let good = write(
            dir.path(),
            "good.json",
            json!({"book_api": {"title": "Book API"}}),
        );
        let store = ContentStore::new(
            vec![bad, dir.path().join("missing.json"), good],
            dir.path().join("dynamic.json"),
        );

        let stores = store.load();
        assert_eq!(stores.len(), 1);
        let results = store.search("book", 3);
        assert_eq!(results[0].document_key, "book_api");
    }

    #[test]
    fn test_ties_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let kb = write(
            dir.path(),
            "kb.json",
            json!({
                "zeta": "hotel info",
                "alpha": "hotel info"
            }),
        );
        let store = ContentStore::new(vec![kb], dir.path().join("dynamic.json"));
        let results = store.search("hotel", 3);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].score, results[1].score);
        assert_eq!(results[0].document_key, "zeta");
        assert_eq!(results[1].document_key, "alpha");
    }

    #[test]
    fn test_limit_and_empty_query() {
        let dir = tempfile::tempdir().unwrap();
        let kb = write(
            dir.path(),
            "kb.json",
            json!({"a1": "hotel", "a2": "hotel", "a3": "hotel", "a4": "hotel"}),
        );
        let store = ContentStore::new(vec![kb], dir.path().join("dynamic.json"));
        assert_eq!(store.search("hotel", 3).len(), 3);
        assert!(store.search("", 3).is_empty());
    }

    #[test]
    fn test_saved_fetch_rescores_identically() {
        let dir = tempfile::tempdir().unwrap();
        let dynamic = dir.path().join("knowledge-base-dynamic.json");
        let store = ContentStore::new(vec![], dynamic.clone());

        let fresh = Document::fetched(
            "Cancel Api",
            "https://docs.example.com/docs/cancel-api",
            "Cancel a confirmed booking by id",
        );
        store.save_fetched(&fresh).unwrap();

        let stores = store.load();
        assert_eq!(stores.len(), 1);
        let reloaded = &stores[0].documents[0];
        assert_eq!(reloaded.key, fresh.key);

        let q = "how do I cancel a booking";
        assert_eq!(score::score(q, reloaded), score::score(q, &fresh));
    }

    #[test]
    fn test_save_fetched_overwrites_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let dynamic = dir.path().join("dynamic.json");
        let store = ContentStore::new(vec![], dynamic);

        store
            .save_fetched(&Document::fetched("Book Api", "u", "old"))
            .unwrap();
        store
            .save_fetched(&Document::fetched("Book Api", "u", "new"))
            .unwrap();
        store
            .save_fetched(&Document::fetched("Cancel Api", "u", "other"))
            .unwrap();

        let docs = &store.load()[0].documents;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].body.field_str("content"), Some("new"));
    }
}
