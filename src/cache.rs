use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

/// TTL class of a cache entry. Generated answers live longer than the raw
/// documentation text they were built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    Answer,
    Documentation,
}

impl TtlClass {
    fn as_str(self) -> &'static str {
        match self {
            TtlClass::Answer => "answer",
            TtlClass::Documentation => "documentation",
        }
    }
}

/// Which tables `Cache::clear` empties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearScope {
    All,
    Answers,
    Documentation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub created_at: DateTime<Utc>,
    pub ttl_class: TtlClass,
    /// Normalized input the key was derived from.
    pub input: String,
    pub payload: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub answer: TableStats,
    pub documentation: TableStats,
}

struct Table {
    path: PathBuf,
    ttl: Duration,
    entries: BTreeMap<String, CacheEntry>,
}

impl Table {
    fn open(path: PathBuf, ttl: Duration) -> Self {
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Could not load cache, starting empty: {}", e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), "Could not read cache, starting empty: {}", e);
                BTreeMap::new()
            }
        };
        Self { path, ttl, entries }
    }

    fn is_valid(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        match (now - entry.created_at).to_std() {
            Ok(age) => age <= self.ttl,
            // created in the future (clock skew): treat as fresh
            Err(_) => true,
        }
    }

    fn save(&self) {
        if let Err(e) = crate::persist::write_json_atomic(&self.path, &self.entries) {
            warn!(path = %self.path.display(), "Could not save cache: {:#}", e);
        }
    }

    fn stats(&self, now: DateTime<Utc>) -> TableStats {
        TableStats {
            total_entries: self.entries.len(),
            valid_entries: self
                .entries
                .values()
                .filter(|e| self.is_valid(e, now))
                .count(),
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

/// Two-tier TTL cache persisted as flat JSON files, one per class.
///
/// Every write rewrites the class's whole file. Expired entries are removed
/// when a read finds them.
pub struct Cache {
    answers: Table,
    documentation: Table,
}

impl Cache {
    pub fn open(dir: &Path, answer_ttl: Duration, documentation_ttl: Duration) -> Self {
        let cache = Self {
            answers: Table::open(dir.join("responses.json"), answer_ttl),
            documentation: Table::open(dir.join("documentation.json"), documentation_ttl),
        };
        info!(
            dir = %dir.display(),
            answers = cache.answers.entries.len(),
            documentation = cache.documentation.entries.len(),
            "cache opened"
        );
        cache
    }

    fn table(&self, class: TtlClass) -> &Table {
        match class {
            TtlClass::Answer => &self.answers,
            TtlClass::Documentation => &self.documentation,
        }
    }

    fn table_mut(&mut self, class: TtlClass) -> &mut Table {
        match class {
            TtlClass::Answer => &mut self.answers,
            TtlClass::Documentation => &mut self.documentation,
        }
    }

    pub fn get(&mut self, input: &str, class: TtlClass) -> Option<Value> {
        self.get_at(input, class, Utc::now())
    }

    pub fn get_at(&mut self, input: &str, class: TtlClass, now: DateTime<Utc>) -> Option<Value> {
        let key = cache_key(input, class);
        let table = self.table_mut(class);

        let entry = table.entries.get(&key)?;
        if table.is_valid(entry, now) {
            debug!(class = class.as_str(), input = %preview(input), "cache hit");
            return Some(entry.payload.clone());
        }

        table.entries.remove(&key);
        table.save();
        debug!(class = class.as_str(), input = %preview(input), "cache entry expired, removed");
        None
    }

    pub fn set(&mut self, input: &str, class: TtlClass, payload: Value) {
        self.set_at(input, class, payload, Utc::now());
    }

    pub fn set_at(&mut self, input: &str, class: TtlClass, payload: Value, now: DateTime<Utc>) {
        let key = cache_key(input, class);
        let table = self.table_mut(class);
        table.entries.insert(
            key,
            CacheEntry {
                created_at: now,
                ttl_class: class,
                input: normalize(input),
                payload,
            },
        );
        table.save();
        debug!(class = class.as_str(), input = %preview(input), "cached");
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        CacheStats {
            answer: self.table(TtlClass::Answer).stats(now),
            documentation: self.table(TtlClass::Documentation).stats(now),
        }
    }

    pub fn clear(&mut self, scope: ClearScope) -> Result<()> {
        if matches!(scope, ClearScope::All | ClearScope::Answers) {
            self.answers.entries.clear();
            crate::persist::write_json_atomic(&self.answers.path, &self.answers.entries)?;
        }
        if matches!(scope, ClearScope::All | ClearScope::Documentation) {
            self.documentation.entries.clear();
            crate::persist::write_json_atomic(
                &self.documentation.path,
                &self.documentation.entries,
            )?;
        }
        info!(?scope, "cache cleared");
        Ok(())
    }
}

/// Trim and collapse runs of whitespace. Case is preserved.
pub fn normalize(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content-addressed key: blake3 of `"{class}:{normalized input}"`.
pub fn cache_key(input: &str, class: TtlClass) -> String {
    let material = format!("{}:{}", class.as_str(), normalize(input));
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

fn preview(input: &str) -> String {
    input.chars().take(50).collect()
}
