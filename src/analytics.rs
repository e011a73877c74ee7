use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assistant::Confidence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, poise::ChoiceParameter)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    #[name = "positive"]
    Positive,
    #[name = "negative"]
    Negative,
}

/// A user's rating of one answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub message_id: String,
    pub conversation_id: String,
    pub question: String,
    pub answer: String,
    pub feedback: Rating,
    pub confidence: Confidence,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Unanswered {
    pub count: u64,
    pub first_seen: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryCount {
    pub question: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeedbackSummary {
    pub positive: usize,
    pub negative: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Data {
    #[serde(default)]
    queries: BTreeMap<String, u64>,
    #[serde(default)]
    client_queries: BTreeMap<String, BTreeMap<String, u64>>,
    #[serde(default)]
    unanswered: BTreeMap<String, Unanswered>,
    #[serde(default)]
    feedback: Vec<FeedbackEntry>,
}

/// Query counters and feedback, persisted to a single JSON file.
///
/// Logging never fails the caller: a failed save is only warned about.
pub struct Analytics {
    path: PathBuf,
    data: Data,
}

impl Analytics {
    pub fn open(path: PathBuf) -> Self {
        let data = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), "Could not load analytics, starting empty: {}", e);
                Data::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Data::default(),
            Err(e) => {
                warn!(path = %path.display(), "Could not read analytics, starting empty: {}", e);
                Data::default()
            }
        };
        Self { path, data }
    }

    fn save(&self) {
        if let Err(e) = crate::persist::write_json_atomic(&self.path, &self.data) {
            warn!(path = %self.path.display(), "Could not save analytics: {:#}", e);
        }
    }

    pub fn log_query(&mut self, question: &str, confidence: Confidence, client_id: &str) {
        self.log_query_at(question, confidence, client_id, Utc::now());
    }

    fn log_query_at(
        &mut self,
        question: &str,
        confidence: Confidence,
        client_id: &str,
        now: DateTime<Utc>,
    ) {
        *self.data.queries.entry(question.to_string()).or_default() += 1;
        *self
            .data
            .client_queries
            .entry(client_id.to_string())
            .or_default()
            .entry(question.to_string())
            .or_default() += 1;

        if confidence == Confidence::Low {
            let entry = self
                .data
                .unanswered
                .entry(question.to_string())
                .or_default();
            entry.count += 1;
            entry.first_seen.get_or_insert(now);
            entry.last_seen = Some(now);
        }
        debug!(client_id, ?confidence, "query logged");
        self.save();
    }

    pub fn log_feedback(&mut self, entry: FeedbackEntry) {
        debug!(message_id = %entry.message_id, feedback = ?entry.feedback, "feedback logged");
        self.data.feedback.push(entry);
        self.save();
    }

    pub fn total_queries(&self) -> u64 {
        self.data.queries.values().sum()
    }

    /// Most-asked questions, most frequent first.
    pub fn top_queries(&self, limit: usize) -> Vec<QueryCount> {
        let mut counts: Vec<QueryCount> = self
            .data
            .queries
            .iter()
            .map(|(q, c)| QueryCount {
                question: q.clone(),
                count: *c,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.truncate(limit);
        counts
    }

    /// Questions that got low-confidence answers, most frequent first.
    pub fn unanswered(&self, limit: usize) -> Vec<(String, Unanswered)> {
        let mut items: Vec<(String, Unanswered)> = self
            .data
            .unanswered
            .iter()
            .map(|(q, u)| (q.clone(), u.clone()))
            .collect();
        items.sort_by(|a, b| b.1.count.cmp(&a.1.count));
        items.truncate(limit);
        items
    }

    pub fn feedback_summary(&self) -> FeedbackSummary {
        let positive = self
            .data
            .feedback
            .iter()
            .filter(|f| f.feedback == Rating::Positive)
            .count();
        FeedbackSummary {
            positive,
            negative: self.data.feedback.len() - positive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_unanswered() {
        let dir = tempfile::tempdir().unwrap();
        let mut analytics = Analytics::open(dir.path().join("analytics.json"));

        analytics.log_query("how to cancel", Confidence::High, "c1");
        analytics.log_query("how to cancel", Confidence::High, "c2");
        analytics.log_query("what is foo", Confidence::Low, "c1");

        assert_eq!(analytics.total_queries(), 3);
        let top = analytics.top_queries(10);
        assert_eq!(top[0].question, "how to cancel");
        assert_eq!(top[0].count, 2);

        let unanswered = analytics.unanswered(10);
        assert_eq!(unanswered.len(), 1);
        assert_eq!(unanswered[0].0, "what is foo");
        assert_eq!(unanswered[0].1.count, 1);
        assert!(unanswered[0].1.first_seen.is_some());
    }

    #[test]
    fn test_unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        // a directory at the analytics path cannot be read as a file
        let analytics = Analytics::open(dir.path().to_path_buf());
        assert_eq!(analytics.total_queries(), 0);
        assert_eq!(analytics.feedback_summary(), FeedbackSummary::default());
    }

    #[test]
    fn test_first_seen_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut analytics = Analytics::open(dir.path().join("analytics.json"));
        let t0 = Utc::now();
        let t1 = t0 + chrono::Duration::minutes(5);
        analytics.log_query_at("q", Confidence::Low, "c", t0);
        analytics.log_query_at("q", Confidence::Low, "c", t1);

        let (_, u) = &analytics.unanswered(1)[0];
        assert_eq!(u.count, 2);
        assert_eq!(u.first_seen, Some(t0));
        assert_eq!(u.last_seen, Some(t1));
    }

    #[test]
    fn test_feedback_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analytics.json");
        {
            let mut analytics = Analytics::open(path.clone());
            analytics.log_query("q", Confidence::High, "c");
            for (i, rating) in [Rating::Positive, Rating::Negative, Rating::Positive]
                .into_iter()
                .enumerate()
            {
                analytics.log_feedback(FeedbackEntry {
                    message_id: format!("m{}", i),
                    conversation_id: "conv".into(),
                    question: "how to cancel a booking".into(),
                    answer: "Use the Cancel API".into(),
                    feedback: rating,
                    confidence: Confidence::High,
                    timestamp: Utc::now(),
                });
            }
        }

        let analytics = Analytics::open(path);
        assert_eq!(analytics.total_queries(), 1);
        assert_eq!(
            analytics.feedback_summary(),
            FeedbackSummary {
                positive: 2,
                negative: 1
            }
        );
    }
}
