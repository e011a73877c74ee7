pub mod citations;
pub mod explain;
pub mod prompts;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheStats, ClearScope, TtlClass};
use crate::docs::types::{Document, ScoredMatch};
use crate::docs::ContentStore;
use crate::fetch::{LiveDoc, LiveFetcher, ERROR_DOC_TITLE};
use crate::llm::Generate;

use citations::Source;

/// Phrases showing the model could not answer from the documentation.
/// Responses containing any of them are low confidence and never cached.
const NOT_FOUND_PATTERNS: &[&str] = &[
    "not available in the current documentation",
    "not found in the documentation",
    "not covered in the documentation",
    "not mentioned in the documentation",
    "does not contain information",
    "doesn't contain information",
    "no information about",
    "i couldn't find",
    "i could not find",
    "unable to find",
    "i don't have information",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

impl Confidence {
    /// Low when the text admits the documentation did not cover the question.
    pub fn of(text: &str) -> Self {
        let lower = text.to_lowercase();
        if NOT_FOUND_PATTERNS.iter().any(|p| lower.contains(p)) {
            Confidence::Low
        } else {
            Confidence::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    LocalKnowledgeBase,
    LiveDocumentation,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub confidence: Confidence,
    pub sources: Vec<Source>,
    pub relevant_docs: usize,
    pub source_type: SourceType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    pub details: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub sources: Vec<Source>,
    pub confidence: Confidence,
}

/// A document selected as grounding for the prompt.
#[derive(Debug, Clone)]
pub struct ContextDoc {
    pub key: String,
    pub text: String,
    pub section: String,
    pub url: Option<String>,
}

impl From<ScoredMatch> for ContextDoc {
    fn from(m: ScoredMatch) -> Self {
        Self {
            key: m.document_key,
            text: m.content,
            section: m.source_file,
            url: m.url,
        }
    }
}

impl From<&LiveDoc> for ContextDoc {
    fn from(doc: &LiveDoc) -> Self {
        Self {
            key: doc.title.clone(),
            text: doc.context_text(),
            section: "live_docs".to_string(),
            url: Some(doc.url.clone()),
        }
    }
}

struct Retrieved {
    contexts: Vec<ContextDoc>,
    source_type: SourceType,
}

pub struct AssistantOptions {
    /// Local documents passed to the model.
    pub top_k: usize,
    /// Save fetched pages into the dynamic knowledge base.
    pub persist_fetched: bool,
}

/// Answers questions from local knowledge bases, falling back to the live
/// documentation site, and caches what it generates.
pub struct Assistant {
    store: ContentStore,
    fetcher: LiveFetcher,
    cache: Mutex<Cache>,
    llm: Arc<dyn Generate>,
    options: AssistantOptions,
}

impl Assistant {
    pub fn new(
        store: ContentStore,
        fetcher: LiveFetcher,
        cache: Cache,
        llm: Arc<dyn Generate>,
        options: AssistantOptions,
    ) -> Self {
        Self {
            store,
            fetcher,
            cache: Mutex::new(cache),
            llm,
            options,
        }
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.lock().await.stats()
    }

    pub async fn clear_cache(&self, scope: ClearScope) -> Result<()> {
        self.cache.lock().await.clear(scope)
    }

    pub async fn answer_question(&self, question: &str) -> Result<Answer> {
        let cache_input = format!("question:{}", question);
        if let Some(hit) = self.cached::<Answer>(&cache_input, TtlClass::Answer).await {
            info!(question, "answer served from cache");
            return Ok(hit);
        }

        let Some(retrieved) = self.retrieve(question).await else {
            info!(question, "no documentation found");
            return Ok(Answer {
                answer: format!(
                    "I couldn't find documentation for this question. Please make sure it is \
                     about the ZentrumHub Hotel API, or browse {} directly.",
                    self.fetcher.docs_home()
                ),
                confidence: Confidence::Low,
                sources: vec![],
                relevant_docs: 0,
                source_type: SourceType::None,
            });
        };

        let prompt = prompts::answer_prompt(question, &retrieved.contexts);
        let text = self.generate(&prompt).await?;
        let confidence = Confidence::of(&text);

        let answer = Answer {
            sources: citations::build_sources(
                &retrieved.contexts,
                &text,
                &self.fetcher.docs_home(),
            ),
            relevant_docs: retrieved.contexts.len(),
            source_type: retrieved.source_type,
            confidence,
            answer: text,
        };

        if confidence == Confidence::High {
            self.store_cached(&cache_input, TtlClass::Answer, &answer).await;
        } else {
            debug!(question, "low-confidence answer not cached");
        }

        info!(
            question,
            confidence = confidence.as_str(),
            source_type = ?answer.source_type,
            relevant_docs = answer.relevant_docs,
            "answer generated"
        );
        Ok(answer)
    }

    pub async fn explain(&self, error_content: &str) -> Result<Explanation> {
        let cache_input = format!("explain:{}", error_content);
        if let Some(hit) = self.cached::<Explanation>(&cache_input, TtlClass::Answer).await {
            info!(error_content, "explanation served from cache");
            return Ok(hit);
        }

        let query = format!("error {}", error_content);
        let Some(retrieved) = self.retrieve(&query).await else {
            info!(error_content, "no error documentation found");
            return Ok(Explanation {
                summary: format!(
                    "Error code not found in documentation. Check the code, or browse {}.",
                    self.fetcher.docs_home()
                ),
                details: vec![],
                recommended_actions: explain::FALLBACK_ACTIONS
                    .iter()
                    .map(|a| a.to_string())
                    .collect(),
                sources: vec![],
                confidence: Confidence::Low,
            });
        };

        let prompt = prompts::explain_prompt(error_content, &retrieved.contexts);
        let text = self.generate(&prompt).await?;
        let confidence = Confidence::of(&text);
        let parsed = explain::parse(&text);

        let explanation = Explanation {
            summary: parsed.summary,
            details: parsed.details,
            recommended_actions: parsed.recommended_actions,
            sources: citations::build_sources(
                &retrieved.contexts,
                &text,
                &self.fetcher.docs_home(),
            ),
            confidence,
        };

        if confidence == Confidence::High {
            self.store_cached(&cache_input, TtlClass::Answer, &explanation).await;
        }

        info!(
            error_content,
            confidence = confidence.as_str(),
            details = explanation.details.len(),
            "error explained"
        );
        Ok(explanation)
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(prompt_len = prompt.len(), "calling LLM");
        self.llm
            .generate(prompt)
            .await
            .context("LLM generation failed")
    }

    /// Local search first; any hit wins. Otherwise the live site, through
    /// the documentation cache.
    async fn retrieve(&self, query: &str) -> Option<Retrieved> {
        let local = self.store.search(query, self.options.top_k);
        if let Some(top) = local.first() {
            debug!(
                query,
                top = %top.title,
                score = top.score,
                hits = local.len(),
                "using local knowledge base"
            );
            return Some(Retrieved {
                contexts: local.into_iter().map(ContextDoc::from).collect(),
                source_type: SourceType::LocalKnowledgeBase,
            });
        }

        let live = match self.cached::<LiveDoc>(query, TtlClass::Documentation).await {
            Some(doc) => doc,
            None => {
                let doc = self.fetcher.fetch(query).await?;
                self.cache_documentation(query, &doc).await;
                doc
            }
        };

        debug!(query, title = %live.title, section = ?live.section, "using live documentation");
        Some(Retrieved {
            contexts: vec![ContextDoc::from(&live)],
            source_type: SourceType::LiveDocumentation,
        })
    }

    async fn cache_documentation(&self, query: &str, doc: &LiveDoc) {
        self.store_cached(query, TtlClass::Documentation, doc).await;

        // The error aggregate is query-specific; only real pages are saved.
        if self.options.persist_fetched && doc.title != ERROR_DOC_TITLE {
            let document = Document::fetched(&doc.title, &doc.url, &doc.content);
            if let Err(e) = self.store.save_fetched(&document) {
                warn!(title = %doc.title, "Could not save fetched document: {:#}", e);
            }
        }
    }

    async fn cached<T: DeserializeOwned>(&self, input: &str, class: TtlClass) -> Option<T> {
        let value = self.cache.lock().await.get(input, class)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring unreadable cache entry: {}", e);
                None
            }
        }
    }

    async fn store_cached<T: Serialize>(&self, input: &str, class: TtlClass, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.cache.lock().await.set(input, class, v),
            Err(e) => warn!("Could not serialize value for cache: {}", e),
        }
    }
}
