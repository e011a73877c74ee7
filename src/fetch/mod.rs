pub mod pages;
pub mod routes;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pages::PageSource;
use routes::Section;

/// Title of the aggregate document built for error-code questions.
pub const ERROR_DOC_TITLE: &str = "ZentrumHub API Error Codes";
/// Fixed score of the aggregate error document.
pub const ERROR_DOC_SCORE: u32 = 100;

/// A page fetched from the live documentation site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDoc {
    pub title: String,
    pub url: String,
    pub content: String,
    pub section: Section,
    pub score: u32,
}

impl LiveDoc {
    pub fn context_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }
}

/// Header that separates pages inside the aggregate error document.
pub fn section_marker(title: &str) -> String {
    format!("=== {} ===", title)
}

/// Maps questions to documentation pages and retrieves them.
pub struct LiveFetcher {
    pages: Arc<dyn PageSource>,
    base_url: String,
}

impl LiveFetcher {
    pub fn new(pages: Arc<dyn PageSource>, base_url: &str) -> Self {
        Self {
            pages,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn page_url(&self, section: Section, slug: &str) -> String {
        format!("{}/{}/{}", self.base_url, section.path(), slug)
    }

    /// Landing page of the guides section, used when a citation has no URL.
    pub fn docs_home(&self) -> String {
        format!("{}/{}", self.base_url, Section::Guides.path())
    }

    /// Fetch the page that best answers `query`.
    ///
    /// Error-code questions bypass keyword routing and aggregate every page
    /// that carries error tables. Returns `None` when nothing routes or the
    /// fetch fails; failures are logged, never returned.
    pub async fn fetch(&self, query: &str) -> Option<LiveDoc> {
        if routes::is_error_query(query) {
            return self.fetch_error_pages().await;
        }

        let Some(route) = routes::route(query) else {
            debug!(query, "no documentation page matches");
            return None;
        };

        let url = self.page_url(route.section, route.slug);
        debug!(
            section = ?route.section,
            keyword = route.keyword,
            score = route.score,
            %url,
            "routing question to documentation page"
        );

        match self.pages.fetch_text(&url).await {
            Ok(content) => {
                info!(%url, size = content.len(), "fetched live documentation");
                Some(LiveDoc {
                    title: routes::page_title(route.slug),
                    url,
                    content,
                    section: route.section,
                    score: route.score,
                })
            }
            Err(e) => {
                warn!(%url, "Error fetching documentation: {:#}", e);
                None
            }
        }
    }

    async fn fetch_error_pages(&self) -> Option<LiveDoc> {
        let mut parts = Vec::new();
        for slug in routes::ERROR_PAGES {
            let url = self.page_url(Section::Guides, slug);
            match self.pages.fetch_text(&url).await {
                Ok(text) => {
                    parts.push(format!(
                        "{}\n{}",
                        section_marker(&routes::page_title(slug)),
                        text
                    ));
                }
                Err(e) => warn!(%url, "Skipping error page: {:#}", e),
            }
        }

        if parts.is_empty() {
            warn!("no error documentation page could be fetched");
            return None;
        }

        info!(pages = parts.len(), "aggregated error documentation");
        Some(LiveDoc {
            title: ERROR_DOC_TITLE.to_string(),
            url: self.docs_home(),
            content: parts.join("\n\n"),
            section: Section::Guides,
            score: ERROR_DOC_SCORE,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    /// In-memory pages keyed by URL; records every request.
    #[derive(Default)]
    pub struct FakePages {
        pub pages: HashMap<String, String>,
        pub requested: Mutex<Vec<String>>,
    }

    impl FakePages {
        pub fn with(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(u, t)| (u.to_string(), t.to_string()))
                    .collect(),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for FakePages {
        async fn fetch_text(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("404 for {}", url))
        }
    }

    const BASE: &str = "https://docs.test";

    #[tokio::test]
    async fn test_fetch_routes_to_reference_page() {
        let url = "https://docs.test/reference/post_api-hotel-hotelid-roomsandrates";
        let pages = Arc::new(FakePages::with(&[(url, "hotelId (string, required)")]));
        let fetcher = LiveFetcher::new(pages.clone(), BASE);

        let doc = fetcher
            .fetch("what fields are required for rooms and rates")
            .await
            .unwrap();
        assert_eq!(doc.url, url);
        assert_eq!(doc.section, Section::Reference);
        assert_eq!(doc.title, "Post Api Hotel Hotelid Roomsandrates");
        assert_eq!(pages.requests(), vec![url.to_string()]);
    }

    #[tokio::test]
    async fn test_unrouted_query_makes_no_request() {
        let pages = Arc::new(FakePages::default());
        let fetcher = LiveFetcher::new(pages.clone(), BASE);
        assert!(fetcher.fetch("tell me a joke").await.is_none());
        assert!(pages.requests().is_empty());
    }

    #[tokio::test]
    async fn test_failed_page_returns_none() {
        let pages = Arc::new(FakePages::default());
        let fetcher = LiveFetcher::new(pages.clone(), BASE);
        assert!(fetcher.fetch("how to cancel").await.is_none());
        assert_eq!(pages.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_error_query_aggregates_pages() {
        let pages = Arc::new(FakePages::with(&[
            ("https://docs.test/docs/search-api", "4001 validation failed"),
            ("https://docs.test/docs/book-api", "4004 sold out"),
            ("https://docs.test/docs/cancel-api", "4007 duplicate"),
        ]));
        let fetcher = LiveFetcher::new(pages.clone(), BASE);

        let doc = fetcher.fetch("error 4004").await.unwrap();
        assert_eq!(doc.title, ERROR_DOC_TITLE);
        assert_eq!(doc.score, ERROR_DOC_SCORE);
        assert_eq!(doc.url, "https://docs.test/docs");
        assert!(doc.content.contains(&section_marker("Search Api")));
        assert!(doc.content.contains(&section_marker("Book Api")));
        assert!(doc.content.contains(&section_marker("Cancel Api")));
        assert!(!doc.content.contains(&section_marker("Price Api")));
        assert!(doc.content.contains("4004 sold out"));
        // every error page attempted, failures skipped
        assert_eq!(pages.requests().len(), routes::ERROR_PAGES.len());
    }

    #[tokio::test]
    async fn test_error_query_with_no_pages_is_none() {
        let fetcher = LiveFetcher::new(Arc::new(FakePages::default()), BASE);
        assert!(fetcher.fetch("what does 5000 mean").await.is_none());
    }
}
