use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ContextDoc;

const SNIPPET_CHARS: usize = 150;

/// A citation attached to a response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    /// Store file name for local documents, `live_docs` for fetched pages.
    pub section: String,
    pub url: String,
    pub snippet: String,
}

/// First 150 characters of the answer, with `...` when cut.
pub fn snippet(answer: &str) -> String {
    if answer.chars().count() > SNIPPET_CHARS {
        let head: String = answer.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", head)
    } else {
        answer.to_string()
    }
}

/// Extract every HTTP(S) URL from a string, trailing punctuation trimmed.
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut urls = Vec::new();
    let mut rest = text;
    loop {
        let start = match (rest.find("https://"), rest.find("http://")) {
            (Some(a), Some(b)) => a.min(b),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => break,
        };
        let url_part = &rest[start..];
        let end = url_part
            .find(|c: char| c.is_whitespace() || matches!(c, ')' | ']' | '>' | '"' | '`'))
            .unwrap_or(url_part.len());
        let url = url_part[..end].trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'));
        if url.len() > 10 {
            urls.push(url.to_string());
        }
        rest = &url_part[end..];
    }
    urls
}

/// Build citations for an answer.
///
/// - every context document becomes a source, using its own URL or `docs_home`
/// - documentation URLs the model cited in its answer (same host as
///   `docs_home`) are added after them
/// - duplicates by URL and title are dropped
pub fn build_sources(contexts: &[ContextDoc], answer: &str, docs_home: &str) -> Vec<Source> {
    let snippet = snippet(answer);
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for doc in contexts {
        let url = doc.url.clone().unwrap_or_else(|| docs_home.to_string());
        if !seen.insert((doc.key.clone(), url.clone())) {
            continue;
        }
        sources.push(Source {
            title: doc.key.clone(),
            section: doc.section.clone(),
            url,
            snippet: snippet.clone(),
        });
    }

    let host = host_of(docs_home);
    let known: HashSet<String> = sources.iter().map(|s| s.url.clone()).collect();
    for url in extract_urls(answer) {
        if host.is_none() || host_of(&url) != host || known.contains(&url) {
            continue;
        }
        // Short label from the URL path
        let label = url
            .rsplit('/')
            .find(|s| !s.is_empty())
            .unwrap_or(&url)
            .to_string();
        if !seen.insert((label.clone(), url.clone())) {
            continue;
        }
        sources.push(Source {
            title: label,
            section: "cited".to_string(),
            url,
            snippet: snippet.clone(),
        });
    }

    sources
}

fn host_of(url: &str) -> Option<&str> {
    let after_scheme = url.split_once("://")?.1;
    after_scheme.split('/').next().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(key: &str, section: &str, url: Option<&str>) -> ContextDoc {
        ContextDoc {
            key: key.into(),
            text: String::new(),
            section: section.into(),
            url: url.map(str::to_string),
        }
    }

    const HOME: &str = "https://docs.example.com/docs";

    #[test]
    fn test_snippet_truncates() {
        let long = "a".repeat(200);
        let s = snippet(&long);
        assert_eq!(s.len(), 153);
        assert!(s.ends_with("..."));
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_local_docs_use_docs_home() {
        let sources = build_sources(
            &[ctx("cancel_api", "knowledge-base.json", None)],
            "Use the Cancel API.",
            HOME,
        );
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].title, "cancel_api");
        assert_eq!(sources[0].section, "knowledge-base.json");
        assert_eq!(sources[0].url, HOME);
        assert_eq!(sources[0].snippet, "Use the Cancel API.");
    }

    #[test]
    fn test_cited_urls_added_once() {
        let answer = "See https://docs.example.com/reference/post_api-hotel-booking. \
                      Also (https://docs.example.com/docs/cancel-api) and https://other.com/x/y \
                      and again https://docs.example.com/reference/post_api-hotel-booking";
        let sources = build_sources(
            &[ctx("Cancel Api", "live_docs", Some("https://docs.example.com/docs/cancel-api"))],
            answer,
            HOME,
        );
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].title, "post_api-hotel-booking");
        assert_eq!(sources[1].section, "cited");
    }

    #[test]
    fn test_extract_urls() {
        let urls = extract_urls("a https://x.io/a/b, then `http://y.io/c`.");
        assert_eq!(urls, vec!["https://x.io/a/b", "http://y.io/c"]);
        assert!(extract_urls("no links").is_empty());
    }
}
