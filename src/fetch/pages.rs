use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

/// Retrieves a documentation page as plain text.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fails on transport errors and non-2xx responses.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// Fetches pages over HTTP and reduces HTML to text.
pub struct HttpPages {
    client: reqwest::Client,
}

impl HttpPages {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPages {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch URL")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("GET {} returned {}", url, status);
        }

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = resp.bytes().await.context("Failed to read response body")?;

        // Convert HTML to text if applicable
        let text = if content_type.contains("html") {
            html_to_text(&body)
        } else {
            String::from_utf8_lossy(&body).to_string()
        };
        Ok(text)
    }
}

/// Plain text of an HTML page, with blank lines and indentation squeezed out.
pub fn html_to_text(html: &[u8]) -> String {
    let raw = html2text::from_read(html, 120)
        .unwrap_or_else(|_| String::from_utf8_lossy(html).to_string());
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
