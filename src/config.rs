use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

pub struct Settings {
    pub discord_token: String,
    pub guild_id: Option<u64>,
    pub admin_ids: HashSet<u64>,
    pub llm: LlmSettings,
    /// Knowledge-base files, searched in order.
    pub knowledge_bases: Vec<PathBuf>,
    /// File that fetched pages are saved into.
    pub dynamic_knowledge_base: PathBuf,
    pub persist_fetched: bool,
    pub docs_base_url: String,
    pub docs_timeout_secs: u64,
    pub cache_dir: PathBuf,
    pub answer_ttl_secs: u64,
    pub documentation_ttl_secs: u64,
    pub analytics_path: PathBuf,
    /// Number of local documents passed to the model.
    pub top_k: usize,
}

impl Settings {
    /// Read settings from the process environment and `.env`.
    pub fn from_env() -> Result<Self> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| dotenv::var(key).ok().filter(|v| !v.is_empty()))
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let parsed = |key: &str, default: u64| -> Result<u64> {
            match get(key) {
                Some(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("{} must be a number, got {:?}", key, v)),
                None => Ok(default),
            }
        };

        let discord_token = get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN required"))?;
        let api_key = get("LLM_API_KEY")
            .or_else(|| get("GEMINI_API_KEY"))
            .ok_or_else(|| anyhow!("LLM_API_KEY (or GEMINI_API_KEY) required"))?;

        let guild_id = get("DISCORD_GUILD_ID").and_then(|s| s.trim().parse::<u64>().ok());
        let admin_ids = get("ADMIN_USER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let temperature: f32 = match get("LLM_TEMPERATURE") {
            Some(v) => v
                .trim()
                .parse()
                .with_context(|| format!("LLM_TEMPERATURE must be a number, got {:?}", v))?,
            None => 0.7,
        };

        let llm = LlmSettings {
            base_url: or(
                "LLM_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta/openai",
            ),
            model: or("LLM_MODEL", "gemini-2.5-pro"),
            api_key,
            temperature,
            max_tokens: u32::try_from(parsed("LLM_MAX_TOKENS", 8192)?)
                .context("LLM_MAX_TOKENS is out of range")?,
            timeout_secs: parsed("LLM_TIMEOUT_SECS", 60)?,
        };

        let knowledge_bases = or(
            "KNOWLEDGE_BASE_PATHS",
            "knowledge-base.json,knowledge-base-extended.json,knowledge-base-rooms-rates.json",
        )
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();

        let persist_fetched = matches!(
            get("PERSIST_FETCHED_DOCS").as_deref().map(str::trim),
            Some("1" | "true" | "yes")
        );

        Ok(Self {
            discord_token,
            guild_id,
            admin_ids,
            llm,
            knowledge_bases,
            dynamic_knowledge_base: PathBuf::from(or(
                "DYNAMIC_KNOWLEDGE_BASE_PATH",
                "knowledge-base-dynamic.json",
            )),
            persist_fetched,
            docs_base_url: or("DOCS_BASE_URL", "https://docs-hotel.prod.zentrumhub.com"),
            docs_timeout_secs: parsed("DOCS_TIMEOUT_SECS", 10)?,
            cache_dir: PathBuf::from(or("CACHE_DIR", "cache")),
            answer_ttl_secs: parsed("ANSWER_CACHE_TTL_SECS", 3600)?,
            documentation_ttl_secs: parsed("DOC_CACHE_TTL_SECS", 1800)?,
            analytics_path: PathBuf::from(or("ANALYTICS_PATH", "analytics.json")),
            top_k: usize::try_from(parsed("TOP_K_DOCUMENTS", 3)?)
                .context("TOP_K_DOCUMENTS is out of range")?,
        })
    }
}
