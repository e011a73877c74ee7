mod admin;
mod ask;
mod explain;
mod feedback;

use crate::assistant::citations::Source;
use crate::state::Context;

/// Discord message limit, less a small margin.
const CHUNK_LIMIT: usize = 1990;

/// ZentrumHub Hotel API documentation assistant
#[poise::command(
    slash_command,
    subcommands(
        "ask::ask",
        "explain::explain",
        "feedback::feedback",
        "admin::stats",
        "admin::clear_cache"
    )
)]
pub async fn docs(_ctx: Context<'_>) -> Result<(), anyhow::Error> {
    Ok(())
}

pub(crate) fn is_admin(ctx: &Context<'_>) -> bool {
    ctx.data().is_admin(ctx.author().id.get())
}

/// Markdown list of sources as clickable links.
fn render_sources(sources: &[Source]) -> String {
    let mut out = String::from("**Sources:**\n");
    for s in sources {
        out.push_str(&format!("- [{}]({}) ({})\n", s.title, s.url, s.section));
    }
    out
}

/// Split `text` into pieces of at most `limit` bytes, preferring line then
/// word boundaries and never cutting inside a character.
fn chunks(text: &str, limit: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= limit {
            out.push(remaining);
            break;
        }
        let mut cut = limit;
        while !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        let split_at = remaining[..cut]
            .rfind('\n')
            .or_else(|| remaining[..cut].rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(cut);
        out.push(&remaining[..split_at]);
        remaining = &remaining[split_at..];
    }
    out
}

/// Send a message in Discord-safe chunks.
/// poise routes follow-ups through the interaction webhook, so this works
/// without Send Messages permission in the channel.
async fn send_chunked(ctx: &Context<'_>, text: &str) -> Result<(), anyhow::Error> {
    for chunk in chunks(text, CHUNK_LIMIT) {
        ctx.say(chunk).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunks_prefer_newlines() {
        let text = format!("{}\n{}", "a".repeat(15), "b".repeat(10));
        let parts = chunks(&text, 20);
        assert_eq!(parts, vec![format!("{}\n", "a".repeat(15)), "b".repeat(10)]);
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        let text = "é".repeat(30);
        let parts = chunks(&text, 7);
        assert!(parts.iter().all(|p| p.len() <= 7));
        assert_eq!(parts.concat(), text);
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        assert_eq!(chunks("hello", CHUNK_LIMIT), vec!["hello"]);
        assert!(chunks("", CHUNK_LIMIT).is_empty());
    }

    #[test]
    fn test_render_sources() {
        let out = render_sources(&[Source {
            title: "cancel_api".into(),
            section: "knowledge-base.json".into(),
            url: "https://docs.example.com/docs".into(),
            snippet: String::new(),
        }]);
        assert!(out.contains("- [cancel_api](https://docs.example.com/docs) (knowledge-base.json)"));
    }
}
