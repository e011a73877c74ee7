use tracing::info;

use super::{render_sources, send_chunked};
use crate::state::Context;

/// Explain an API error code or message
#[poise::command(slash_command)]
pub async fn explain(
    ctx: Context<'_>,
    #[description = "Error code or message, e.g. 4004"] error: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;
    info!(user = ctx.author().name, error, "explanation requested");

    let explanation = ctx.data().assistant.explain(&error).await?;

    let mut full = format!(
        "**Error:** `{}`\n**Confidence:** {}\n\n{}\n",
        error,
        explanation.confidence.as_str(),
        explanation.summary
    );
    if !explanation.details.is_empty() {
        full.push_str("\n**Details**\n");
        for d in &explanation.details {
            full.push_str(&format!("- {}\n", d));
        }
    }
    full.push_str("\n**Recommended Actions**\n");
    for (i, a) in explanation.recommended_actions.iter().enumerate() {
        full.push_str(&format!("{}. {}\n", i + 1, a));
    }
    if !explanation.sources.is_empty() {
        full.push('\n');
        full.push_str(&render_sources(&explanation.sources));
    }

    send_chunked(&ctx, &full).await
}
