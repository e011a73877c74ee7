use tracing::info;

use super::{render_sources, send_chunked};
use crate::state::Context;

/// Ask a question about the ZentrumHub Hotel API
#[poise::command(slash_command)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Your question"] question: String,
) -> Result<(), anyhow::Error> {
    ctx.defer().await?;

    let client_id = ctx.author().id.to_string();
    info!(user = ctx.author().name, question, "question received");

    let answer = ctx.data().assistant.answer_question(&question).await?;

    ctx.data()
        .analytics
        .lock()
        .await
        .log_query(&question, answer.confidence, &client_id);

    let mut full = format!(
        "**Q:** {}\n**Confidence:** {}\n\n{}",
        question,
        answer.confidence.as_str(),
        answer.answer
    );
    if !answer.sources.is_empty() {
        full.push_str("\n\n");
        full.push_str(&render_sources(&answer.sources));
    }

    send_chunked(&ctx, &full).await
}
