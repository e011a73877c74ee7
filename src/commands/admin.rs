use tracing::info;

use super::{is_admin, send_chunked};
use crate::cache::{ClearScope, TableStats};
use crate::state::Context;

const TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum Scope {
    #[name = "all"]
    All,
    #[name = "answers"]
    Answers,
    #[name = "documentation"]
    Documentation,
}

impl Scope {
    fn as_str(self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Answers => "answers",
            Scope::Documentation => "documentation",
        }
    }
}

impl From<Scope> for ClearScope {
    fn from(s: Scope) -> Self {
        match s {
            Scope::All => ClearScope::All,
            Scope::Answers => ClearScope::Answers,
            Scope::Documentation => ClearScope::Documentation,
        }
    }
}

fn table_line(name: &str, t: &TableStats) -> String {
    format!(
        "`{}`: {} valid / {} total (ttl {}s)\n",
        name, t.valid_entries, t.total_entries, t.ttl_seconds
    )
}

/// Usage and cache statistics (admin only)
#[poise::command(slash_command)]
pub async fn stats(ctx: Context<'_>) -> Result<(), anyhow::Error> {
    if !is_admin(&ctx) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    let cache = ctx.data().assistant.cache_stats().await;
    let mut out = String::from("**Cache**\n");
    out.push_str(&table_line("answers", &cache.answer));
    out.push_str(&table_line("documentation", &cache.documentation));

    {
        let analytics = ctx.data().analytics.lock().await;
        let feedback = analytics.feedback_summary();
        out.push_str(&format!(
            "\n**Queries:** {}\n**Feedback:** {} positive, {} negative\n",
            analytics.total_queries(),
            feedback.positive,
            feedback.negative
        ));

        let top = analytics.top_queries(TOP_LIMIT);
        if !top.is_empty() {
            out.push_str("\n**Top questions**\n");
            for q in top {
                out.push_str(&format!("- ({}) {}\n", q.count, q.question));
            }
        }

        let unanswered = analytics.unanswered(TOP_LIMIT);
        if !unanswered.is_empty() {
            out.push_str("\n**Unanswered**\n");
            for (question, u) in unanswered {
                let last = u
                    .last_seen
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                out.push_str(&format!("- ({}) {} _last {}_\n", u.count, question, last));
            }
        }
    }

    send_chunked(&ctx, &out).await
}

/// Clear cached answers or documentation (admin only)
#[poise::command(slash_command)]
pub async fn clear_cache(
    ctx: Context<'_>,
    #[description = "Which cache to clear"] scope: Scope,
) -> Result<(), anyhow::Error> {
    if !is_admin(&ctx) {
        ctx.say("This command is admin-only.").await?;
        return Ok(());
    }

    ctx.data().assistant.clear_cache(scope.into()).await?;
    info!(user = ctx.author().name, ?scope, "cache cleared by admin");
    ctx.say(format!("Cleared `{}` cache.", scope.as_str())).await?;
    Ok(())
}
