mod analytics;
mod assistant;
mod cache;
mod commands;
mod config;
mod docs;
mod fetch;
mod llm;
mod persist;
mod state;

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use poise::{Framework, FrameworkOptions};
use tokio::sync::Mutex;
use tracing::{error, info, Level};

use analytics::Analytics;
use assistant::{Assistant, AssistantOptions};
use cache::Cache;
use config::Settings;
use docs::ContentStore;
use fetch::pages::HttpPages;
use fetch::LiveFetcher;
use llm::LlmClient;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let level = dotenv::var("LOG_LEVEL")
        .ok()
        .and_then(|s| s.parse::<Level>().ok())
        .unwrap_or(Level::DEBUG);
    tracing_subscriber::fmt().with_max_level(level).init();

    let settings = Settings::from_env()?;
    let guild_id = settings.guild_id.map(serenity::GuildId::new);

    let store = ContentStore::new(
        settings.knowledge_bases.clone(),
        settings.dynamic_knowledge_base.clone(),
    );
    let loaded = store.load();
    info!(
        files = loaded.len(),
        documents = loaded.iter().map(|kb| kb.documents.len()).sum::<usize>(),
        "Knowledge bases loaded"
    );

    let pages = Arc::new(HttpPages::new(Duration::from_secs(settings.docs_timeout_secs))?);
    let fetcher = LiveFetcher::new(pages, &settings.docs_base_url);
    info!(base_url = %settings.docs_base_url, "Live documentation fetcher initialized");

    let cache = Cache::open(
        &settings.cache_dir,
        Duration::from_secs(settings.answer_ttl_secs),
        Duration::from_secs(settings.documentation_ttl_secs),
    );

    let llm_client = Arc::new(LlmClient::new(&settings.llm)?);
    info!(model = llm_client.model(), "LLM client initialized");

    let assistant = Arc::new(Assistant::new(
        store,
        fetcher,
        cache,
        llm_client,
        AssistantOptions {
            top_k: settings.top_k,
            persist_fetched: settings.persist_fetched,
        },
    ));

    let analytics = Arc::new(Mutex::new(Analytics::open(settings.analytics_path.clone())));

    if !settings.admin_ids.is_empty() {
        info!(count = settings.admin_ids.len(), "Admin users configured");
    }

    let app_state = AppState {
        assistant,
        analytics,
        admin_ids: settings.admin_ids,
    };

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: vec![commands::docs()],
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);

                let commands = &framework.options().commands;
                for cmd in commands {
                    info!("  /{} ({} subcommands)", cmd.name, cmd.subcommands.len());
                    for sub in &cmd.subcommands {
                        info!("    /{} {}", cmd.name, sub.name);
                    }
                }

                if let Some(gid) = guild_id {
                    info!("Registering to guild {} (instant)", gid);
                    poise::builtins::register_in_guild(ctx, commands, gid).await?;
                } else {
                    info!("Registering globally (up to 1 hour delay)");
                    poise::builtins::register_globally(ctx, commands).await?;
                }

                Ok(app_state)
            })
        })
        .build();

    info!("Starting documentation assistant...");

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create client: {}", e))?;

    if let Err(e) = client.start().await {
        error!("Client error: {}", e);
    }

    Ok(())
}
