//! Catalog Chat
//!
//! Entry point: seed the catalog, then chat about it.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;

use catalog_chat::catalog::{self, ProductGenerator, seed_catalog};
use catalog_chat::config::AppConfig;
use catalog_chat::console::{self, AiBackend};
use catalog_chat::llm::Orchestrator;
use catalog_chat::plugin::CatalogPlugin;
use catalog_chat::repl::{self, ChatContext};
use catalog_chat::session::ChatSession;
use catalog_chat::telemetry;
use catalog_chat::tools::ToolRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load()?;
    let mut telemetry = telemetry::init(&config.telemetry)?;

    let mut stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    stdout
        .write_all(b"***** Product catalog chat: tool calling + Postgres *****\n\n")
        .await?;

    let backend: AiBackend = match &config.startup.backend {
        Some(choice) => choice.parse()?,
        None => console::prompt_backend(&mut stdin, &mut stdout).await?,
    };
    let records = match config.startup.records {
        Some(n) => n,
        None => console::prompt_record_count(&mut stdin, &mut stdout).await?,
    };

    info!(
        name: "app.startup",
        backend = %backend,
        records,
        "Startup choices"
    );

    let store = catalog::connect(&config.database, config.seed.batch_size).await?;
    let mut generator = ProductGenerator::new(config.seed.min_price, config.seed.max_price)?;

    if records > 0 {
        say(&mut stdout, &format!("Generating {records} products...\n")).await?;
        seed_catalog(store.as_ref(), &mut generator, records).await?;
        say(&mut stdout, "Products generated successfully!\n\n").await?;
    } else {
        say(&mut stdout, "No new products were generated!\n\n").await?;
    }

    let settings = config.llm_settings(backend)?;
    info!(
        name: "llm.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "LLM configuration loaded"
    );

    let tools = Arc::new(ToolRegistry::new().with_plugin(&CatalogPlugin::new(Arc::clone(&store))));
    for name in tools.names() {
        info!(name: "tool.registered", tool = %name, "Tool registered");
    }

    let orchestrator = Orchestrator::new(settings, tools)
        .with_max_tool_iterations(config.chat.max_tool_iterations);

    let mut session = ChatSession::new();
    if let Some(prompt) = &config.chat.system_prompt {
        session.set_system_prompt(prompt.clone());
    }

    let mut ctx = ChatContext::new(orchestrator, session);
    let result = repl::run_chat_loop(&mut ctx, &mut stdin, &mut stdout).await;

    telemetry.shutdown()?;
    result.map(|_| ())
}

async fn say<W: AsyncWrite + Unpin>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.flush().await
}
