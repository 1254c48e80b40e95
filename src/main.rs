use std::sync::Arc;

use anyhow::Context;
use orchestra_search::channels::CliChannel;
use orchestra_search::config::{AppConfig, Interface};
use orchestra_search::llm::create_provider;
use orchestra_search::preferences::{CollectorConfig, PreferenceCollector, PreferenceSchema};
use orchestra_search::session::spawn_pruning_task;
use orchestra_search::web::{AppState, app_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Optional .env file for the API key
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export OPENAI_API_KEY=sk-...");
        std::process::exit(1);
    });

    eprintln!("🎻 Orchestra Search v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);

    let llm = create_provider(&config).context("Failed to create LLM provider")?;
    let collector = Arc::new(PreferenceCollector::new(
        llm,
        PreferenceSchema::orchestra(),
        CollectorConfig {
            history_turns: config.history_turns,
            max_tokens: config.max_tokens,
        },
    ));

    match config.interface {
        Interface::Web => {
            let state = AppState::new(collector, config.session_idle_timeout)
                .context("Failed to compile templates")?;
            let _pruner = spawn_pruning_task(state.sessions.clone());
            let app = app_routes(state);

            let listener = tokio::net::TcpListener::bind(config.bind)
                .await
                .with_context(|| format!("Failed to bind {}", config.bind))?;
            eprintln!("   Chat UI: http://{}/\n", config.bind);
            tracing::info!(addr = %config.bind, "Web server started");

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Web server failed")?;
        }
        Interface::Cli => {
            eprintln!();
            let state = CliChannel::new(collector)
                .run()
                .await
                .context("Error reading stdin")?;
            tracing::info!(step = %state.step, turns = state.turns.len(), "Session ended");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
