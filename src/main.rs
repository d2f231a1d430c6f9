//! # Club Events Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database,
//! starts the wizard sweeper and health server, and runs the Telegram bot.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use club_events_bot::bot::handlers::BotHandler;
use club_events_bot::bot::ClubServices;
use club_events_bot::config::Config;
use club_events_bot::database::connection::DatabaseManager;
use club_events_bot::services::health::HealthService;
use club_events_bot::services::wizard_sweeper::WizardSweeper;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "club_events_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Club Events Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, Admins: {}",
        config.database_url,
        config.http_port,
        config.admin_ids.len()
    );

    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    info!("Running database migrations...");
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    let http_port = config.http_port;
    let bot = Bot::new(&config.telegram_bot_token);
    let services = ClubServices::new(Arc::new(db_arc.repository()), config);
    let wizards = services.wizards.clone();
    let handler = BotHandler::new(services);
    info!("Telegram bot initialized successfully");

    let mut sweeper = WizardSweeper::new(wizards.clone())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create wizard sweeper: {}", e))?;
    if let Err(e) = sweeper.start().await {
        tracing::error!("Failed to start wizard sweeper: {}", e);
    }

    let health_service = HealthService::new(db_arc.clone(), wizards);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", http_port, e))?;
    info!("Health check server starting on port {}", http_port);

    let bot_task = tokio::spawn(async move {
        Dispatcher::builder(bot, handler.schema())
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    });

    let health_task = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_service.router).await {
            tracing::error!("Health server error: {}", e);
        }
    });

    tokio::select! {
        result = bot_task => {
            if let Err(e) = result {
                tracing::error!("Bot task error: {}", e);
            }
        }
        result = health_task => {
            if let Err(e) = result {
                tracing::error!("Health task error: {}", e);
            }
        }
    }

    if let Err(e) = sweeper.stop().await {
        tracing::warn!("Error stopping wizard sweeper: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
