use anyhow::Result;
use join_gatekeeper::bot::{self, gateway::TelegramGateway, HandlerContext};
use join_gatekeeper::config::AppConfig;
use join_gatekeeper::localization;
use join_gatekeeper::observability::{self, ReadinessState};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ChatJoinRequest;
use tracing::info;

/// Load and validate configuration from the environment.
///
/// Logging is not initialized yet, so failures go to stderr.
fn load_configuration() -> Result<AppConfig> {
    AppConfig::load().map_err(|e| {
        eprintln!("{}", e);
        anyhow::anyhow!(e)
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = Arc::new(load_configuration()?);

    // Initialize complete observability stack (logging, tracing, metrics, health)
    let readiness = ReadinessState::new(config.bot.token.clone());
    observability::init_observability_with_config(&config.observability, readiness.clone()).await?;
    info!("{}", config.summary());

    let localization_manager =
        localization::create_localization_manager_with_default(&config.gatekeeper.default_language)?;

    // Initialize the bot with custom client configuration for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;

    let bot = Bot::with_client(config.bot.token.clone(), client);
    let gateway = Arc::new(TelegramGateway::new(bot.clone()));
    let ctx = HandlerContext::new(gateway, Arc::clone(&config), localization_manager);

    info!(
        timeout_secs = config.bot.http_timeout_secs,
        target_chat_id = config.gatekeeper.target_chat_id,
        "Bot initialized, starting dispatcher"
    );

    let handler = dptree::entry()
        .branch(Update::filter_chat_join_request().endpoint({
            let ctx = ctx.clone();
            move |request: ChatJoinRequest| {
                let ctx = ctx.clone();
                async move { bot::join_request_handler(request, ctx).await }
            }
        }))
        .branch(Update::filter_message().endpoint({
            let ctx = ctx.clone();
            move |msg: Message| {
                let ctx = ctx.clone();
                async move { bot::message_handler(msg, ctx).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let ctx = ctx.clone();
            move |q: CallbackQuery| {
                let ctx = ctx.clone();
                async move { bot::callback_handler(q, ctx).await }
            }
        }));

    readiness.mark_started();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
