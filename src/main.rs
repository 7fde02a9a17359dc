use ::serenity::all::ClientBuilder;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use songbird::SerenityInit;
use std::env;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;
mod events;
mod status;

use commands::general::ping::*;
use commands::music::{
    nowplaying::*, pause::*, play::*, queue::*, resume::*, skip::*, stop::*,
    utils::player_manager::PlayerManager, utils::retry::RetryPolicy,
};
use commands::weather::weather::*;

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;
type CommandResult = Result<(), Error>;

/// User data, which is stored and accessible in all command invocations
struct Data {
    players: Arc<PlayerManager>,
}

/// Shared HTTP client for audio inputs and the weather API.
pub static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Delay before reconnecting after the gateway connection fails.
const GATEWAY_RETRY_DELAY: Duration = Duration::from_secs(5);

#[poise::command(slash_command, category = "General")]
async fn help(
    ctx: Context<'_>,
    #[description = "Specific command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> CommandResult {
    poise::builtins::help(
        ctx,
        command.as_deref(),
        poise::builtins::HelpConfiguration {
            show_context_menu_commands: true,
            ..Default::default()
        },
    )
    .await
    .map_err(|e| e.into())
}

#[poise::command(prefix_command, hide_in_help)]
async fn register(ctx: Context<'_>) -> Result<(), Error> {
    poise::builtins::register_application_commands_buttons(ctx)
        .await
        .map_err(|e| e.into())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize logging with debug level for our crate
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("unibot=debug,warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    dotenv().ok();

    let token = env::var("DISCORD_TOKEN").expect("Missing DISCORD_TOKEN");

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let commands = vec![
        // Default commands
        register(),
        help(),
        // General commands
        ping(),
        // Weather commands
        weather(),
        // Music commands
        play(),
        pause(),
        resume(),
        queue(),
        skip(),
        stop(),
        nowplaying(),
    ];

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands,
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data {
                    players: Arc::new(PlayerManager::new(RetryPolicy::default())),
                })
            })
        });

    let mut client = ClientBuilder::new(token, intents)
        .framework(framework.build())
        .event_handler(events::Handler)
        .register_songbird()
        .await?;

    // Liveness endpoints for the hosting platform
    let port = env::var("STATUS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let status_state = status::StatusState {
        cache: client.cache.clone(),
        started_at: Instant::now(),
    };
    tokio::spawn(async move {
        if let Err(e) = status::serve(status_state, port).await {
            error!("status server error: {}", e);
        }
    });

    // Shut the gateway down cleanly on ctrl-c
    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl-c");
        info!("received interrupt, shutting down");
        shard_manager.shutdown_all().await;
    });

    // The hosting penalizes restarts, so gateway failures are retried
    // forever instead of exiting.
    loop {
        match client.start().await {
            Ok(()) => break,
            Err(e) => {
                error!(
                    "gateway connection failed: {}; retrying in {}s",
                    e,
                    GATEWAY_RETRY_DELAY.as_secs()
                );
                tokio::time::sleep(GATEWAY_RETRY_DELAY).await;
            }
        }
    }

    Ok(())
}
