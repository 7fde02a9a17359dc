use super::*;
use crate::commands::music::{
    audio_sources::youtube::YoutubeApi,
    utils::{
        embedded_messages,
        player_manager::{MusicError, PlayerManager},
    },
};
use tracing::info;

/// Play a song from YouTube, by link or by search query
#[poise::command(slash_command, category = "Music")]
pub async fn play(
    ctx: Context<'_>,
    #[description = "YouTube URL or search query"] query: String,
) -> CommandResult {
    info!("Received play command with query: {}", query);
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    // The user must already be in a voice channel
    let channel_id = match PlayerManager::user_voice_channel(
        ctx.serenity_context(),
        guild_id,
        ctx.author().id,
    ) {
        Ok(channel_id) => channel_id,
        Err(err) => {
            ctx.send(embedded_messages::error_reply(format!(
                "You need to be in a voice channel: {}",
                err
            )))
            .await?;
            return Ok(());
        }
    };

    // Defer the response since the yt-dlp lookup might take time
    ctx.defer().await?;

    let retry = ctx.data().players.retry();
    let song = match YoutubeApi::resolve(&query, retry).await {
        Ok(song) => song,
        Err(err) => {
            ctx.send(embedded_messages::error_reply(format!(
                "Failed to process audio source: {}",
                err
            )))
            .await?;
            return Ok(());
        }
    };

    // Join the voice channel if not already connected
    let songbird = PlayerManager::songbird(ctx.serenity_context()).await?;
    let call = match songbird.get(guild_id) {
        Some(call) => call,
        None => match songbird.join(guild_id, channel_id).await {
            Ok(call) => call,
            Err(err) => {
                ctx.send(embedded_messages::error_reply(format!(
                    "Failed to join voice channel: {}",
                    err
                )))
                .await?;
                return Ok(());
            }
        },
    };

    let player = ctx.data().players.get_or_spawn(
        guild_id,
        songbird,
        call,
        ctx.channel_id(),
        ctx.serenity_context().http.clone(),
    );

    let embed = match player.enqueue(song.clone()).await {
        Ok(0) => embedded_messages::now_playing(&song),
        Ok(position) => embedded_messages::added_to_queue(&song, position),
        Err(_) => {
            ctx.send(embedded_messages::error_reply(
                "Playback just stopped for this server, try again",
            ))
            .await?;
            return Ok(());
        }
    };

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
