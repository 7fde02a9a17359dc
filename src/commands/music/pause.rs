use super::*;
use crate::commands::music::utils::{embedded_messages, player_manager::MusicError};

/// Pause the current song
#[poise::command(slash_command, category = "Music")]
pub async fn pause(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let paused = match ctx.data().players.get(guild_id) {
        Some(player) => player.pause().await.unwrap_or(None),
        None => None,
    };

    match paused {
        Some(song) => {
            ctx.send(
                CreateReply::default().embed(
                    CreateEmbed::new()
                        .title("⏸️ Paused")
                        .description(format!("Paused [{}]({})", song.title, song.url))
                        .color(0x00ff00),
                ),
            )
            .await?;
        }
        None => {
            ctx.send(embedded_messages::error_reply(
                "No track is currently playing",
            ))
            .await?;
        }
    }

    Ok(())
}
