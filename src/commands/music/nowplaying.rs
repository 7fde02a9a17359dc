use super::*;
use crate::commands::music::utils::{embedded_messages, player_manager::MusicError};

/// Show the song that is currently playing
#[poise::command(slash_command, category = "Music")]
pub async fn nowplaying(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let snapshot = match ctx.data().players.get(guild_id) {
        Some(player) => player.snapshot().await.ok(),
        None => None,
    };

    match snapshot.and_then(|s| s.current.map(|song| (song, s.paused))) {
        Some((song, paused)) => {
            let mut embed = embedded_messages::now_playing(&song);
            if paused {
                embed = embed.field("Status", "`Paused`", true);
            }
            ctx.send(CreateReply::default().embed(embed)).await?;
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
