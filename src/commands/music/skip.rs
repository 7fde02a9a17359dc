use super::*;
use crate::commands::music::utils::{embedded_messages, player_manager::MusicError};

/// Skip the currently playing song
#[poise::command(slash_command, category = "Music")]
pub async fn skip(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let Some(player) = ctx.data().players.get(guild_id) else {
        ctx.send(embedded_messages::error_reply(
            "No music is currently playing",
        ))
        .await?;
        return Ok(());
    };

    match player.skip().await {
        Ok(Some(song)) => {
            ctx.send(
                CreateReply::default().embed(
                    CreateEmbed::new()
                        .title("⏭️ Skipped")
                        .description(format!("Skipped **{}**", song.title))
                        .color(0x00ff00),
                ),
            )
            .await?;
        }
        Ok(None) | Err(_) => {
            ctx.send(embedded_messages::error_reply(
                "No music is currently playing",
            ))
            .await?;
        }
    }

    Ok(())
}
