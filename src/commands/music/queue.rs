use super::*;
use crate::commands::music::utils::{embedded_messages, player_manager::MusicError};

/// View the current music queue
#[poise::command(slash_command, category = "Music")]
pub async fn queue(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let snapshot = match ctx.data().players.get(guild_id) {
        Some(player) => player.snapshot().await.ok(),
        None => None,
    };

    let embed = match snapshot {
        Some(snapshot) => embedded_messages::music_queue(&snapshot),
        None => CreateEmbed::new()
            .title("🎵 Music Queue")
            .description("The queue is currently empty")
            .color(0x00ff00),
    };

    ctx.send(CreateReply::default().embed(embed)).await?;

    Ok(())
}
