use super::*;
use crate::commands::music::utils::player_manager::MusicError;

/// Stop the music, clear the queue, and leave the voice channel
#[poise::command(slash_command, category = "Music")]
pub async fn stop(ctx: Context<'_>) -> CommandResult {
    let guild_id = ctx.guild_id().ok_or_else(|| {
        Box::new(MusicError::NotInGuild) as Box<dyn std::error::Error + Send + Sync>
    })?;

    let description = match ctx.data().players.get(guild_id) {
        Some(player) => {
            player.stop().await;
            "Stopped playback, cleared the queue, and left the voice channel"
        }
        None => "Nothing is playing",
    };

    ctx.send(
        CreateReply::default().embed(
            CreateEmbed::new()
                .title("⏹️ Stopped")
                .description(description)
                .color(0x00ff00),
        ),
    )
    .await?;

    Ok(())
}
