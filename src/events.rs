use std::env;

use chrono::Utc;
use serenity::all::{ActivityData, CreateEmbed, CreateMessage, Member, Mentionable, Ready};
use serenity::async_trait;
use serenity::prelude::*;
use tracing::{info, warn};

use crate::Error;

pub struct Handler;

#[async_trait]
impl serenity::prelude::EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("connected as {}", ready.user.name);
        ctx.set_activity(Some(ActivityData::listening("🎵 music & weather")));
    }

    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        if let Err(e) = welcome_new_member(&ctx, &new_member).await {
            warn!(
                "failed to welcome {} in guild {}: {}",
                new_member.user.name, new_member.guild_id, e
            );
        }
    }
}

/// Give a new member the configured auto-role and greet them in the guild's
/// chat channel. Both halves are optional: a missing role or channel is
/// skipped, not an error.
async fn welcome_new_member(ctx: &Context, member: &Member) -> Result<(), Error> {
    let guild_id = member.guild_id;

    if let Ok(role_name) = env::var("AUTO_ROLE_NAME") {
        let roles = guild_id.roles(&ctx.http).await?;
        if let Some(role_id) = roles
            .iter()
            .find(|(_, role)| role.name == role_name)
            .map(|(id, _)| *id)
        {
            member.add_role(&ctx.http, role_id).await?;
            info!(
                "assigned role '{}' to {} in guild {}",
                role_name, member.user.name, guild_id
            );
        }
    }

    let channels = guild_id.channels(&ctx.http).await?;
    if let Some(channel) = channels
        .values()
        .find(|channel| channel.name.contains("chat") || channel.name.contains('💬'))
    {
        let embed = CreateEmbed::new()
            .title("🎉 Welcome!")
            .description(format!(
                "Hello {}! Welcome to the server! 🦄",
                member.user.mention()
            ))
            .thumbnail(member.user.face())
            .color(0x00ff00)
            .timestamp(Utc::now());

        channel
            .send_message(&ctx.http, CreateMessage::new().embed(embed))
            .await?;
    }

    Ok(())
}
