use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serenity::all::{ChannelId, GuildId, UserId};
use serenity::client::Context;
use serenity::http::Http;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::{Call, Songbird};
use thiserror::Error;
use tracing::info;

use super::guild_player::{GuildPlayer, PlayerHandle};
use super::retry::RetryPolicy;

/// Errors that can occur during music operations
#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Not in a guild")]
    NotInGuild,

    #[error("Failed to get voice manager")]
    NoVoiceManager,

    #[error("User is not in a voice channel")]
    UserNotInVoiceChannel,

    #[error("Audio source error: {0}")]
    AudioSourceError(String),

    #[error("No active playback for this guild")]
    NoQueue,
}

/// Result type for music operations
pub type MusicResult<T> = Result<T, MusicError>;

/// Owns the guild → player mapping. One instance lives in the bot's shared
/// data and is handed to command handlers; players register and deregister
/// themselves here as voice sessions come and go.
pub struct PlayerManager {
    players: Arc<DashMap<GuildId, PlayerHandle>>,
    retry: RetryPolicy,
}

impl PlayerManager {
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            players: Arc::new(DashMap::new()),
            retry,
        }
    }

    /// The retry policy shared with the audio source lookup.
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// The player for a guild, if it has an active voice session.
    pub fn get(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players.get(&guild_id).map(|entry| entry.value().clone())
    }

    /// The player for a guild, spawning one if none exists. The entry API
    /// makes this atomic, so two concurrent first plays end up talking to
    /// the same player.
    pub fn get_or_spawn(
        &self,
        guild_id: GuildId,
        songbird: Arc<Songbird>,
        call: Arc<SerenityMutex<Call>>,
        text_channel: ChannelId,
        http: Arc<Http>,
    ) -> PlayerHandle {
        match self.players.entry(guild_id) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                info!("spawning player for guild {}", guild_id);
                let handle = GuildPlayer::spawn(
                    guild_id,
                    songbird,
                    call,
                    text_channel,
                    http,
                    self.retry,
                    Arc::clone(&self.players),
                );
                entry.insert(handle.clone());
                handle
            }
        }
    }

    /// Get the Songbird voice client from the context
    pub async fn songbird(ctx: &Context) -> MusicResult<Arc<Songbird>> {
        songbird::get(ctx).await.ok_or(MusicError::NoVoiceManager)
    }

    /// Get the voice channel ID that the user is currently in
    pub fn user_voice_channel(
        ctx: &Context,
        guild_id: GuildId,
        user_id: UserId,
    ) -> MusicResult<ChannelId> {
        let guild = ctx.cache.guild(guild_id).ok_or(MusicError::NotInGuild)?;

        let voice_state = guild
            .voice_states
            .get(&user_id)
            .ok_or(MusicError::UserNotInVoiceChannel)?;

        voice_state
            .channel_id
            .ok_or(MusicError::UserNotInVoiceChannel)
    }
}
