//! Songbird track-event handlers. They do nothing but forward a message to
//! the guild's player task; the task owns every queue transition.

use serenity::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use super::guild_player::PlayerMessage;

/// Fires when a track finishes or is stopped.
pub(crate) struct TrackEndNotifier {
    pub tx: mpsc::UnboundedSender<PlayerMessage>,
    pub generation: u64,
}

#[async_trait]
impl songbird::EventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            let _ = self.tx.send(PlayerMessage::TrackEnded(self.generation));
        }
        None
    }
}

/// Fires when a track's stream fails (unavailable video, network error).
pub(crate) struct TrackErrorNotifier {
    pub tx: mpsc::UnboundedSender<PlayerMessage>,
    pub generation: u64,
}

#[async_trait]
impl songbird::EventHandler for TrackErrorNotifier {
    async fn act(&self, ctx: &songbird::EventContext<'_>) -> Option<songbird::Event> {
        if let songbird::EventContext::Track(_) = ctx {
            debug!("track error event received");
            let _ = self.tx.send(PlayerMessage::TrackErrored(self.generation));
        }
        None
    }
}
