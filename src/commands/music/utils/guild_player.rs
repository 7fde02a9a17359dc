//! Per-guild playback: a FIFO of songs owned by one task per guild, driven
//! by messages from command handlers and from the songbird track events.
//!
//! Track end and track error are two roads into the same place: drop the
//! head of the queue and start the next song, or shut the player down when
//! nothing is left.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use serenity::all::{ChannelId, CreateEmbed, CreateMessage, GuildId};
use serenity::http::Http;
use serenity::prelude::Mutex as SerenityMutex;
use songbird::input::{Input, YoutubeDl};
use songbird::{Call, Event, Songbird, TrackEvent};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::embedded_messages;
use super::event_handlers::{TrackEndNotifier, TrackErrorNotifier};
use super::player_manager::MusicError;
use super::retry::RetryPolicy;
use crate::HTTP_CLIENT;
use crate::commands::music::audio_sources::Song;

/// Messages accepted by a guild's player task.
pub(crate) enum PlayerMessage {
    Enqueue {
        song: Song,
        position: oneshot::Sender<usize>,
    },
    Skip {
        skipped: oneshot::Sender<Option<Song>>,
    },
    Stop {
        done: oneshot::Sender<()>,
    },
    Pause {
        paused: oneshot::Sender<Option<Song>>,
    },
    Resume {
        resumed: oneshot::Sender<Option<Song>>,
    },
    Snapshot {
        reply: oneshot::Sender<PlayerSnapshot>,
    },
    /// From the songbird end-of-track event; the counter identifies which
    /// playback it belongs to so stale events are ignored.
    TrackEnded(u64),
    /// From the songbird track-error event, same counter rules.
    TrackErrored(u64),
}

/// Point-in-time view of a guild's playback, for `/queue` and `/nowplaying`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub current: Option<Song>,
    pub upcoming: Vec<Song>,
    pub paused: bool,
}

/// Cheap, cloneable sender half of a guild player. Stored in the
/// `PlayerManager` registry and handed to command handlers.
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::UnboundedSender<PlayerMessage>,
}

impl PlayerHandle {
    /// Append a song; returns its position (0 = plays immediately).
    pub async fn enqueue(&self, song: Song) -> Result<usize, MusicError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PlayerMessage::Enqueue { song, position: tx })
            .map_err(|_| MusicError::NoQueue)?;
        rx.await.map_err(|_| MusicError::NoQueue)
    }

    /// Drop the current song and move on; returns the song that was skipped.
    pub async fn skip(&self) -> Result<Option<Song>, MusicError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PlayerMessage::Skip { skipped: tx })
            .map_err(|_| MusicError::NoQueue)?;
        rx.await.map_err(|_| MusicError::NoQueue)
    }

    /// Tear the player down. A closed channel means the player is already
    /// gone, which counts as success.
    pub async fn stop(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(PlayerMessage::Stop { done: tx }).is_ok() {
            let _ = rx.await;
        }
    }

    /// Pause playback; returns the paused song, or None if nothing plays.
    pub async fn pause(&self) -> Result<Option<Song>, MusicError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PlayerMessage::Pause { paused: tx })
            .map_err(|_| MusicError::NoQueue)?;
        rx.await.map_err(|_| MusicError::NoQueue)
    }

    /// Resume playback; returns the resumed song, or None if nothing plays.
    pub async fn resume(&self) -> Result<Option<Song>, MusicError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PlayerMessage::Resume { resumed: tx })
            .map_err(|_| MusicError::NoQueue)?;
        rx.await.map_err(|_| MusicError::NoQueue)
    }

    /// Current song plus upcoming queue.
    pub async fn snapshot(&self) -> Result<PlayerSnapshot, MusicError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(PlayerMessage::Snapshot { reply: tx })
            .map_err(|_| MusicError::NoQueue)?;
        rx.await.map_err(|_| MusicError::NoQueue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DriverState {
    Idle,
    Resolving,
    Playing,
    ErrorRecovering,
}

/// Whether the task keeps processing messages after handling one.
enum Flow {
    Continue,
    Exit,
}

/// Remove the head song from the queue, whether it finished, failed, or was
/// skipped, and return it. The rest of the queue is untouched.
fn finish_head(songs: &mut VecDeque<Song>) -> Option<Song> {
    songs.pop_front()
}

/// Build a snapshot: the head is "current" only while something is actually
/// playing; everything behind it is upcoming.
fn snapshot_of(songs: &VecDeque<Song>, playing: bool, paused: bool) -> PlayerSnapshot {
    PlayerSnapshot {
        current: playing.then(|| songs.front().cloned()).flatten(),
        upcoming: songs.iter().skip(1).cloned().collect(),
        paused,
    }
}

/// The task-owned state for one guild's playback.
pub(crate) struct GuildPlayer {
    guild_id: GuildId,
    songs: VecDeque<Song>,
    state: DriverState,
    paused: bool,
    current: Option<songbird::tracks::TrackHandle>,
    generation: u64,
    text_channel: ChannelId,
    http: Arc<Http>,
    call: Arc<SerenityMutex<Call>>,
    songbird: Arc<Songbird>,
    registry: Arc<DashMap<GuildId, PlayerHandle>>,
    retry: RetryPolicy,
    tx: mpsc::UnboundedSender<PlayerMessage>,
}

impl GuildPlayer {
    /// Spawn the player task for a guild and return its handle.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn spawn(
        guild_id: GuildId,
        songbird: Arc<Songbird>,
        call: Arc<SerenityMutex<Call>>,
        text_channel: ChannelId,
        http: Arc<Http>,
        retry: RetryPolicy,
        registry: Arc<DashMap<GuildId, PlayerHandle>>,
    ) -> PlayerHandle {
        let (tx, rx) = mpsc::unbounded_channel();

        let player = GuildPlayer {
            guild_id,
            songs: VecDeque::new(),
            state: DriverState::Idle,
            paused: false,
            current: None,
            generation: 0,
            text_channel,
            http,
            call,
            songbird,
            registry,
            retry,
            tx: tx.clone(),
        };

        tokio::spawn(player.run(rx));

        PlayerHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<PlayerMessage>) {
        while let Some(message) = rx.recv().await {
            if let Flow::Exit = self.handle_message(message).await {
                break;
            }
        }
    }

    async fn handle_message(&mut self, message: PlayerMessage) -> Flow {
        match message {
            PlayerMessage::Enqueue { song, position } => {
                self.songs.push_back(song);
                let _ = position.send(self.songs.len() - 1);
                if self.state == DriverState::Idle {
                    self.play_head(false).await
                } else {
                    Flow::Continue
                }
            }
            PlayerMessage::TrackEnded(generation) => {
                if generation != self.generation {
                    return Flow::Continue;
                }
                debug!("track ended in guild {}", self.guild_id);
                finish_head(&mut self.songs);
                self.current = None;
                self.play_head(true).await
            }
            PlayerMessage::TrackErrored(generation) => {
                if generation != self.generation {
                    return Flow::Continue;
                }
                self.state = DriverState::ErrorRecovering;
                self.current = None;
                if let Some(failed) = finish_head(&mut self.songs) {
                    warn!(
                        "playback of '{}' failed in guild {}",
                        failed.title, self.guild_id
                    );
                    self.announce(embedded_messages::playback_failed(&failed))
                        .await;
                }
                tokio::time::sleep(self.retry.delay).await;
                self.play_head(true).await
            }
            PlayerMessage::Skip { skipped } => match &self.current {
                Some(track) => {
                    let song = self.songs.front().cloned();
                    // Stopping the track fires the end event, which advances
                    // the queue like a natural finish.
                    let _ = track.stop();
                    let _ = skipped.send(song);
                    Flow::Continue
                }
                None => {
                    let song = finish_head(&mut self.songs);
                    let _ = skipped.send(song);
                    self.play_head(true).await
                }
            },
            PlayerMessage::Stop { done } => {
                self.teardown().await;
                let _ = done.send(());
                Flow::Exit
            }
            PlayerMessage::Pause { paused } => {
                let response = match &self.current {
                    Some(track) => {
                        let _ = track.pause();
                        self.paused = true;
                        self.songs.front().cloned()
                    }
                    None => None,
                };
                let _ = paused.send(response);
                Flow::Continue
            }
            PlayerMessage::Resume { resumed } => {
                let response = match &self.current {
                    Some(track) => {
                        let _ = track.play();
                        self.paused = false;
                        self.songs.front().cloned()
                    }
                    None => None,
                };
                let _ = resumed.send(response);
                Flow::Continue
            }
            PlayerMessage::Snapshot { reply } => {
                let _ = reply.send(snapshot_of(&self.songs, self.current.is_some(), self.paused));
                Flow::Continue
            }
        }
    }

    /// Start playing the song at the head of the queue. Songs whose stream
    /// cannot be started are dropped one by one; an empty queue shuts the
    /// player down.
    async fn play_head(&mut self, announce: bool) -> Flow {
        loop {
            let Some(song) = self.songs.front().cloned() else {
                self.teardown().await;
                return Flow::Exit;
            };

            self.state = DriverState::Resolving;
            debug!(
                "resolving stream for '{}' in guild {}",
                song.title, self.guild_id
            );

            let input: Input = YoutubeDl::new(HTTP_CLIENT.clone(), song.url.clone()).into();
            let track = self.call.lock().await.play_input(input);
            self.generation += 1;

            let end = track.add_event(
                Event::Track(TrackEvent::End),
                TrackEndNotifier {
                    tx: self.tx.clone(),
                    generation: self.generation,
                },
            );
            let error = track.add_event(
                Event::Track(TrackEvent::Error),
                TrackErrorNotifier {
                    tx: self.tx.clone(),
                    generation: self.generation,
                },
            );

            if end.is_err() || error.is_err() {
                warn!(
                    "track for '{}' died before playback started in guild {}",
                    song.title, self.guild_id
                );
                self.state = DriverState::ErrorRecovering;
                finish_head(&mut self.songs);
                self.announce(embedded_messages::playback_failed(&song)).await;
                tokio::time::sleep(self.retry.delay).await;
                continue;
            }

            self.current = Some(track);
            self.paused = false;
            self.state = DriverState::Playing;
            info!(
                "started playback of '{}' in guild {}",
                song.title, self.guild_id
            );

            if announce {
                self.announce(embedded_messages::now_playing(&song)).await;
            }

            return Flow::Continue;
        }
    }

    /// Unconditional shutdown: discard the queue, stop the track, leave the
    /// voice channel, and drop this guild's registry entry.
    async fn teardown(&mut self) {
        self.state = DriverState::Idle;
        if let Some(track) = self.current.take() {
            let _ = track.stop();
        }
        self.songs.clear();
        self.registry.remove(&self.guild_id);

        if let Err(e) = self.songbird.remove(self.guild_id).await {
            debug!(
                "voice session for guild {} was already gone: {}",
                self.guild_id, e
            );
        }

        info!("player for guild {} shut down", self.guild_id);
    }

    async fn announce(&self, embed: CreateEmbed) {
        let message = CreateMessage::new().embed(embed);
        if let Err(e) = self
            .text_channel
            .send_message(self.http.clone(), message)
            .await
        {
            warn!(
                "failed to post status message for guild {}: {}",
                self.guild_id, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn song(title: &str) -> Song {
        Song {
            title: title.to_string(),
            url: format!("https://youtu.be/{}", title),
            duration: None,
            thumbnail: None,
            channel: None,
        }
    }

    fn queue_of(titles: &[&str]) -> VecDeque<Song> {
        titles.iter().map(|t| song(t)).collect()
    }

    #[test]
    fn playback_order_is_insertion_order() {
        let mut songs = VecDeque::new();
        for title in ["first", "second", "third", "fourth"] {
            songs.push_back(song(title));
        }

        let mut played = Vec::new();
        while let Some(s) = finish_head(&mut songs) {
            played.push(s.title);
        }

        assert_eq!(played, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn failed_head_is_removed_and_rest_survive() {
        let mut songs = queue_of(&["broken", "ok1", "ok2"]);

        let failed = finish_head(&mut songs).unwrap();
        assert_eq!(failed.title, "broken");

        let remaining: Vec<_> = songs.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(remaining, vec!["ok1", "ok2"]);
    }

    #[test]
    fn advancing_an_empty_queue_yields_nothing() {
        let mut songs = VecDeque::new();
        assert_eq!(finish_head(&mut songs), None);
    }

    #[test]
    fn single_song_queue_drains_to_empty() {
        // play one song, simulate its end: the queue must be empty, which is
        // the condition for tearing the player down
        let mut songs = queue_of(&["only"]);
        finish_head(&mut songs);
        assert!(songs.is_empty());
    }

    #[test]
    fn snapshot_splits_current_from_upcoming() {
        let songs = queue_of(&["now", "next", "later"]);

        let snapshot = snapshot_of(&songs, true, false);
        assert_eq!(snapshot.current.unwrap().title, "now");
        let upcoming: Vec<_> = snapshot.upcoming.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(upcoming, vec!["next", "later"]);
        assert!(!snapshot.paused);
    }

    #[test]
    fn snapshot_has_no_current_when_not_playing() {
        let songs = queue_of(&["queued"]);
        let snapshot = snapshot_of(&songs, false, false);
        assert_eq!(snapshot.current, None);
    }
}
