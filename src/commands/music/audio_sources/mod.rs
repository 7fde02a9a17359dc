//! Audio source handling: the `Song` type and the YouTube (`yt-dlp`) lookup
//! that produces it.

pub(crate) mod youtube;

use std::time::Duration;

use url::Url;

use crate::commands::music::utils::player_manager::MusicError;

/// Result type for audio source operations
pub type AudioSourceResult<T> = Result<T, MusicError>;

/// A resolved, playable reference to a YouTube video plus display metadata.
/// Immutable once resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    /// The title of the video.
    pub title: String,
    /// The resolved watch-page URL, used to build the audio input.
    pub url: String,
    /// The duration of the video, if reported.
    pub duration: Option<Duration>,
    /// URL to a thumbnail image, if reported.
    pub thumbnail: Option<String>,
    /// Name of the uploading channel, if reported.
    pub channel: Option<String>,
}

/// General helpers for classifying user input.
pub struct AudioSource;

impl AudioSource {
    /// Basic check whether the input parses as a URL at all.
    /// Does not validate that the URL is reachable or supported.
    pub fn is_url(input: &str) -> bool {
        Url::parse(input).is_ok()
    }
}
