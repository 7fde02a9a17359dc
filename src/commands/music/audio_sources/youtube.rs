//! YouTube metadata lookup via the `yt-dlp` command-line tool.
//!
//! A `play` query is either a YouTube link or a free-text search term; both
//! are handed to `yt-dlp -j` and the resulting JSON is turned into a [`Song`].

use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use super::{AudioSource, AudioSourceResult, Song};
use crate::commands::music::utils::player_manager::MusicError;
use crate::commands::music::utils::retry::RetryPolicy;

/// Regex to match and capture YouTube video URLs (various formats).
static YOUTUBE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:https?:)?//)?((?:www|m)\.)?((?:youtube\.com|youtu.be))(/(?:[\w\-]+\?v=|embed/|v/)?)([\w\-]+)(\S+)?$").unwrap()
});

/// YouTube lookup logic (via `yt-dlp`).
#[derive(Default)]
pub struct YoutubeApi;

impl YoutubeApi {
    /// Checks whether the input is a YouTube watch page or youtu.be link.
    pub fn is_youtube_url(query: &str) -> bool {
        YOUTUBE_REGEX.is_match(query)
    }

    /// Resolve a user query into a [`Song`].
    ///
    /// A YouTube link is looked up directly; any other URL is rejected; free
    /// text becomes a `ytsearch:` lookup for the first result. Lookups are
    /// retried per `retry` before the error is surfaced.
    pub async fn resolve(query: &str, retry: RetryPolicy) -> AudioSourceResult<Song> {
        let target = if AudioSource::is_url(query) {
            if !Self::is_youtube_url(query) {
                return Err(MusicError::AudioSourceError(format!(
                    "Only YouTube links are supported: {}",
                    query
                )));
            }
            query.to_string()
        } else {
            info!("Creating audio source from search term: {}", query);
            format!("ytsearch:{}", query)
        };

        let mut attempt = 1;
        loop {
            match Self::fetch_metadata(&target) {
                Ok(song) => return Ok(song),
                Err(err) if attempt < retry.max_attempts => {
                    warn!(
                        "yt-dlp lookup failed (attempt {}/{}): {}",
                        attempt, retry.max_attempts, err
                    );
                    attempt += 1;
                    tokio::time::sleep(retry.delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Execute `yt-dlp -j` for a URL or `ytsearch:` term and parse the output.
    fn fetch_metadata(target: &str) -> AudioSourceResult<Song> {
        let output = Command::new("yt-dlp")
            .args([
                "-j",            // Output as JSON
                "--no-playlist", // Don't process playlists
                target,
            ])
            .output()
            .map_err(|e| {
                MusicError::AudioSourceError(format!("Failed to get video metadata: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MusicError::AudioSourceError(format!(
                "yt-dlp exited with an error: {}",
                stderr.lines().last().unwrap_or("unknown")
            )));
        }

        Self::parse_metadata(&String::from_utf8_lossy(&output.stdout))
    }

    /// Convert the JSON emitted by `yt-dlp -j` into a [`Song`].
    fn parse_metadata(json_str: &str) -> AudioSourceResult<Song> {
        let metadata: serde_json::Value = serde_json::from_str(json_str).map_err(|e| {
            MusicError::AudioSourceError(format!("Failed to parse video metadata: {}", e))
        })?;

        let url = metadata["webpage_url"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                MusicError::AudioSourceError("Video metadata is missing a URL".to_string())
            })?;

        let title = metadata["title"]
            .as_str()
            .unwrap_or("Unknown Title")
            .to_string();

        let duration = metadata["duration"]
            .as_f64()
            .map(Duration::from_secs_f64);

        let thumbnail = metadata["thumbnail"].as_str().map(|s| s.to_string());

        let channel = metadata["channel"]
            .as_str()
            .or_else(|| metadata["uploader"].as_str())
            .map(|s| s.to_string());

        Ok(Song {
            title,
            url,
            duration,
            thumbnail,
            channel,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn recognizes_watch_urls() {
        assert!(YoutubeApi::is_youtube_url(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
        assert!(YoutubeApi::is_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(YoutubeApi::is_youtube_url(
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
    }

    #[test]
    fn rejects_non_youtube_urls() {
        assert!(!YoutubeApi::is_youtube_url("https://example.com/watch"));
        assert!(!YoutubeApi::is_youtube_url("not a url"));
    }

    #[test]
    fn parses_ytdlp_json() {
        let json = r#"{
            "title": "Never Gonna Give You Up",
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "duration": 212.0,
            "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg",
            "channel": "Rick Astley"
        }"#;

        let song = YoutubeApi::parse_metadata(json).unwrap();
        assert_eq!(song.title, "Never Gonna Give You Up");
        assert_eq!(song.url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(song.duration, Some(Duration::from_secs(212)));
        assert_eq!(song.channel.as_deref(), Some("Rick Astley"));
    }

    #[test]
    fn missing_url_is_an_error() {
        let json = r#"{"title": "No Url Here"}"#;
        assert!(YoutubeApi::parse_metadata(json).is_err());
    }

    #[test]
    fn garbage_output_is_an_error() {
        assert!(YoutubeApi::parse_metadata("ERROR: video unavailable").is_err());
    }
}
