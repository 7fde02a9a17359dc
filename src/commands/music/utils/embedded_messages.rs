use ::serenity::all::{CreateEmbed, CreateEmbedFooter};
use poise::CreateReply;

use super::format_duration;
use super::guild_player::PlayerSnapshot;
use crate::commands::music::audio_sources::Song;

/// How many upcoming songs the queue embed lists before cutting off.
const QUEUE_DISPLAY_LIMIT: usize = 10;

/// Parse a song into the pieces the playback embeds show
fn parse_song(song: &Song) -> (String, String, String) {
    let title = song.title.clone();
    let url = song.url.clone();
    let duration_str = song
        .duration
        .map(format_duration)
        .unwrap_or_else(|| "Unknown duration".to_string());

    (title, url, duration_str)
}

/// Embed for a song that just started playing
pub fn now_playing(song: &Song) -> CreateEmbed {
    let (title, url, duration_str) = parse_song(song);

    let mut embed = CreateEmbed::new()
        .title("🎵 Now Playing")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .color(0x00ff00);

    if let Some(channel) = &song.channel {
        embed = embed.field("Channel", channel.clone(), true);
    }
    if let Some(thumbnail) = &song.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }

    embed
}

/// Embed for a song that was appended behind others
pub fn added_to_queue(song: &Song, position: usize) -> CreateEmbed {
    let (title, url, duration_str) = parse_song(song);

    let mut embed = CreateEmbed::new()
        .title("🎵 Added to Queue")
        .description(format!("[{}]({})", title, url))
        .field("Duration", format!("`{}`", duration_str), true)
        .field("Position", format!("`#{}`", position), true)
        .color(0x00ff00);

    if let Some(thumbnail) = &song.thumbnail {
        embed = embed.thumbnail(thumbnail.clone());
    }

    embed
}

/// Numbered lines for up to [`QUEUE_DISPLAY_LIMIT`] upcoming songs, plus a
/// "+N more" footer when the queue is longer than that.
pub fn queue_lines(upcoming: &[Song]) -> (Vec<String>, Option<String>) {
    let lines = upcoming
        .iter()
        .take(QUEUE_DISPLAY_LIMIT)
        .enumerate()
        .map(|(index, song)| {
            let mut line = format!("`{}.` [{}]({})", index + 1, song.title, song.url);
            if let Some(duration) = song.duration {
                line.push_str(&format!(" `{}`", format_duration(duration)));
            }
            line
        })
        .collect();

    let footer = (upcoming.len() > QUEUE_DISPLAY_LIMIT)
        .then(|| format!("+{} more", upcoming.len() - QUEUE_DISPLAY_LIMIT));

    (lines, footer)
}

/// Embed for the `/queue` command
pub fn music_queue(snapshot: &PlayerSnapshot) -> CreateEmbed {
    let mut description = String::new();

    match &snapshot.current {
        Some(song) => {
            let marker = if snapshot.paused { "⏸️" } else { "🎵" };
            description.push_str(&format!(
                "**{} Now Playing**\n[{}]({})\n\n",
                marker, song.title, song.url
            ));
        }
        None => description.push_str("**🔇 Nothing playing**\n\n"),
    }

    let mut embed = CreateEmbed::new().title("🎵 Music Queue").color(0x00ff00);

    if snapshot.upcoming.is_empty() {
        description.push_str("**📭 Queue is empty**");
    } else {
        description.push_str(&format!("**📋 Up next - {} tracks**\n", snapshot.upcoming.len()));
        let (lines, footer) = queue_lines(&snapshot.upcoming);
        description.push_str(&lines.join("\n"));
        if let Some(footer) = footer {
            embed = embed.footer(CreateEmbedFooter::new(footer));
        }
    }

    embed.description(description)
}

/// Generic red error reply, ephemeral
pub fn error_reply(description: impl Into<String>) -> CreateReply {
    CreateReply::default()
        .embed(
            CreateEmbed::new()
                .title("❌ Error")
                .description(description.into())
                .color(0xff0000),
        )
        .ephemeral(true)
}

/// Embed posted to the guild's text channel when a song cannot be played
pub fn playback_failed(song: &Song) -> CreateEmbed {
    CreateEmbed::new()
        .title("❌ Playback Error")
        .description(format!(
            "Could not play **{}**, skipping to the next song",
            song.title
        ))
        .color(0xff0000)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn song(n: usize) -> Song {
        Song {
            title: format!("Song {}", n),
            url: format!("https://youtu.be/{}", n),
            duration: None,
            thumbnail: None,
            channel: None,
        }
    }

    #[test]
    fn short_queue_has_no_footer() {
        let songs: Vec<Song> = (1..=3).map(song).collect();
        let (lines, footer) = queue_lines(&songs);
        assert_eq!(lines.len(), 3);
        assert_eq!(footer, None);
        assert!(lines[0].contains("Song 1"));
        assert!(lines[2].contains("Song 3"));
    }

    #[test]
    fn twelve_songs_show_ten_plus_footer() {
        let songs: Vec<Song> = (1..=12).map(song).collect();
        let (lines, footer) = queue_lines(&songs);
        assert_eq!(lines.len(), 10);
        assert_eq!(footer.as_deref(), Some("+2 more"));
        assert!(lines[9].contains("Song 10"));
    }

    #[test]
    fn lines_are_numbered_in_queue_order() {
        let songs: Vec<Song> = (1..=4).map(song).collect();
        let (lines, _) = queue_lines(&songs);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.starts_with(&format!("`{}.`", i + 1)));
        }
    }
}
