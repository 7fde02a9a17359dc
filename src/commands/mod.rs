//! This module aggregates all the command modules for the bot.

/// General purpose commands (e.g., ping).
pub(crate) mod general;
/// Commands related to music playback.
pub(crate) mod music;
/// Commands for the OpenWeatherMap weather lookup.
pub(crate) mod weather;
