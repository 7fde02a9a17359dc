use std::env;

use chrono::Utc;
use futures::Stream;
use poise::{CreateReply, serenity_prelude::Color};
use serenity::builder::CreateEmbedFooter;
use tracing::warn;

use crate::{CommandResult, Context, serenity::CreateEmbed};

use super::*;

/// Get the current weather for a Vietnamese city
#[poise::command(slash_command, category = "Weather")]
pub async fn weather(
    ctx: Context<'_>,
    #[description = "City name (e.g. Ho Chi Minh City, Go Vap)"]
    #[autocomplete = "autocomplete_city"]
    city: String,
) -> CommandResult {
    ctx.defer().await?;

    let Ok(api_key) = env::var("OPENWEATHER_API_KEY") else {
        ctx.send(lookup_failed(&city)).await?;
        return Ok(());
    };

    match fetch_weather(API, &api_key, &city).await {
        Ok(report) => {
            let fields = vec![
                ("🌡️ Temperature", format!("{}°C", report.temperature.round()), true),
                ("🌡️ Feels Like", format!("{}°C", report.feels_like.round()), true),
                ("💧 Humidity", format!("{}%", report.humidity), true),
                ("☁️ Conditions", report.description.clone(), true),
                ("💨 Wind", format!("{} m/s", report.wind_speed), true),
                ("👁️ Visibility", format!("{} km", report.visibility_km), true),
            ];

            let mut embed = CreateEmbed::new()
                .title(format!("🌤️ Weather in {}", report.city))
                .fields(fields)
                .color(Color::DARK_GREEN)
                .timestamp(Utc::now())
                .footer(CreateEmbedFooter::new("via OpenWeatherMap"));

            if let Some(icon) = &report.icon {
                embed = embed.thumbnail(format!(
                    "https://openweathermap.org/img/wn/{}@2x.png",
                    icon
                ));
            }

            ctx.send(CreateReply::default().embed(embed)).await?;
        }
        Err(err) => {
            warn!("weather lookup for '{}' failed: {}", city, err);
            ctx.send(lookup_failed(&city)).await?;
        }
    }

    Ok(())
}

/// Fixed error reply shown for any failed lookup
fn lookup_failed(city: &str) -> CreateReply {
    CreateReply::default().embed(
        CreateEmbed::new()
            .title("❌ Error")
            .description(format!(
                "Could not fetch the weather for **{}**. Please check the city name!",
                city
            ))
            .color(Color::RED),
    )
}

async fn autocomplete_city<'a>(
    _ctx: Context<'_>,
    partial: &'a str,
) -> impl Stream<Item = String> + 'a {
    let partial = partial.to_lowercase();

    futures::stream::iter(
        VIETNAM_CITIES
            .iter()
            .filter(move |city| city.to_lowercase().contains(&partial))
            .map(|city| city.to_string()),
    )
}
