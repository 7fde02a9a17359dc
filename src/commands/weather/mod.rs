//! Module providing functionality to interact with the OpenWeatherMap API.
//! Includes the command definition, city alias handling, request logic, and
//! error handling.

use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

use crate::HTTP_CLIENT;

/// Submodule defining the actual `/weather` command.
pub(crate) mod weather;

/// Base URL for the OpenWeatherMap API v2.5.
const API: &str = "https://api.openweathermap.org/data/2.5/";

/// Country code appended to every lookup; this bot serves Vietnamese guilds.
const COUNTRY: &str = "VN";

/// Vietnamese-language spellings and shorthand mapped to the city names the
/// weather API knows. Matched case-insensitively and exactly.
const CITY_ALIASES: &[(&str, &str)] = &[
    ("hcm", "Ho Chi Minh City"),
    ("tphcm", "Ho Chi Minh City"),
    ("tp hcm", "Ho Chi Minh City"),
    ("go vap", "Go Vap"),
    ("gò vấp", "Go Vap"),
    ("ha noi", "Hanoi"),
    ("hà nội", "Hanoi"),
    ("da nang", "Da Nang"),
    ("đà nẵng", "Da Nang"),
    ("can tho", "Can Tho"),
    ("cần thơ", "Can Tho"),
];

/// Cities offered by the `/weather` autocomplete.
pub(crate) const VIETNAM_CITIES: &[&str] = &[
    "Ho Chi Minh City",
    "Hanoi",
    "Da Nang",
    "Can Tho",
    "Hai Phong",
    "Go Vap",
    "Cu Chi",
    "Bien Hoa",
    "Vung Tau",
    "Nha Trang",
    "Hue",
    "Quy Nhon",
    "Da Lat",
    "Phan Thiet",
    "Rach Gia",
    "Ca Mau",
    "Buon Ma Thuot",
    "Pleiku",
    "Kontum",
    "An Giang",
    "Long Xuyen",
    "My Tho",
    "Tra Vinh",
    "Soc Trang",
    "Bac Lieu",
    "Cao Lanh",
    "Sa Dec",
    "Vinh Long",
    "Ben Tre",
    "Dong Thap",
];

/// Map a free-text city name onto its canonical form, or pass it through
/// unchanged when no alias matches.
fn resolve_city(input: &str) -> String {
    let normalized = input.trim().to_lowercase();
    CITY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == normalized)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| input.trim().to_string())
}

/// The six fields the weather embed displays.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct WeatherReport {
    /// City name as reported back by the API.
    pub city: String,
    /// Temperature in °C.
    pub temperature: f64,
    /// Perceived temperature in °C.
    pub feels_like: f64,
    /// Relative humidity in percent.
    pub humidity: u64,
    /// Short weather description.
    pub description: String,
    /// Wind speed in m/s.
    pub wind_speed: f64,
    /// Visibility in km.
    pub visibility_km: f64,
    /// Icon code for the thumbnail, if present.
    pub icon: Option<String>,
}

impl WeatherReport {
    /// Creates a `WeatherReport` from the API's JSON response.
    fn from_json(json: &Value) -> Option<Self> {
        let main = json.get("main")?;

        Some(Self {
            city: json["name"].as_str().unwrap_or("Unknown").to_string(),
            temperature: main["temp"].as_f64()?,
            feels_like: main["feels_like"].as_f64().unwrap_or_default(),
            humidity: main["humidity"].as_u64().unwrap_or_default(),
            description: json["weather"][0]["description"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            wind_speed: json["wind"]["speed"].as_f64().unwrap_or_default(),
            visibility_km: json["visibility"].as_f64().unwrap_or_default() / 1000.0,
            icon: json["weather"][0]["icon"].as_str().map(|s| s.to_string()),
        })
    }
}

/// Custom error type for weather API interactions.
#[derive(Error, Debug)]
pub(crate) enum WeatherError {
    /// Error during HTTP request communication.
    #[error("API communication failure: {0}")]
    Api(#[from] reqwest::Error),

    /// Error during JSON parsing.
    #[error("Unable to parse text from JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Error reported by the API itself (unknown city, bad key).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The response parsed but did not contain the expected fields.
    #[error("Invalid response received from OpenWeatherMap")]
    Invalid,
}

/// Look up the current weather for a free-text city name. The alias table is
/// applied before the request is made.
pub(crate) async fn fetch_weather(
    base_url: &str,
    api_key: &str,
    city: &str,
) -> Result<WeatherReport, WeatherError> {
    let resolved = resolve_city(city);
    let place = format!("{},{}", resolved, COUNTRY);
    let query = [
        ("q", place.as_str()),
        ("appid", api_key),
        ("units", "metric"),
    ];

    let value = send_request(base_url, "weather", &query).await?;

    WeatherReport::from_json(&value).ok_or(WeatherError::Invalid)
}

/// Sends a GET request to an OpenWeatherMap endpoint and surfaces API-level
/// errors (non-200 `cod` plus a `message` field) as `BadRequest`.
async fn send_request(
    base_url: &str,
    path: &str,
    query: &[(&str, &str)],
) -> Result<Value, WeatherError> {
    let base = Url::parse(base_url)
        .map_err(|e| WeatherError::BadRequest(format!("Invalid base URL '{}': {}", base_url, e)))?;
    let full_url = base.join(path).map_err(|e| {
        WeatherError::BadRequest(format!(
            "Invalid path segment '{}' for base URL '{}': {}",
            path, base_url, e
        ))
    })?;

    let response = HTTP_CLIENT
        .get(full_url)
        .query(query)
        .send()
        .await
        .map_err(WeatherError::Api)?
        .text()
        .await
        .map_err(WeatherError::Api)?;

    let val: Value = serde_json::from_str(&response).map_err(WeatherError::Json)?;

    // OpenWeatherMap reports errors in the body; `cod` is a number on
    // success and a string on failure.
    let cod = val["cod"]
        .as_i64()
        .or_else(|| val["cod"].as_str().and_then(|s| s.parse().ok()));
    match cod {
        Some(200) | None => Ok(val),
        Some(_) => Err(WeatherError::BadRequest(
            val["message"]
                .as_str()
                .unwrap_or("unknown API error")
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test_case("hcm", "Ho Chi Minh City")]
    #[test_case("tphcm", "Ho Chi Minh City")]
    #[test_case("tp hcm", "Ho Chi Minh City")]
    #[test_case("go vap", "Go Vap")]
    #[test_case("gò vấp", "Go Vap")]
    #[test_case("ha noi", "Hanoi")]
    #[test_case("hà nội", "Hanoi")]
    #[test_case("da nang", "Da Nang")]
    #[test_case("đà nẵng", "Da Nang")]
    #[test_case("can tho", "Can Tho")]
    #[test_case("cần thơ", "Can Tho")]
    fn resolves_known_aliases(alias: &str, canonical: &str) {
        assert_eq!(resolve_city(alias), canonical);
    }

    #[test]
    fn alias_matching_is_case_insensitive() {
        assert_eq!(resolve_city("HCM"), "Ho Chi Minh City");
        assert_eq!(resolve_city("Gò Vấp"), "Go Vap");
    }

    #[test]
    fn unknown_cities_pass_through() {
        assert_eq!(resolve_city("Hue"), "Hue");
        assert_eq!(resolve_city("  Nha Trang "), "Nha Trang");
    }

    fn sample_payload() -> Value {
        json!({
            "cod": 200,
            "name": "Go Vap",
            "main": {
                "temp": 31.4,
                "feels_like": 36.2,
                "humidity": 62
            },
            "weather": [
                { "description": "scattered clouds", "icon": "03d" }
            ],
            "wind": { "speed": 3.6 },
            "visibility": 10000
        })
    }

    #[test]
    fn parses_api_payload() {
        let report = WeatherReport::from_json(&sample_payload()).unwrap();
        assert_eq!(report.city, "Go Vap");
        assert_eq!(report.temperature, 31.4);
        assert_eq!(report.feels_like, 36.2);
        assert_eq!(report.humidity, 62);
        assert_eq!(report.description, "scattered clouds");
        assert_eq!(report.wind_speed, 3.6);
        assert_eq!(report.visibility_km, 10.0);
        assert_eq!(report.icon.as_deref(), Some("03d"));
    }

    #[test]
    fn payload_without_main_is_invalid() {
        assert_eq!(WeatherReport::from_json(&json!({"name": "X"})), None);
    }

    #[tokio::test]
    async fn alias_is_resolved_before_the_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", "Go Vap,VN"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_payload()))
            .expect(1)
            .mount(&server)
            .await;

        let report = fetch_weather(&format!("{}/", server.uri()), "test-key", "gò vấp")
            .await
            .unwrap();

        assert_eq!(report.city, "Go Vap");
        server.verify().await;
    }

    #[tokio::test]
    async fn unknown_city_maps_to_bad_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "cod": "404",
                "message": "city not found"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = fetch_weather(&format!("{}/", server.uri()), "test-key", "nowhere").await;

        match result {
            Err(WeatherError::BadRequest(msg)) => assert_eq!(msg, "city not found"),
            other => panic!("Expected BadRequest error, got {:?}", other),
        }
        server.verify().await;
    }
}
