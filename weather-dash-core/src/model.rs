use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// A point on the map, optionally resolved to a named place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl GeoLocation {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, city: None, country: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl WeatherCondition {
    /// Image URL for the condition icon. The code is passed through untouched.
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    #[serde(deserialize_with = "non_empty_conditions")]
    pub conditions: Vec<WeatherCondition>,
    pub city: String,
    pub country: String,
    pub timestamp: String,
    /// Not every backend reports coordinates with current weather.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl CurrentWeather {
    pub fn primary_condition(&self) -> &WeatherCondition {
        // Decoding rejects empty lists, so index 0 always exists.
        &self.conditions[0]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub date: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub precipitation_chance: f64,
    #[serde(deserialize_with = "non_empty_conditions")]
    pub conditions: Vec<WeatherCondition>,
}

impl ForecastItem {
    pub fn primary_condition(&self) -> &WeatherCondition {
        &self.conditions[0]
    }
}

/// Five-day forecast. `forecast` is chronological and must stay in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub city: String,
    pub country: String,
    pub forecast: Vec<ForecastItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    /// Air quality index, 1 (good) to 5 (very poor).
    pub aqi: u8,
    pub description: String,
    pub pollutants: BTreeMap<String, f64>,
    pub city: String,
    pub country: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub disabled: Option<bool>,
}

/// Body of a successful `POST /auth/token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

fn non_empty_conditions<'de, D>(deserializer: D) -> Result<Vec<WeatherCondition>, D::Error>
where
    D: Deserializer<'de>,
{
    let conditions = Vec::<WeatherCondition>::deserialize(deserializer)?;
    if conditions.is_empty() {
        return Err(D::Error::custom("conditions must contain at least one entry"));
    }
    Ok(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_json(conditions: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "temperature": 18.4,
            "feels_like": 17.9,
            "humidity": 72,
            "pressure": 1012,
            "wind_speed": 3.6,
            "wind_direction": 240,
            "conditions": conditions,
            "city": "Paris",
            "country": "FR",
            "timestamp": "2026-10-18T09:00:00",
            "lat": 48.85,
            "lon": 2.35
        })
    }

    #[test]
    fn integer_metrics_decode_as_floats() {
        let weather: CurrentWeather = serde_json::from_value(current_json(serde_json::json!([
            {"main": "Clouds", "description": "broken clouds", "icon": "04d"}
        ])))
        .expect("valid payload");

        assert_eq!(weather.humidity, 72.0);
        assert_eq!(weather.pressure, 1012.0);
        assert_eq!(weather.primary_condition().main, "Clouds");
    }

    #[test]
    fn empty_conditions_are_rejected() {
        let err = serde_json::from_value::<CurrentWeather>(current_json(serde_json::json!([])))
            .unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn missing_coordinates_decode_as_none() {
        let mut json = current_json(serde_json::json!([
            {"main": "Clear", "description": "clear sky", "icon": "01d"}
        ]));
        let obj = json.as_object_mut().expect("object");
        obj.remove("lat");
        obj.remove("lon");

        let weather: CurrentWeather = serde_json::from_value(json).expect("valid payload");
        assert_eq!((weather.lat, weather.lon), (None, None));
    }

    #[test]
    fn icon_url_embeds_code() {
        let condition = WeatherCondition {
            main: "Rain".into(),
            description: "light rain".into(),
            icon: "10n".into(),
        };
        assert_eq!(condition.icon_url(), "https://openweathermap.org/img/wn/10n@2x.png");
    }

    #[test]
    fn geolocation_without_names() {
        let loc: GeoLocation = serde_json::from_str(r#"{"lat": 35.68, "lon": 139.69}"#).unwrap();
        assert_eq!(loc, GeoLocation::new(35.68, 139.69));
    }
}
