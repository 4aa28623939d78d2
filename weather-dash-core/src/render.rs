//! Plain-text presentation of the dashboard.
//!
//! Every function here is pure: it reads entities or controller state and
//! returns text. Nothing in this module touches the network.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::{
    config::Config,
    controller::{ForecastView, ViewController},
    model::{AirQuality, CurrentWeather, ForecastItem, GeoLocation, WeatherForecast},
};

pub const LOADING_MESSAGE: &str = "Loading weather data...";
pub const WEATHER_ERROR_MESSAGE: &str =
    "Error fetching weather data. Please check the city name and try again.";
pub const LOGIN_REQUIRED_MESSAGE: &str = "Log in to see the 5-day forecast.";
pub const DEMO_ACCOUNTS: &[(&str, &str)] = &[("johndoe", "secret"), ("alice", "secret123")];

pub fn weather_card(weather: &CurrentWeather) -> String {
    let condition = weather.primary_condition();
    let mut out = String::new();

    let _ = writeln!(out, "{}, {}  {}°C", weather.city, weather.country, weather.temperature.round());
    let _ = writeln!(out, "  {} ({})", condition.description, condition.icon_url());
    let _ = writeln!(out, "  Feels like  {}°C", weather.feels_like.round());
    let _ = writeln!(out, "  Wind        {} m/s", weather.wind_speed);
    let _ = writeln!(out, "  Humidity    {}%", weather.humidity);
    let _ = writeln!(out, "  Pressure    {} hPa", weather.pressure);
    let _ = write!(out, "  Updated: {}", format_timestamp(&weather.timestamp));
    out
}

pub fn forecast_card(item: &ForecastItem) -> String {
    let condition = item.primary_condition();
    let low = format!("{}°", item.temp_min.round());
    format!(
        "{:<12} {:>4}° / {:<4} rain {:>3}%  hum {:>3}%  wind {} m/s  {}",
        format_day(&item.date),
        item.temp_max.round(),
        low,
        item.precipitation_chance.round(),
        item.humidity,
        item.wind_speed,
        condition.main,
    )
}

/// One line per day, in the order the server sent them.
pub fn forecast_list(forecast: &WeatherForecast) -> String {
    let mut out = format!("5-Day Forecast for {}, {}", forecast.city, forecast.country);
    for item in &forecast.forecast {
        out.push_str("\n  ");
        out.push_str(&forecast_card(item));
    }
    out
}

pub fn air_quality_card(air: &AirQuality) -> String {
    let mut out = format!("Air quality in {}, {}: {} (AQI {})", air.city, air.country, air.description, air.aqi);
    for (pollutant, value) in &air.pollutants {
        let _ = write!(out, "\n  {pollutant:<6} {value}");
    }
    out
}

pub fn map_panel(config: &Config, center: (f64, f64), selected: Option<&GeoLocation>) -> String {
    let mut out = String::from("Interactive Map\n");
    let _ = writeln!(out, "  Tiles:  {}", config.map_tile_url());
    if !config.map_attribution().is_empty() {
        let _ = writeln!(out, "  {}", config.map_attribution());
    }
    let _ = write!(out, "  Centre: {:.2}, {:.2}", center.0, center.1);
    match selected {
        Some(loc) => {
            let _ = write!(out, "\n  Selected Location: {:.4}, {:.4}", loc.lat, loc.lon);
        }
        None => out.push_str("\n  Pick a location to see its weather"),
    }
    out
}

pub fn login_hint() -> String {
    let mut out = String::from("Demo accounts:");
    for (user, password) in DEMO_ACCOUNTS {
        let _ = write!(out, "\n  Username: {user} / Password: {password}");
    }
    out
}

/// Full dashboard as the controller currently sees it.
pub fn dashboard(ctrl: &ViewController, config: &Config) -> String {
    let state = ctrl.state();
    let mut sections = Vec::new();

    sections.push(match &state.username {
        Some(user) => format!("Weather App  (logged in as {user})"),
        None => "Weather App  (not logged in)".to_string(),
    });

    if let Some(err) = &state.search_error {
        sections.push(err.clone());
    }

    if ctrl.has_data() {
        if let Some(weather) = ctrl.current_weather() {
            sections.push(format!("Current Weather\n{}", weather_card(weather)));
        }
    }

    sections.push(map_panel(config, ctrl.map_center(), state.selected_location.as_ref()));

    match ctrl.forecast_view() {
        ForecastView::LoginRequired if !state.search_city.is_empty() => {
            sections.push(LOGIN_REQUIRED_MESSAGE.to_string());
        }
        ForecastView::Ready(forecast) if ctrl.has_data() => {
            sections.push(forecast_list(forecast));
        }
        ForecastView::Error(err) => sections.push(format!("Forecast: {}", err.user_message())),
        _ => {}
    }

    if ctrl.is_loading() {
        sections.push(LOADING_MESSAGE.to_string());
    }

    if ctrl.has_weather_error() {
        sections.push(WEATHER_ERROR_MESSAGE.to_string());
    }

    sections.join("\n\n")
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// `Mon, Oct 19`. Unparseable input is shown as-is.
fn format_day(raw: &str) -> String {
    parse_datetime(raw)
        .map(|dt| dt.format("%a, %b %-d").to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn format_timestamp(raw: &str) -> String {
    parse_datetime(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}
