//! Interactive forms. Required-field validation happens here, before the
//! controller sees the input.

use anyhow::{Context, Result};
use inquire::{
    CustomType, CustomUserError, Password, PasswordDisplayMode, Select, Text, required,
    validator::Validation,
};
use weather_dash_core::{Config, GeoLocation, controller::EMPTY_SEARCH_MESSAGE, render};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Search,
    PickOnMap,
    FindOnMap,
    AirQuality,
    Login,
    Logout,
    Quit,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Search => "Search for a city",
            Action::PickOnMap => "Pick a map location (coordinates)",
            Action::FindOnMap => "Find a place on the map",
            Action::AirQuality => "Air quality for the current place",
            Action::Login => "Log in",
            Action::Logout => "Log out",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

pub fn action(is_authenticated: bool) -> Result<Action> {
    let mut options = vec![Action::Search, Action::PickOnMap, Action::FindOnMap, Action::AirQuality];
    options.push(if is_authenticated { Action::Logout } else { Action::Login });
    options.push(Action::Quit);

    Select::new("What next?", options).prompt().context("Failed to read menu choice")
}

pub fn search_city() -> Result<String> {
    Text::new("City:")
        .with_placeholder("Enter city name...")
        .with_validator(required!(EMPTY_SEARCH_MESSAGE))
        .prompt()
        .context("Failed to read city name")
}

pub fn place_name() -> Result<String> {
    Text::new("Place to find on the map:")
        .with_validator(required!(EMPTY_SEARCH_MESSAGE))
        .prompt()
        .context("Failed to read place name")
}

pub fn map_location() -> Result<GeoLocation> {
    let lat = CustomType::<f64>::new("Latitude:")
        .with_error_message("Please type a number")
        .with_validator(|v: &f64| -> Result<Validation, CustomUserError> {
            Ok(if (-90.0..=90.0).contains(v) {
                Validation::Valid
            } else {
                Validation::Invalid("Latitude must be between -90 and 90".into())
            })
        })
        .prompt()
        .context("Failed to read latitude")?;

    let lon = CustomType::<f64>::new("Longitude:")
        .with_error_message("Please type a number")
        .with_validator(|v: &f64| -> Result<Validation, CustomUserError> {
            Ok(if (-180.0..=180.0).contains(v) {
                Validation::Valid
            } else {
                Validation::Invalid("Longitude must be between -180 and 180".into())
            })
        })
        .prompt()
        .context("Failed to read longitude")?;

    Ok(GeoLocation::new(lat, lon))
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn login_form(username: Option<String>) -> Result<Credentials> {
    println!("{}", render::login_hint());

    let username = match username {
        Some(username) => username,
        None => Text::new("Username:")
            .with_validator(required!("Username is required"))
            .prompt()
            .context("Failed to read username")?,
    };

    let password = Password::new("Password:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_validator(required!("Password is required"))
        .prompt()
        .context("Failed to read password")?;

    Ok(Credentials { username, password })
}

/// Edit the stored settings, starting from the current values.
pub fn configure(current: &Config) -> Result<Config> {
    let api_url = Text::new("API base URL:")
        .with_default(current.api_url())
        .with_validator(required!("The API URL is required"))
        .prompt()
        .context("Failed to read API URL")?;

    let tile_url = Text::new("Map tile URL:")
        .with_default(current.map_tile_url())
        .prompt()
        .context("Failed to read map tile URL")?;

    let attribution = Text::new("Map attribution:")
        .with_default(current.map_attribution())
        .prompt()
        .context("Failed to read map attribution")?;

    let mut cfg = current.clone();
    cfg.api_url = Some(api_url.trim().to_string());
    cfg.map.tile_url = Some(tile_url.trim().to_string()).filter(|s| !s.is_empty());
    cfg.map.attribution = Some(attribution.trim().to_string()).filter(|s| !s.is_empty());
    Ok(cfg)
}
