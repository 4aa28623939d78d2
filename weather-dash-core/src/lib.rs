//! Core library for the `weather-dash` terminal dashboard.
//!
//! This crate defines:
//! - The bearer-token session store and the request decorator that reads it
//! - Clients for the weather and auth APIs
//! - The view controller deciding which queries run and what gets rendered
//! - Plain-text rendering of the dashboard panels
//!
//! It is used by `weather-dash-cli`, but the controller can drive any front end.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod render;
pub mod retry;
pub mod session;

pub use auth::{AuthApi, AuthClient};
pub use config::Config;
pub use controller::{Delivery, ForecastView, ViewController, ViewState};
pub use error::DashboardError;
pub use model::{
    AirQuality, CurrentWeather, ForecastItem, GeoLocation, TokenResponse, User, WeatherCondition,
    WeatherForecast,
};
pub use provider::{WeatherApi, WeatherClient};
pub use retry::RetryPolicy;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, SharedSession};
