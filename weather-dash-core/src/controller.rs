//! Central view state: search input, selected map location, session flags,
//! and the two data queries derived from them.
//!
//! Queries are addressed by key. Whenever a key changes the query's
//! generation is bumped and, if the query is enabled, a fetch task is spawned
//! tagged with that generation. Completions travel back over a channel and
//! are applied only when their generation is still current, so a response to
//! a superseded key is never rendered.
//!
//! Completions also carry the session epoch they were started under. The
//! epoch moves on every login, logout and invalidation, and a 401 only ends
//! the session when it was earned by the current one.
//!
//! Fetches are spawned with `tokio::spawn`; input handlers must run inside a
//! tokio runtime.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    auth::AuthApi,
    error::{DashboardError, Result},
    model::{CurrentWeather, GeoLocation, WeatherForecast},
    provider::WeatherApi,
    retry::RetryPolicy,
};

pub const LOGIN_FAILED_MESSAGE: &str = "Invalid username or password. Please try again.";
pub const EMPTY_SEARCH_MESSAGE: &str = "Please enter a city name";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Username and password are required";

/// Map centre used before any weather has been loaded.
pub const DEFAULT_MAP_CENTER: (f64, f64) = (20.0, 0.0);

/// What the current-weather query is fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherKey {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatus<T> {
    Idle,
    Loading,
    Success(T),
    Error(DashboardError),
}

/// A keyed query with a generation counter for discarding stale completions.
#[derive(Debug, Clone)]
pub struct Query<K, T> {
    key: Option<K>,
    generation: u64,
    status: QueryStatus<T>,
}

impl<K: PartialEq, T> Default for Query<K, T> {
    fn default() -> Self {
        Self { key: None, generation: 0, status: QueryStatus::Idle }
    }
}

impl<K: PartialEq, T> Query<K, T> {
    pub fn key(&self) -> Option<&K> {
        self.key.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> &QueryStatus<T> {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, QueryStatus::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match &self.status {
            QueryStatus::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DashboardError> {
        match &self.status {
            QueryStatus::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Point the query at `key` (`None` disables it). Returns the generation a
    /// new fetch must be tagged with, or `None` when nothing needs fetching.
    fn retarget(&mut self, key: Option<K>) -> Option<u64> {
        if self.key == key {
            return None;
        }

        self.generation += 1;
        self.key = key;
        if self.key.is_some() {
            self.status = QueryStatus::Loading;
            Some(self.generation)
        } else {
            self.status = QueryStatus::Idle;
            None
        }
    }

    /// Apply a completion. Returns `false` if it belongs to an older generation.
    fn accept(&mut self, generation: u64, result: Result<T>) -> bool {
        if generation != self.generation || self.key.is_none() {
            return false;
        }

        self.status = match result {
            Ok(data) => QueryStatus::Success(data),
            Err(err) => QueryStatus::Error(err),
        };
        true
    }
}

#[derive(Debug)]
pub enum Completion {
    Weather { generation: u64, epoch: u64, result: Result<CurrentWeather> },
    Forecast { generation: u64, epoch: u64, result: Result<WeatherForecast> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    /// The completion was for a superseded key and was dropped.
    Discarded,
}

/// User input and session flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search_city: String,
    pub selected_location: Option<GeoLocation>,
    pub is_authenticated: bool,
    pub username: Option<String>,
    pub show_login: bool,
    pub login_error: Option<String>,
    pub search_error: Option<String>,
}

/// How the forecast panel should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastView<'a> {
    LoginRequired,
    /// Nothing searched by city yet.
    Hidden,
    Loading,
    Error(&'a DashboardError),
    Ready(&'a WeatherForecast),
}

#[derive(Debug)]
pub struct ViewController {
    weather_api: Arc<dyn WeatherApi>,
    auth_api: Arc<dyn AuthApi>,
    retry: RetryPolicy,
    state: ViewState,
    weather: Query<WeatherKey, CurrentWeather>,
    forecast: Query<String, WeatherForecast>,
    session_epoch: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl ViewController {
    pub fn new(weather_api: Arc<dyn WeatherApi>, auth_api: Arc<dyn AuthApi>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            weather_api,
            auth_api,
            retry: RetryPolicy::default(),
            // A stored token counts only after `initialize` has checked it.
            state: ViewState::default(),
            weather: Query::default(),
            forecast: Query::default(),
            session_epoch: 0,
            tx,
            rx,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn weather_query(&self) -> &Query<WeatherKey, CurrentWeather> {
        &self.weather
    }

    pub fn forecast_query(&self) -> &Query<String, WeatherForecast> {
        &self.forecast
    }

    /// Page-load check: a stored token is only trusted once the server confirms it.
    pub async fn initialize(&mut self) {
        self.session_epoch += 1;
        self.state.is_authenticated = self.auth_api.is_authenticated();
        if self.state.is_authenticated {
            if let Err(err) = self.refresh_user().await {
                tracing::info!(error = %err, "stored session rejected");
            }
        }
        self.sync_queries();
    }

    pub fn handle_search(&mut self, input: &str) -> Result<()> {
        let city = input.trim();
        if city.is_empty() {
            self.state.search_error = Some(EMPTY_SEARCH_MESSAGE.to_string());
            return Err(DashboardError::Validation(EMPTY_SEARCH_MESSAGE.to_string()));
        }

        self.state.search_error = None;
        self.state.search_city = city.to_string();
        self.state.selected_location = None;
        self.sync_queries();
        Ok(())
    }

    pub fn handle_map_location_selected(&mut self, location: GeoLocation) {
        self.state.selected_location = Some(location);
        self.state.search_city.clear();
        self.sync_queries();
    }

    pub fn open_login(&mut self) {
        self.state.show_login = true;
        self.state.login_error = None;
    }

    pub fn close_login(&mut self) {
        self.state.show_login = false;
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.state.login_error = None;

        if username.trim().is_empty() || password.is_empty() {
            self.state.login_error = Some(MISSING_CREDENTIALS_MESSAGE.to_string());
            return Err(DashboardError::Validation(MISSING_CREDENTIALS_MESSAGE.to_string()));
        }

        if let Err(err) = self.auth_api.login(username, password).await {
            tracing::info!(error = %err, "login rejected");
            self.state.login_error = Some(LOGIN_FAILED_MESSAGE.to_string());
            return Err(err);
        }

        self.session_epoch += 1;
        self.state.is_authenticated = true;
        self.state.show_login = false;
        let user = self.refresh_user().await;
        self.sync_queries();
        user
    }

    pub fn logout(&mut self) {
        self.session_epoch += 1;
        self.auth_api.logout();
        self.state.is_authenticated = false;
        self.state.username = None;
        self.sync_queries();
    }

    pub fn weather_enabled(&self) -> bool {
        !self.state.search_city.is_empty() || self.state.selected_location.is_some()
    }

    pub fn forecast_enabled(&self) -> bool {
        !self.state.search_city.is_empty() && self.state.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.weather.is_loading() || self.forecast.is_loading()
    }

    pub fn has_weather_error(&self) -> bool {
        self.weather.error().is_some()
    }

    pub fn has_data(&self) -> bool {
        self.weather.data().is_some() && !self.is_loading() && !self.has_weather_error()
    }

    pub fn current_weather(&self) -> Option<&CurrentWeather> {
        self.weather.data()
    }

    pub fn forecast_view(&self) -> ForecastView<'_> {
        if !self.state.is_authenticated {
            return ForecastView::LoginRequired;
        }
        match self.forecast.status() {
            QueryStatus::Idle => ForecastView::Hidden,
            QueryStatus::Loading => ForecastView::Loading,
            QueryStatus::Error(err) => ForecastView::Error(err),
            QueryStatus::Success(forecast) => ForecastView::Ready(forecast),
        }
    }

    /// Centre for the map panel: the loaded weather's coordinates, then the
    /// selected location, then the default.
    pub fn map_center(&self) -> (f64, f64) {
        self.current_weather()
            .and_then(|w| w.lat.zip(w.lon))
            .or_else(|| self.state.selected_location.as_ref().map(|loc| (loc.lat, loc.lon)))
            .unwrap_or(DEFAULT_MAP_CENTER)
    }

    /// Wait for the next fetch completion and apply it.
    pub async fn next_completion(&mut self) -> Delivery {
        match self.rx.recv().await {
            Some(completion) => self.apply(completion),
            // Unreachable while `self.tx` lives.
            None => Delivery::Discarded,
        }
    }

    /// Apply every completion that has already arrived.
    pub fn drain_ready(&mut self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            count += 1;
        }
        count
    }

    /// Apply completions until no query is loading.
    pub async fn settle(&mut self) {
        while self.is_loading() {
            self.next_completion().await;
        }
    }

    pub fn apply(&mut self, completion: Completion) -> Delivery {
        let (applied, epoch, unauthorized) = match completion {
            Completion::Weather { generation, epoch, result } => {
                let unauthorized = result.as_ref().is_err_and(DashboardError::is_unauthorized);
                (self.weather.accept(generation, result), epoch, unauthorized)
            }
            Completion::Forecast { generation, epoch, result } => {
                let unauthorized = result.as_ref().is_err_and(DashboardError::is_unauthorized);
                (self.forecast.accept(generation, result), epoch, unauthorized)
            }
        };

        if !applied {
            tracing::debug!("discarded stale completion");
            return Delivery::Discarded;
        }

        if unauthorized {
            if epoch == self.session_epoch {
                tracing::info!("server rejected session token");
                self.invalidate_session();
            } else {
                tracing::debug!(epoch, current = self.session_epoch, "ignored 401 from an earlier session");
            }
        }
        Delivery::Applied
    }

    async fn refresh_user(&mut self) -> Result<()> {
        match self.auth_api.current_user().await {
            Ok(user) => {
                self.state.username = Some(user.username);
                Ok(())
            }
            Err(err) => {
                self.invalidate_session();
                Err(err)
            }
        }
    }

    fn invalidate_session(&mut self) {
        self.session_epoch += 1;
        self.auth_api.logout();
        self.state.is_authenticated = false;
        self.state.username = None;
        self.sync_queries();
    }

    /// Retarget both queries at the keys implied by the current state.
    fn sync_queries(&mut self) {
        let weather_key = if !self.state.search_city.is_empty() {
            Some(WeatherKey::City(self.state.search_city.clone()))
        } else {
            self.state
                .selected_location
                .as_ref()
                .map(|loc| WeatherKey::Coordinates { lat: loc.lat, lon: loc.lon })
        };
        if let Some(generation) = self.weather.retarget(weather_key.clone()) {
            if let Some(key) = weather_key {
                self.spawn_weather(generation, key);
            }
        }

        let forecast_key = self.forecast_enabled().then(|| self.state.search_city.clone());
        if let Some(generation) = self.forecast.retarget(forecast_key.clone()) {
            if let Some(city) = forecast_key {
                self.spawn_forecast(generation, city);
            }
        }
    }

    fn spawn_weather(&self, generation: u64, key: WeatherKey) {
        let api = Arc::clone(&self.weather_api);
        let tx = self.tx.clone();
        let epoch = self.session_epoch;
        tracing::debug!(generation, epoch, ?key, "fetching current weather");

        tokio::spawn(async move {
            let result = match key {
                WeatherKey::City(city) => api.current_by_city(&city).await,
                WeatherKey::Coordinates { lat, lon } => api.current_by_coordinates(lat, lon).await,
            };
            let _ = tx.send(Completion::Weather { generation, epoch, result });
        });
    }

    fn spawn_forecast(&self, generation: u64, city: String) {
        let api = Arc::clone(&self.weather_api);
        let tx = self.tx.clone();
        let retry = self.retry.clone();
        let epoch = self.session_epoch;
        tracing::debug!(generation, epoch, %city, "fetching forecast");

        tokio::spawn(async move {
            let api = api.as_ref();
            let city = city.as_str();
            let result = retry.run(move || api.forecast_by_city(city)).await;
            let _ = tx.send(Completion::Forecast { generation, epoch, result });
        });
    }
}
