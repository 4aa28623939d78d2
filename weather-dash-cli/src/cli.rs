use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use weather_dash_core::{
    AuthApi, AuthClient, Config, DashboardError, FileSessionStore, GeoLocation, MemorySessionStore,
    SharedSession, ViewController, WeatherApi, WeatherClient, http::build_client, render,
};

use crate::{dashboard::Dashboard, prompt};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    /// Keep the session in memory only; nothing is written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive dashboard (default).
    Dashboard,

    /// Show current weather, and the forecast when logged in, for a city.
    Show {
        city: String,
    },

    /// Show current weather at a map coordinate.
    At {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
    },

    /// Show air quality for a city.
    Air {
        city: String,
    },

    /// Log in and store the session token.
    Login {
        #[arg(long)]
        username: Option<String>,
    },

    /// Forget the stored session token.
    Logout,

    /// Print the logged-in user.
    Whoami,

    /// Edit API and map settings.
    Configure,
}

/// Clients and settings shared by every command.
struct AppContext {
    config: Config,
    weather: Arc<WeatherClient>,
    auth: Arc<AuthClient>,
}

impl AppContext {
    fn build(ephemeral: bool) -> Result<Self> {
        let config = Config::load()?.with_env();

        let session: SharedSession = if ephemeral {
            Arc::new(MemorySessionStore::new())
        } else {
            Arc::new(FileSessionStore::open_default()?)
        };

        let http = build_client(config.request_timeout()).context("Failed to build HTTP client")?;
        let weather = Arc::new(WeatherClient::new(config.api_url(), http.clone(), session.clone()));
        let auth = Arc::new(AuthClient::new(config.api_url(), http, session.clone()));

        Ok(Self { config, weather, auth })
    }

    fn controller(&self) -> ViewController {
        ViewController::new(self.weather.clone(), self.auth.clone())
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let command = self.command.unwrap_or(Command::Dashboard);
        let ctx = AppContext::build(self.ephemeral)?;
        tracing::debug!(api_url = ctx.config.api_url(), "starting");

        match command {
            Command::Dashboard => {
                Dashboard {
                    controller: ctx.controller(),
                    weather: ctx.weather.as_ref(),
                    config: &ctx.config,
                }
                .run()
                .await?;
            }
            Command::Show { city } => {
                let mut ctrl = ctx.controller();
                ctrl.initialize().await;
                ctrl.handle_search(&city).map_err(|e| anyhow::anyhow!(e.user_message()))?;
                ctrl.settle().await;
                println!("{}", render::dashboard(&ctrl, &ctx.config));
            }
            Command::At { lat, lon } => {
                let mut ctrl = ctx.controller();
                ctrl.initialize().await;
                ctrl.handle_map_location_selected(GeoLocation::new(lat, lon));
                ctrl.settle().await;
                println!("{}", render::dashboard(&ctrl, &ctx.config));
            }
            Command::Air { city } => {
                let air = ctx
                    .weather
                    .air_quality_by_city(city.trim())
                    .await
                    .with_context(|| format!("Failed to fetch air quality for {city}"))?;
                println!("{}", render::air_quality_card(&air));
            }
            Command::Login { username } => {
                let creds = prompt::login_form(username)?;
                let mut ctrl = ctx.controller();
                ctrl.open_login();
                match ctrl.login(&creds.username, &creds.password).await {
                    Ok(()) => println!(
                        "Logged in as {}",
                        ctrl.state().username.as_deref().unwrap_or(&creds.username)
                    ),
                    Err(err) => {
                        let msg = ctrl.state().login_error.clone().unwrap_or_else(|| err.user_message());
                        anyhow::bail!(msg);
                    }
                }
            }
            Command::Logout => {
                ctx.auth.logout();
                println!("Logged out");
            }
            Command::Whoami => match ctx.auth.current_user().await {
                Ok(user) => {
                    let name = user.full_name.as_deref().unwrap_or(&user.username);
                    println!("{name} ({})", user.username);
                }
                Err(DashboardError::NotAuthenticated) => println!("Not logged in"),
                Err(DashboardError::Unauthorized) => {
                    ctx.auth.logout();
                    println!("Session expired, please log in again");
                }
                Err(err) => return Err(err).context("Failed to fetch current user"),
            },
            Command::Configure => configure()?,
        }

        Ok(())
    }
}

fn configure() -> Result<()> {
    let current = Config::load()?;
    let updated = prompt::configure(&current)?;
    updated.save()?;
    println!("Saved {}", Config::config_file_path()?.display());
    Ok(())
}
