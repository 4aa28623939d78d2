//! Interactive dashboard loop.

use anyhow::Result;
use weather_dash_core::{Config, ViewController, WeatherApi, render};

use crate::prompt::{self, Action};

pub struct Dashboard<'a> {
    pub controller: ViewController,
    pub weather: &'a dyn WeatherApi,
    pub config: &'a Config,
}

impl Dashboard<'_> {
    pub async fn run(mut self) -> Result<()> {
        self.controller.initialize().await;
        self.print();

        loop {
            let action = prompt::action(self.controller.state().is_authenticated)?;
            match action {
                Action::Search => {
                    let city = prompt::search_city()?;
                    if let Err(err) = self.controller.handle_search(&city) {
                        println!("{}", err.user_message());
                        continue;
                    }
                }
                Action::PickOnMap => {
                    let location = prompt::map_location()?;
                    self.controller.handle_map_location_selected(location);
                }
                Action::FindOnMap => {
                    let place = prompt::place_name()?;
                    match self.weather.geocode_city(place.trim()).await {
                        Ok(location) => self.controller.handle_map_location_selected(location),
                        Err(err) => {
                            tracing::warn!(error = %err, "geocoding failed");
                            println!("Could not find '{}' on the map.", place.trim());
                            continue;
                        }
                    }
                }
                Action::AirQuality => {
                    self.print_air_quality().await;
                    continue;
                }
                Action::Login => {
                    self.controller.open_login();
                    let creds = prompt::login_form(None)?;
                    if let Err(err) = self.controller.login(&creds.username, &creds.password).await {
                        let msg = self.controller.state().login_error.clone();
                        println!("{}", msg.unwrap_or_else(|| err.user_message()));
                        self.controller.close_login();
                        continue;
                    }
                }
                Action::Logout => self.controller.logout(),
                Action::Quit => return Ok(()),
            }

            if self.controller.is_loading() {
                println!("{}", render::LOADING_MESSAGE);
                self.controller.settle().await;
            }
            self.print();
        }
    }

    fn print(&self) {
        println!("\n{}\n", render::dashboard(&self.controller, self.config));
    }

    async fn print_air_quality(&self) {
        let state = self.controller.state();
        let result = if !state.search_city.is_empty() {
            self.weather.air_quality_by_city(&state.search_city).await
        } else if let Some(loc) = &state.selected_location {
            self.weather.air_quality_by_coordinates(loc.lat, loc.lon).await
        } else {
            println!("Search for a city or pick a map location first.");
            return;
        };

        match result {
            Ok(air) => println!("\n{}\n", render::air_quality_card(&air)),
            Err(err) => println!("{}", err.user_message()),
        }
    }
}
