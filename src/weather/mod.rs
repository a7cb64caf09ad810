/*
 *  weather/mod.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Weather providers, normalized samples and the provider error taxonomy
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub mod accuweather;
pub mod cache;
pub mod http;
pub mod icons;
pub mod location;
pub mod openweather;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::StationConfig;

pub use accuweather::AccuWeather;
pub use cache::{CacheStore, DataKind};
pub use icons::IconCode;
pub use openweather::OpenWeather;

/// Errors raised while acquiring or normalizing weather data.
#[derive(Debug, Error)]
pub enum WeatherApiError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{what} request failed with status {status}")]
    Status { what: String, status: u16 },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Record does not have the shape the provider expects.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("{operation} is not supported by {provider}")]
    Unsupported { provider: ProviderKind, operation: &'static str },
    #[error("unknown icon code {0}")]
    UnknownIconCode(String),
    #[error("missing configuration: {0}")]
    MissingConfig(String),
    #[error("geolocation error: {0}")]
    Geolocation(String),
}

/// Unit system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Metric,
    Imperial,
    Standard,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

/// Which provider variant backs the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[value(name = "openweather")]
    OpenWeather,
    #[value(name = "accuweather")]
    AccuWeather,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::OpenWeather => write!(f, "OpenWeather"),
            ProviderKind::AccuWeather => write!(f, "AccuWeather"),
        }
    }
}

/// One timestamped value from a forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSample<T> {
    pub timestamp: NaiveDateTime,
    pub value: T,
}

/// Current conditions: icon plus short description.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub icon: IconCode,
    pub description: String,
}

/// Composite value carried by hourly samples.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyConditions {
    pub temperature: f64,
    pub icon: IconCode,
    pub precipitation_probability: u8,
}

pub type DailyForecast = Vec<WeatherSample<f64>>;
pub type HourlyForecast = Vec<WeatherSample<HourlyConditions>>;

/// Sort samples ascending by timestamp. Duplicate timestamps keep the last value seen.
pub fn sorted_samples<T, I>(samples: I) -> Vec<WeatherSample<T>>
where
    I: IntoIterator<Item = (NaiveDateTime, T)>,
{
    let by_time: BTreeMap<NaiveDateTime, T> = samples.into_iter().collect();
    by_time
        .into_iter()
        .map(|(timestamp, value)| WeatherSample { timestamp, value })
        .collect()
}

// Typed field access by JSON pointer; a missing or mis-typed field is a malformed record.
pub(crate) fn json_field<'a>(record: &'a Value, pointer: &str) -> Result<&'a Value, WeatherApiError> {
    record
        .pointer(pointer)
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("missing {}", pointer)))
}

pub(crate) fn json_str<'a>(record: &'a Value, pointer: &str) -> Result<&'a str, WeatherApiError> {
    json_field(record, pointer)?
        .as_str()
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("{} is not a string", pointer)))
}

pub(crate) fn json_f64(record: &Value, pointer: &str) -> Result<f64, WeatherApiError> {
    json_field(record, pointer)?
        .as_f64()
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("{} is not a number", pointer)))
}

pub(crate) fn json_i64(record: &Value, pointer: &str) -> Result<i64, WeatherApiError> {
    json_field(record, pointer)?
        .as_i64()
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("{} is not an integer", pointer)))
}

pub(crate) fn json_array<'a>(record: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, WeatherApiError> {
    json_field(record, pointer)?
        .as_array()
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("{} is not an array", pointer)))
}

/// Epoch seconds to local wall-clock time.
pub(crate) fn local_from_epoch(secs: i64) -> Result<NaiveDateTime, WeatherApiError> {
    DateTime::from_timestamp(secs, 0)
        .map(|utc| utc.with_timezone(&Local).naive_local())
        .ok_or_else(|| WeatherApiError::MalformedRecord(format!("epoch {} out of range", secs)))
}

/// The read capabilities every provider exposes to the composition pipeline.
#[allow(async_fn_in_trait)]
pub trait WeatherSource {
    async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError>;

    async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError>;

    async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError>;
}

/// Closed set of provider variants behind the `WeatherSource` capability.
#[derive(Debug)]
pub enum Provider {
    OpenWeather(OpenWeather),
    AccuWeather(AccuWeather),
}

impl Provider {
    /// Build the provider selected in the configuration. AccuWeather resolves its
    /// location key here (config, persisted file, or a one-time lookup).
    pub async fn from_config(config: &StationConfig) -> Result<Self, WeatherApiError> {
        let client = http::build_client()?;
        let store = CacheStore::new(config.paths.cache_dir.clone(), config.cache_enabled);
        match config.provider {
            ProviderKind::OpenWeather => Ok(Provider::OpenWeather(OpenWeather::new(
                &config.openweather,
                config.latitude,
                config.longitude,
                config.units,
                client,
                store,
            )?)),
            ProviderKind::AccuWeather => {
                let location_key = location::resolve_location_key(
                    &client,
                    &config.accuweather,
                    config.latitude,
                    config.longitude,
                    &config.paths.cache_dir,
                )
                .await?;
                Ok(Provider::AccuWeather(AccuWeather::new(
                    &config.accuweather,
                    location_key,
                    config.units,
                    client,
                    store,
                )?))
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::OpenWeather(_) => ProviderKind::OpenWeather,
            Provider::AccuWeather(_) => ProviderKind::AccuWeather,
        }
    }
}

impl WeatherSource for Provider {
    async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError> {
        match self {
            Provider::OpenWeather(p) => p.current_weather().await,
            Provider::AccuWeather(p) => p.current_weather().await,
        }
    }

    async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError> {
        match self {
            Provider::OpenWeather(p) => p.daily_forecast().await,
            Provider::AccuWeather(p) => p.daily_forecast().await,
        }
    }

    async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
        match self {
            Provider::OpenWeather(p) => p.hourly_forecast().await,
            Provider::AccuWeather(p) => p.hourly_forecast().await,
        }
    }
}

/// Provider built on first use. Runs that are satisfied by a snapshot never
/// check API keys or resolve a location key.
pub struct LazyProvider<'a> {
    config: &'a StationConfig,
    provider: OnceCell<Provider>,
}

impl<'a> LazyProvider<'a> {
    pub fn new(config: &'a StationConfig) -> Self {
        Self { config, provider: OnceCell::new() }
    }

    pub async fn get(&self) -> Result<&Provider, WeatherApiError> {
        self.provider
            .get_or_try_init(|| async {
                let provider = Provider::from_config(self.config).await?;
                log::info!(
                    "Using {} at {:.4},{:.4}",
                    provider.kind(),
                    self.config.latitude,
                    self.config.longitude
                );
                Ok(provider)
            })
            .await
    }

    pub fn is_built(&self) -> bool {
        self.provider.initialized()
    }
}

impl WeatherSource for LazyProvider<'_> {
    async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError> {
        self.get().await?.current_weather().await
    }

    async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError> {
        self.get().await?.daily_forecast().await
    }

    async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
        self.get().await?.hourly_forecast().await
    }
}
