/*
 *  weather/accuweather.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  AccuWeather provider - current conditions and 12 hour forecast
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

use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use reqwest::Client;
use serde_json::Value;

use super::cache::{CacheStore, DataKind};
use super::http::fetch_json;
use super::{
    CurrentConditions, DailyForecast, HourlyConditions, HourlyForecast, IconCode, ProviderKind,
    Units, WeatherApiError, WeatherSource, json_array, json_f64, json_i64, json_str,
    local_from_epoch, sorted_samples,
};
use crate::config::ApiSettings;

pub const DEFAULT_BASE_URL: &str = "https://dataservice.accuweather.com";

/// AccuWeather reports numeric icons; they are translated at parse time so the
/// pipeline only ever sees the shared vocabulary.
#[derive(Debug)]
pub struct AccuWeather {
    client: Client,
    store: CacheStore,
    base_url: String,
    api_key: String,
    location_key: String,
    units: Units,
}

impl AccuWeather {
    pub fn new(
        settings: &ApiSettings,
        location_key: String,
        units: Units,
        client: Client,
        store: CacheStore,
    ) -> Result<Self, WeatherApiError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or_else(|| WeatherApiError::MissingConfig("AccuWeather API key".to_string()))?;
        Ok(Self {
            client,
            store,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            location_key,
            units,
        })
    }

    pub fn current_url(&self) -> String {
        format!(
            "{}/currentconditions/v1/{}?apikey={}",
            self.base_url, self.location_key, self.api_key
        )
    }

    pub fn hourly_url(&self) -> String {
        let mut url = format!(
            "{}/forecasts/v1/hourly/12hour/{}?apikey={}",
            self.base_url, self.location_key, self.api_key
        );
        if self.units == Units::Metric {
            url.push_str("&metric=true");
        }
        url
    }

    pub fn current_timestamp(record: &Value) -> Result<NaiveDateTime, WeatherApiError> {
        local_from_epoch(json_i64(record, "/0/EpochTime")?)
    }

    pub fn hourly_timestamp(record: &Value) -> Result<NaiveDateTime, WeatherApiError> {
        local_from_epoch(json_i64(record, "/0/EpochDateTime")?)
    }

    pub fn parse_current(record: &Value) -> Result<CurrentConditions, WeatherApiError> {
        let observed = Self::current_timestamp(record)?;
        let icon = IconCode::from_accuweather(json_i64(record, "/0/WeatherIcon")?, observed.hour())?;
        let description = json_str(record, "/0/WeatherText")?.to_string();
        Ok(CurrentConditions { icon, description })
    }

    pub fn parse_hourly(record: &Value) -> Result<HourlyForecast, WeatherApiError> {
        let samples = json_array(record, "")?
            .iter()
            .map(|item| {
                let at = parse_local_time(json_str(item, "/DateTime")?)?;
                let icon = IconCode::from_accuweather(json_i64(item, "/WeatherIcon")?, at.hour())?;
                let probability = json_i64(item, "/PrecipitationProbability")?.clamp(0, 100) as u8;
                Ok((
                    at,
                    HourlyConditions {
                        temperature: json_f64(item, "/Temperature/Value")?,
                        icon,
                        precipitation_probability: probability,
                    },
                ))
            })
            .collect::<Result<Vec<_>, WeatherApiError>>()?;
        Ok(sorted_samples(samples))
    }
}

// Offsets are the location's own; the wall time is what gets displayed.
fn parse_local_time(s: &str) -> Result<NaiveDateTime, WeatherApiError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .map_err(|e| WeatherApiError::MalformedRecord(format!("DateTime {:?}: {}", s, e)))
}

impl WeatherSource for AccuWeather {
    async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError> {
        let url = self.current_url();
        self.store
            .fetch_or_cache(
                DataKind::Current,
                Local::now().naive_local(),
                Self::current_timestamp,
                || fetch_json(&self.client, &url, DataKind::Current.label()),
                Self::parse_current,
            )
            .await
    }

    async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError> {
        Err(WeatherApiError::Unsupported {
            provider: ProviderKind::AccuWeather,
            operation: "daily forecast",
        })
    }

    async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
        let url = self.hourly_url();
        self.store
            .fetch_or_cache(
                DataKind::HourlyForecast,
                Local::now().naive_local(),
                Self::hourly_timestamp,
                || fetch_json(&self.client, &url, DataKind::HourlyForecast.label()),
                Self::parse_hourly,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::http::build_client;
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, units: Units, cache_dir: &std::path::Path) -> AccuWeather {
        let settings = ApiSettings {
            api_key: Some("abc".to_string()),
            base_url: base_url.to_string(),
            location_key: None,
        };
        AccuWeather::new(
            &settings,
            "349727".to_string(),
            units,
            build_client().unwrap(),
            CacheStore::new(cache_dir.to_path_buf(), true),
        )
        .unwrap()
    }

    fn hourly_fixture() -> Value {
        json!([
            {
                "DateTime": "2024-05-01T20:00:00-04:00",
                "EpochDateTime": 1714608000,
                "WeatherIcon": 18,
                "Temperature": {"Value": 12.3, "Unit": "C"},
                "PrecipitationProbability": 80
            },
            {
                "DateTime": "2024-05-01T19:00:00-04:00",
                "EpochDateTime": 1714604400,
                "WeatherIcon": 12,
                "Temperature": {"Value": 13.0, "Unit": "C"},
                "PrecipitationProbability": 55
            }
        ])
    }

    #[test]
    fn test_urls() {
        let dir = tempdir().unwrap();
        let metric = provider("https://accu.test/", Units::Metric, dir.path());
        assert_eq!(metric.current_url(), "https://accu.test/currentconditions/v1/349727?apikey=abc");
        assert_eq!(
            metric.hourly_url(),
            "https://accu.test/forecasts/v1/hourly/12hour/349727?apikey=abc&metric=true"
        );
        let imperial = provider("https://accu.test", Units::Imperial, dir.path());
        assert!(!imperial.hourly_url().contains("metric"));
    }

    #[test]
    fn test_parse_hourly_sorted_and_translated() {
        let samples = AccuWeather::parse_hourly(&hourly_fixture()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp.hour(), 19);
        assert_eq!(samples[0].value.icon, IconCode::ShowerRainDay);
        // code 18 after 18:00 is night rain
        assert_eq!(samples[1].value.icon, IconCode::RainNight);
        assert_eq!(samples[1].value.temperature, 12.3);
        assert_eq!(samples[1].value.precipitation_probability, 80);
    }

    #[test]
    fn test_parse_hourly_unknown_icon_is_error() {
        let record = json!([{
            "DateTime": "2024-05-01T10:00:00+00:00",
            "EpochDateTime": 1714557600,
            "WeatherIcon": 999,
            "Temperature": {"Value": 1.0},
            "PrecipitationProbability": 0
        }]);
        assert!(matches!(
            AccuWeather::parse_hourly(&record),
            Err(WeatherApiError::UnknownIconCode(_))
        ));
    }

    #[test]
    fn test_parse_current() {
        let record = json!([{"EpochTime": 1714557600, "WeatherIcon": 7, "WeatherText": "Cloudy"}]);
        let current = AccuWeather::parse_current(&record).unwrap();
        assert_eq!(current.icon, IconCode::BrokenCloudsDay);
        assert_eq!(current.description, "Cloudy");
        assert!(AccuWeather::current_timestamp(&json!({})).is_err());
        assert!(AccuWeather::hourly_timestamp(&json!([])).is_err());
    }

    #[tokio::test]
    async fn test_daily_forecast_unsupported() {
        let dir = tempdir().unwrap();
        let p = provider(DEFAULT_BASE_URL, Units::Metric, dir.path());
        let err = p.daily_forecast().await.unwrap_err();
        assert!(matches!(
            err,
            WeatherApiError::Unsupported { provider: ProviderKind::AccuWeather, .. }
        ));
    }

    #[tokio::test]
    async fn test_hourly_forecast_fetch_and_cache() {
        let server = MockServer::start().await;
        let now = Local::now().timestamp();
        Mock::given(method("GET"))
            .and(path("/forecasts/v1/hourly/12hour/349727"))
            .and(query_param("apikey", "abc"))
            .and(query_param("metric", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "DateTime": "2024-05-01T09:00:00+01:00",
                "EpochDateTime": now,
                "WeatherIcon": 1,
                "Temperature": {"Value": 9.5, "Unit": "C"},
                "PrecipitationProbability": 3
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let p = provider(&server.uri(), Units::Metric, dir.path());
        let first = p.hourly_forecast().await.unwrap();
        let second = p.hourly_forecast().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].value.icon, IconCode::ClearDay);
        assert!(dir.path().join("hourly.json").exists());
    }

    #[tokio::test]
    async fn test_fetch_failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let p = provider(&server.uri(), Units::Metric, dir.path());
        assert!(matches!(
            p.current_weather().await,
            Err(WeatherApiError::Status { status: 503, .. })
        ));
        assert!(!dir.path().join("current.json").exists());
    }
}
