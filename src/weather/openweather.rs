/*
 *  weather/openweather.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  OpenWeather provider - current conditions and 5 day / 3 hour forecast
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

use chrono::{Local, NaiveDateTime};
use reqwest::Client;
use serde_json::Value;

use super::cache::{CacheStore, DataKind};
use super::http::fetch_json;
use super::{
    CurrentConditions, DailyForecast, HourlyForecast, IconCode, ProviderKind, Units,
    WeatherApiError, WeatherSource, json_array, json_f64, json_i64, json_str, local_from_epoch,
    sorted_samples,
};
use crate::config::ApiSettings;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const FORECAST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// OpenWeather already reports icons in the shared vocabulary.
#[derive(Debug)]
pub struct OpenWeather {
    client: Client,
    store: CacheStore,
    base_url: String,
    query: String,
}

impl OpenWeather {
    pub fn new(
        settings: &ApiSettings,
        latitude: f64,
        longitude: f64,
        units: Units,
        client: Client,
        store: CacheStore,
    ) -> Result<Self, WeatherApiError> {
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| WeatherApiError::MissingConfig("OpenWeather API key".to_string()))?;
        Ok(Self {
            client,
            store,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            query: format!(
                "?lat={}&lon={}&units={}&appid={}",
                latitude,
                longitude,
                units.as_str(),
                api_key
            ),
        })
    }

    pub fn current_url(&self) -> String {
        format!("{}/weather{}", self.base_url, self.query)
    }

    pub fn forecast_url(&self) -> String {
        format!("{}/forecast{}", self.base_url, self.query)
    }

    /// Observation time of a current-weather record.
    pub fn current_timestamp(record: &Value) -> Result<NaiveDateTime, WeatherApiError> {
        local_from_epoch(json_i64(record, "/dt")?)
    }

    /// Time of the earliest entry of a forecast record.
    pub fn forecast_timestamp(record: &Value) -> Result<NaiveDateTime, WeatherApiError> {
        parse_forecast_time(json_str(record, "/list/0/dt_txt")?)
    }

    pub fn parse_current(record: &Value) -> Result<CurrentConditions, WeatherApiError> {
        let icon: IconCode = json_str(record, "/weather/0/icon")?.parse()?;
        let description = json_str(record, "/weather/0/description")?.to_string();
        Ok(CurrentConditions { icon, description })
    }

    pub fn parse_forecast(record: &Value) -> Result<DailyForecast, WeatherApiError> {
        let samples = json_array(record, "/list")?
            .iter()
            .map(|item| {
                let at = parse_forecast_time(json_str(item, "/dt_txt")?)?;
                Ok((at, json_f64(item, "/main/temp")?))
            })
            .collect::<Result<Vec<_>, WeatherApiError>>()?;
        Ok(sorted_samples(samples))
    }
}

fn parse_forecast_time(s: &str) -> Result<NaiveDateTime, WeatherApiError> {
    NaiveDateTime::parse_from_str(s, FORECAST_TIME_FORMAT)
        .map_err(|e| WeatherApiError::MalformedRecord(format!("dt_txt {:?}: {}", s, e)))
}

impl WeatherSource for OpenWeather {
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
        let url = self.forecast_url();
        self.store
            .fetch_or_cache(
                DataKind::DailyForecast,
                Local::now().naive_local(),
                Self::forecast_timestamp,
                || fetch_json(&self.client, &url, DataKind::DailyForecast.label()),
                Self::parse_forecast,
            )
            .await
    }

    async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
        Err(WeatherApiError::Unsupported {
            provider: ProviderKind::OpenWeather,
            operation: "hourly forecast",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weather::http::build_client;
    use chrono::{NaiveDate, Timelike};
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, cache_dir: &std::path::Path) -> OpenWeather {
        let settings = ApiSettings {
            api_key: Some("k3y".to_string()),
            base_url: base_url.to_string(),
            location_key: None,
        };
        OpenWeather::new(
            &settings,
            51.5,
            -0.12,
            Units::Metric,
            build_client().unwrap(),
            CacheStore::new(cache_dir.to_path_buf(), true),
        )
        .unwrap()
    }

    fn forecast_fixture() -> Value {
        json!({
            "list": [
                {"dt_txt": "2024-05-02 09:00:00", "main": {"temp": 14.2}},
                {"dt_txt": "2024-05-01 21:00:00", "main": {"temp": 11.0}},
                {"dt_txt": "2024-05-01 18:00:00", "main": {"temp": 12.5}}
            ]
        })
    }

    #[test]
    fn test_urls_carry_location_units_and_key() {
        let dir = tempdir().unwrap();
        let p = provider("https://example.test/data/2.5/", dir.path());
        assert_eq!(
            p.current_url(),
            "https://example.test/data/2.5/weather?lat=51.5&lon=-0.12&units=metric&appid=k3y"
        );
        assert!(p.forecast_url().starts_with("https://example.test/data/2.5/forecast?"));
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let dir = tempdir().unwrap();
        let settings = ApiSettings {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            location_key: None,
        };
        let result = OpenWeather::new(
            &settings,
            0.0,
            0.0,
            Units::Metric,
            build_client().unwrap(),
            CacheStore::new(dir.path().to_path_buf(), true),
        );
        assert!(matches!(result, Err(WeatherApiError::MissingConfig(_))));
    }

    #[test]
    fn test_parse_current() {
        let record = json!({"dt": 1714550400, "weather": [{"icon": "10n", "description": "light rain"}]});
        let current = OpenWeather::parse_current(&record).unwrap();
        assert_eq!(current.icon, IconCode::RainNight);
        assert_eq!(current.description, "light rain");
    }

    #[test]
    fn test_parse_current_rejects_unknown_icon() {
        let record = json!({"weather": [{"icon": "77x", "description": "odd"}]});
        assert!(matches!(
            OpenWeather::parse_current(&record),
            Err(WeatherApiError::UnknownIconCode(_))
        ));
    }

    #[test]
    fn test_parse_forecast_sorted() {
        let samples = OpenWeather::parse_forecast(&forecast_fixture()).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].timestamp.hour(), 18);
        assert_eq!(samples[2].value, 14.2);
    }

    #[test]
    fn test_timestamps() {
        let ts = OpenWeather::forecast_timestamp(&forecast_fixture()).unwrap();
        // first list entry, not the earliest
        assert_eq!(ts, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(9, 0, 0).unwrap());
        assert!(OpenWeather::current_timestamp(&json!({})).is_err());
        assert!(OpenWeather::forecast_timestamp(&json!({"list": []})).is_err());
    }

    #[tokio::test]
    async fn test_hourly_unsupported() {
        let dir = tempdir().unwrap();
        let p = provider(DEFAULT_BASE_URL, dir.path());
        assert!(matches!(
            p.hourly_forecast().await,
            Err(WeatherApiError::Unsupported { provider: ProviderKind::OpenWeather, .. })
        ));
    }

    #[tokio::test]
    async fn test_current_weather_fetched_once_then_cached() {
        let server = MockServer::start().await;
        let now = Local::now().timestamp();
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "k3y"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dt": now,
                "weather": [{"icon": "01d", "description": "clear sky"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let p = provider(&server.uri(), dir.path());
        let first = p.current_weather().await.unwrap();
        let second = p.current_weather().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.icon, IconCode::ClearDay);
        assert!(dir.path().join("current.json").exists());
    }

    #[tokio::test]
    async fn test_empty_cache_record_triggers_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "dt": Local::now().timestamp(),
                "weather": [{"icon": "04d", "description": "broken clouds"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("current.json"), "{}").unwrap();
        let p = provider(&server.uri(), dir.path());
        let current = p.current_weather().await.unwrap();
        assert_eq!(current.description, "broken clouds");
    }
}
