/*
 *  weather/cache.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fetch-or-reuse cache protocol for raw provider responses
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

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use log::{debug, info, warn};
use serde_json::Value;

use super::WeatherApiError;

/// The kinds of data a provider caches, one file each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Current,
    DailyForecast,
    HourlyForecast,
}

impl DataKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            DataKind::Current => "current.json",
            DataKind::DailyForecast => "forecast.json",
            DataKind::HourlyForecast => "hourly.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataKind::Current => "current weather",
            DataKind::DailyForecast => "daily forecast",
            DataKind::HourlyForecast => "hourly forecast",
        }
    }

    pub fn expiry(&self) -> ExpiryPolicy {
        match self {
            DataKind::Current | DataKind::HourlyForecast => ExpiryPolicy::ElapsedHour,
            DataKind::DailyForecast => ExpiryPolicy::CalendarDay,
        }
    }
}

/// When a cached record stops being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    /// Expired once one whole hour has elapsed since the record's timestamp.
    ElapsedHour,
    /// Expired once the calendar date has moved past the record's date.
    CalendarDay,
}

impl ExpiryPolicy {
    pub fn is_expired(&self, recorded: NaiveDateTime, now: NaiveDateTime) -> bool {
        match self {
            ExpiryPolicy::ElapsedHour => elapsed_whole_hours(recorded, now) >= 1,
            ExpiryPolicy::CalendarDay => now.date() > recorded.date(),
        }
    }
}

/// Whole hours between two instants, floored. Negative when `recorded` is ahead of `now`.
pub fn elapsed_whole_hours(recorded: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - recorded).num_seconds().div_euclid(3600)
}

/// Read a cached record. A missing file is `None`; an unreadable or non-JSON file is
/// also `None` so it gets superseded by the next successful fetch.
pub fn load_record(path: &Path) -> Option<Value> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Cache {} unreadable ({}), ignoring", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Cache {} is not valid JSON ({}), ignoring", path.display(), e);
            None
        }
    }
}

/// Persist a raw record, overwriting whatever was there.
pub fn save_record(path: &Path, record: &Value) -> Result<(), WeatherApiError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_vec(record)?)?;
    Ok(())
}

/// Use a fresh cached record, otherwise fetch, persist and parse.
///
/// `is_expired` returning an error means the record is structurally malformed and
/// is handled exactly like an expired record. A cached record that fails `parse`
/// is treated the same way. Errors from `fetch`, and from parsing freshly fetched
/// data, propagate; nothing is written when the fetch fails.
pub async fn fetch_or_cache<T, E, F, Fut, P>(
    path: &Path,
    cache_enabled: bool,
    is_expired: E,
    fetch: F,
    parse: P,
) -> Result<T, WeatherApiError>
where
    E: Fn(&Value) -> Result<bool, WeatherApiError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, WeatherApiError>>,
    P: Fn(&Value) -> Result<T, WeatherApiError>,
{
    let cached = if cache_enabled { load_record(path) } else { None };

    if let Some(record) = cached {
        let usable = match is_expired(&record) {
            Ok(expired) => !expired,
            Err(e) => {
                warn!("Cache {} is malformed ({}), treating as expired", path.display(), e);
                false
            }
        };
        if usable {
            match parse(&record) {
                Ok(parsed) => {
                    info!("Using cached {}", path.display());
                    return Ok(parsed);
                }
                Err(e) => warn!("Cache {} failed to parse ({}), refetching", path.display(), e),
            }
        } else {
            debug!("Cache {} expired", path.display());
        }
    }

    let fresh = fetch().await?;
    save_record(path, &fresh)?;
    parse(&fresh)
}

/// Cache directory plus the enabled flag shared by every provider operation.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
    enabled: bool,
}

impl CacheStore {
    pub fn new(dir: PathBuf, enabled: bool) -> Self {
        Self { dir, enabled }
    }

    pub fn path_for(&self, kind: DataKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Run the protocol for one data kind, applying that kind's expiry policy to the
    /// timestamp the provider extracts from the record.
    pub async fn fetch_or_cache<T, S, F, Fut, P>(
        &self,
        kind: DataKind,
        now: NaiveDateTime,
        timestamp: S,
        fetch: F,
        parse: P,
    ) -> Result<T, WeatherApiError>
    where
        S: Fn(&Value) -> Result<NaiveDateTime, WeatherApiError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, WeatherApiError>>,
        P: Fn(&Value) -> Result<T, WeatherApiError>,
    {
        let policy = kind.expiry();
        fetch_or_cache(
            &self.path_for(kind),
            self.enabled,
            |record| Ok(policy.is_expired(timestamp(record)?, now)),
            fetch,
            parse,
        )
        .await
    }
}
