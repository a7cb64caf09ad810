/*
 *  weather/location.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  AccuWeather location key - from config, a persisted file, or a one-time lookup
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
use std::path::{Path, PathBuf};

use log::{info, warn};
use reqwest::Client;

use super::WeatherApiError;
use super::http::fetch_json;
use crate::config::ApiSettings;

const LOCATION_KEY_FILE: &str = "location_key";

/// Where a resolved key is persisted between runs.
pub fn location_key_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(LOCATION_KEY_FILE)
}

/// Resolve the AccuWeather location key. A configured key wins; otherwise a key
/// persisted by an earlier run is reused; otherwise it is looked up from the
/// coordinates once and persisted.
pub async fn resolve_location_key(
    client: &Client,
    settings: &ApiSettings,
    latitude: f64,
    longitude: f64,
    cache_dir: &Path,
) -> Result<String, WeatherApiError> {
    if let Some(key) = settings.location_key.as_ref().filter(|k| !k.is_empty()) {
        info!("Using location key from config: {}", key);
        return Ok(key.clone());
    }

    let path = location_key_path(cache_dir);
    match fs::read_to_string(&path) {
        Ok(saved) if !saved.trim().is_empty() => {
            info!("Using persisted location key from {}", path.display());
            return Ok(saved.trim().to_string());
        }
        Ok(_) => warn!("Persisted location key {} is empty, looking up again", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not read {}: {}", path.display(), e),
    }

    let api_key = settings
        .api_key
        .as_deref()
        .ok_or_else(|| WeatherApiError::MissingConfig("AccuWeather API key".to_string()))?;
    let url = format!(
        "{}/locations/v1/cities/geoposition/search?apikey={}&q={},{}",
        settings.base_url.trim_end_matches('/'),
        api_key,
        latitude,
        longitude
    );
    let found = fetch_json(client, &url, "location key").await?;
    let key = found
        .get("Key")
        .and_then(|k| k.as_str())
        .ok_or_else(|| {
            WeatherApiError::Geolocation(format!("no location key for {:.4}, {:.4}", latitude, longitude))
        })?
        .to_string();

    fs::create_dir_all(cache_dir)?;
    fs::write(&path, &key)?;
    info!("Location key {} resolved and saved to {}", key, path.display());
    Ok(key)
}
