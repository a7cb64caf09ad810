/*
 *  config.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML, environment, CLI
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

use chrono::NaiveTime;
use clap::{ArgAction, ArgGroup, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::layout::ForecastMode;
use crate::weather::{ProviderKind, Units, accuweather, openweather};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// File-level configuration. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub provider: Option<ProviderKind>,
    pub units: Option<Units>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub cache_enabled: Option<bool>,
    pub display: Option<DisplayConfig>,
    pub layout: Option<LayoutConfig>,
    pub paths: Option<PathsConfig>,
    pub forecast: Option<ForecastConfig>,
    pub schedule: Option<ScheduleConfig>,
    pub openweather: Option<ApiConfig>,
    pub accuweather: Option<ApiConfig>,
    pub user_content: Option<UserContentConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Where the PNG driver writes each refreshed frame.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LayoutConfig {
    pub grid_horiz_ratio: Option<f64>,
    pub time_vert_ratio: Option<f64>,
    pub time_left_margin: Option<u32>,
    pub weather_icon_ratio: Option<f64>,
    pub weather_icon_margin: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsConfig {
    pub cache_dir: Option<PathBuf>,
    pub icon_dir: Option<PathBuf>,
    /// TrueType font; the built-in bitmap face is used when unset.
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ForecastConfig {
    pub mode: Option<ForecastMode>,
    /// `HH:MM` slot times for the five day grid
    pub slot_times: Option<Vec<String>>,
    /// icon name drawn beside each slot row
    pub slot_icons: Option<Vec<String>>,
    pub hourly_count: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScheduleConfig {
    pub current_weather_minute: Option<u32>,
    pub forecast_hour: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub location_key: Option<String>,
}

/// `user_content` section: set exactly one of `image` or `text`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserContentConfig {
    pub image: Option<PathBuf>,
    pub text: Option<String>,
}

/// Free-form content drawn into the spare region under the forecast.
#[derive(Debug, Clone, PartialEq)]
pub enum UserContent {
    Image(PathBuf),
    Text(String),
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "wxstation", about = "e-ink weather station renderer")]
#[command(group(ArgGroup::new("mode").args(["time_only", "weather_only", "auto_update"])))]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// weather provider
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,
    /// ignore and do not consult cached provider responses
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_cache: bool,
    /// PNG file the rendered frame is written to
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// redraw only the clock
    #[arg(long, action = ArgAction::SetTrue)]
    pub time_only: bool,
    /// redraw the clock and current weather
    #[arg(long, action = ArgAction::SetTrue)]
    pub weather_only: bool,
    /// pick full, weather or time update from the wall clock
    #[arg(long, action = ArgAction::SetTrue)]
    pub auto_update: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

const REDACTED: &str = "<redacted>";

impl Config {
    /// Copy with API keys masked, for `--dump-config`.
    pub fn redacted(&self) -> Config {
        let mut cfg = self.clone();
        for api in [cfg.openweather.as_mut(), cfg.accuweather.as_mut()].into_iter().flatten() {
            if api.api_key.is_some() {
                api.api_key = Some(REDACTED.to_string());
            }
        }
        cfg
    }

    /// Every key populated with its built-in value.
    pub fn defaults() -> Self {
        Self {
            log_level: Some("info".to_string()),
            log_file: None,
            provider: Some(ProviderKind::OpenWeather),
            units: Some(Units::Metric),
            latitude: None,
            longitude: None,
            cache_enabled: Some(true),
            display: Some(DisplayConfig {
                width: Some(1872),
                height: Some(1404),
                output: Some(PathBuf::from("wxstation.png")),
            }),
            layout: Some(LayoutConfig {
                grid_horiz_ratio: Some(0.6),
                time_vert_ratio: Some(0.7),
                time_left_margin: Some(50),
                weather_icon_ratio: Some(0.4),
                weather_icon_margin: Some(50),
            }),
            paths: Some(PathsConfig {
                cache_dir: Some(PathBuf::from("./cache")),
                icon_dir: Some(PathBuf::from("./icon")),
                font: None,
            }),
            forecast: Some(ForecastConfig {
                mode: Some(ForecastMode::FiveDay),
                slot_times: Some(vec!["09:00".into(), "15:00".into(), "21:00".into()]),
                slot_icons: Some(vec!["am".into(), "pm".into(), "sleepy".into()]),
                hourly_count: Some(6),
            }),
            schedule: Some(ScheduleConfig {
                current_weather_minute: Some(0),
                forecast_hour: Some(0),
            }),
            openweather: Some(ApiConfig {
                api_key: None,
                base_url: Some(openweather::DEFAULT_BASE_URL.to_string()),
                location_key: None,
            }),
            accuweather: Some(ApiConfig {
                api_key: None,
                base_url: Some(accuweather::DEFAULT_BASE_URL.to_string()),
                location_key: None,
            }),
            user_content: None,
        }
    }
}

/// Merge every layer for `cli`: defaults, YAML (explicit path or search), environment
/// fallback for secrets and location, then CLI overrides.
pub fn merged<F>(cli: &Cli, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1) defaults
    let mut cfg = Config::defaults();

    // 2) YAML file (explicit path or search)
    if let Some(p) = config_source(cli) {
        if p.exists() {
            merge(&mut cfg, read_yaml(&p)?);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    }

    // 3) environment, only where the file left a gap
    apply_env_fallback(&mut cfg, env)?;

    // 4) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    Ok(cfg)
}

/// Public entry point: merge all layers and resolve the immutable station config.
pub fn load(cli: &Cli) -> Result<StationConfig, ConfigError> {
    StationConfig::resolve(&merged(cli, |k| std::env::var(k).ok())?)
}

/// The YAML file `merged` reads: the explicit `--config`, else the first search hit.
pub fn config_source(cli: &Cli) -> Option<PathBuf> {
    cli.config.clone().or_else(find_config_file)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/wxstation/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/wxstation/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/wxstation.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["wxstation.yaml", "config.yaml", "config/wxstation.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

macro_rules! take {
    ($dst:expr, $src:expr, $($field:ident),+) => {
        {{ $( if $src.$field.is_some() { $dst.$field = $src.$field; } )+ }}
    };
}

/// Merge a nested section; a section absent from `dst` is taken whole.
fn merge_section<T>(dst: &mut Option<T>, src: Option<T>, f: impl FnOnce(&mut T, T)) {
    match (dst.as_mut(), src) {
        (None, Some(s)) => *dst = Some(s),
        (Some(d), Some(s)) => f(d, s),
        _ => {}
    }
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    take!(dst, src, log_level, log_file, provider, units, latitude, longitude, cache_enabled, user_content);
    merge_section(&mut dst.display, src.display, |d, s| take!(d, s, width, height, output));
    merge_section(&mut dst.layout, src.layout, |d, s| {
        take!(d, s, grid_horiz_ratio, time_vert_ratio, time_left_margin, weather_icon_ratio, weather_icon_margin)
    });
    merge_section(&mut dst.paths, src.paths, |d, s| take!(d, s, cache_dir, icon_dir, font));
    merge_section(&mut dst.forecast, src.forecast, |d, s| {
        take!(d, s, mode, slot_times, slot_icons, hourly_count)
    });
    merge_section(&mut dst.schedule, src.schedule, |d, s| {
        take!(d, s, current_weather_minute, forecast_hour)
    });
    merge_section(&mut dst.openweather, src.openweather, |d, s| take!(d, s, api_key, base_url, location_key));
    merge_section(&mut dst.accuweather, src.accuweather, |d, s| take!(d, s, api_key, base_url, location_key));
}

fn parse_env_f64(name: &str, raw: String) -> Result<f64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Validation(format!("{} must be a number, got {:?}", name, raw)))
}

fn apply_env_fallback<F>(cfg: &mut Config, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if cfg.latitude.is_none() {
        if let Some(v) = env("LATITUDE") {
            cfg.latitude = Some(parse_env_f64("LATITUDE", v)?);
        }
    }
    if cfg.longitude.is_none() {
        if let Some(v) = env("LONGITUDE") {
            cfg.longitude = Some(parse_env_f64("LONGITUDE", v)?);
        }
    }
    let ow = cfg.openweather.get_or_insert_with(ApiConfig::default);
    if ow.api_key.is_none() {
        ow.api_key = env("OPEN_WEATHER_API_KEY");
    }
    let aw = cfg.accuweather.get_or_insert_with(ApiConfig::default);
    if aw.api_key.is_none() {
        aw.api_key = env("ACCU_WEATHER_API_KEY");
    }
    if aw.location_key.is_none() {
        aw.location_key = env("LOCATION_KEY");
    }
    Ok(())
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.provider.is_some()  { cfg.provider = cli.provider; }
    if cli.no_cache            { cfg.cache_enabled = Some(false); }
    if cli.output.is_some() {
        cfg.display.get_or_insert_with(DisplayConfig::default).output = cli.output.clone();
    }
}

/// Provider endpoint settings after merging.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub location_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationPaths {
    pub cache_dir: PathBuf,
    pub icon_dir: PathBuf,
    pub font: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationDisplay {
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationLayoutRatios {
    pub grid_horiz_ratio: f64,
    pub time_vert_ratio: f64,
    pub time_left_margin: u32,
    pub weather_icon_ratio: f64,
    pub weather_icon_margin: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StationForecast {
    pub mode: ForecastMode,
    pub slot_times: Vec<NaiveTime>,
    pub slot_icons: Vec<String>,
    pub hourly_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub current_weather_minute: u32,
    pub forecast_hour: u32,
}

/// Fully resolved, validated configuration. Built once at startup and passed by
/// reference; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct StationConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub provider: ProviderKind,
    pub units: Units,
    pub latitude: f64,
    pub longitude: f64,
    pub cache_enabled: bool,
    pub display: StationDisplay,
    pub layout: StationLayoutRatios,
    pub paths: StationPaths,
    pub forecast: StationForecast,
    pub schedule: Schedule,
    pub openweather: ApiSettings,
    pub accuweather: ApiSettings,
    pub user_content: Option<UserContent>,
}

fn required<T>(value: Option<T>, key: &str) -> Result<T, ConfigError> {
    value.ok_or_else(|| ConfigError::Validation(format!("{} is required", key)))
}

fn ratio(value: Option<f64>, key: &str) -> Result<f64, ConfigError> {
    let r = required(value, key)?;
    if r > 0.0 && r < 1.0 {
        Ok(r)
    } else {
        Err(ConfigError::Validation(format!("{} must be strictly between 0 and 1, got {}", key, r)))
    }
}

fn api_settings(api: Option<ApiConfig>, default_base: &str) -> ApiSettings {
    let api = api.unwrap_or_default();
    ApiSettings {
        api_key: api.api_key.filter(|k| !k.is_empty()),
        base_url: api.base_url.unwrap_or_else(|| default_base.to_string()),
        location_key: api.location_key.filter(|k| !k.is_empty()),
    }
}

fn user_content(section: Option<UserContentConfig>) -> Result<Option<UserContent>, ConfigError> {
    match section {
        None => Ok(None),
        Some(UserContentConfig { image: Some(_), text: Some(_) }) => Err(ConfigError::Validation(
            "user_content takes either image or text, not both".into(),
        )),
        Some(UserContentConfig { image: Some(path), .. }) => Ok(Some(UserContent::Image(path))),
        Some(UserContentConfig { text: Some(text), .. }) => Ok(Some(UserContent::Text(text))),
        Some(_) => Ok(None),
    }
}

impl StationConfig {
    /// Validate a merged config and resolve it. Sections left unset fall back to
    /// the defaults, so a bare `Config::default()` fails only on location.
    pub fn resolve(cfg: &Config) -> Result<Self, ConfigError> {
        let defaults = Config::defaults();
        let mut cfg_full = defaults;
        merge(&mut cfg_full, cfg.clone());
        let cfg = cfg_full;

        let display = cfg.display.unwrap_or_default();
        let width = required(display.width, "display.width")?;
        let height = required(display.height, "display.height")?;
        if width == 0 || height == 0 {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }

        let latitude = required(cfg.latitude, "latitude")?;
        let longitude = required(cfg.longitude, "longitude")?;
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ConfigError::Validation(format!("latitude {} out of range", latitude)));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ConfigError::Validation(format!("longitude {} out of range", longitude)));
        }

        let layout = cfg.layout.unwrap_or_default();
        let layout = StationLayoutRatios {
            grid_horiz_ratio: ratio(layout.grid_horiz_ratio, "layout.grid_horiz_ratio")?,
            time_vert_ratio: ratio(layout.time_vert_ratio, "layout.time_vert_ratio")?,
            time_left_margin: required(layout.time_left_margin, "layout.time_left_margin")?,
            weather_icon_ratio: ratio(layout.weather_icon_ratio, "layout.weather_icon_ratio")?,
            weather_icon_margin: required(layout.weather_icon_margin, "layout.weather_icon_margin")?,
        };

        let forecast = cfg.forecast.unwrap_or_default();
        let slot_times = required(forecast.slot_times, "forecast.slot_times")?
            .iter()
            .map(|s| {
                NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| {
                    ConfigError::Validation(format!("forecast slot time {:?} is not HH:MM", s))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let slot_icons = required(forecast.slot_icons, "forecast.slot_icons")?;
        if slot_times.is_empty() {
            return Err(ConfigError::Validation("forecast.slot_times must not be empty".into()));
        }
        if slot_icons.len() != slot_times.len() {
            return Err(ConfigError::Validation(format!(
                "forecast.slot_icons has {} entries for {} slot times",
                slot_icons.len(),
                slot_times.len()
            )));
        }
        let hourly_count = required(forecast.hourly_count, "forecast.hourly_count")?;
        if hourly_count == 0 {
            return Err(ConfigError::Validation("forecast.hourly_count must be >= 1".into()));
        }

        let schedule = cfg.schedule.unwrap_or_default();
        let schedule = Schedule {
            current_weather_minute: required(schedule.current_weather_minute, "schedule.current_weather_minute")?,
            forecast_hour: required(schedule.forecast_hour, "schedule.forecast_hour")?,
        };
        if schedule.current_weather_minute >= 60 || schedule.forecast_hour >= 24 {
            return Err(ConfigError::Validation(
                "schedule minute must be < 60 and hour < 24".into(),
            ));
        }

        let paths = cfg.paths.unwrap_or_default();
        Ok(Self {
            log_level: cfg.log_level.unwrap_or_else(|| "info".to_string()),
            log_file: cfg.log_file,
            provider: cfg.provider.unwrap_or_default(),
            units: cfg.units.unwrap_or_default(),
            latitude,
            longitude,
            cache_enabled: cfg.cache_enabled.unwrap_or(true),
            display: StationDisplay {
                width,
                height,
                output: required(display.output, "display.output")?,
            },
            layout,
            paths: StationPaths {
                cache_dir: required(paths.cache_dir, "paths.cache_dir")?,
                icon_dir: required(paths.icon_dir, "paths.icon_dir")?,
                font: paths.font,
            },
            forecast: StationForecast {
                mode: forecast.mode.unwrap_or_default(),
                slot_times,
                slot_icons,
                hourly_count,
            },
            schedule,
            openweather: api_settings(cfg.openweather, openweather::DEFAULT_BASE_URL),
            accuweather: api_settings(cfg.accuweather, accuweather::DEFAULT_BASE_URL),
            user_content: user_content(cfg.user_content)?,
        })
    }
}
