/*
 *  display/mode_controller.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Run mode selection - explicit flags, or picked from the wall clock
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

use chrono::{NaiveDateTime, Timelike};

use crate::config::{Cli, Schedule};

/// What one run of the station redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// forecast, user content, summary and clock; full refresh
    Full,
    /// clock only over the saved snapshot; partial refresh
    TimeOnly,
    /// summary and clock over the saved snapshot; partial refresh
    WeatherOnly,
}

/// The mode asked for on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestedMode {
    Fixed(RunMode),
    Auto,
}

impl RequestedMode {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.auto_update {
            RequestedMode::Auto
        } else if cli.time_only {
            RequestedMode::Fixed(RunMode::TimeOnly)
        } else if cli.weather_only {
            RequestedMode::Fixed(RunMode::WeatherOnly)
        } else {
            RequestedMode::Fixed(RunMode::Full)
        }
    }
}

/// Display mode controller - turns the request and schedule into a run mode
#[derive(Debug, Clone)]
pub struct DisplayModeController {
    schedule: Schedule,
}

impl DisplayModeController {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    pub fn resolve(&self, requested: RequestedMode, now: NaiveDateTime) -> RunMode {
        let mode = match requested {
            RequestedMode::Fixed(mode) => mode,
            RequestedMode::Auto => self.auto_mode(now),
        };
        log::debug!("Requested {:?} at {} -> {:?}", requested, now.format("%H:%M"), mode);
        mode
    }

    /// Full render once a day at the forecast hour, current weather once an hour,
    /// the clock every other minute.
    fn auto_mode(&self, now: NaiveDateTime) -> RunMode {
        let on_weather_minute = now.minute() == self.schedule.current_weather_minute;
        if on_weather_minute && now.hour() == self.schedule.forecast_hour {
            RunMode::Full
        } else if on_weather_minute {
            RunMode::WeatherOnly
        } else {
            RunMode::TimeOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, m, 30).unwrap()
    }

    fn controller() -> DisplayModeController {
        DisplayModeController::new(Schedule { current_weather_minute: 0, forecast_hour: 0 })
    }

    #[test]
    fn test_auto_mode_schedule() {
        let c = controller();
        assert_eq!(c.resolve(RequestedMode::Auto, at(0, 0)), RunMode::Full);
        assert_eq!(c.resolve(RequestedMode::Auto, at(7, 0)), RunMode::WeatherOnly);
        assert_eq!(c.resolve(RequestedMode::Auto, at(0, 1)), RunMode::TimeOnly);
        assert_eq!(c.resolve(RequestedMode::Auto, at(13, 37)), RunMode::TimeOnly);
    }

    #[test]
    fn test_custom_schedule() {
        let c = DisplayModeController::new(Schedule { current_weather_minute: 30, forecast_hour: 5 });
        assert_eq!(c.resolve(RequestedMode::Auto, at(5, 30)), RunMode::Full);
        assert_eq!(c.resolve(RequestedMode::Auto, at(5, 0)), RunMode::TimeOnly);
        assert_eq!(c.resolve(RequestedMode::Auto, at(9, 30)), RunMode::WeatherOnly);
    }

    #[test]
    fn test_fixed_modes_ignore_clock() {
        let c = controller();
        assert_eq!(c.resolve(RequestedMode::Fixed(RunMode::TimeOnly), at(0, 0)), RunMode::TimeOnly);
        assert_eq!(c.resolve(RequestedMode::Fixed(RunMode::Full), at(13, 37)), RunMode::Full);
    }

    #[test]
    fn test_requested_mode_from_cli() {
        let mut cli = Cli::default();
        assert_eq!(RequestedMode::from_cli(&cli), RequestedMode::Fixed(RunMode::Full));
        cli.weather_only = true;
        assert_eq!(RequestedMode::from_cli(&cli), RequestedMode::Fixed(RunMode::WeatherOnly));
        cli.weather_only = false;
        cli.auto_update = true;
        assert_eq!(RequestedMode::from_cli(&cli), RequestedMode::Auto);
    }
}
