/*
 *  weather/icons.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Shared icon vocabulary and provider code translation
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

use std::fmt;
use std::str::FromStr;

use super::WeatherApiError;

/// AccuWeather reports rain as code 18 regardless of time of day.
const ACCU_RAIN: i64 = 18;
/// Samples later than this hour draw the night variant of code 18.
const ACCU_RAIN_NIGHT_AFTER_HOUR: u32 = 18;

/// Closed icon vocabulary, named after the OpenWeather icon set. Every icon asset on
/// disk is `<code>.<ext>` for one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconCode {
    ClearDay,
    ClearNight,
    FewCloudsDay,
    FewCloudsNight,
    ScatteredCloudsDay,
    ScatteredCloudsNight,
    BrokenCloudsDay,
    BrokenCloudsNight,
    ShowerRainDay,
    ShowerRainNight,
    RainDay,
    RainNight,
    ThunderstormDay,
    ThunderstormNight,
    SnowDay,
    SnowNight,
    MistDay,
    MistNight,
}

impl IconCode {
    pub const ALL: [IconCode; 18] = [
        IconCode::ClearDay,
        IconCode::ClearNight,
        IconCode::FewCloudsDay,
        IconCode::FewCloudsNight,
        IconCode::ScatteredCloudsDay,
        IconCode::ScatteredCloudsNight,
        IconCode::BrokenCloudsDay,
        IconCode::BrokenCloudsNight,
        IconCode::ShowerRainDay,
        IconCode::ShowerRainNight,
        IconCode::RainDay,
        IconCode::RainNight,
        IconCode::ThunderstormDay,
        IconCode::ThunderstormNight,
        IconCode::SnowDay,
        IconCode::SnowNight,
        IconCode::MistDay,
        IconCode::MistNight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IconCode::ClearDay => "01d",
            IconCode::ClearNight => "01n",
            IconCode::FewCloudsDay => "02d",
            IconCode::FewCloudsNight => "02n",
            IconCode::ScatteredCloudsDay => "03d",
            IconCode::ScatteredCloudsNight => "03n",
            IconCode::BrokenCloudsDay => "04d",
            IconCode::BrokenCloudsNight => "04n",
            IconCode::ShowerRainDay => "09d",
            IconCode::ShowerRainNight => "09n",
            IconCode::RainDay => "10d",
            IconCode::RainNight => "10n",
            IconCode::ThunderstormDay => "11d",
            IconCode::ThunderstormNight => "11n",
            IconCode::SnowDay => "13d",
            IconCode::SnowNight => "13n",
            IconCode::MistDay => "50d",
            IconCode::MistNight => "50n",
        }
    }

    /// Translate an AccuWeather numeric icon into the vocabulary. `hour` is the
    /// sample's local hour and only matters for code 18 (rain).
    pub fn from_accuweather(code: i64, hour: u32) -> Result<Self, WeatherApiError> {
        let icon = match code {
            // sunny, mostly sunny
            1 | 2 => IconCode::ClearDay,
            // clear, mostly clear
            33 | 34 => IconCode::ClearNight,
            // partly sunny, intermittent clouds
            3 | 4 => IconCode::FewCloudsDay,
            35 | 36 => IconCode::FewCloudsNight,
            // hazy sunshine, mostly cloudy
            5 | 6 => IconCode::ScatteredCloudsDay,
            37 | 38 => IconCode::ScatteredCloudsNight,
            // cloudy, dreary
            7 | 8 => IconCode::BrokenCloudsDay,
            11 => IconCode::MistDay,
            // showers
            12..=14 => IconCode::ShowerRainDay,
            39 | 40 => IconCode::ShowerRainNight,
            // t-storms
            15..=17 => IconCode::ThunderstormDay,
            41 | 42 => IconCode::ThunderstormNight,
            ACCU_RAIN if hour > ACCU_RAIN_NIGHT_AFTER_HOUR => IconCode::RainNight,
            ACCU_RAIN => IconCode::RainDay,
            // snow, ice, sleet, freezing rain
            19..=26 | 29 | 43 | 44 => IconCode::SnowDay,
            other => return Err(WeatherApiError::UnknownIconCode(other.to_string())),
        };
        Ok(icon)
    }
}

impl FromStr for IconCode {
    type Err = WeatherApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IconCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| WeatherApiError::UnknownIconCode(s.to_string()))
    }
}

impl fmt::Display for IconCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuweather_mapping_is_pure() {
        for code in [1, 2, 3, 7, 11, 12, 15, 19, 33, 44] {
            let first = IconCode::from_accuweather(code, 9).unwrap();
            for hour in [0, 6, 12, 23] {
                assert_eq!(IconCode::from_accuweather(code, hour).unwrap(), first);
            }
        }
        assert_eq!(IconCode::from_accuweather(1, 12).unwrap(), IconCode::ClearDay);
        assert_eq!(IconCode::from_accuweather(41, 12).unwrap().as_str(), "11n");
        assert_eq!(IconCode::from_accuweather(26, 12).unwrap().as_str(), "13d");
    }

    #[test]
    fn test_rain_day_night_split() {
        assert_eq!(IconCode::from_accuweather(18, 9).unwrap(), IconCode::RainDay);
        assert_eq!(IconCode::from_accuweather(18, 18).unwrap(), IconCode::RainDay);
        assert_eq!(IconCode::from_accuweather(18, 19).unwrap(), IconCode::RainNight);
        assert_eq!(IconCode::from_accuweather(18, 23).unwrap().as_str(), "10n");
    }

    #[test]
    fn test_unknown_accuweather_code_is_error() {
        assert!(matches!(
            IconCode::from_accuweather(999, 12),
            Err(WeatherApiError::UnknownIconCode(code)) if code == "999"
        ));
        // codes absent from the table in the middle of the range
        assert!(IconCode::from_accuweather(9, 12).is_err());
        assert!(IconCode::from_accuweather(30, 12).is_err());
    }

    #[test]
    fn test_vocabulary_round_trips_through_strings() {
        for code in IconCode::ALL {
            assert_eq!(code.as_str().parse::<IconCode>().unwrap(), code);
        }
        assert!("99x".parse::<IconCode>().is_err());
    }
}
