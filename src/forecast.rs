/*
 *  forecast.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Forecast binning - day x slot grid, or leading hourly entries
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

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use log::debug;

use crate::weather::WeatherSample;

/// Day label format used on the grid header.
pub const DAY_LABEL_FORMAT: &str = "%d";

/// Temperatures arranged by day (rows) and time-of-day slot (columns).
/// A slot with no matching sample is `None`, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastGrid {
    pub days: Vec<NaiveDate>,
    pub slots: Vec<NaiveTime>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl ForecastGrid {
    pub fn day_labels(&self) -> Vec<String> {
        self.days
            .iter()
            .map(|d| d.format(DAY_LABEL_FORMAT).to_string())
            .collect()
    }

    pub fn value(&self, day: usize, slot: usize) -> Option<f64> {
        self.cells.get(day).and_then(|row| row.get(slot)).copied().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Bin samples into a day x slot grid. Only samples whose time of day equals a
/// slot exactly are kept; a day appears only if at least one of its samples did.
pub fn bin_by_day(samples: &[WeatherSample<f64>], slots: &[NaiveTime]) -> ForecastGrid {
    let mut by_day: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    let mut discarded = 0usize;

    for sample in samples {
        let Some(slot) = slots.iter().position(|s| *s == sample.timestamp.time()) else {
            discarded += 1;
            continue;
        };
        let row = by_day
            .entry(sample.timestamp.date())
            .or_insert_with(|| vec![None; slots.len()]);
        row[slot] = Some(sample.value);
    }
    if discarded > 0 {
        debug!("Forecast binning discarded {} off-slot samples", discarded);
    }

    let (days, cells): (Vec<_>, Vec<_>) = by_day.into_iter().unzip();
    ForecastGrid { days, slots: slots.to_vec(), cells }
}

/// Leading `count` entries of an already sorted hourly sequence.
pub fn leading_hours<T>(samples: &[WeatherSample<T>], count: usize) -> &[WeatherSample<T>] {
    &samples[..samples.len().min(count)]
}
