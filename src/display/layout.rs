/*
 *  display/layout.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Fixed region layout derived from the canvas size and split ratios
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

use embedded_graphics::prelude::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StationLayoutRatios;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("canvas {width}x{height} is degenerate")]
    DegenerateCanvas { width: i64, height: i64 },
    #[error("ratio {name}={value} must be strictly between 0 and 1")]
    BadRatio { name: &'static str, value: f64 },
    #[error("region {name} collapsed to {width}x{height}")]
    DegenerateRegion { name: &'static str, width: i64, height: i64 },
}

/// What the forecast region shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMode {
    /// day x slot grid, 4:3
    #[default]
    FiveDay,
    /// one column per hour, 3:2
    Hourly,
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub width: u32,
    pub height: u32,
    pub origin_x: i32,
    pub origin_y: i32,
}

impl Region {
    pub fn new(width: u32, height: u32, origin_x: i32, origin_y: i32) -> Self {
        Self { width, height, origin_x, origin_y }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.origin_x, self.origin_y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn rect(&self) -> Rectangle {
        Rectangle::new(self.origin(), self.size())
    }

    /// A region positioned relative to this one's origin.
    pub fn child(&self, width: u32, height: u32, dx: i32, dy: i32) -> Region {
        Region::new(width, height, self.origin_x + dx, self.origin_y + dy)
    }

    pub fn right(&self) -> i64 {
        self.origin_x as i64 + self.width as i64
    }

    pub fn bottom(&self) -> i64 {
        self.origin_y as i64 + self.height as i64
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        (self.origin_x as i64) < other.right()
            && (other.origin_x as i64) < self.right()
            && (self.origin_y as i64) < other.bottom()
            && (other.origin_y as i64) < self.bottom()
    }

    pub fn contains_region(&self, other: &Region) -> bool {
        other.origin_x >= self.origin_x
            && other.origin_y >= self.origin_y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Vertical split of the hourly strip: time, temperature, icon, probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyBands {
    pub time: Region,
    pub temperature: Region,
    pub icon: Region,
    pub probability: Region,
}

const HOURLY_BAND_RATIOS: [f64; 3] = [0.2, 0.25, 0.35];

impl HourlyBands {
    /// Split `strip` top to bottom; the probability band takes what is left so
    /// rounding never loses a row.
    pub fn split(strip: &Region) -> Self {
        let h = strip.height as f64;
        let time_h = (h * HOURLY_BAND_RATIOS[0]) as u32;
        let temp_h = (h * HOURLY_BAND_RATIOS[1]) as u32;
        let icon_h = (h * HOURLY_BAND_RATIOS[2]) as u32;
        let prob_h = strip.height.saturating_sub(time_h + temp_h + icon_h);
        let w = strip.width;
        Self {
            time: strip.child(w, time_h, 0, 0),
            temperature: strip.child(w, temp_h, 0, time_h as i32),
            icon: strip.child(w, icon_h, 0, (time_h + temp_h) as i32),
            probability: strip.child(w, prob_h, 0, (time_h + temp_h + icon_h) as i32),
        }
    }
}

/// Every region of the composite, computed once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StationLayout {
    pub canvas: Region,
    pub clock: Region,
    /// clock region less the left margin; the time text is fitted here
    pub clock_text: Region,
    pub forecast: Region,
    pub summary: Region,
    pub summary_icon: Region,
    pub summary_text: Region,
    pub user_content: Region,
    pub mode: ForecastMode,
}

fn check_ratio(name: &'static str, value: f64) -> Result<f64, LayoutError> {
    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(LayoutError::BadRatio { name, value })
    }
}

fn check_region(name: &'static str, width: i64, height: i64) -> Result<(u32, u32), LayoutError> {
    if width > 0 && height > 0 {
        Ok((width as u32, height as u32))
    } else {
        Err(LayoutError::DegenerateRegion { name, width, height })
    }
}

impl StationLayout {
    /// Partition a `width` x `height` canvas.
    ///
    /// The forecast region sits top right, `grid_horiz_ratio` of the width, with
    /// its height set by the mode's aspect ratio. The clock sits top left above
    /// the summary, split by `time_vert_ratio`. User content fills the space under
    /// the forecast.
    pub fn new(
        width: i64,
        height: i64,
        ratios: &StationLayoutRatios,
        mode: ForecastMode,
    ) -> Result<Self, LayoutError> {
        if width <= 0 || height <= 0 {
            return Err(LayoutError::DegenerateCanvas { width, height });
        }
        let grid_ratio = check_ratio("grid_horiz_ratio", ratios.grid_horiz_ratio)?;
        let time_ratio = check_ratio("time_vert_ratio", ratios.time_vert_ratio)?;
        let icon_ratio = check_ratio("weather_icon_ratio", ratios.weather_icon_ratio)?;

        let grid_w = (width as f64 * grid_ratio) as i64;
        let grid_h = match mode {
            ForecastMode::FiveDay => grid_w / 4 * 3,
            ForecastMode::Hourly => grid_w / 3 * 2,
        };
        let (grid_w, grid_h) = check_region("forecast", grid_w, grid_h.min(height))?;

        let (clock_w, clock_h) =
            check_region("clock", width - grid_w as i64, (height as f64 * time_ratio) as i64)?;
        let (summary_w, summary_h) = check_region(
            "summary",
            width - grid_w as i64,
            (height as f64 * (1.0 - time_ratio)) as i64,
        )?;
        let (user_w, user_h) = check_region("user_content", grid_w as i64, height - grid_h as i64)?;

        let canvas = Region::new(width as u32, height as u32, 0, 0);
        let clock = Region::new(clock_w, clock_h, 0, 0);
        let margin = ratios.time_left_margin as i64;
        let (text_w, text_h) = check_region("clock_text", clock_w as i64 - margin, clock_h as i64)?;
        let clock_text = clock.child(text_w, text_h, margin as i32, 0);
        let forecast = Region::new(grid_w, grid_h, clock_w as i32, 0);
        let summary = Region::new(summary_w, summary_h, 0, clock_h as i32);

        let icon_margin = ratios.weather_icon_margin as i64;
        let (icon_w, icon_h) = check_region(
            "summary_icon",
            (summary_w as f64 * icon_ratio) as i64,
            summary_h as i64 - icon_margin,
        )?;
        let summary_icon = summary.child(icon_w, icon_h, 0, icon_margin as i32);
        let (desc_w, desc_h) = check_region(
            "summary_text",
            (summary_w as f64 * (1.0 - icon_ratio)) as i64,
            summary_h as i64,
        )?;
        let summary_text = summary.child(desc_w, desc_h, icon_w as i32, 0);
        let user_content = Region::new(user_w, user_h, clock_w as i32, grid_h as i32);

        Ok(Self {
            canvas,
            clock,
            clock_text,
            forecast,
            summary,
            summary_icon,
            summary_text,
            user_content,
            mode,
        })
    }

    pub fn from_config(config: &crate::config::StationConfig) -> Result<Self, LayoutError> {
        Self::new(
            config.display.width as i64,
            config.display.height as i64,
            &config.layout,
            config.forecast.mode,
        )
    }

    pub fn hourly_bands(&self) -> HourlyBands {
        HourlyBands::split(&self.forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratios() -> StationLayoutRatios {
        StationLayoutRatios {
            grid_horiz_ratio: 0.6,
            time_vert_ratio: 0.7,
            time_left_margin: 50,
            weather_icon_ratio: 0.4,
            weather_icon_margin: 50,
        }
    }

    #[test]
    fn test_default_canvas_regions() {
        let l = StationLayout::new(1872, 1404, &ratios(), ForecastMode::FiveDay).unwrap();
        assert_eq!(l.forecast, Region::new(1123, 840, 749, 0));
        assert_eq!(l.clock, Region::new(749, 982, 0, 0));
        assert_eq!(l.clock_text, Region::new(699, 982, 50, 0));
        assert_eq!(l.summary, Region::new(749, 421, 0, 982));
        assert_eq!(l.summary_icon, Region::new(299, 371, 0, 1032));
        assert_eq!(l.summary_text, Region::new(449, 421, 299, 982));
        assert_eq!(l.user_content, Region::new(1123, 564, 749, 840));
    }

    #[test]
    fn test_hourly_aspect() {
        let l = StationLayout::new(1872, 1404, &ratios(), ForecastMode::Hourly).unwrap();
        assert_eq!(l.forecast.height, 1123 / 3 * 2);
        let bands = l.hourly_bands();
        let total = bands.time.height + bands.temperature.height + bands.icon.height + bands.probability.height;
        assert_eq!(total, l.forecast.height);
        assert_eq!(bands.probability.bottom(), l.forecast.bottom());
        assert!(!bands.time.overlaps(&bands.temperature));
        assert!(!bands.icon.overlaps(&bands.probability));
    }

    #[test]
    fn test_top_level_regions_do_not_overlap() {
        for mode in [ForecastMode::FiveDay, ForecastMode::Hourly] {
            for (w, h) in [(1872, 1404), (800, 600), (640, 480)] {
                let l = StationLayout::new(w, h, &ratios(), mode).unwrap();
                let top = [l.clock, l.forecast, l.summary, l.user_content];
                for (i, a) in top.iter().enumerate() {
                    assert!(l.canvas.contains_region(a), "{:?} escapes canvas", a);
                    for b in &top[i + 1..] {
                        assert!(!a.overlaps(b), "{:?} overlaps {:?}", a, b);
                    }
                }
                assert!(l.summary.contains_region(&l.summary_icon));
                assert!(l.summary.contains_region(&l.summary_text));
                assert!(!l.summary_icon.overlaps(&l.summary_text));
                assert!(l.clock.contains_region(&l.clock_text));
            }
        }
    }

    #[test]
    fn test_degenerate_inputs_rejected() {
        assert!(matches!(
            StationLayout::new(0, 100, &ratios(), ForecastMode::FiveDay),
            Err(LayoutError::DegenerateCanvas { .. })
        ));
        assert!(StationLayout::new(100, -1, &ratios(), ForecastMode::FiveDay).is_err());
        let mut r = ratios();
        r.grid_horiz_ratio = 1.2;
        assert!(matches!(
            StationLayout::new(100, 100, &r, ForecastMode::FiveDay),
            Err(LayoutError::BadRatio { .. })
        ));
        // margin wider than the clock column
        let mut r = ratios();
        r.time_left_margin = 500;
        assert!(matches!(
            StationLayout::new(800, 600, &r, ForecastMode::FiveDay),
            Err(LayoutError::DegenerateRegion { name: "clock_text", .. })
        ));
    }
}
