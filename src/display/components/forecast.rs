/*
 *  display/components/forecast.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Forecast region - five day slot grid or hourly strip
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

use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle};
use log::debug;

use super::{clear_region, draw_text_centered, paste_centered};
use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;
use crate::display::icons::{IconFit, IconStore, lighten};
use crate::display::layout::{HourlyBands, Region};
use crate::display::text::{Typeface, fit_font_size};
use crate::forecast::ForecastGrid;
use crate::weather::{HourlyConditions, WeatherSample};

/// Days shown across the grid.
pub const GRID_DAYS: usize = 5;
/// Slot icons are drawn this much smaller than their cell.
const SLOT_ICON_INSET: u32 = 20;
/// Slot icons are decoration and never print darker than this.
const SLOT_ICON_GRAY: u8 = 70;
const HOURLY_ICON_INSET: u32 = 10;
const GRID_LINE_WIDTH: u32 = 2;

// Widest strings each cell must hold; fonts are fitted to these once.
const TEMPERATURE_SAMPLE: &str = " 25.5°";
const DAY_LABEL_SAMPLE: &str = "00";
const HOUR_SAMPLE: &str = "00:00";
const HOURLY_TEMPERATURE_SAMPLE: &str = "-00°";
const PROBABILITY_SAMPLE: &str = "100%";

pub fn format_temperature(value: f64) -> String {
    format!(" {:.1}°", value)
}

/// Day x slot temperature grid. Row 0 holds day labels, column 0 the slot icons.
pub struct ForecastGridDisplay {
    region: Region,
    slot_icons: Vec<String>,
}

impl ForecastGridDisplay {
    pub fn new(region: Region, slot_icons: Vec<String>) -> Self {
        Self { region, slot_icons }
    }

    fn cell_size(&self) -> Size {
        let columns = GRID_DAYS as u32 + 1;
        let rows = self.slot_icons.len() as u32 + 1;
        Size::new(self.region.width / columns, self.region.height / rows)
    }

    fn cell(&self, column: usize, row: usize) -> Region {
        let size = self.cell_size();
        self.region.child(
            size.width,
            size.height,
            column as i32 * size.width as i32,
            row as i32 * size.height as i32,
        )
    }

    pub fn render(
        &self,
        canvas: &mut Canvas,
        face: &dyn Typeface,
        icons: &IconStore,
        grid: &ForecastGrid,
    ) -> Result<(), DisplayError> {
        clear_region(canvas, &self.region);
        let cell = self.cell_size();
        let label_size = fit_font_size(face, DAY_LABEL_SAMPLE, cell);
        let temp_size = fit_font_size(face, TEMPERATURE_SAMPLE, cell);
        debug!("Forecast grid cell {}x{}, font {}/{}", cell.width, cell.height, label_size, temp_size);

        for (row, name) in self.slot_icons.iter().enumerate() {
            let inset = Size::new(
                cell.width.saturating_sub(SLOT_ICON_INSET).max(1),
                cell.height.saturating_sub(SLOT_ICON_INSET).max(1),
            );
            let mut icon = icons.load(name, IconFit::Within(inset))?;
            lighten(&mut icon, SLOT_ICON_GRAY);
            paste_centered(canvas, &icon, &self.cell(0, row + 1));
        }

        let labels = grid.day_labels();
        for (day, label) in labels.iter().take(GRID_DAYS).enumerate() {
            draw_text_centered(canvas, face, label, label_size, &self.cell(day + 1, 0));
            for slot in 0..self.slot_icons.len() {
                if let Some(value) = grid.value(day, slot) {
                    let text = format_temperature(value);
                    draw_text_centered(canvas, face, &text, temp_size, &self.cell(day + 1, slot + 1));
                }
            }
        }

        self.draw_rules(canvas);
        Ok(())
    }

    fn draw_rules(&self, canvas: &mut Canvas) {
        let cell = self.cell_size();
        let style = PrimitiveStyle::with_stroke(Gray8::BLACK, GRID_LINE_WIDTH);
        let o = self.region.origin();
        let right = o.x + self.region.width as i32 - 1;
        let bottom = o.y + self.region.height as i32 - 1;
        let header = o.y + cell.height as i32;
        let labels = o.x + cell.width as i32;
        // drawing into a canvas cannot fail
        let _ = Line::new(Point::new(labels, header), Point::new(right, header))
            .into_styled(style)
            .draw(canvas);
        let _ = Line::new(Point::new(labels, header), Point::new(labels, bottom))
            .into_styled(style)
            .draw(canvas);
    }
}

/// One column per hourly entry, split into time, temperature, icon and
/// precipitation bands.
pub struct HourlyStripDisplay {
    region: Region,
    bands: HourlyBands,
    columns: usize,
}

impl HourlyStripDisplay {
    pub fn new(region: Region, bands: HourlyBands, columns: usize) -> Self {
        Self { region, bands, columns: columns.max(1) }
    }

    fn column_width(&self) -> u32 {
        self.region.width / self.columns as u32
    }

    fn cell(&self, band: &Region, column: usize) -> Region {
        let w = self.column_width();
        band.child(w, band.height, column as i32 * w as i32, 0)
    }

    pub fn render(
        &self,
        canvas: &mut Canvas,
        face: &dyn Typeface,
        icons: &IconStore,
        entries: &[WeatherSample<HourlyConditions>],
    ) -> Result<(), DisplayError> {
        clear_region(canvas, &self.region);
        let w = self.column_width();
        let time_size = fit_font_size(face, HOUR_SAMPLE, Size::new(w, self.bands.time.height));
        let temp_size =
            fit_font_size(face, HOURLY_TEMPERATURE_SAMPLE, Size::new(w, self.bands.temperature.height));
        let prob_size =
            fit_font_size(face, PROBABILITY_SAMPLE, Size::new(w, self.bands.probability.height));
        let icon_box = Size::new(
            w.saturating_sub(HOURLY_ICON_INSET).max(1),
            self.bands.icon.height.saturating_sub(HOURLY_ICON_INSET).max(1),
        );

        for (column, entry) in entries.iter().take(self.columns).enumerate() {
            let hour = entry.timestamp.format("%H:%M").to_string();
            draw_text_centered(canvas, face, &hour, time_size, &self.cell(&self.bands.time, column));

            let temp = format!("{:.0}°", entry.value.temperature);
            draw_text_centered(canvas, face, &temp, temp_size, &self.cell(&self.bands.temperature, column));

            let icon = icons.load(entry.value.icon.as_str(), IconFit::Within(icon_box))?;
            paste_centered(canvas, &icon, &self.cell(&self.bands.icon, column));

            let prob = format!("{}%", entry.value.precipitation_probability);
            draw_text_centered(canvas, face, &prob, prob_size, &self.cell(&self.bands.probability, column));
        }
        Ok(())
    }
}
