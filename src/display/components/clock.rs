/*
 *  display/components/clock.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Clock component - hours over minutes, as large as the region allows
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

use chrono::NaiveDateTime;
use log::debug;

use super::{clear_region, draw_text_fitted};
use crate::display::canvas::Canvas;
use crate::display::layout::Region;
use crate::display::text::Typeface;

/// Clock display component
pub struct ClockDisplay {
    region: Region,
    text_region: Region,
}

impl ClockDisplay {
    /// `text_region` is the part of `region` the digits are fitted into.
    pub fn new(region: Region, text_region: Region) -> Self {
        Self { region, text_region }
    }

    pub fn text(now: NaiveDateTime) -> String {
        now.format("%H\n%M").to_string()
    }

    /// Clear the clock region and draw `now`. Nothing outside the region changes.
    pub fn render(&self, canvas: &mut Canvas, face: &dyn Typeface, now: NaiveDateTime) {
        clear_region(canvas, &self.region);
        let size = draw_text_fitted(canvas, face, &Self::text(now), &self.text_region);
        debug!("Clock drawn at size {}", size);
    }
}
