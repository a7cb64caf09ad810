/*
 *  display/components/weather.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Current weather summary - icon beside a short description
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

use embedded_graphics::prelude::*;

use super::clear_region;
use crate::display::canvas::{BLACK, Canvas};
use crate::display::error::DisplayError;
use crate::display::icons::{IconFit, IconStore};
use crate::display::layout::Region;
use crate::display::text::{Content, Typeface, fit_font_size};
use crate::weather::CurrentConditions;

/// Summary display component
pub struct WeatherSummaryDisplay {
    region: Region,
    icon_region: Region,
    text_region: Region,
}

impl WeatherSummaryDisplay {
    pub fn new(region: Region, icon_region: Region, text_region: Region) -> Self {
        Self { region, icon_region, text_region }
    }

    /// Icon stretched over its sub-region; description fitted to the rest,
    /// left aligned and vertically centred.
    pub fn render(
        &self,
        canvas: &mut Canvas,
        face: &dyn Typeface,
        icons: &IconStore,
        current: &CurrentConditions,
    ) -> Result<(), DisplayError> {
        let icon = icons.load(current.icon.as_str(), IconFit::Exact(self.icon_region.size()))?;
        clear_region(canvas, &self.region);
        canvas.paste(&icon, self.icon_region.origin());

        let size = fit_font_size(face, &current.description, self.text_region.size());
        let offset = Content::Text { text: &current.description, face, size }
            .center_in(self.text_region.size());
        let at = self.text_region.origin() + Point::new(0, offset.y);
        face.draw(canvas, &current.description, size, at, BLACK);
        Ok(())
    }
}
