/*
 *  display/components/mod.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Region renderers for the composite
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

pub mod clock;
pub mod forecast;
pub mod user_content;
pub mod weather;

// Re-exports
pub use clock::ClockDisplay;
pub use forecast::{ForecastGridDisplay, HourlyStripDisplay};
pub use user_content::UserContentDisplay;
pub use weather::WeatherSummaryDisplay;

use crate::display::canvas::{BLACK, Canvas, WHITE};
use crate::display::layout::Region;
use crate::display::text::{Content, Typeface, fit_font_size};

/// Blank a region before redrawing it.
pub(crate) fn clear_region(canvas: &mut Canvas, region: &Region) {
    canvas.fill_rect(&region.rect(), WHITE);
}

/// Draw `text` at `size` centred in `region`.
pub(crate) fn draw_text_centered(
    canvas: &mut Canvas,
    face: &dyn Typeface,
    text: &str,
    size: u32,
    region: &Region,
) {
    let offset = Content::Text { text, face, size }.center_in(region.size());
    face.draw(canvas, text, size, region.origin() + offset, BLACK);
}

/// Fit `text` to `region` and draw it centred. Returns the size used.
pub(crate) fn draw_text_fitted(
    canvas: &mut Canvas,
    face: &dyn Typeface,
    text: &str,
    region: &Region,
) -> u32 {
    let size = fit_font_size(face, text, region.size());
    draw_text_centered(canvas, face, text, size, region);
    size
}

/// Paste `bitmap` centred in `region`.
pub(crate) fn paste_centered(canvas: &mut Canvas, bitmap: &Canvas, region: &Region) {
    let offset = Content::Bitmap(bitmap).center_in(region.size());
    canvas.paste(bitmap, region.origin() + offset);
}
