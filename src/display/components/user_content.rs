/*
 *  display/components/user_content.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Free-form image or text under the forecast
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

use image::imageops::{self, FilterType};
use log::info;

use super::{clear_region, draw_text_fitted, paste_centered};
use crate::config::UserContent;
use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;
use crate::display::layout::Region;
use crate::display::text::Typeface;

pub struct UserContentDisplay {
    region: Region,
}

impl UserContentDisplay {
    pub fn new(region: Region) -> Self {
        Self { region }
    }

    pub fn render(
        &self,
        canvas: &mut Canvas,
        face: &dyn Typeface,
        content: &UserContent,
    ) -> Result<(), DisplayError> {
        match content {
            UserContent::Image(path) => {
                info!("Drawing user image {}", path.display());
                let img = image::open(path)?.into_luma8();
                let img = if img.width() > self.region.width || img.height() > self.region.height {
                    // thumbnail keeps the aspect ratio inside the region
                    let scale = f64::min(
                        self.region.width as f64 / img.width() as f64,
                        self.region.height as f64 / img.height() as f64,
                    );
                    let w = ((img.width() as f64 * scale) as u32).max(1);
                    let h = ((img.height() as f64 * scale) as u32).max(1);
                    imageops::resize(&img, w, h, FilterType::Triangle)
                } else {
                    img
                };
                clear_region(canvas, &self.region);
                paste_centered(canvas, &Canvas::from_image(&img), &self.region);
            }
            UserContent::Text(text) => {
                clear_region(canvas, &self.region);
                draw_text_fitted(canvas, face, text, &self.region);
            }
        }
        Ok(())
    }
}
