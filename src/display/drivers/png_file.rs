/*
 *  display/drivers/png_file.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display driver that writes each refreshed frame to a PNG file
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

use std::path::{Path, PathBuf};

use embedded_graphics::prelude::*;
use log::info;

use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver};

/// Stands in for the panel: the frame the panel would show is written to `path`.
/// A partial refresh clears to white and pastes at the offset, like the panel
/// client does.
#[derive(Debug)]
pub struct PngFileDriver {
    path: PathBuf,
    capabilities: DisplayCapabilities,
}

impl PngFileDriver {
    pub fn new(path: PathBuf, width: u32, height: u32) -> Self {
        Self {
            path,
            capabilities: DisplayCapabilities { width, height, supports_partial: true },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, frame: &Canvas, offset: Point) -> Result<(), DisplayError> {
        let (w, h) = self.dimensions();
        if frame.width() == w && frame.height() == h && offset == Point::zero() {
            return frame.save_png(&self.path);
        }
        let mut panel = Canvas::new(w, h);
        panel.paste(frame, offset);
        panel.save_png(&self.path)
    }
}

impl DisplayDriver for PngFileDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn full_refresh(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        info!("Full refresh -> {}", self.path.display());
        self.write(frame, Point::zero())
    }

    fn partial_refresh(&mut self, frame: &Canvas, offset: Point) -> Result<(), DisplayError> {
        info!("Partial refresh at {:?} -> {}", offset, self.path.display());
        self.write(frame, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_full_refresh_writes_frame() {
        let dir = tempdir().unwrap();
        let mut driver = PngFileDriver::new(dir.path().join("out.png"), 10, 6);
        let mut frame = Canvas::new(10, 6);
        frame.set_pixel(Point::new(9, 5), 0);
        driver.full_refresh(&frame).unwrap();
        assert_eq!(Canvas::load_png(driver.path(), Size::new(10, 6)).unwrap(), frame);
    }

    #[test]
    fn test_partial_refresh_pastes_at_offset() {
        let dir = tempdir().unwrap();
        let mut driver = PngFileDriver::new(dir.path().join("out.png"), 10, 6);
        driver.partial_refresh(&Canvas::filled(2, 2, 0), Point::new(3, 4)).unwrap();
        let shown = Canvas::load_png(driver.path(), Size::new(10, 6)).unwrap();
        assert_eq!(shown.pixel(Point::new(3, 4)), Some(0));
        assert_eq!(shown.pixel(Point::new(4, 5)), Some(0));
        assert_eq!(shown.pixel(Point::new(2, 4)), Some(255));
    }
}
