/*
 *  display/traits.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display collaborator contract
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

use embedded_graphics::prelude::Point;

use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;

/// How the panel is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// high quality, slow, clears ghosting
    Full,
    /// fast, only the pasted area changes
    Partial,
}

/// Display capabilities and metadata
#[derive(Debug, Clone)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Whether partial refresh is available; drivers without it get full refreshes
    pub supports_partial: bool,
}

/// What every display collaborator must accept: a grayscale frame and a refresh
/// mode. Nothing is returned beyond success or failure.
pub trait DisplayDriver {
    /// Returns the capabilities of this display
    fn capabilities(&self) -> &DisplayCapabilities;

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Show `frame` with a full refresh.
    fn full_refresh(&mut self, frame: &Canvas) -> Result<(), DisplayError>;

    /// Paste `frame` at `offset` and refresh only that area.
    fn partial_refresh(&mut self, frame: &Canvas, offset: Point) -> Result<(), DisplayError>;

    /// Dispatch on `mode`, degrading partial to full where unsupported.
    fn refresh(&mut self, frame: &Canvas, mode: RefreshMode) -> Result<(), DisplayError> {
        match mode {
            RefreshMode::Partial if self.capabilities().supports_partial => {
                self.partial_refresh(frame, Point::zero())
            }
            _ => self.full_refresh(frame),
        }
    }
}
