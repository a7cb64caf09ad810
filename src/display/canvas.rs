/*
 *  display/canvas.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runtime-sized 8-bit grayscale canvas for embedded-graphics
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

use core::convert::Infallible;
use std::path::Path;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use image::GrayImage;

use crate::display::error::DisplayError;

pub const WHITE: u8 = 255;
pub const BLACK: u8 = 0;

/// A single-channel raster the whole composite is drawn into. Anything drawn
/// outside the canvas is clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    buf: Vec<u8>,
    w: usize,
    h: usize,
}

impl Canvas {
    /// New canvas filled white.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, WHITE)
    }

    pub fn filled(width: u32, height: u32, luma: u8) -> Self {
        let (w, h) = (width as usize, height as usize);
        Self { buf: vec![luma; w * h], w, h }
    }

    pub fn width(&self) -> u32 { self.w as u32 }
    pub fn height(&self) -> u32 { self.h as u32 }

    /// Immutable raw access, row-major
    pub fn as_slice(&self) -> &[u8] { &self.buf }

    #[inline]
    fn idx(&self, p: Point) -> Option<usize> {
        if p.x >= 0 && p.y >= 0 {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < self.w && y < self.h {
                return Some(y * self.w + x);
            }
        }
        None
    }

    pub fn pixel(&self, p: Point) -> Option<u8> {
        self.idx(p).map(|i| self.buf[i])
    }

    pub fn set_pixel(&mut self, p: Point, luma: u8) {
        if let Some(i) = self.idx(p) {
            self.buf[i] = luma;
        }
    }

    pub fn fill_rect(&mut self, area: &Rectangle, luma: u8) {
        let area = area.intersection(&self.bounding_box());
        for p in area.points() {
            self.set_pixel(p, luma);
        }
    }

    /// Copy `src` with its top-left at `at`; pixels falling outside are clipped.
    pub fn paste(&mut self, src: &Canvas, at: Point) {
        for y in 0..src.h {
            for x in 0..src.w {
                let p = at + Point::new(x as i32, y as i32);
                if let Some(i) = self.idx(p) {
                    self.buf[i] = src.buf[y * src.w + x];
                }
            }
        }
    }

    /// Bounding box of every pixel that differs from `other`, or None when equal.
    pub fn diff_bounds(&self, other: &Canvas) -> Option<Rectangle> {
        if self.w != other.w || self.h != other.h {
            return Some(self.bounding_box());
        }
        let mut min = Point::new(i32::MAX, i32::MAX);
        let mut max = Point::new(i32::MIN, i32::MIN);
        for (i, (a, b)) in self.buf.iter().zip(other.buf.iter()).enumerate() {
            if a != b {
                let p = Point::new((i % self.w) as i32, (i / self.w) as i32);
                min = min.component_min(p);
                max = max.component_max(p);
            }
        }
        (min.x <= max.x).then(|| Rectangle::with_corners(min, max))
    }

    pub fn to_image(&self) -> GrayImage {
        GrayImage::from_fn(self.w as u32, self.h as u32, |x, y| {
            image::Luma([self.buf[y as usize * self.w + x as usize]])
        })
    }

    pub fn from_image(img: &GrayImage) -> Self {
        Self {
            buf: img.as_raw().clone(),
            w: img.width() as usize,
            h: img.height() as usize,
        }
    }

    pub fn save_png(&self, path: &Path) -> Result<(), DisplayError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.to_image().save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Load a PNG, converting to grayscale. The size must match `expected`.
    pub fn load_png(path: &Path, expected: Size) -> Result<Self, DisplayError> {
        let img = image::open(path)?.into_luma8();
        if img.width() != expected.width || img.height() != expected.height {
            return Err(DisplayError::BufferSizeMismatch {
                expected: (expected.width, expected.height),
                actual: (img.width(), img.height()),
            });
        }
        Ok(Self::from_image(&img))
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(self.w as u32, self.h as u32)
    }
}

impl DrawTarget for Canvas {
    type Color = Gray8;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            if let Some(i) = self.idx(p) {
                self.buf[i] = c.luma();
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buf.fill(color.luma());
        Ok(())
    }
}
