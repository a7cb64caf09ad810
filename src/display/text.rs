/*
 *  display/text.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Typefaces, text-fit search and centring
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

use std::fs;
use std::path::Path;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle, iso_8859_1::FONT_10X20};
use embedded_graphics::pixelcolor::{Gray8, GrayColor};
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use log::{info, warn};
use rusttype::{Font, Scale, point};

use crate::display::canvas::{BLACK, Canvas};
use crate::display::error::DisplayError;

pub const MIN_FONT_SIZE: u32 = 10;
pub const FONT_SIZE_STEP: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 1000;

/// A scalable face. `size` is the nominal pixel size.
pub trait Typeface {
    /// Height of one line at `size`.
    fn line_height(&self, size: u32) -> u32;

    /// Advance width of a single line at `size`.
    fn line_width(&self, line: &str, size: u32) -> u32;

    /// Draw one line with its top-left corner at `at`.
    fn draw_line(&self, canvas: &mut Canvas, line: &str, size: u32, at: Point, luma: u8);

    /// Bounding box of possibly multi-line text: widest line by summed line heights.
    fn measure(&self, text: &str, size: u32) -> Size {
        let mut width = 0;
        let mut height = 0;
        for line in text.split('\n') {
            width = width.max(self.line_width(line, size));
            height += self.line_height(size);
        }
        Size::new(width, height)
    }

    fn draw(&self, canvas: &mut Canvas, text: &str, size: u32, at: Point, luma: u8) {
        let step = self.line_height(size) as i32;
        for (i, line) in text.split('\n').enumerate() {
            self.draw_line(canvas, line, size, at + Point::new(0, step * i as i32), luma);
        }
    }
}

/// TrueType face rendered with rusttype, antialiased onto the canvas.
pub struct TrueTypeFace {
    font: Font<'static>,
}

impl TrueTypeFace {
    pub fn load(path: &Path) -> Result<Self, DisplayError> {
        let data = fs::read(path)?;
        let font = Font::try_from_vec(data)
            .ok_or_else(|| DisplayError::Font(format!("{} is not a TrueType font", path.display())))?;
        Ok(Self { font })
    }

    fn scale(size: u32) -> Scale {
        Scale::uniform(size as f32)
    }
}

impl Typeface for TrueTypeFace {
    fn line_height(&self, size: u32) -> u32 {
        let v = self.font.v_metrics(Self::scale(size));
        (v.ascent - v.descent).ceil() as u32
    }

    fn line_width(&self, line: &str, size: u32) -> u32 {
        let scale = Self::scale(size);
        self.font
            .layout(line, scale, point(0.0, 0.0))
            .last()
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .unwrap_or(0.0)
            .ceil() as u32
    }

    fn draw_line(&self, canvas: &mut Canvas, line: &str, size: u32, at: Point, luma: u8) {
        let scale = Self::scale(size);
        let ascent = self.font.v_metrics(scale).ascent;
        for glyph in self.font.layout(line, scale, point(at.x as f32, at.y as f32 + ascent)) {
            let Some(bb) = glyph.pixel_bounding_box() else { continue };
            glyph.draw(|x, y, coverage| {
                let p = Point::new(bb.min.x + x as i32, bb.min.y + y as i32);
                if let Some(under) = canvas.pixel(p) {
                    let blended = under as f32 * (1.0 - coverage) + luma as f32 * coverage;
                    canvas.set_pixel(p, blended.round() as u8);
                }
            });
        }
    }
}

/// Built-in mono bitmap face scaled nearest-neighbour to the requested size.
/// Used when no TrueType font is configured.
pub struct BitmapFace {
    font: &'static MonoFont<'static>,
}

impl Default for BitmapFace {
    fn default() -> Self {
        Self { font: &FONT_10X20 }
    }
}

impl BitmapFace {
    fn cell(&self, size: u32) -> Size {
        let native = self.font.character_size;
        Size::new((native.width * size / native.height).max(1), size.max(1))
    }
}

impl Typeface for BitmapFace {
    fn line_height(&self, size: u32) -> u32 {
        self.cell(size).height
    }

    fn line_width(&self, line: &str, size: u32) -> u32 {
        self.cell(size).width * line.chars().count() as u32
    }

    fn draw_line(&self, canvas: &mut Canvas, line: &str, size: u32, at: Point, luma: u8) {
        let chars = line.chars().count() as u32;
        if chars == 0 {
            return;
        }
        let native = self.font.character_size;
        let mut glyphs = Canvas::new(native.width * chars, native.height);
        let style = MonoTextStyle::new(self.font, Gray8::BLACK);
        // drawing into a canvas cannot fail
        let _ = Text::with_baseline(line, Point::zero(), style, Baseline::Top).draw(&mut glyphs);

        let (sw, sh) = (glyphs.width(), glyphs.height());
        let cell = self.cell(size);
        let (tw, th) = (cell.width * chars, cell.height);
        for ty in 0..th {
            for tx in 0..tw {
                let src = Point::new((tx * sw / tw) as i32, (ty * sh / th) as i32);
                if glyphs.pixel(src) == Some(BLACK) {
                    canvas.set_pixel(at + Point::new(tx as i32, ty as i32), luma);
                }
            }
        }
    }
}

/// The configured TrueType font, or the built-in bitmap face.
pub fn load_typeface(path: Option<&Path>) -> Result<Box<dyn Typeface>, DisplayError> {
    match path {
        Some(p) => {
            info!("Loading font {}", p.display());
            Ok(Box::new(TrueTypeFace::load(p)?))
        }
        None => {
            info!("No font configured, using built-in bitmap face");
            Ok(Box::new(BitmapFace::default()))
        }
    }
}

/// Largest size on the 10-step grid whose rendering of `text` fits strictly
/// inside `limit`. Returns the smallest size when nothing fits and stops at the
/// ceiling.
pub fn fit_font_size(face: &dyn Typeface, text: &str, limit: Size) -> u32 {
    let fits = |size: u32| {
        let m = face.measure(text, size);
        m.width < limit.width && m.height < limit.height
    };
    let mut size = MIN_FONT_SIZE;
    loop {
        if size >= MAX_FONT_SIZE {
            warn!("Font size for {:?} reached the {} ceiling", text, MAX_FONT_SIZE);
            return MAX_FONT_SIZE;
        }
        let next = size + FONT_SIZE_STEP;
        if !fits(next) {
            return size;
        }
        size = next;
    }
}

/// Offset that centres `content` in `region`. Integer halves; negative when the
/// content is larger.
pub fn center_offset(content: Size, region: Size) -> Point {
    Point::new(
        (region.width as i32 - content.width as i32) / 2,
        (region.height as i32 - content.height as i32) / 2,
    )
}

/// Something to be centred: measured text or a bitmap.
pub enum Content<'a> {
    Text { text: &'a str, face: &'a dyn Typeface, size: u32 },
    Bitmap(&'a Canvas),
}

impl Content<'_> {
    pub fn size(&self) -> Size {
        match self {
            Content::Text { text, face, size } => face.measure(text, *size),
            Content::Bitmap(bitmap) => bitmap.size(),
        }
    }

    pub fn center_in(&self, region: Size) -> Point {
        center_offset(self.size(), region)
    }
}
