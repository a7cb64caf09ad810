/*
 *  display/icons.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Icon asset store - PNG, or SVG rasterised with resvg
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
use std::path::{Path, PathBuf};

use embedded_graphics::prelude::{Point, Size};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use log::debug;
use resvg::{render, usvg::{Options as UsvgOptions, Transform, Tree as UsvgTree}};
use tiny_skia::Pixmap;

use crate::display::canvas::{BLACK, Canvas};
use crate::display::error::DisplayError;

const RASTER_EXTENSIONS: [&str; 2] = ["png", "svg"];

/// How a loaded icon is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFit {
    /// stretched to exactly this size
    Exact(Size),
    /// largest size inside this box keeping the aspect ratio
    Within(Size),
}

/// Icons live in one directory as `<name>.png` or `<name>.svg`.
#[derive(Debug, Clone)]
pub struct IconStore {
    dir: PathBuf,
}

impl IconStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn resolve(&self, name: &str) -> Result<PathBuf, DisplayError> {
        RASTER_EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .find(|p| p.is_file())
            .ok_or_else(|| DisplayError::IconNotFound { name: name.to_string(), dir: self.dir.clone() })
    }

    /// Load `name` as grayscale, transparency flattened onto white.
    pub fn load(&self, name: &str, fit: IconFit) -> Result<Canvas, DisplayError> {
        let path = self.resolve(name)?;
        debug!("Loading icon {}", path.display());
        let img = if path.extension().is_some_and(|e| e == "svg") {
            render_svg(&path, fit)?
        } else {
            let flat = flatten_on_white(&image::open(&path)?.to_luma_alpha8());
            let (w, h) = target_size(flat.width(), flat.height(), fit);
            if (w, h) == flat.dimensions() {
                flat
            } else {
                imageops::resize(&flat, w, h, FilterType::Triangle)
            }
        };
        Ok(Canvas::from_image(&img))
    }
}

fn target_size(width: u32, height: u32, fit: IconFit) -> (u32, u32) {
    match fit {
        IconFit::Exact(size) => (size.width.max(1), size.height.max(1)),
        IconFit::Within(size) => {
            let scale = f64::min(
                size.width as f64 / width.max(1) as f64,
                size.height as f64 / height.max(1) as f64,
            );
            (
                ((width as f64 * scale) as u32).max(1),
                ((height as f64 * scale) as u32).max(1),
            )
        }
    }
}

fn flatten_on_white(img: &image::GrayAlphaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let [l, a] = img.get_pixel(x, y).0;
        let a = a as u32;
        Luma([((l as u32 * a + 255 * (255 - a)) / 255) as u8])
    })
}

fn render_svg(path: &Path, fit: IconFit) -> Result<GrayImage, DisplayError> {
    let data = fs::read_to_string(path)?;
    let tree = UsvgTree::from_str(&data, &UsvgOptions::default())
        .map_err(|e| DisplayError::Svg(format!("{}: {}", path.display(), e)))?;

    let svg_size = tree.size();
    let (w, h) = target_size(svg_size.width().ceil() as u32, svg_size.height().ceil() as u32, fit);
    let mut pixmap = Pixmap::new(w, h)
        .ok_or_else(|| DisplayError::Svg(format!("cannot allocate {}x{} pixmap", w, h)))?;
    let transform = Transform::from_scale(w as f32 / svg_size.width(), h as f32 / svg_size.height());
    render(&tree, transform, &mut pixmap.as_mut());

    // pixels are premultiplied, so compositing on white is an add
    let pixels = pixmap.pixels();
    Ok(GrayImage::from_fn(w, h, |x, y| {
        let p = pixels[(y * w + x) as usize];
        let lum = 0.299 * p.red() as f32 + 0.587 * p.green() as f32 + 0.114 * p.blue() as f32;
        Luma([(lum + (255 - p.alpha()) as f32).round().clamp(0.0, 255.0) as u8])
    }))
}

/// Repaint pure black pixels as `gray` so decorative icons print lighter.
/// Antialiased edges keep their value.
pub fn lighten(icon: &mut Canvas, gray: u8) {
    for y in 0..icon.height() as i32 {
        for x in 0..icon.width() as i32 {
            let p = Point::new(x, y);
            if icon.pixel(p) == Some(BLACK) {
                icon.set_pixel(p, gray);
            }
        }
    }
}
