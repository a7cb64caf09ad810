/*
 *  display/error.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for the rendering side
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

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Unified error type for all rendering and display operations
#[derive(Debug)]
pub enum DisplayError {
    /// File system error (snapshots, icons, output frames)
    Io(std::io::Error),

    /// Raster encode/decode error
    Image(image::ImageError),

    /// Font could not be loaded
    Font(String),

    /// No asset for an icon name in the icon directory
    IconNotFound { name: String, dir: PathBuf },

    /// SVG parse or rasterise failure
    Svg(String),

    /// Image size does not match the canvas
    BufferSizeMismatch { expected: (u32, u32), actual: (u32, u32) },

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::Io(err) =>
                write!(f, "I/O error: {}", err),
            DisplayError::Image(err) =>
                write!(f, "Image error: {}", err),
            DisplayError::Font(msg) =>
                write!(f, "Font error: {}", msg),
            DisplayError::IconNotFound { name, dir } =>
                write!(f, "No icon '{}' in {}", name, dir.display()),
            DisplayError::Svg(msg) =>
                write!(f, "SVG error: {}", msg),
            DisplayError::BufferSizeMismatch { expected, actual } =>
                write!(f, "Image size mismatch: expected {}x{}, got {}x{}",
                    expected.0, expected.1, actual.0, actual.1),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            DisplayError::Image(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DisplayError {
    fn from(err: std::io::Error) -> Self {
        DisplayError::Io(err)
    }
}

impl From<image::ImageError> for DisplayError {
    fn from(err: image::ImageError) -> Self {
        DisplayError::Image(err)
    }
}
