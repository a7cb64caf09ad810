/*
 *  display/mod.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - canvas, layout, text, icons, snapshots and drivers
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

// Core trait definitions
pub mod traits;
pub mod error;

// Raster surface and persistence
pub mod canvas;
pub mod snapshot;

// Region model for the composite
pub mod layout;

// Text fitting and icon assets
pub mod text;
pub mod icons;

// Display drivers
pub mod drivers;

// UI components
pub mod components;

// Display mode controller
pub mod mode_controller;

// Re-exports for convenience
pub use canvas::{BLACK, Canvas, WHITE};
pub use error::DisplayError;
pub use icons::{IconFit, IconStore};
pub use layout::{ForecastMode, LayoutError, Region, StationLayout};
pub use mode_controller::{DisplayModeController, RequestedMode, RunMode};
pub use snapshot::{SnapshotKind, SnapshotStore};
pub use text::{Typeface, fit_font_size, load_typeface};
pub use traits::{DisplayCapabilities, DisplayDriver, RefreshMode};
