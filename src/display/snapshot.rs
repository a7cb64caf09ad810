/*
 *  display/snapshot.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  On-disk canvas snapshots used as the base for partial updates
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

use std::path::PathBuf;

use embedded_graphics::prelude::Size;
use log::{debug, warn};

use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// forecast, user content and current-weather summary
    WithCurrentWeather,
    /// forecast and user content only
    WithoutCurrentWeather,
}

impl SnapshotKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            SnapshotKind::WithCurrentWeather => "image_w_current_weather.png",
            SnapshotKind::WithoutCurrentWeather => "image_wo_current_weather.png",
        }
    }
}

/// The two snapshot files under one directory. The clock is never part of either.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    size: Size,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf, size: Size) -> Self {
        Self { dir, size }
    }

    pub fn path(&self, kind: SnapshotKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn save(&self, kind: SnapshotKind, canvas: &Canvas) -> Result<(), DisplayError> {
        let path = self.path(kind);
        debug!("Saving snapshot {}", path.display());
        canvas.save_png(&path)
    }

    /// The stored snapshot, or None when it is missing, unreadable or the wrong
    /// size; the caller then falls back to a full render.
    pub fn load(&self, kind: SnapshotKind) -> Option<Canvas> {
        let path = self.path(kind);
        if !path.exists() {
            debug!("No snapshot at {}", path.display());
            return None;
        }
        Canvas::load_png(&path, self.size)
            .map_err(|e| warn!("Ignoring snapshot {}: {}", path.display(), e))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::prelude::Point;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf(), Size::new(6, 4));
        let mut canvas = Canvas::new(6, 4);
        canvas.set_pixel(Point::new(5, 3), 0);
        store.save(SnapshotKind::WithCurrentWeather, &canvas).unwrap();

        assert_eq!(store.load(SnapshotKind::WithCurrentWeather), Some(canvas));
        assert_eq!(store.load(SnapshotKind::WithoutCurrentWeather), None);
        assert!(dir.path().join("image_w_current_weather.png").exists());
    }

    #[test]
    fn test_corrupt_or_resized_snapshot_ignored() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().to_path_buf(), Size::new(6, 4));
        std::fs::write(store.path(SnapshotKind::WithoutCurrentWeather), b"not a png").unwrap();
        assert_eq!(store.load(SnapshotKind::WithoutCurrentWeather), None);

        Canvas::new(3, 3).save_png(&store.path(SnapshotKind::WithCurrentWeather)).unwrap();
        assert_eq!(store.load(SnapshotKind::WithCurrentWeather), None);
    }
}
