/*
 *  display/drivers/mock.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock display driver for testing without a panel
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

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_graphics::prelude::*;

use crate::display::canvas::Canvas;
use crate::display::error::DisplayError;
use crate::display::traits::{DisplayCapabilities, DisplayDriver, RefreshMode};

/// One refresh the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshRecord {
    pub mode: RefreshMode,
    pub offset: Point,
    pub frame: Canvas,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Every refresh in order
    pub refreshes: Vec<RefreshRecord>,

    /// Simulate failures (for error testing)
    pub simulate_refresh_failure: bool,
}

/// Mock display driver
///
/// Records every frame handed to it. Clones share state, so a test can keep a
/// handle while the pipeline owns the driver.
#[derive(Debug, Clone)]
pub struct MockDriver {
    capabilities: DisplayCapabilities,
    state: Arc<Mutex<MockDriverState>>,
}

impl MockDriver {
    pub fn new_with_size(width: u32, height: u32) -> Self {
        Self {
            capabilities: DisplayCapabilities { width, height, supports_partial: true },
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Most recent refresh, if any.
    pub fn last_refresh(&self) -> Option<RefreshRecord> {
        self.lock().ok().and_then(|s| s.refreshes.last().cloned())
    }

    pub fn refresh_count(&self) -> usize {
        self.lock().map(|s| s.refreshes.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockDriverState>, DisplayError> {
        self.state
            .lock()
            .map_err(|_| DisplayError::Other("mock driver state poisoned".to_string()))
    }

    fn record(&mut self, mode: RefreshMode, frame: &Canvas, offset: Point) -> Result<(), DisplayError> {
        if frame.width() > self.capabilities.width || frame.height() > self.capabilities.height {
            return Err(DisplayError::BufferSizeMismatch {
                expected: self.dimensions(),
                actual: (frame.width(), frame.height()),
            });
        }
        let mut state = self.lock()?;
        if state.simulate_refresh_failure {
            return Err(DisplayError::Other("Simulated refresh failure".to_string()));
        }
        state.refreshes.push(RefreshRecord { mode, offset, frame: frame.clone() });
        Ok(())
    }
}

impl DisplayDriver for MockDriver {
    fn capabilities(&self) -> &DisplayCapabilities {
        &self.capabilities
    }

    fn full_refresh(&mut self, frame: &Canvas) -> Result<(), DisplayError> {
        self.record(RefreshMode::Full, frame, Point::zero())
    }

    fn partial_refresh(&mut self, frame: &Canvas, offset: Point) -> Result<(), DisplayError> {
        self.record(RefreshMode::Partial, frame, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_driver_creation() {
        let driver = MockDriver::new_with_size(128, 64);
        assert_eq!(driver.dimensions(), (128, 64));
        assert_eq!(driver.refresh_count(), 0);
        assert_eq!(driver.last_refresh(), None);
    }

    #[test]
    fn test_refreshes_recorded_across_clones() {
        let mut driver = MockDriver::new_with_size(16, 16);
        let watcher = driver.clone();
        let frame = Canvas::new(16, 16);
        driver.refresh(&frame, RefreshMode::Full).unwrap();
        driver.refresh(&frame, RefreshMode::Partial).unwrap();
        assert_eq!(watcher.refresh_count(), 2);
        assert_eq!(watcher.last_refresh().unwrap().mode, RefreshMode::Partial);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        let mut driver = MockDriver::new_with_size(8, 8);
        assert!(matches!(
            driver.full_refresh(&Canvas::new(9, 8)),
            Err(DisplayError::BufferSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_mock_driver_simulated_failure() {
        let mut driver = MockDriver::new_with_size(8, 8);
        driver.state().lock().unwrap().simulate_refresh_failure = true;
        assert!(driver.full_refresh(&Canvas::new(8, 8)).is_err());
        driver.state().lock().unwrap().simulate_refresh_failure = false;
        assert!(driver.full_refresh(&Canvas::new(8, 8)).is_ok());
    }
}
