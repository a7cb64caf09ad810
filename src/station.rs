/*
 *  station.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
 *
 *  Composition pipeline - full render, time-only and current-weather updates
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

use chrono::{NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use thiserror::Error;

use crate::config::{StationConfig, UserContent};
use crate::display::components::{
    ClockDisplay,
    ForecastGridDisplay,
    HourlyStripDisplay,
    UserContentDisplay,
    WeatherSummaryDisplay,
};
use crate::display::{
    Canvas,
    DisplayDriver,
    DisplayError,
    ForecastMode,
    IconStore,
    LayoutError,
    RefreshMode,
    RunMode,
    SnapshotKind,
    SnapshotStore,
    StationLayout,
    Typeface,
    load_typeface,
};
use crate::forecast::{ForecastGrid, bin_by_day, leading_hours};
use crate::weather::{CurrentConditions, HourlyForecast, WeatherApiError, WeatherSource};

#[derive(Debug, Error)]
pub enum StationError {
    #[error("weather: {0}")]
    Weather(#[from] WeatherApiError),
    #[error("display: {0}")]
    Display(#[from] DisplayError),
    #[error("layout: {0}")]
    Layout(#[from] LayoutError),
}

/// Forecast data ready for the forecast region.
enum ForecastView {
    Grid(ForecastGrid),
    Hourly(HourlyForecast),
}

/// The weather station: owns the layout, the region renderers, the snapshot
/// store and the display collaborator.
pub struct WeatherStation<D: DisplayDriver> {
    driver: D,
    layout: StationLayout,
    face: Box<dyn Typeface>,
    icons: IconStore,
    snapshots: SnapshotStore,
    slot_times: Vec<NaiveTime>,
    hourly_count: usize,
    user_content: Option<UserContent>,
    clock: ClockDisplay,
    grid: ForecastGridDisplay,
    strip: HourlyStripDisplay,
    summary: WeatherSummaryDisplay,
    user: UserContentDisplay,
}

impl<D: DisplayDriver> WeatherStation<D> {
    pub fn new(config: &StationConfig, driver: D) -> Result<Self, StationError> {
        let layout = StationLayout::from_config(config)?;
        let face = load_typeface(config.paths.font.as_deref())?;
        Ok(Self::with_face(config, layout, face, driver))
    }

    /// Build with an already loaded typeface.
    pub fn with_face(
        config: &StationConfig,
        layout: StationLayout,
        face: Box<dyn Typeface>,
        driver: D,
    ) -> Self {
        let (w, h) = driver.dimensions();
        if (w, h) != (layout.canvas.width, layout.canvas.height) {
            warn!(
                "Display is {}x{} but the canvas is {}x{}",
                w, h, layout.canvas.width, layout.canvas.height
            );
        }

        let clock = ClockDisplay::new(layout.clock, layout.clock_text);
        let grid = ForecastGridDisplay::new(layout.forecast, config.forecast.slot_icons.clone());
        let strip =
            HourlyStripDisplay::new(layout.forecast, layout.hourly_bands(), config.forecast.hourly_count);
        let summary = WeatherSummaryDisplay::new(layout.summary, layout.summary_icon, layout.summary_text);
        let user = UserContentDisplay::new(layout.user_content);

        Self {
            driver,
            icons: IconStore::new(config.paths.icon_dir.clone()),
            snapshots: SnapshotStore::new(config.paths.cache_dir.clone(), layout.canvas.size()),
            slot_times: config.forecast.slot_times.clone(),
            hourly_count: config.forecast.hourly_count,
            user_content: config.user_content.clone(),
            layout,
            face,
            clock,
            grid,
            strip,
            summary,
            user,
        }
    }

    pub fn layout(&self) -> &StationLayout {
        &self.layout
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub async fn run<S: WeatherSource>(
        &mut self,
        mode: RunMode,
        source: &S,
        now: NaiveDateTime,
    ) -> Result<(), StationError> {
        info!("Running {:?} update at {}", mode, now.format("%Y-%m-%d %H:%M"));
        match mode {
            RunMode::Full => self.update_all(source, now).await,
            RunMode::TimeOnly => self.update_time(source, now).await,
            RunMode::WeatherOnly => self.update_current_weather(source, now).await,
        }
    }

    /// Full render. Everything is fetched before anything is drawn and nothing is
    /// saved until every region has drawn, so any failure leaves both snapshots
    /// and the display as they were.
    pub async fn update_all<S: WeatherSource>(
        &mut self,
        source: &S,
        now: NaiveDateTime,
    ) -> Result<(), StationError> {
        let forecast = self.fetch_forecast(source).await?;
        let current = source.current_weather().await?;

        let mut canvas = Canvas::new(self.layout.canvas.width, self.layout.canvas.height);
        let face = self.face.as_ref();
        match &forecast {
            ForecastView::Grid(grid) => {
                if grid.is_empty() {
                    warn!("No forecast samples fell on a configured slot time");
                }
                self.grid.render(&mut canvas, face, &self.icons, grid)?
            }
            ForecastView::Hourly(entries) => self.strip.render(&mut canvas, face, &self.icons, entries)?,
        }
        if let Some(content) = &self.user_content {
            self.user.render(&mut canvas, face, content)?;
        }
        let mut with_current = canvas.clone();
        self.summary.render(&mut with_current, face, &self.icons, &current)?;

        // both snapshots are written only once every region has drawn
        self.snapshots.save(SnapshotKind::WithoutCurrentWeather, &canvas)?;
        self.snapshots.save(SnapshotKind::WithCurrentWeather, &with_current)?;

        let mut frame = with_current;
        self.clock.render(&mut frame, face, now);
        self.driver.refresh(&frame, RefreshMode::Full)?;
        info!("Full refresh done");
        Ok(())
    }

    /// Redraw the clock over the "with current weather" snapshot.
    pub async fn update_time<S: WeatherSource>(
        &mut self,
        source: &S,
        now: NaiveDateTime,
    ) -> Result<(), StationError> {
        let Some(mut canvas) = self.snapshots.load(SnapshotKind::WithCurrentWeather) else {
            info!("No current-weather snapshot, falling back to a full render");
            return self.update_all(source, now).await;
        };
        self.clock.render(&mut canvas, self.face.as_ref(), now);
        self.driver.refresh(&canvas, RefreshMode::Partial)?;
        debug!("Clock refreshed");
        Ok(())
    }

    /// Redraw the summary over the "without current weather" snapshot, store the
    /// result as the new "with" snapshot, then add the clock.
    pub async fn update_current_weather<S: WeatherSource>(
        &mut self,
        source: &S,
        now: NaiveDateTime,
    ) -> Result<(), StationError> {
        let Some(mut canvas) = self.snapshots.load(SnapshotKind::WithoutCurrentWeather) else {
            info!("No forecast snapshot, falling back to a full render");
            return self.update_all(source, now).await;
        };
        let current: CurrentConditions = source.current_weather().await?;
        let face = self.face.as_ref();
        self.summary.render(&mut canvas, face, &self.icons, &current)?;
        self.snapshots.save(SnapshotKind::WithCurrentWeather, &canvas)?;

        self.clock.render(&mut canvas, face, now);
        self.driver.refresh(&canvas, RefreshMode::Partial)?;
        info!("Current weather refreshed: {}", current.description);
        Ok(())
    }

    async fn fetch_forecast<S: WeatherSource>(&self, source: &S) -> Result<ForecastView, WeatherApiError> {
        match self.layout.mode {
            ForecastMode::FiveDay => {
                let daily = source.daily_forecast().await?;
                Ok(ForecastView::Grid(bin_by_day(&daily, &self.slot_times)))
            }
            ForecastMode::Hourly => {
                let hourly = source.hourly_forecast().await?;
                Ok(ForecastView::Hourly(leading_hours(&hourly, self.hourly_count).to_vec()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::display::canvas::WHITE;
    use crate::display::drivers::MockDriver;
    use crate::display::layout::Region;
    use crate::display::text::BitmapFace;
    use crate::weather::{
        DailyForecast,
        HourlyConditions,
        IconCode,
        ProviderKind,
        WeatherSample,
    };
    use chrono::NaiveDate;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::Rectangle;
    use image::{GrayImage, Luma};
    use std::fs;
    use std::path::Path;
    use tempfile::{TempDir, tempdir};

    const W: u32 = 300;
    const H: u32 = 200;

    struct StubSource {
        current: CurrentConditions,
        fail: bool,
    }

    impl StubSource {
        fn new(icon: IconCode, description: &str) -> Self {
            Self { current: CurrentConditions { icon, description: description.into() }, fail: false }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::new(IconCode::ClearDay, "unused") }
        }

        fn check(&self) -> Result<(), WeatherApiError> {
            if self.fail {
                Err(WeatherApiError::Status { what: "stub".into(), status: 503 })
            } else {
                Ok(())
            }
        }
    }

    fn day(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    impl WeatherSource for StubSource {
        async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError> {
            self.check()?;
            Ok(self.current.clone())
        }

        async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError> {
            self.check()?;
            Ok((1..=3)
                .flat_map(|d| [9, 12, 15, 21].map(move |h| WeatherSample { timestamp: day(d, h), value: 20.5 }))
                .collect())
        }

        async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
            self.check()?;
            Ok((8..20)
                .map(|h| WeatherSample {
                    timestamp: day(1, h),
                    value: HourlyConditions { temperature: 18.0, icon: IconCode::RainDay, precipitation_probability: 40 },
                })
                .collect())
        }
    }

    fn write_icon(dir: &Path, name: &str, luma: u8) {
        GrayImage::from_pixel(12, 12, Luma([luma])).save(dir.join(format!("{}.png", name))).unwrap();
    }

    fn station_config(dir: &TempDir, mode: ForecastMode) -> StationConfig {
        let icon_dir = dir.path().join("icon");
        fs::create_dir_all(&icon_dir).unwrap();
        for name in ["am", "pm", "sleepy"] {
            write_icon(&icon_dir, name, 0);
        }
        write_icon(&icon_dir, "01d", 40);
        write_icon(&icon_dir, "10d", 80);

        let mut config = StationConfig::resolve(&Config {
            latitude: Some(51.5),
            longitude: Some(-0.12),
            ..Default::default()
        })
        .unwrap();
        config.display.width = W;
        config.display.height = H;
        config.layout.time_left_margin = 10;
        config.layout.weather_icon_margin = 10;
        config.forecast.mode = mode;
        config.paths.icon_dir = icon_dir;
        config.paths.cache_dir = dir.path().join("cache");
        config
    }

    fn build(config: &StationConfig) -> (WeatherStation<MockDriver>, MockDriver) {
        let layout = StationLayout::from_config(config).unwrap();
        let driver = MockDriver::new_with_size(W, H);
        let station = WeatherStation::with_face(config, layout, Box::new(BitmapFace::default()), driver.clone());
        (station, driver)
    }

    fn setup(mode: ForecastMode) -> (TempDir, WeatherStation<MockDriver>, MockDriver) {
        let dir = tempdir().unwrap();
        let (station, driver) = build(&station_config(&dir, mode));
        (dir, station, driver)
    }

    fn snapshot_bytes(station: &WeatherStation<MockDriver>) -> (Vec<u8>, Vec<u8>) {
        let read = |kind| fs::read(station.snapshots().path(kind)).unwrap();
        (read(SnapshotKind::WithoutCurrentWeather), read(SnapshotKind::WithCurrentWeather))
    }

    fn within(rect: Rectangle, region: &Region) -> bool {
        region.contains_region(&Region::new(rect.size.width, rect.size.height, rect.top_left.x, rect.top_left.y))
    }

    #[tokio::test]
    async fn test_full_render_saves_both_snapshots() {
        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        let source = StubSource::new(IconCode::ClearDay, "sunny");
        station.update_all(&source, day(1, 10)).await.unwrap();

        let record = driver.last_refresh().unwrap();
        assert_eq!(record.mode, RefreshMode::Full);

        let with = station.snapshots().load(SnapshotKind::WithCurrentWeather).unwrap();
        let without = station.snapshots().load(SnapshotKind::WithoutCurrentWeather).unwrap();
        let layout = station.layout().clone();

        // the summary is the only difference between the two snapshots
        let diff = without.diff_bounds(&with).unwrap();
        assert!(within(diff, &layout.summary));
        // the clock is never snapshotted
        assert!(layout.clock.rect().points().all(|p| with.pixel(p) == Some(WHITE)));
        let clock_diff = with.diff_bounds(&record.frame).unwrap();
        assert!(within(clock_diff, &layout.clock));
        // forecast region has content
        assert!(layout.forecast.rect().points().any(|p| with.pixel(p) != Some(WHITE)));
    }

    #[tokio::test]
    async fn test_time_only_changes_only_clock() {
        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        let source = StubSource::new(IconCode::ClearDay, "sunny");
        station.update_all(&source, day(1, 10)).await.unwrap();

        station.update_time(&source, day(1, 11)).await.unwrap();
        let record = driver.last_refresh().unwrap();
        assert_eq!(record.mode, RefreshMode::Partial);
        assert_eq!(record.offset, Point::zero());

        let with = station.snapshots().load(SnapshotKind::WithCurrentWeather).unwrap();
        let diff = with.diff_bounds(&record.frame).unwrap();
        assert!(within(diff, &station.layout().clock));
    }

    #[tokio::test]
    async fn test_time_only_without_snapshot_falls_back_to_full() {
        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        let source = StubSource::new(IconCode::ClearDay, "sunny");
        station.run(RunMode::TimeOnly, &source, day(1, 10)).await.unwrap();

        assert_eq!(driver.refresh_count(), 1);
        assert_eq!(driver.last_refresh().unwrap().mode, RefreshMode::Full);
        assert!(station.snapshots().load(SnapshotKind::WithCurrentWeather).is_some());
    }

    #[tokio::test]
    async fn test_weather_only_replaces_summary_snapshot() {
        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        station.update_all(&StubSource::new(IconCode::ClearDay, "sunny"), day(1, 10)).await.unwrap();
        let before = station.snapshots().load(SnapshotKind::WithCurrentWeather).unwrap();

        station
            .run(RunMode::WeatherOnly, &StubSource::new(IconCode::RainDay, "rain"), day(1, 11))
            .await
            .unwrap();
        assert_eq!(driver.last_refresh().unwrap().mode, RefreshMode::Partial);

        let after = station.snapshots().load(SnapshotKind::WithCurrentWeather).unwrap();
        let diff = before.diff_bounds(&after).unwrap();
        assert!(within(diff, &station.layout().summary));
        assert!(station.layout().summary_icon.rect().points().any(|p| after.pixel(p) == Some(80)));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_snapshots() {
        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        station.update_all(&StubSource::new(IconCode::ClearDay, "sunny"), day(1, 10)).await.unwrap();
        let with_path = station.snapshots().path(SnapshotKind::WithCurrentWeather);
        let without_path = station.snapshots().path(SnapshotKind::WithoutCurrentWeather);
        let with_bytes = fs::read(&with_path).unwrap();
        let without_bytes = fs::read(&without_path).unwrap();

        let failing = StubSource::failing();
        assert!(matches!(
            station.update_current_weather(&failing, day(1, 11)).await,
            Err(StationError::Weather(WeatherApiError::Status { status: 503, .. }))
        ));
        assert!(station.update_all(&failing, day(1, 11)).await.is_err());

        assert_eq!(fs::read(&with_path).unwrap(), with_bytes);
        assert_eq!(fs::read(&without_path).unwrap(), without_bytes);
        assert_eq!(driver.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_summary_icon_keeps_snapshot_pair() {
        let dir = tempdir().unwrap();
        let mut config = station_config(&dir, ForecastMode::FiveDay);
        let (mut first, _) = build(&config);
        first.update_all(&StubSource::new(IconCode::ClearDay, "sunny"), day(1, 10)).await.unwrap();
        let before = snapshot_bytes(&first);

        // new user content draws fine, then the summary icon is missing
        config.user_content = Some(UserContent::Text("changed".into()));
        let (mut second, driver) = build(&config);
        let err = second
            .update_all(&StubSource::new(IconCode::SnowNight, "snow"), day(1, 11))
            .await
            .unwrap_err();
        assert!(matches!(err, StationError::Display(DisplayError::IconNotFound { .. })));

        assert_eq!(snapshot_bytes(&second), before);
        assert_eq!(driver.refresh_count(), 0);
        let with = second.snapshots().load(SnapshotKind::WithCurrentWeather).unwrap();
        let without = second.snapshots().load(SnapshotKind::WithoutCurrentWeather).unwrap();
        assert!(within(without.diff_bounds(&with).unwrap(), &second.layout().summary));
    }

    #[tokio::test]
    async fn test_missing_user_image_keeps_snapshot_pair() {
        let dir = tempdir().unwrap();
        let mut config = station_config(&dir, ForecastMode::FiveDay);
        let (mut first, _) = build(&config);
        first.update_all(&StubSource::new(IconCode::ClearDay, "sunny"), day(1, 10)).await.unwrap();
        let before = snapshot_bytes(&first);

        config.user_content = Some(UserContent::Image(dir.path().join("missing.png")));
        let (mut second, driver) = build(&config);
        let source = StubSource::new(IconCode::RainDay, "rain");
        assert!(second.update_all(&source, day(1, 11)).await.is_err());

        assert_eq!(snapshot_bytes(&second), before);
        assert_eq!(driver.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_hourly_mode_renders_strip() {
        let (_dir, mut station, driver) = setup(ForecastMode::Hourly);
        station.update_all(&StubSource::new(IconCode::ClearDay, "sunny"), day(1, 7)).await.unwrap();
        let frame = driver.last_refresh().unwrap().frame;
        let forecast = station.layout().forecast;
        // hourly icons are gray 80
        assert!(forecast.rect().points().any(|p| frame.pixel(p) == Some(80)));
    }

    #[tokio::test]
    async fn test_unsupported_capability_aborts_render() {
        struct NoDaily;
        impl WeatherSource for NoDaily {
            async fn current_weather(&self) -> Result<CurrentConditions, WeatherApiError> {
                Ok(CurrentConditions { icon: IconCode::ClearDay, description: "clear".into() })
            }
            async fn daily_forecast(&self) -> Result<DailyForecast, WeatherApiError> {
                Err(WeatherApiError::Unsupported { provider: ProviderKind::AccuWeather, operation: "daily forecast" })
            }
            async fn hourly_forecast(&self) -> Result<HourlyForecast, WeatherApiError> {
                Ok(Vec::new())
            }
        }

        let (_dir, mut station, driver) = setup(ForecastMode::FiveDay);
        let err = station.update_all(&NoDaily, day(1, 10)).await.unwrap_err();
        assert!(matches!(err, StationError::Weather(WeatherApiError::Unsupported { .. })));
        assert_eq!(driver.refresh_count(), 0);
        assert!(station.snapshots().load(SnapshotKind::WithoutCurrentWeather).is_none());
    }
}
