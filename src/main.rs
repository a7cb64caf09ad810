/*
 *  main.rs
 *
 *  wxstation - weather at a glance
 *  (c) 2020-26 Stuart Hunter
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

use std::fs::OpenOptions;
use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use env_logger::{Env, Target};
use log::{error, info};

use wxstation::config::{self, Cli, StationConfig};
use wxstation::display::drivers::PngFileDriver;
use wxstation::display::{DisplayModeController, RequestedMode};
use wxstation::station::WeatherStation;
use wxstation::weather::LazyProvider;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

fn init_logging(config: &StationConfig) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()));
    builder.format_timestamp_secs();
    if let Some(path) = &config.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

async fn run(cli: &Cli, config: &StationConfig) -> anyhow::Result<()> {
    let now = Local::now().naive_local();
    let mode = DisplayModeController::new(config.schedule).resolve(RequestedMode::from_cli(cli), now);

    // built only if this run actually fetches
    let provider = LazyProvider::new(config);

    let driver = PngFileDriver::new(
        config.display.output.clone(),
        config.display.width,
        config.display.height,
    );
    let mut station = WeatherStation::new(config, driver)?;
    station.run(mode, &provider, now).await?;
    info!("Frame written to {}", station.driver().path().display());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let merged = config::merged(&cli, |k| std::env::var(k).ok())?;
    if cli.dump_config {
        println!("{}", serde_yaml::to_string(&merged.redacted())?);
        return Ok(ExitCode::SUCCESS);
    }
    let config = StationConfig::resolve(&merged)?;
    init_logging(&config)?;

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);
    match config::config_source(&cli) {
        Some(path) => info!("Using config {}", path.display()),
        None => info!("No config file found, using defaults and environment"),
    }

    match run(&cli, &config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            // display keeps its last frame
            error!("Update failed: {:#}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
