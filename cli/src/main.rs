//! A collection of tools for checking parking rules against regulation datasets. These are bundled
//! as a single executable.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod check;
mod import;
mod logger;
mod render;
mod simplify;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(name = "parkcli", about = "The parking rules multi-tool")]
enum Command {
    /// Looks up a point, then explains whether the given permits are good there and for how long.
    Check {
        /// The path to a JSON list of regulation areas
        #[structopt(long)]
        areas: String,
        #[structopt(long)]
        lat: f64,
        #[structopt(long)]
        lon: f64,
        /// Local time, like 2024-01-02T10:00:00
        #[structopt(long)]
        time: NaiveDateTime,
        /// A permit area code, like Q. Repeat for every permit owned.
        #[structopt(long = "permit")]
        permits: Vec<String>,
        /// How far off the position might be, in meters
        #[structopt(long)]
        accuracy: Option<f64>,
        /// The path to a JSON LookupConfig. Defaults are used if omitted.
        #[structopt(long)]
        config: Option<String>,
    },
    /// Simplifies every boundary in a list of regulation areas, for display.
    Simplify {
        /// The path to a JSON list of regulation areas
        #[structopt(long)]
        input: String,
        /// The path to write
        #[structopt(long)]
        output: String,
        /// The path to JSON SimplificationOptions. Defaults are used if omitted.
        #[structopt(long)]
        options: Option<String>,
    },
    /// Simplifies every boundary, then cuts overlapping areas so each spot is drawn once. Metered
    /// areas are drawn on top, then north-south blocks, then smaller ones.
    Render {
        /// The path to a JSON list of regulation areas
        #[structopt(long)]
        input: String,
        /// The path to write
        #[structopt(long)]
        output: String,
        /// The path to JSON SimplificationOptions. Defaults are used if omitted.
        #[structopt(long)]
        options: Option<String>,
    },
    /// Converts raw municipal regulation records into regulation areas. Records that can't be
    /// converted are skipped with a warning.
    Import {
        /// The path to a JSON list of raw areas
        #[structopt(long)]
        input: String,
        /// The path to write
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    logger::setup();

    match Command::from_args() {
        Command::Check {
            areas,
            lat,
            lon,
            time,
            permits,
            accuracy,
            config,
        } => check::run(areas, lat, lon, time, permits, accuracy, config)?,
        Command::Simplify {
            input,
            output,
            options,
        } => simplify::run(input, output, options)?,
        Command::Render {
            input,
            output,
            options,
        } => render::run(input, output, options)?,
        Command::Import { input, output } => import::run(input, output)?,
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let contents = fs_err::read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path))
}

fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    fs_err::write(path, serde_json::to_string_pretty(value)?)?;
    info!("Wrote {}", path);
    Ok(())
}
