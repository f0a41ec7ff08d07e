//! eurodsp - the two channel engine in a terminal
//!
//! Run with: cargo run --release
//!
//! Settings and calibration are read from `EURODSP_SETTINGS` and
//! `EURODSP_CALIBRATION` (JSON files, created on save), log level from
//! `RUST_LOG`.

mod app;
mod config;
mod ui;

use app::App;
use config::Config;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    App::new(Config::from_env()).run()
}
