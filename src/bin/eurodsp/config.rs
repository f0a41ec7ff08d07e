//! Front end configuration, taken from the environment.

use std::path::PathBuf;

const DEFAULT_SETTINGS: &str = "eurodsp.json";
const DEFAULT_CALIBRATION: &str = "eurodsp-calibration.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub settings_path: PathBuf,
    pub calibration_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            settings_path: path_from_env("EURODSP_SETTINGS", DEFAULT_SETTINGS),
            calibration_path: path_from_env("EURODSP_CALIBRATION", DEFAULT_CALIBRATION),
        }
    }
}

fn path_from_env(key: &str, default: &str) -> PathBuf {
    std::env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
