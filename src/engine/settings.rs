//! Persistent panel state.

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use log::{debug, info, warn};

use crate::engine::{EditMode, Function};
#[cfg(feature = "serde")]
use crate::error::Result;
use crate::NUM_CHANNELS;

/// Everything the panel remembers across power cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct Settings {
    pub edit_mode: EditMode,
    pub function: [Function; NUM_CHANNELS],
    /// Knob positions, 8 bits each: four for the first channel, then four
    /// for the second. Only restored in the per-channel edit modes.
    pub pot_value: [u8; 8],
    /// Knobs must be turned back to their stored position before they take
    /// over in the per-channel edit modes.
    pub snap_mode: bool,
}

#[cfg(feature = "serde")]
impl Settings {
    /// Read settings from a JSON file. A missing file is not an error: the
    /// power-on defaults are returned instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = load_json(path.as_ref(), "settings")?;
        debug!("settings loaded: {settings:?}");
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_json(path.as_ref(), self)?;
        info!("settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(feature = "serde")]
pub(crate) fn load_json<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(serde_json::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("no {what} at {}, using defaults", path.display());
            Ok(T::default())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(feature = "serde")]
pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, json)?;
    Ok(())
}
