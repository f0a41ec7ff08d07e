//! Per-channel trim of the output stage.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::path::Path;

#[cfg(feature = "serde")]
use log::info;

#[cfg(feature = "serde")]
use crate::engine::settings::{load_json, save_json};
#[cfg(feature = "serde")]
use crate::error::Result;
use crate::io::converter::dac_code;
use crate::NUM_CHANNELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case", default))]
pub struct Calibration {
    /// Added to the code of each channel so that a zero sample lands on
    /// zero volts.
    pub dac_offset: [i32; NUM_CHANNELS],
}

impl Calibration {
    /// DAC code for `sample` on `channel`. Channels past the last use no
    /// offset.
    pub fn dac_code(&self, channel: usize, sample: i16) -> u16 {
        let offset = self.dac_offset.get(channel).copied().unwrap_or(0);
        dac_code(sample, offset)
    }
}

#[cfg(feature = "serde")]
impl Calibration {
    /// Read a calibration record, or the defaults if there is none yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let calibration: Calibration = load_json(path.as_ref(), "calibration")?;
        info!("dac offsets {:?}", calibration.dac_offset);
        Ok(calibration)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        save_json(path.as_ref(), self)?;
        info!("calibration saved to {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_apply_per_channel() {
        let calibration = Calibration {
            dac_offset: [100, -100],
        };
        assert_eq!(calibration.dac_code(0, 0), 32867);
        assert_eq!(calibration.dac_code(1, 0), 32667);
        assert_eq!(calibration.dac_code(7, 0), 32767);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn persists_offsets() {
        let path = std::env::temp_dir().join(format!(
            "eurodsp-{}-calibration.json",
            std::process::id()
        ));
        let calibration = Calibration {
            dac_offset: [-42, 17],
        };
        calibration.save(&path).unwrap();
        let loaded = Calibration::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, calibration);
    }
}
