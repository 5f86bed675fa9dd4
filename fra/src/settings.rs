use miniconf::{json_core, SerdeError, Tree};
use serde::{Deserialize, Serialize};

use crate::{Calibration, ClassifierConfig, SweepConfig};

/// Runtime settings of the analyzer.
#[derive(Clone, Debug, PartialEq, Tree, Serialize, Deserialize)]
pub struct Settings {
    /// Attenuator amplitude calibration.
    pub calibration: Calibration,
    /// Sweep schedule.
    pub sweep: SweepConfig,
    /// Curve classification thresholds.
    pub classifier: ClassifierConfig,
    /// Attenuator code of the tunable signal.
    pub tunable_code: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("No such setting")]
    Key,
    #[error("Malformed value")]
    Value,
}

impl Settings {
    /// Update one leaf, e.g. `/calibration/max_vpp`, from its JSON value.
    ///
    /// The settings are unchanged on error.
    pub fn set_json(
        &mut self,
        path: &str,
        value: &[u8],
    ) -> Result<(), SettingsError> {
        let mut update = self.clone();
        match json_core::set(&mut update, path, value) {
            Ok(_) => {
                *self = update;
                Ok(())
            }
            Err(SerdeError::Value(_)) => Err(SettingsError::Key),
            Err(_) => Err(SettingsError::Value),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            sweep: SweepConfig::default(),
            classifier: ClassifierConfig::default(),
            tunable_code: 255,
        }
    }
}
