use miniconf::Tree;
use serde::{Deserialize, Serialize};

/// Peak-to-peak voltage of the drive stage at attenuator code 255.
///
/// Bench measured. Adjust after replacing the DDS module or the output stage.
pub const DEVICE_MAX_VPP: f32 = 3.0;

/// Linear amplitude calibration of the attenuator.
#[derive(Clone, Copy, Debug, PartialEq, Tree, Serialize, Deserialize)]
pub struct Calibration {
    /// Peak-to-peak output voltage at full attenuator code (V).
    pub max_vpp: f32,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            max_vpp: DEVICE_MAX_VPP,
        }
    }
}

impl Calibration {
    /// Convert a peak-to-peak voltage into the attenuator code.
    ///
    /// The voltage is clamped to `[0, max_vpp]` and mapped linearly onto
    /// `[0, 255]`, rounding half up.
    pub fn vpp_to_code(&self, vpp: f32) -> u8 {
        let vpp = if vpp > self.max_vpp {
            self.max_vpp
        } else if vpp < 0.0 {
            0.0
        } else {
            vpp
        };
        let code = vpp / self.max_vpp * 255.0;
        // Saturating cast, NaN maps to 0
        (code + 0.5) as u8
    }

    pub fn code_to_vpp(&self, code: u8) -> f32 {
        code as f32 / 255.0 * self.max_vpp
    }
}

/// [Calibration::vpp_to_code] against [DEVICE_MAX_VPP].
pub fn vpp_to_code(vpp: f32) -> u8 {
    Calibration::default().vpp_to_code(vpp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps() {
        assert_eq!(vpp_to_code(-1.0), 0);
        assert_eq!(vpp_to_code(0.0), 0);
        assert_eq!(vpp_to_code(f32::NEG_INFINITY), 0);
        assert_eq!(vpp_to_code(DEVICE_MAX_VPP), 255);
        assert_eq!(vpp_to_code(DEVICE_MAX_VPP + 0.1), 255);
        assert_eq!(vpp_to_code(1e6), 255);
    }

    #[test]
    fn rounds_half_up() {
        // 0.5 code
        assert_eq!(vpp_to_code(DEVICE_MAX_VPP / 510.0), 1);
        assert_eq!(vpp_to_code(DEVICE_MAX_VPP / 2.0), 128);
        assert_eq!(vpp_to_code(1.0), 85);
    }

    #[test]
    fn monotonic() {
        let mut last = 0;
        for i in -100..=400 {
            let code = vpp_to_code(i as f32 * 0.01);
            assert!(code >= last);
            last = code;
        }
        assert_eq!(last, 255);
    }

    #[test]
    fn custom_full_scale() {
        let cal = Calibration { max_vpp: 5.1 };
        assert_eq!(cal.vpp_to_code(5.1), 255);
        assert_eq!(cal.vpp_to_code(0.02), 1);
        assert_eq!(cal.code_to_vpp(255), 5.1);
    }

    #[test]
    fn degenerate_full_scale() {
        let cal = Calibration { max_vpp: 0.0 };
        assert_eq!(cal.vpp_to_code(1.0), 0);
    }
}
