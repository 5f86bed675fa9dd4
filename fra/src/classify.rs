use miniconf::Tree;
use serde::{Deserialize, Serialize};

use crate::GainCurve;

/// Filter type inferred from a gain curve.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::AsRefStr,
    strum::Display,
)]
pub enum FilterVerdict {
    LowPass,
    HighPass,
    BandPass,
    BandStop,
    Unknown,
}

/// Band edge averaging and pass/block thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Tree, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Number of points averaged at either end of the curve.
    pub band_len: u32,
    /// Pass threshold relative to the peak gain.
    pub pass_ratio: f32,
    /// Block threshold relative to the peak gain.
    pub block_ratio: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            band_len: 10,
            pass_ratio: 0.5,
            block_ratio: 0.3,
        }
    }
}

/// Curve statistics the classification is based on.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BandSummary {
    pub max: f32,
    pub min: f32,
    /// Mean gain over the lowest `band_len` points.
    pub low: f32,
    /// Mean gain over the highest `band_len` points.
    pub high: f32,
}

impl ClassifierConfig {
    pub fn summarize(&self, gains: &[f32]) -> BandSummary {
        if gains.is_empty() {
            return BandSummary::default();
        }
        let n = (self.band_len as usize).clamp(1, gains.len());
        let mean = |band: &[f32]| band.iter().sum::<f32>() / band.len() as f32;
        BandSummary {
            max: gains.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            min: gains.iter().copied().fold(f32::INFINITY, f32::min),
            low: mean(&gains[..n]),
            high: mean(&gains[gains.len() - n..]),
        }
    }

    /// First matching rule wins:
    ///
    /// | low        | high       | verdict  |
    /// |------------|------------|----------|
    /// | > pass     | < block    | LowPass  |
    /// | < block    | > pass     | HighPass |
    /// | < block    | < block    | BandPass |
    /// | > pass     | > pass     | BandStop |
    ///
    /// with `pass = pass_ratio * max` and `block = block_ratio * max`.
    /// A curve without positive gain is [FilterVerdict::Unknown].
    pub fn decide(&self, s: &BandSummary) -> FilterVerdict {
        if !(s.max > 0.0) {
            return FilterVerdict::Unknown;
        }
        let pass = self.pass_ratio * s.max;
        let block = self.block_ratio * s.max;
        if s.low > pass && s.high < block {
            FilterVerdict::LowPass
        } else if s.low < block && s.high > pass {
            FilterVerdict::HighPass
        } else if s.low < block && s.high < block {
            FilterVerdict::BandPass
        } else if s.low > pass && s.high > pass {
            FilterVerdict::BandStop
        } else {
            FilterVerdict::Unknown
        }
    }

    pub fn classify<const N: usize>(
        &self,
        curve: &GainCurve<N>,
    ) -> FilterVerdict {
        let summary = self.summarize(curve.gains());
        let verdict = self.decide(&summary);
        log::info!(
            "Classified {verdict}: max {} min {} low {} high {}",
            summary.max,
            summary.min,
            summary.low,
            summary.high
        );
        verdict
    }
}

/// Classify with the default thresholds.
pub fn classify<const N: usize>(curve: &GainCurve<N>) -> FilterVerdict {
    ClassifierConfig::default().classify(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::POINTS;

    fn curve(f: impl Fn(usize) -> f32) -> GainCurve<POINTS> {
        GainCurve::new(200.0, 200.0, core::array::from_fn(f))
    }

    #[test]
    fn low_pass() {
        let c = curve(|i| 1.0 / (1.0 + (i as f32 / 50.0).powi(2)));
        assert_eq!(classify(&c), FilterVerdict::LowPass);
    }

    #[test]
    fn high_pass() {
        let c = curve(|i| if i < 200 { 0.05 } else { 1.0 });
        assert_eq!(classify(&c), FilterVerdict::HighPass);
    }

    #[test]
    fn band_pass() {
        let c = curve(|i| if (200..300).contains(&i) { 2.0 } else { 0.1 });
        assert_eq!(classify(&c), FilterVerdict::BandPass);
    }

    #[test]
    fn band_stop() {
        let c = curve(|i| if (200..300).contains(&i) { 0.01 } else { 1.0 });
        assert_eq!(classify(&c), FilterVerdict::BandStop);
    }

    #[test]
    fn flat_reads_band_stop() {
        // Both edges pass, the notch depth is not checked
        assert_eq!(classify(&curve(|_| 1.0)), FilterVerdict::BandStop);
    }

    #[test]
    fn shelf_is_unknown() {
        let c = curve(|i| if (200..300).contains(&i) { 1.0 } else { 0.4 });
        assert_eq!(classify(&c), FilterVerdict::Unknown);
    }

    #[test]
    fn silent_is_unknown() {
        assert_eq!(classify(&curve(|_| 0.0)), FilterVerdict::Unknown);
    }

    #[test]
    fn scale_invariant() {
        let shape = |i: usize| if i > 250 { 0.02 } else { 0.9 };
        for k in [1e-3, 1.0, 7.5, 1e3] {
            let c = curve(|i| k * shape(i));
            assert_eq!(classify(&c), FilterVerdict::LowPass);
        }
    }

    #[test]
    fn summary() {
        let cfg = ClassifierConfig {
            band_len: 2,
            ..Default::default()
        };
        let s = cfg.summarize(&[1.0, 3.0, 0.5, 4.0, 6.0]);
        assert_eq!(
            s,
            BandSummary {
                max: 6.0,
                min: 0.5,
                low: 2.0,
                high: 5.0
            }
        );
        // Bands longer than the curve cover all of it
        let s = ClassifierConfig::default().summarize(&[2.0, 4.0]);
        assert_eq!((s.low, s.high), (3.0, 3.0));
        assert_eq!(cfg.summarize(&[]), BandSummary::default());
    }

    #[test]
    fn rule_order() {
        let cfg = ClassifierConfig::default();
        // Both LowPass and BandStop style edges: LowPass needs high < block
        let s = BandSummary {
            max: 1.0,
            min: 0.1,
            low: 0.9,
            high: 0.2,
        };
        assert_eq!(cfg.decide(&s), FilterVerdict::LowPass);
        // Edges between thresholds match nothing
        let s = BandSummary {
            max: 1.0,
            min: 0.1,
            low: 0.4,
            high: 0.4,
        };
        assert_eq!(cfg.decide(&s), FilterVerdict::Unknown);
        let s = BandSummary {
            max: f32::NAN,
            ..Default::default()
        };
        assert_eq!(cfg.decide(&s), FilterVerdict::Unknown);
    }

    #[test]
    fn names() {
        assert_eq!(FilterVerdict::BandStop.as_ref(), "BandStop");
    }
}
