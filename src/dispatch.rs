//! Execute panel commands on the analyzer.
use embedded_hal_1::delay::DelayNs;
use fra::{Acquire, Analyzer, SignalSource};

use crate::hmi::{Command, Page};

/// Run one command to completion.
///
/// Returns the page to show in response, if any. Source failures are logged
/// and otherwise dropped, the panel has no error page.
pub fn dispatch<S, A, D, const N: usize, const L: usize>(
    analyzer: &mut Analyzer<S, A, D, N, L>,
    command: Command,
) -> Option<Page>
where
    S: SignalSource,
    A: Acquire,
    D: DelayNs,
{
    log::info!("Command: {command:?}");
    match command {
        Command::TunableSignal { frequency } => {
            if let Err(err) = analyzer.set_tunable_signal(frequency) {
                log::warn!("Tunable signal failed: {err}");
            }
            None
        }
        Command::CalibratedSignal { frequency, vpp } => {
            if let Err(err) = analyzer.set_calibrated_signal(frequency, vpp) {
                log::warn!("Calibrated signal failed: {err}");
            }
            None
        }
        Command::Classify => {
            let verdict = analyzer.run_sweep_and_classify();
            let page = Page::for_verdict(verdict);
            if page.is_none() {
                log::warn!("No result page for {verdict}");
            }
            page
        }
        Command::Stop => {
            if let Err(err) = analyzer.stop_all_output() {
                log::warn!("Stop failed: {err}");
            }
            None
        }
        Command::Set { path, value } => {
            match analyzer.settings_mut().set_json(&path, value.as_bytes()) {
                Ok(()) => log::info!("Set {path} to {value}"),
                Err(err) => log::warn!("Setting {path} failed: {err}"),
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fra::{AcquireError, Input, Register, Settings, Waveform};

    #[derive(Default)]
    struct Source {
        frequency: f32,
        code: u8,
    }

    impl SignalSource for Source {
        type Error = ();

        fn set_waveform(
            &mut self,
            frequency: f32,
            _phase: f32,
            _waveform: Waveform,
            _register: Register,
        ) -> Result<(), ()> {
            self.frequency = frequency;
            Ok(())
        }

        fn set_amplitude(&mut self, code: u8) -> Result<(), ()> {
            self.code = code;
            Ok(())
        }
    }

    /// Full scale stimulus, response gain of `f(index)` per sweep point.
    struct Adc {
        input: Input,
        point: usize,
        response: fn(usize) -> u16,
    }

    impl Acquire for Adc {
        fn configure(&mut self, input: Input) -> Result<(), AcquireError> {
            self.input = input;
            Ok(())
        }

        fn capture(
            &mut self,
            samples: &mut [u16],
            _timeout_ms: u32,
        ) -> Result<(), AcquireError> {
            let hi = match self.input {
                Input::Stimulus => 2000,
                Input::Response => {
                    self.point += 1;
                    (self.response)(self.point - 1)
                }
            };
            samples.fill(0);
            samples[0] = hi;
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    fn analyzer(
        response: fn(usize) -> u16,
    ) -> Analyzer<Source, Adc, NoDelay, 100, 4> {
        Analyzer::new(
            Source::default(),
            Adc {
                input: Input::Stimulus,
                point: 0,
                response,
            },
            NoDelay,
            Settings::default(),
        )
    }

    #[test]
    fn signals() {
        let mut fra = analyzer(|_| 0);
        assert_eq!(
            dispatch(&mut fra, Command::TunableSignal { frequency: 1e3 }),
            None
        );
        assert_eq!(fra.source_mut().code, 255);
        assert_eq!(fra.source_mut().frequency, 1e3);
        dispatch(
            &mut fra,
            Command::CalibratedSignal {
                frequency: 0.0,
                vpp: 1.0,
            },
        );
        assert_eq!(fra.source_mut().code, 17);
        dispatch(&mut fra, Command::Stop);
        assert_eq!(fra.source_mut().code, 0);
        assert_eq!(fra.source_mut().frequency, 0.0);
    }

    fn set(path: &str, value: &str) -> Command {
        Command::Set {
            path: path.try_into().unwrap(),
            value: value.try_into().unwrap(),
        }
    }

    #[test]
    fn settings() {
        let mut fra = analyzer(|_| 0);
        let command = set("/calibration/max_vpp", "1.5");
        assert_eq!(dispatch(&mut fra, command), None);
        assert_eq!(fra.settings().calibration.max_vpp, 1.5);
        dispatch(
            &mut fra,
            Command::CalibratedSignal {
                frequency: 0.0,
                vpp: 1.0,
            },
        );
        assert_eq!(fra.source_mut().code, 34);
        // Rejected updates leave the settings alone
        dispatch(&mut fra, set("/calibration/max_vpp", "x"));
        dispatch(&mut fra, set("/calibration/offset", "1"));
        assert_eq!(fra.settings().calibration.max_vpp, 1.5);
    }

    #[test]
    fn classify_pages() {
        let mut fra = analyzer(|i| if i < 50 { 2000 } else { 20 });
        assert_eq!(dispatch(&mut fra, Command::Classify), Some(Page(4)));
        let mut fra = analyzer(|i| if i < 50 { 20 } else { 2000 });
        assert_eq!(dispatch(&mut fra, Command::Classify), Some(Page(3)));
        // Both band edges between the thresholds
        let mut fra =
            analyzer(|i| if (40..60).contains(&i) { 2000 } else { 800 });
        assert_eq!(dispatch(&mut fra, Command::Classify), None);
        assert_eq!(fra.source_mut().code, 0);
    }
}
