//! Touch panel command protocol
//!
//! The panel sends ASCII commands over the UART, one command per burst. A
//! burst ends when the line goes idle. Responses are panel instructions
//! terminated by three `0xFF` bytes.
//!
//! | Command           | Meaning                                        |
//! |-------------------|------------------------------------------------|
//! | `B<freq>`         | Fixed amplitude sine at `freq` Hz              |
//! | `A<vpp>,<freq>`   | Sine at `freq` Hz, `vpp` V after the reference |
//! | `C`               | Sweep and classify, answered with a page       |
//! | `E`               | Stop all output                                |
//! | `S<path> <value>` | Set a runtime setting to a JSON value          |
use core::fmt::Write;

use fra::FilterVerdict;
use heapless::{String, Vec};

/// Receive buffer size. Longer bursts are rejected.
pub const FRAME_CAPACITY: usize = 50;

/// Instruction terminator.
pub const TERMINATOR: [u8; 3] = [0xff; 3];

/// Longest settings path, e.g. `/classifier/block_ratio`.
pub const PATH_CAPACITY: usize = 32;

/// Longest settings value.
pub const VALUE_CAPACITY: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Fixed amplitude sine (Hz).
    TunableSignal { frequency: f32 },
    /// Calibrated sine (Hz, V).
    CalibratedSignal { frequency: f32, vpp: f32 },
    /// Sweep and classify.
    Classify,
    /// Stop all output.
    Stop,
    /// Settings update (`/calibration/max_vpp`, JSON value).
    Set {
        path: String<PATH_CAPACITY>,
        value: String<VALUE_CAPACITY>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty frame")]
    Empty,
    #[error("Unsupported command `{0}`")]
    Unsupported(char),
    #[error("Malformed number")]
    Number,
    #[error("Missing `,` separator")]
    MissingSeparator,
    #[error("Malformed setting, expected `S/<path> <value>`")]
    Setting,
    #[error("Frame exceeds {} bytes", FRAME_CAPACITY)]
    Overflow,
}

/// Parse the longest numeric prefix after optional leading whitespace.
///
/// Trailing garbage (line endings, padding, a second decimal point) is
/// ignored. A field without any number, or one that overflows, is an error.
fn parse_number(field: &[u8]) -> Result<f32, ParseError> {
    let start = field
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(field.len());
    let field = &field[start..];
    let run = field
        .iter()
        .position(|b| {
            !matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')
        })
        .unwrap_or(field.len());
    // Number-like characters are ASCII
    let text = core::str::from_utf8(&field[..run])
        .map_err(|_| ParseError::Number)?;
    (1..=run)
        .rev()
        .find_map(|len| text[..len].parse::<f32>().ok())
        .filter(|x| x.is_finite())
        .ok_or(ParseError::Number)
}

/// `<path> <value>` with a `/` rooted path.
fn parse_setting(args: &[u8]) -> Result<Command, ParseError> {
    let args = core::str::from_utf8(args).map_err(|_| ParseError::Setting)?;
    let args = args.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    let (path, value) = args
        .split_once(char::is_whitespace)
        .ok_or(ParseError::Setting)?;
    let value = value.trim_start();
    if !path.starts_with('/') || value.is_empty() {
        return Err(ParseError::Setting);
    }
    Ok(Command::Set {
        path: String::try_from(path).map_err(|_| ParseError::Setting)?,
        value: String::try_from(value).map_err(|_| ParseError::Setting)?,
    })
}

impl Command {
    pub fn parse(frame: &[u8]) -> Result<Self, ParseError> {
        let (&lead, args) = frame.split_first().ok_or(ParseError::Empty)?;
        match lead {
            b'B' => Ok(Self::TunableSignal {
                frequency: parse_number(args)?,
            }),
            b'A' => {
                let sep = args
                    .iter()
                    .position(|&b| b == b',')
                    .ok_or(ParseError::MissingSeparator)?;
                Ok(Self::CalibratedSignal {
                    vpp: parse_number(&args[..sep])?,
                    frequency: parse_number(&args[sep + 1..])?,
                })
            }
            b'C' => Ok(Self::Classify),
            b'E' => Ok(Self::Stop),
            b'S' => parse_setting(args),
            other => Err(ParseError::Unsupported(other as char)),
        }
    }
}

/// Accumulates received bytes into idle delimited frames.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: Vec<u8, FRAME_CAPACITY>,
    overflow: bool,
}

impl Framer {
    pub fn push(&mut self, byte: u8) {
        if self.buffer.push(byte).is_err() {
            self.overflow = true;
        }
    }

    /// End the current frame. `None` if nothing was received.
    pub fn idle(&mut self) -> Option<Result<Command, ParseError>> {
        let overflow = core::mem::take(&mut self.overflow);
        if self.buffer.is_empty() && !overflow {
            return None;
        }
        let result = if overflow {
            Err(ParseError::Overflow)
        } else {
            Command::parse(&self.buffer)
        };
        self.buffer.clear();
        Some(result)
    }
}

/// Result page shown on the panel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Page(pub u8);

impl Page {
    pub fn for_verdict(verdict: FilterVerdict) -> Option<Self> {
        match verdict {
            FilterVerdict::HighPass => Some(Self(3)),
            FilterVerdict::LowPass => Some(Self(4)),
            FilterVerdict::BandPass => Some(Self(5)),
            FilterVerdict::BandStop => Some(Self(6)),
            FilterVerdict::Unknown => None,
        }
    }

    /// `page page<N>` followed by the terminator.
    pub fn encode(&self) -> Vec<u8, 16> {
        let mut text: String<12> = String::new();
        // At most 12 characters
        write!(text, "page page{}", self.0).ok();
        let mut frame = Vec::new();
        frame.extend_from_slice(text.as_bytes()).ok();
        frame.extend_from_slice(&TERMINATOR).ok();
        frame
    }
}
