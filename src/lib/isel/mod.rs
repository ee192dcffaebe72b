//! Parser for the ISEL motion-command dialect.
//!
//! One input line holds one command: a case-sensitive keyword prefix
//! followed by axis words such as `X1000` or `J-2500`, whose integer values
//! are in device units (thousandths of a millimetre).

use thiserror::Error;

/// Partial coordinate words extracted from one command line, already scaled
/// to millimetres. An absent axis is `None`, never zero; the machine state
/// inherits the previous value for it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisWords {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl AxisWords {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcDirection {
    Cw,
    Ccw,
}

/// One recognized input command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `SPINDLE CW RPM<n>`: start the spindle clockwise.
    Spindle { rpm: u32 },
    /// `FASTABS`: rapid positioning move.
    Rapid(AxisWords),
    /// `MOVEABS`: linear move at the active feed rate.
    Feed(AxisWords),
    /// `VEL <n>`: set the feed rate, in dialect velocity units.
    Vel(f64),
    /// `CWABS` / `CCWABS`: circular move around a center given as an
    /// I/J offset from the start point.
    Arc {
        dir: ArcDirection,
        end: AxisWords,
        i: Option<f64>,
        j: Option<f64>,
    },
}

/// Recoverable failure parsing one line. The orchestrator logs these and
/// carries on with the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized command")]
    Unrecognized,
    #[error("missing or malformed {0} token")]
    MissingToken(&'static str),
}

/// A parsed line, plus any axis letters that were present but carried a
/// numeric token that failed to parse. Those axes are treated as absent,
/// matching the source dialect's tolerance, but are reported so the caller
/// can warn about them.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub command: Command,
    pub malformed_axes: Vec<char>,
}

/// Classify one trimmed, non-blank, non-comment line.
pub fn parse_command(line: &str, scale: f64) -> Result<Parsed, ParseError> {
    if let Some(rest) = line.strip_prefix("SPINDLE CW") {
        let rpm = scan_rpm(rest).ok_or(ParseError::MissingToken("RPM"))?;
        return Ok(Parsed {
            command: Command::Spindle { rpm },
            malformed_axes: Vec::new(),
        });
    }
    if let Some(rest) = line.strip_prefix("FASTABS") {
        let scan = parse_axes(rest, scale);
        return Ok(Parsed {
            command: Command::Rapid(scan.words),
            malformed_axes: scan.malformed,
        });
    }
    if let Some(rest) = line.strip_prefix("MOVEABS") {
        let scan = parse_axes(rest, scale);
        return Ok(Parsed {
            command: Command::Feed(scan.words),
            malformed_axes: scan.malformed,
        });
    }
    if let Some(rest) = line.strip_prefix("VEL") {
        let vel = rest
            .split_whitespace()
            .next()
            .and_then(|tok| tok.parse::<f64>().ok())
            .ok_or(ParseError::MissingToken("velocity"))?;
        return Ok(Parsed {
            command: Command::Vel(vel),
            malformed_axes: Vec::new(),
        });
    }
    for (keyword, dir) in [("CWABS", ArcDirection::Cw), ("CCWABS", ArcDirection::Ccw)] {
        if let Some(rest) = line.strip_prefix(keyword) {
            let mut scan = parse_axes(rest, scale);
            let i = scan_axis(rest, 'I', scale, &mut scan.malformed);
            let j = scan_axis(rest, 'J', scale, &mut scan.malformed);
            return Ok(Parsed {
                command: Command::Arc {
                    dir,
                    end: scan.words,
                    i,
                    j,
                },
                malformed_axes: scan.malformed,
            });
        }
    }
    Err(ParseError::Unrecognized)
}

/// Axis words found in `text`, plus letters whose numeric token was
/// malformed.
#[derive(Debug, Default)]
pub struct AxisScan {
    pub words: AxisWords,
    pub malformed: Vec<char>,
}

/// Scan `text` for X, Y and Z words. `text` must not contain the command
/// keyword (its letters would shadow axis letters).
pub fn parse_axes(text: &str, scale: f64) -> AxisScan {
    let mut scan = AxisScan::default();
    scan.words.x = scan_axis(text, 'X', scale, &mut scan.malformed);
    scan.words.y = scan_axis(text, 'Y', scale, &mut scan.malformed);
    scan.words.z = scan_axis(text, 'Z', scale, &mut scan.malformed);
    scan
}

/// Value of the first well-formed `letter` word in `text`, scaled to
/// millimetres. If the letter occurs but is never followed by a usable
/// number, the letter is pushed onto `malformed` and `None` is returned.
fn scan_axis(text: &str, letter: char, scale: f64, malformed: &mut Vec<char>) -> Option<f64> {
    let mut seen = false;
    for (idx, c) in text.char_indices() {
        if c != letter {
            continue;
        }
        seen = true;
        if let Some(v) = scan_number(&text[idx + 1..]) {
            return Some(v / scale);
        }
    }
    if seen {
        malformed.push(letter);
    }
    None
}

/// Parse a signed integer or decimal at the start of `s`. The dialect
/// always writes at least one integer digit, so bare `.5` is rejected.
fn scan_number(s: &str) -> Option<f64> {
    let b = s.as_bytes();
    let mut end = 0;
    if matches!(b.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < b.len() && b[end].is_ascii_digit() {
        end += 1;
    }
    if end == int_start {
        return None;
    }
    if end < b.len() && b[end] == b'.' {
        let mut frac = end + 1;
        while frac < b.len() && b[frac].is_ascii_digit() {
            frac += 1;
        }
        if frac > end + 1 {
            end = frac;
        }
    }
    s[..end].parse().ok()
}

fn scan_rpm(text: &str) -> Option<u32> {
    let idx = text.find("RPM")?;
    let digits: String = text[idx + 3..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_axes_absent_not_zero() {
        let scan = parse_axes(" X1000 Z-500", 1000.0);
        assert_eq!(scan.words.x, Some(1.0));
        assert_eq!(scan.words.y, None);
        assert_eq!(scan.words.z, Some(-0.5));
        assert!(scan.malformed.is_empty());
    }

    #[test]
    fn test_decimal_token() {
        let scan = parse_axes(" Y12.5", 1000.0);
        assert_eq!(scan.words.y, Some(0.0125));
    }

    #[test]
    fn test_malformed_token_reported_and_absent() {
        let scan = parse_axes(" X-- Y200", 1000.0);
        assert_eq!(scan.words.x, None);
        assert_eq!(scan.words.y, Some(0.2));
        assert_eq!(scan.malformed, vec!['X']);
    }

    #[test]
    fn test_rapid_command() {
        let parsed = parse_command("FASTABS X0 Y0 Z5000", 1000.0).unwrap();
        assert_eq!(
            parsed.command,
            Command::Rapid(AxisWords {
                x: Some(0.0),
                y: Some(0.0),
                z: Some(5.0),
            })
        );
    }

    #[test]
    fn test_vel_with_and_without_space() {
        let tight = parse_command("VEL1000", 1000.0).unwrap();
        let spaced = parse_command("VEL 1000", 1000.0).unwrap();
        assert_eq!(tight.command, Command::Vel(1000.0));
        assert_eq!(spaced.command, Command::Vel(1000.0));
    }

    #[test]
    fn test_vel_without_number_is_recoverable() {
        assert_eq!(
            parse_command("VEL", 1000.0),
            Err(ParseError::MissingToken("velocity"))
        );
    }

    #[test]
    fn test_spindle() {
        let parsed = parse_command("SPINDLE CW RPM12000", 1000.0).unwrap();
        assert_eq!(parsed.command, Command::Spindle { rpm: 12000 });
    }

    #[test]
    fn test_spindle_without_rpm_is_recoverable() {
        assert_eq!(
            parse_command("SPINDLE CW", 1000.0),
            Err(ParseError::MissingToken("RPM"))
        );
    }

    #[test]
    fn test_arc_command_with_center_offset() {
        let parsed = parse_command("CWABS X10000 Y0 I5000 J0", 1000.0).unwrap();
        match parsed.command {
            Command::Arc { dir, end, i, j } => {
                assert_eq!(dir, ArcDirection::Cw);
                assert_eq!(end.x, Some(10.0));
                assert_eq!(end.y, Some(0.0));
                assert_eq!(i, Some(5.0));
                assert_eq!(j, Some(0.0));
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn test_ccw_arc_keyword() {
        let parsed = parse_command("CCWABS X0 Y10000 I0 J5000", 1000.0).unwrap();
        assert!(matches!(
            parsed.command,
            Command::Arc {
                dir: ArcDirection::Ccw,
                ..
            }
        ));
    }

    #[test]
    fn test_unrecognized_keyword() {
        assert_eq!(
            parse_command("GETTOOL 1", 1000.0),
            Err(ParseError::Unrecognized)
        );
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            parse_command("fastabs X100", 1000.0),
            Err(ParseError::Unrecognized)
        );
    }
}
