//! Machine state carried through one conversion run.

use crate::isel::AxisWords;

/// Fully resolved absolute position, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const ORIGIN: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Absolute target for a partial command: present axes override, absent
    /// axes inherit the current value.
    pub fn resolve(&self, words: &AxisWords) -> Position {
        Position {
            x: words.x.unwrap_or(self.x),
            y: words.y.unwrap_or(self.y),
            z: words.z.unwrap_or(self.z),
        }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Per-run machine state. Created at the start of a conversion, mutated by
/// each recognized command in order, discarded at the end. Never shared
/// between runs.
#[derive(Debug)]
pub struct MachineState {
    /// Current absolute position. Runs start at the machine origin.
    pub pos: Position,
    /// Active feed rate in mm/min of the output program, `None` until the
    /// first VEL command or the defaulting rule sets it.
    pub feed: Option<f64>,
    /// Whether the one-shot startup retraction has been decided.
    pub retracted: bool,
    line_no: u32,
}

impl MachineState {
    pub fn new() -> Self {
        MachineState {
            pos: Position::ORIGIN,
            feed: None,
            retracted: false,
            line_no: 0,
        }
    }

    /// Issue the next output line number. Starts at 1 and never repeats.
    pub fn next_line(&mut self) -> u32 {
        self.line_no += 1;
        self.line_no
    }
}

impl Default for MachineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulated cycle-time estimate, in minutes. Only cutting motion
/// contributes; rapids are treated as free.
#[derive(Debug, Default, Clone, Copy)]
pub struct CycleTime {
    minutes: f64,
}

impl CycleTime {
    /// Record one cutting segment of `dist` millimetres at the feed rate,
    /// in mm/min, that was active when the segment was generated.
    pub fn add_segment(&mut self, dist: f64, feed: f64) {
        if feed > 0.0 {
            self.minutes += dist / feed;
        }
    }

    pub fn minutes(&self) -> f64 {
        self.minutes
    }
}

/// Split a fractional minute count into whole minutes and truncated
/// remaining seconds, for display.
pub fn minutes_seconds(minutes: f64) -> (u64, u64) {
    let whole = minutes.floor();
    let seconds = ((minutes - whole) * 60.0).floor() as u64;
    (whole as u64, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_resolve_only_touches_present_axes() {
        let pos = Position {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        let target = pos.resolve(&AxisWords {
            x: None,
            y: Some(5.0),
            z: None,
        });
        assert_eq!(
            target,
            Position {
                x: 1.0,
                y: 5.0,
                z: 3.0,
            }
        );
    }

    #[test]
    fn test_explicit_zero_is_not_inherited() {
        let pos = Position {
            x: 7.0,
            y: 0.0,
            z: 0.0,
        };
        let target = pos.resolve(&AxisWords {
            x: Some(0.0),
            y: None,
            z: None,
        });
        assert_eq!(target.x, 0.0);
    }

    #[test]
    fn test_line_numbers_start_at_one_and_increase() {
        let mut state = MachineState::new();
        assert_eq!(state.next_line(), 1);
        assert_eq!(state.next_line(), 2);
        assert_eq!(state.next_line(), 3);
    }

    #[test]
    fn test_cycle_time_accumulates() {
        let mut time = CycleTime::default();
        time.add_segment(60.0, 60.0);
        time.add_segment(30.0, 60.0);
        assert_relative_eq!(time.minutes(), 1.5);
    }

    #[test]
    fn test_minutes_seconds_truncates() {
        let (m, s) = minutes_seconds(2.51);
        assert_eq!(m, 2);
        assert_eq!(s, 30);
    }
}
