//! Numbered G-code line output.

use std::fmt::Write as _;
use std::io::{Result, Write};

use crate::isel::AxisWords;
use crate::machine::MachineState;

/// Writes the converted program: three unnumbered setup lines, then one
/// `N00001`-style numbered line per directive, numbers issued by the
/// machine state.
pub struct ProgramWriter<'a> {
    out: &'a mut dyn Write,
}

impl<'a> ProgramWriter<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        ProgramWriter { out }
    }

    /// Unnumbered setup block: metric units, XY plane, absolute mode.
    pub fn preamble(&mut self) -> Result<()> {
        writeln!(self.out, "G21")?;
        writeln!(self.out, "G17")?;
        writeln!(self.out, "G90")
    }

    /// One numbered program line.
    pub fn line(&mut self, state: &mut MachineState, body: &str) -> Result<()> {
        writeln!(self.out, "N{:05} {}", state.next_line(), body)
    }

    /// Numbered shutdown block: spindle stop, program end.
    pub fn postamble(&mut self, state: &mut MachineState) -> Result<()> {
        self.line(state, "M05")?;
        self.line(state, "M30")
    }
}

/// G-code words for the axes present in `words`, in X, Y, Z order, each in
/// the dialect converter's three-decimal format. Absent axes are simply
/// left out, so the controller keeps its modal value.
pub fn axis_words(words: &AxisWords) -> String {
    let mut s = String::new();
    for (letter, v) in [('X', words.x), ('Y', words.y), ('Z', words.z)] {
        if let Some(v) = v {
            let _ = write!(s, " {letter}{v:.3}");
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_lines_are_zero_padded() {
        let mut out = Vec::new();
        let mut state = MachineState::new();
        let mut w = ProgramWriter::new(&mut out);
        w.line(&mut state, "G0 X1.000").unwrap();
        w.line(&mut state, "F60").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "N00001 G0 X1.000\nN00002 F60\n"
        );
    }

    #[test]
    fn test_axis_words_skip_absent_axes() {
        let words = AxisWords {
            x: Some(1.0),
            y: None,
            z: Some(-0.5),
        };
        assert_eq!(axis_words(&words), " X1.000 Z-0.500");
    }
}
