//! The conversion orchestrator: reads the input line by line, drives the
//! parser, machine state, arc engine and emitter, and produces the final
//! cycle-time estimate.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::geometry::Point2;

use crate::emit::{axis_words, ProgramWriter};
use crate::geometry::ArcSpec;
use crate::isel::{self, ArcDirection, AxisWords, Command};
use crate::machine::{CycleTime, MachineState, Position};
use crate::{ArcMode, Config, ConvertError, LogSink, ProgressSink};

/// How often, in processed lines, the progress sink is called. The final
/// line always reports regardless.
const PROGRESS_INTERVAL: usize = 50;

/// Convert the ISEL program at `input` into a G-code file at `output`.
/// Returns the estimated cycle time in fractional minutes.
pub fn convert_file(
    input: &Path,
    output: &Path,
    cfg: &Config,
    log: &mut LogSink,
    progress: Option<&mut ProgressSink>,
) -> Result<f64, ConvertError> {
    let text = fs::read_to_string(input).map_err(|source| ConvertError::ReadInput {
        path: input.to_path_buf(),
        source,
    })?;
    let file = File::create(output).map_err(|source| ConvertError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    let minutes = convert(&text, &mut out, cfg, log, progress)?;
    out.flush()?;
    Ok(minutes)
}

/// Convert an already-decoded ISEL program into G-code written to `out`.
/// Returns the estimated cycle time in fractional minutes.
///
/// Blank lines and `;` comments are ignored. A line that cannot be applied
/// is reported through `log` and skipped; only I/O failures and an input
/// with nothing to process are fatal.
pub fn convert(
    text: &str,
    out: &mut dyn Write,
    cfg: &Config,
    log: &mut LogSink,
    mut progress: Option<&mut ProgressSink>,
) -> Result<f64, ConvertError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';'))
        .collect();
    if lines.is_empty() {
        return Err(ConvertError::EmptyInput);
    }

    let mut w = ProgramWriter::new(out);
    w.preamble()?;

    let mut engine = Engine {
        cfg,
        state: MachineState::new(),
        time: CycleTime::default(),
    };

    let total = lines.len();
    for (idx, line) in lines.iter().enumerate() {
        engine.apply_line(line, &mut w, log)?;
        let done = idx + 1;
        if done % PROGRESS_INTERVAL == 0 || done == total {
            if let Some(p) = progress.as_deref_mut() {
                let pct = (done * 100 / total) as u8;
                p(pct, &format!("{done}/{total} commands"));
            }
        }
    }

    w.postamble(&mut engine.state)?;
    Ok(engine.time.minutes())
}

struct Engine<'a> {
    cfg: &'a Config,
    state: MachineState,
    time: CycleTime,
}

impl Engine<'_> {
    /// Apply one non-blank, non-comment input line. Recoverable problems
    /// are logged and swallowed here; the `Err` path is reserved for
    /// output I/O failures.
    fn apply_line(
        &mut self,
        line: &str,
        w: &mut ProgramWriter,
        log: &mut LogSink,
    ) -> Result<(), ConvertError> {
        let parsed = match isel::parse_command(line, self.cfg.scale) {
            Ok(parsed) => parsed,
            Err(err) => {
                log(&format!("skipping \"{line}\": {err}"));
                return Ok(());
            }
        };
        for axis in &parsed.malformed_axes {
            log(&format!("ignoring malformed {axis} token in \"{line}\""));
        }

        match parsed.command {
            Command::Spindle { rpm } => {
                w.line(&mut self.state, &format!("S{rpm} M03"))?;
                log(&format!("Spindle: {rpm} RPM"));
            }
            Command::Vel(vel) => {
                let feed = vel / self.cfg.vel_ratio;
                self.state.feed = Some(feed);
                w.line(&mut self.state, &format!("F{feed:.0}"))?;
                log(&format!("Feed: F{feed:.0}"));
            }
            Command::Rapid(words) => self.rapid(words, line, w, log)?,
            Command::Feed(words) => self.feed_move(words, line, w, log)?,
            Command::Arc { dir, end, i, j } => self.arc_move(dir, end, i, j, line, w, log)?,
        }
        Ok(())
    }

    fn rapid(
        &mut self,
        words: AxisWords,
        line: &str,
        w: &mut ProgramWriter,
        log: &mut LogSink,
    ) -> Result<(), ConvertError> {
        if words.is_empty() {
            log(&format!("skipping \"{line}\": no axis words"));
            return Ok(());
        }
        // One-shot startup retraction: the very first rapid of a run pulls
        // the tool up to the safe height if it starts below it.
        if !self.state.retracted {
            if self.state.pos.z < self.cfg.safe_z {
                w.line(&mut self.state, &format!("G0 Z{:.3}", self.cfg.safe_z))?;
                self.state.pos.z = self.cfg.safe_z;
            }
            self.state.retracted = true;
        }
        let target = self.state.pos.resolve(&words);
        w.line(&mut self.state, &format!("G0{}", axis_words(&words)))?;
        self.state.pos = target;
        Ok(())
    }

    fn feed_move(
        &mut self,
        words: AxisWords,
        line: &str,
        w: &mut ProgramWriter,
        log: &mut LogSink,
    ) -> Result<(), ConvertError> {
        if words.is_empty() {
            log(&format!("skipping \"{line}\": no axis words"));
            return Ok(());
        }
        let feed = self.ensure_feed(w, log)?;
        let target = self.state.pos.resolve(&words);
        w.line(&mut self.state, &format!("G1{}", axis_words(&words)))?;
        self.time.add_segment(self.state.pos.distance(&target), feed);
        self.state.pos = target;
        Ok(())
    }

    fn arc_move(
        &mut self,
        dir: ArcDirection,
        end_words: AxisWords,
        i: Option<f64>,
        j: Option<f64>,
        line: &str,
        w: &mut ProgramWriter,
        log: &mut LogSink,
    ) -> Result<(), ConvertError> {
        if i.is_none() && j.is_none() {
            log(&format!("skipping \"{line}\": no I/J center offset"));
            return Ok(());
        }
        let start = self.state.pos;
        let end = start.resolve(&end_words);
        let arc = ArcSpec::from_center_offset(
            Point2::new(start.x, start.y),
            Point2::new(end.x, end.y),
            i.unwrap_or(0.0),
            j.unwrap_or(0.0),
            dir,
        );
        if arc.radius() == 0.0 {
            log(&format!("skipping \"{line}\": zero-radius arc"));
            return Ok(());
        }
        let feed = self.ensure_feed(w, log)?;

        // Arcs are planar: motion stays at the Z the arc starts on.
        match self.cfg.arc_mode {
            ArcMode::Chords => {
                let mut prev = arc.start;
                for p in arc.chords(self.cfg.arc_resolution) {
                    w.line(&mut self.state, &format!("G1 X{:.3} Y{:.3}", p.x, p.y))?;
                    self.time.add_segment((p - prev).norm(), feed);
                    prev = p;
                }
                self.state.pos = Position {
                    x: prev.x,
                    y: prev.y,
                    z: start.z,
                };
            }
            ArcMode::RadiusForm => {
                let word = match dir {
                    ArcDirection::Cw => "G2",
                    ArcDirection::Ccw => "G3",
                };
                w.line(
                    &mut self.state,
                    &format!("{word} X{:.3} Y{:.3} R{:.3}", end.x, end.y, arc.signed_radius()),
                )?;
                self.time.add_segment(arc.arc_length(), feed);
                self.state.pos = Position {
                    x: end.x,
                    y: end.y,
                    z: start.z,
                };
            }
        }
        Ok(())
    }

    /// Active feed rate, defaulting it with a warning if motion happens
    /// before any VEL command. The output never carries a cutting move
    /// without a preceding F word.
    fn ensure_feed(&mut self, w: &mut ProgramWriter, log: &mut LogSink) -> Result<f64, ConvertError> {
        if let Some(feed) = self.state.feed {
            return Ok(feed);
        }
        let feed = self.cfg.default_feed;
        self.state.feed = Some(feed);
        w.line(&mut self.state, &format!("F{feed:.0}"))?;
        log(&format!(
            "warning: motion before any VEL command, assuming F{feed:.0}"
        ));
        Ok(feed)
    }
}
