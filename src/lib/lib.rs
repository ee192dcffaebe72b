//! Conversion engine turning ISEL-dialect NC programs into standard G-code.
//!
//! The ISEL dialect is a line-oriented format of absolute motion commands in
//! integer device units (thousandths of a millimetre). This crate parses it,
//! tracks the implied machine state, interpolates circular moves, and writes
//! a numbered G-code program together with an estimated cycle time.
//!
//! The entry points are [`convert`] (stream to stream) and [`convert_file`].
//! Interactive front ends hook in through the [`LogSink`] and
//! [`ProgressSink`] callbacks; the engine itself is synchronous and holds no
//! state across runs.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub mod convert;
mod emit;
pub mod geometry;
pub mod isel;
pub mod machine;

pub use convert::{convert, convert_file};

/// How circular moves are written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcMode {
    /// Approximate each arc with short linear G1 chords. Works on any
    /// controller, at the cost of many output lines.
    Chords,
    /// Emit one radius-form G2/G3 directive per arc. The radius is taken
    /// from the start point, which sidesteps controllers that reject the
    /// dialect's independently-rounded center offsets.
    RadiusForm,
}

/// Conversion constants. The source dialect fixes most of these, but they
/// are carried explicitly so a run never depends on ambient globals.
#[derive(Debug, Clone)]
pub struct Config {
    /// Divisor turning the dialect's integer device units into millimetres.
    pub scale: f64,
    /// Divisor turning a VEL argument into an F feed rate, in mm/min.
    pub vel_ratio: f64,
    /// Z level, in mm, retracted to before the first rapid move.
    pub safe_z: f64,
    /// Maximum chord length, in mm, when approximating arcs with lines.
    pub arc_resolution: f64,
    /// Feed rate, in mm/min, assumed when motion occurs before any VEL.
    pub default_feed: f64,
    /// Arc emission strategy.
    pub arc_mode: ArcMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            scale: 1000.0,
            vel_ratio: 16.6667,
            safe_z: 4.0,
            arc_resolution: 0.05,
            default_feed: 1000.0,
            arc_mode: ArcMode::Chords,
        }
    }
}

/// Sink for human-readable progress and warning messages.
pub type LogSink<'a> = dyn FnMut(&str) + 'a;

/// Sink for coarse progress reports: a percentage (0-100) and a short
/// status string. Called from whatever context the engine runs in;
/// marshaling onto a UI thread is the caller's concern.
pub type ProgressSink<'a> = dyn FnMut(u8, &str) + 'a;

/// Fatal conversion failures. Problems confined to a single input line are
/// logged through the [`LogSink`] and skipped, never surfaced here.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot read input file {}: {source}", path.display())]
    ReadInput { path: PathBuf, source: io::Error },

    #[error("input contains no processable commands")]
    EmptyInput,

    #[error("cannot open output file {}: {source}", path.display())]
    CreateOutput { path: PathBuf, source: io::Error },

    #[error("failed writing output: {0}")]
    Write(#[from] io::Error),
}
