//! Command-line front end for the ISEL to G-code converter.

use std::path::PathBuf;

use anyhow::{Context, Result};
use structopt::StructOpt;

use isel2gcode::{convert_file, machine, ArcMode, Config};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "isel2gcode",
    about = "Converts ISEL NC programs into standard G-code"
)]
struct Opt {
    /// Input ISEL (.nc) program
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Output G-code file. Defaults to the input path with an .ngc extension
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Emit each arc as a single radius-form G2/G3 directive instead of
    /// approximating it with G1 chords
    #[structopt(long)]
    radius_arcs: bool,

    /// Feed rate, in mm/min, assumed when motion occurs before any VEL
    #[structopt(long, default_value = "1000")]
    default_feed: f64,

    /// Z height, in mm, retracted to before the first rapid move
    #[structopt(long, default_value = "4")]
    safe_z: f64,

    /// Maximum chord length, in mm, for arc approximation
    #[structopt(long, default_value = "0.05")]
    resolution: f64,

    /// Suppress per-command log output
    #[structopt(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    let output = opt
        .output
        .clone()
        .unwrap_or_else(|| opt.input.with_extension("ngc"));

    let cfg = Config {
        safe_z: opt.safe_z,
        arc_resolution: opt.resolution,
        default_feed: opt.default_feed,
        arc_mode: if opt.radius_arcs {
            ArcMode::RadiusForm
        } else {
            ArcMode::Chords
        },
        ..Config::default()
    };

    let quiet = opt.quiet;
    let mut log = |msg: &str| {
        if !quiet {
            eprintln!("{msg}");
        }
    };
    let mut progress = |pct: u8, status: &str| {
        if !quiet {
            eprintln!("[{pct:3}%] {status}");
        }
    };

    let minutes = convert_file(&opt.input, &output, &cfg, &mut log, Some(&mut progress))
        .with_context(|| format!("converting {}", opt.input.display()))?;

    let (whole, seconds) = machine::minutes_seconds(minutes);
    println!("{} -> {}", opt.input.display(), output.display());
    println!("Estimated cycle time: {whole} min {seconds} s");

    Ok(())
}
