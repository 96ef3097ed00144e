//! In-plane slices of a material's lobe.

use crate::MaterialOptions;
use base::{error::Error, math::Vec3, Spectrum};
use bxdf::{config::MaterialConfig, ClosureTree, ScatteringMode, ShadingContext, ShadingPoint};
use serde::Serialize;
use std::{fs::File, io::Write, path::PathBuf};

/// Options for the `slice` command.
#[derive(clap::Args, Debug)]
#[clap(about = "Write the in-plane lobe of a material as CSV.")]
pub struct SliceOptions {
    #[clap(flatten)]
    pub material: MaterialOptions,

    #[clap(long, help = "Outgoing zenith angle in degrees")]
    pub theta_o: f32,

    #[clap(
        long,
        default_value_t = 180,
        help = "Number of intervals between -90 and 90 degrees"
    )]
    pub steps: usize,

    #[clap(short, long, help = "Output CSV file; prints to stdout if omitted")]
    pub output: Option<PathBuf>,
}

/// One incoming direction of a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceEntry {
    /// Signed zenith angle of the incoming direction in degrees; negative
    /// angles lie on the side opposite to the outgoing direction.
    pub theta_i: f32,
    /// Value of the scattering function.
    pub value: Spectrum,
    /// Density of sampling the incoming direction.
    pub pdf: f32,
}

pub fn run(opts: SliceOptions) -> Result<(), Error> {
    let config = MaterialConfig::load(&opts.material.config)?;
    Error::check_range("theta_o", opts.theta_o, 0.0, 90.0)?;
    let entries = compute_slice(&config.closure, opts.theta_o, opts.steps.max(1));
    log::info!(
        "Computed {} slice entries at theta_o = {}",
        entries.len(),
        opts.theta_o
    );

    match &opts.output {
        Some(path) => {
            let file = File::create(path).map_err(|err| Error::io(path, err))?;
            write_csv(&entries, file).map_err(|err| Error::io(path, err))?;
            log::info!("Slice written to {}", path.display());
        },
        None => {
            write_csv(&entries, std::io::stdout().lock())
                .map_err(|err| Error::io("<stdout>", err))?;
        },
    }
    Ok(())
}

/// Evaluates the lobe for incoming directions in the plane of incidence.
///
/// The outgoing direction has zenith `theta_o` (degrees) and azimuth 0; the
/// incoming zenith sweeps from -90 to 90 degrees in `steps` intervals.
pub fn compute_slice(tree: &ClosureTree, theta_o: f32, steps: usize) -> Vec<SliceEntry> {
    let point = ShadingPoint::default();
    let mut ctx = ShadingContext::new();
    let root = ctx.prepare(tree, &point);
    let (sin_o, cos_o) = theta_o.to_radians().sin_cos();
    let outgoing = Vec3::new(sin_o, cos_o, 0.0);
    (0..=steps)
        .map(|i| {
            let theta_i = -90.0 + 180.0 * i as f32 / steps as f32;
            let (sin_i, cos_i) = theta_i.to_radians().sin_cos();
            let incoming = Vec3::new(sin_i, cos_i.max(0.0), 0.0);
            let (value, pdf) = ctx.evaluate(root, outgoing, incoming, ScatteringMode::ALL);
            SliceEntry {
                theta_i,
                value,
                pdf,
            }
        })
        .collect()
}

/// Row of the CSV output.
#[derive(Serialize)]
struct CsvRecord {
    theta_i: f32,
    r: f32,
    g: f32,
    b: f32,
    pdf: f32,
}

/// Writes the slice as CSV with a header line.
pub fn write_csv<W: Write>(entries: &[SliceEntry], writer: W) -> std::io::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in entries {
        let [r, g, b] = entry.value.to_array();
        wtr.serialize(CsvRecord {
            theta_i: entry.theta_i,
            r,
            g,
            b,
            pdf: entry.pdf,
        })
        .map_err(std::io::Error::other)?;
    }
    wtr.flush()
}
