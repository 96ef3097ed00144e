//! Directional albedo: Monte Carlo estimate against quadrature.

use crate::MaterialOptions;
use base::{
    error::Error,
    math::{sph_to_cart, Vec3},
    sampling::SamplingContext,
    Spectrum,
};
use bxdf::{config::MaterialConfig, ClosureTree, ScatteringMode, ShadingContext, ShadingPoint};
use rayon::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};

/// Number of samples drawn by one worker stream.
const CHUNK_SIZE: usize = 4096;

/// Outgoing zenith angles (degrees) used when none are given.
const DEFAULT_ANGLES: [f32; 7] = [0.0, 15.0, 30.0, 45.0, 60.0, 75.0, 85.0];

/// Options for the `albedo` command.
#[derive(clap::Args, Debug)]
#[clap(about = "Compare the sampled directional albedo against its quadrature.")]
pub struct AlbedoOptions {
    #[clap(flatten)]
    pub material: MaterialOptions,

    #[clap(
        short,
        long,
        default_value_t = 1 << 18,
        help = "Number of samples per outgoing direction"
    )]
    pub samples: usize,

    #[clap(
        long,
        default_value_t = 256,
        help = "Number of zenith steps of the quadrature (azimuth uses 4x)"
    )]
    pub theta_steps: usize,

    #[clap(long, default_value_t = 0, help = "Seed of the sampling streams")]
    pub seed: u64,

    #[clap(
        long,
        value_delimiter = ',',
        num_args = 1..,
        help = "Outgoing zenith angles in degrees [default: 0,15,30,45,60,75,85]"
    )]
    pub angles: Vec<f32>,
}

/// Albedo of a material seen from one direction.
#[derive(Debug, Clone, Copy)]
pub struct AlbedoReport {
    /// Outgoing zenith angle in degrees.
    pub theta_o: f32,
    /// Monte Carlo estimate.
    pub sampled: Spectrum,
    /// Quadrature of the evaluated lobe.
    pub integrated: Spectrum,
}

impl AlbedoReport {
    /// Relative difference of the channel averages.
    pub fn relative_difference(&self) -> f32 {
        let reference = self.integrated.average();
        let diff = (self.sampled.average() - reference).abs();
        if reference > 1.0e-6 {
            diff / reference
        } else {
            diff
        }
    }
}

pub fn run(opts: AlbedoOptions) -> Result<(), Error> {
    let config = MaterialConfig::load(&opts.material.config)?;
    let angles = if opts.angles.is_empty() {
        DEFAULT_ANGLES.to_vec()
    } else {
        opts.angles
    };
    for &theta in &angles {
        Error::check_range("angles", theta, 0.0, 90.0)?;
    }
    if opts.samples == 0 || opts.theta_steps == 0 {
        return Err(Error::InvalidParameter {
            name: "samples",
            value: 0.0,
            reason: "sample and step counts must be positive",
        });
    }

    log::info!(
        "Estimating albedo of {} with {} samples, {} quadrature steps",
        config.closure.model(),
        opts.samples,
        opts.theta_steps
    );

    println!("theta_o   sampled (r, g, b)            quadrature (r, g, b)         rel. diff");
    for theta_o in angles {
        let report = compute_albedo(
            &config.closure,
            theta_o,
            opts.samples,
            opts.theta_steps,
            opts.seed,
        );
        let [sr, sg, sb] = report.sampled.to_array();
        let [ir, ig, ib] = report.integrated.to_array();
        println!(
            "{:7.2}   ({:.4}, {:.4}, {:.4})   ({:.4}, {:.4}, {:.4})   {:.4}",
            report.theta_o,
            sr,
            sg,
            sb,
            ir,
            ig,
            ib,
            report.relative_difference()
        );
        if report.relative_difference() > 0.05 {
            log::warn!(
                "Sampled and integrated albedo disagree at theta_o = {}",
                report.theta_o
            );
        }
    }
    Ok(())
}

/// Both albedo estimates at the outgoing zenith angle `theta_o` (degrees).
pub fn compute_albedo(
    tree: &ClosureTree,
    theta_o: f32,
    samples: usize,
    theta_steps: usize,
    seed: u64,
) -> AlbedoReport {
    let outgoing = sph_to_cart(theta_o.to_radians(), 0.0);
    AlbedoReport {
        theta_o,
        sampled: estimate_albedo(tree, outgoing, samples, seed),
        integrated: integrate_albedo(tree, outgoing, theta_steps),
    }
}

/// Mean of `value · cos / probability` over `samples` sampled directions.
pub fn estimate_albedo(tree: &ClosureTree, outgoing: Vec3, samples: usize, seed: u64) -> Spectrum {
    if samples == 0 {
        return Spectrum::ZERO;
    }
    let point = ShadingPoint::default();
    let root_sampling = SamplingContext::new(seed);
    let n_chunks = samples.div_ceil(CHUNK_SIZE);
    let total = (0..n_chunks)
        .into_par_iter()
        .map(|chunk| {
            let mut ctx = ShadingContext::new();
            let root = ctx.prepare(tree, &point);
            let mut sampling = root_sampling.split(chunk as u64);
            let count = CHUNK_SIZE.min(samples - chunk * CHUNK_SIZE);
            let mut sum = Spectrum::ZERO;
            for _ in 0..count {
                let sample = ctx.sample(root, &mut sampling, outgoing);
                if sample.is_absorbed() || sample.probability <= 0.0 {
                    continue;
                }
                sum.madd(
                    &sample.value,
                    sample.incoming.y.abs() / sample.probability,
                );
            }
            sum
        })
        .reduce(|| Spectrum::ZERO, |a, b| a + b);
    total * (1.0 / samples as f32)
}

/// Midpoint quadrature of `evaluate · cos` over the upper hemisphere.
pub fn integrate_albedo(tree: &ClosureTree, outgoing: Vec3, theta_steps: usize) -> Spectrum {
    let point = ShadingPoint::default();
    let phi_steps = 4 * theta_steps;
    let d_theta = FRAC_PI_2 / theta_steps as f32;
    let d_phi = 2.0 * PI / phi_steps as f32;
    (0..theta_steps)
        .into_par_iter()
        .map(|i| {
            let mut ctx = ShadingContext::new();
            let root = ctx.prepare(tree, &point);
            let theta = (i as f32 + 0.5) * d_theta;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let mut row = Spectrum::ZERO;
            for j in 0..phi_steps {
                let phi = (j as f32 + 0.5) * d_phi;
                let incoming = sph_to_cart(theta, phi);
                let (value, _) = ctx.evaluate(root, outgoing, incoming, ScatteringMode::ALL);
                row += value;
            }
            row * (cos_theta * sin_theta * d_theta * d_phi)
        })
        .reduce(|| Spectrum::ZERO, |a, b| a + b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bxdf::brdf::{LambertianParams, SurfaceLayerParams};

    fn lambert(r: f32) -> ClosureTree {
        ClosureTree::Lambert(LambertianParams {
            reflectance: Spectrum::splat(r),
        })
    }

    #[test]
    fn lambert_albedo_is_its_reflectance() {
        let report = compute_albedo(&lambert(0.5), 30.0, 1 << 14, 128, 7);
        // Importance sampling is exact for a Lambertian lobe.
        assert_relative_eq!(report.sampled.average(), 0.5, max_relative = 1.0e-3);
        assert_relative_eq!(report.integrated.average(), 0.5, max_relative = 1.0e-3);
        assert!(report.relative_difference() < 3.0e-3);
    }

    #[test]
    fn layered_estimates_agree() {
        let tree = ClosureTree::SurfaceLayer(SurfaceLayerParams {
            roughness: 0.5,
            substrate: Box::new(lambert(0.6)),
            ..Default::default()
        });
        for theta_o in [0.0, 45.0] {
            let report = compute_albedo(&tree, theta_o, 1 << 17, 256, 3);
            assert!(
                report.relative_difference() < 0.03,
                "theta_o = {theta_o}: {report:?}"
            );
            assert!(report.integrated.max_value() <= 1.0);
        }
    }

    #[test]
    fn estimate_is_deterministic() {
        let tree = lambert(0.8);
        let wo = sph_to_cart(0.5, 1.0);
        let a = estimate_albedo(&tree, wo, 10_000, 42);
        let b = estimate_albedo(&tree, wo, 10_000, 42);
        assert_eq!(a, b);
        assert_eq!(estimate_albedo(&tree, wo, 0, 42), Spectrum::ZERO);
    }
}
