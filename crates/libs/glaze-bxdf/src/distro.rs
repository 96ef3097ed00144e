//! Microfacet distribution function models.
//!
//! Distributions are stateless: the roughness parameters are passed to every
//! call, so a single immutable instance per model is shared process-wide (see
//! [`pick_distro`]).
//!
//! All directions are expressed in the Y-up shading frame. Directions below
//! the macro-surface are mirrored into the upper hemisphere by the sampling
//! routine and its density.

mod beckmann;
mod trowbridge_reitz;

use base::math::Vec3;
pub use beckmann::*;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
pub use trowbridge_reitz::*;

/// Different kinds of microfacet distribution functions.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MicrofacetDistroKind {
    /// Beckmann microfacet distribution, narrow tailed.
    #[cfg_attr(feature = "cli", clap(alias = "bk"))]
    #[serde(rename = "beckmann", alias = "bk")]
    #[default]
    Beckmann,
    /// Trowbridge-Reitz (GGX) microfacet distribution, heavy tailed.
    #[cfg_attr(feature = "cli", clap(alias = "tr", alias = "ggx"))]
    #[serde(rename = "ggx", alias = "tr", alias = "trowbridge_reitz")]
    TrowbridgeReitz,
}

impl MicrofacetDistroKind {
    /// Human readable name of the distribution.
    pub fn to_str(&self) -> &'static str {
        match self {
            MicrofacetDistroKind::Beckmann => "Beckmann",
            MicrofacetDistroKind::TrowbridgeReitz => "Trowbridge-Reitz",
        }
    }
}

impl Display for MicrofacetDistroKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.to_str()) }
}

/// Common interface for microfacet distribution functions.
pub trait MicrofacetDistribution: Debug + Send + Sync {
    /// Returns the kind of the distribution.
    fn kind(&self) -> MicrofacetDistroKind;

    /// Evaluates the microfacet normal distribution function D(m).
    ///
    /// `m` is assumed to be normalised; normals below the macro-surface have
    /// zero density.
    fn eval_ndf(&self, m: Vec3, alpha_x: f32, alpha_y: f32) -> f32;

    /// Evaluates the Smith auxiliary function Λ for the given direction.
    fn eval_lambda(&self, w: Vec3, alpha_x: f32, alpha_y: f32) -> f32;

    /// Evaluates the Smith masking function G1 for a single direction.
    ///
    /// Zero when `v` sees the back of the microfacet `m`.
    fn eval_msf1(&self, v: Vec3, m: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        if v.dot(m) * v.y <= 0.0 {
            return 0.0;
        }
        1.0 / (1.0 + self.eval_lambda(v, alpha_x, alpha_y))
    }

    /// Evaluates the height-correlated Smith masking-shadowing function
    /// G(wi, wo, m).
    fn eval_msf(&self, wi: Vec3, wo: Vec3, _m: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        1.0 / (1.0 + self.eval_lambda(wi, alpha_x, alpha_y) + self.eval_lambda(wo, alpha_x, alpha_y))
    }

    /// Samples a microfacet normal from the distribution of normals visible
    /// from `wo`.
    ///
    /// Only the first two numbers of `u` are consumed.
    fn sample(&self, wo: Vec3, u: [f32; 3], alpha_x: f32, alpha_y: f32) -> Vec3;

    /// Density (solid angle measure) of [`MicrofacetDistribution::sample`]
    /// producing `m` given `wo`:
    ///
    /// $$p(m) = \frac{G_1(\omega_o) \max(0, \omega_o \cdot m) D(m)}{|\omega_o \cdot n|}$$
    fn pdf(&self, wo: Vec3, m: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        let wo = upper(wo);
        let cos_o = wo.y;
        if cos_o == 0.0 {
            return 0.0;
        }
        let cos_om = wo.dot(m);
        if cos_om <= 0.0 {
            return 0.0;
        }
        let g1 = self.eval_msf1(wo, m, alpha_x, alpha_y);
        g1 * cos_om * self.eval_ndf(m, alpha_x, alpha_y) / cos_o
    }
}

/// Shared Beckmann distribution.
pub static BECKMANN: BeckmannDistribution = BeckmannDistribution;

/// Shared Trowbridge-Reitz distribution.
pub static TROWBRIDGE_REITZ: TrowbridgeReitzDistribution = TrowbridgeReitzDistribution;

/// Returns the shared instance of the given distribution model.
pub fn pick_distro(kind: MicrofacetDistroKind) -> &'static dyn MicrofacetDistribution {
    match kind {
        MicrofacetDistroKind::Beckmann => &BECKMANN,
        MicrofacetDistroKind::TrowbridgeReitz => &TROWBRIDGE_REITZ,
    }
}

/// Flips a direction into the upper hemisphere.
#[inline(always)]
fn upper(w: Vec3) -> Vec3 {
    if w.y < 0.0 {
        -w
    } else {
        w
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::{
        math::{sph_to_cart, Vec3},
        sampling::SamplingContext,
    };
    use proptest::prelude::*;
    use std::f64::consts::PI;

    const KINDS: [MicrofacetDistroKind; 2] = [
        MicrofacetDistroKind::Beckmann,
        MicrofacetDistroKind::TrowbridgeReitz,
    ];

    /// Direction from the cosine of the zenith angle and the azimuth.
    fn dir(cos_theta: f64, phi: f64) -> Vec3 {
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        Vec3::new(
            (sin_theta * phi.cos()) as f32,
            cos_theta as f32,
            (sin_theta * phi.sin()) as f32,
        )
    }

    /// Midpoint quadrature over the upper hemisphere in (cos θ, φ).
    fn integrate_hemisphere(n: usize, f: impl Fn(Vec3) -> f64) -> f64 {
        let du = 1.0 / n as f64;
        let dphi = 2.0 * PI / n as f64;
        let mut sum = 0.0;
        for i in 0..n {
            let u = (i as f64 + 0.5) * du;
            for j in 0..n {
                let phi = (j as f64 + 0.5) * dphi;
                sum += f(dir(u, phi));
            }
        }
        sum * du * dphi
    }

    #[test]
    fn kind_names() {
        assert_eq!(MicrofacetDistroKind::default(), MicrofacetDistroKind::Beckmann);
        assert_eq!(pick_distro(MicrofacetDistroKind::Beckmann).kind(), MicrofacetDistroKind::Beckmann);
        assert_eq!(
            pick_distro(MicrofacetDistroKind::TrowbridgeReitz).kind(),
            MicrofacetDistroKind::TrowbridgeReitz
        );
        assert_eq!(MicrofacetDistroKind::TrowbridgeReitz.to_string(), "Trowbridge-Reitz");
    }

    #[test]
    fn ndf_is_normalized() {
        for kind in KINDS {
            let distro = pick_distro(kind);
            for (ax, ay) in [(0.3, 0.3), (0.5, 0.5), (0.3, 0.6), (0.8, 0.4)] {
                let integral = integrate_hemisphere(512, |m| {
                    distro.eval_ndf(m, ax, ay) as f64 * m.y as f64
                });
                assert!(
                    (integral - 1.0).abs() < 1.0e-2,
                    "{kind}: ∫D cos = {integral} for ({ax}, {ay})"
                );
            }
        }
    }

    #[test]
    fn ndf_vanishes_below_the_surface() {
        for kind in KINDS {
            let distro = pick_distro(kind);
            assert_eq!(distro.eval_ndf(Vec3::NEG_Y, 0.3, 0.3), 0.0);
            assert_eq!(distro.eval_ndf(Vec3::X, 0.3, 0.3), 0.0);
        }
    }

    #[test]
    fn pdf_integrates_to_one() {
        for kind in KINDS {
            let distro = pick_distro(kind);
            for theta_o in [0.0f32, 0.5, 1.2] {
                let wo = sph_to_cart(theta_o, 0.7);
                let integral = integrate_hemisphere(512, |m| distro.pdf(wo, m, 0.4, 0.6) as f64);
                assert!(
                    (integral - 1.0).abs() < 2.0e-2,
                    "{kind}: ∫pdf = {integral} at θo = {theta_o}"
                );
            }
        }
    }

    #[test]
    fn pdf_matches_sample_histogram() {
        const N: usize = 200_000;
        const BINS: usize = 8;
        const SUB: usize = 16;
        let (ax, ay) = (0.5, 0.3);
        for kind in KINDS {
            let distro = pick_distro(kind);
            let wo = sph_to_cart(0.7, 0.4);
            let mut sampling = SamplingContext::new(0x5eed);
            let mut histogram = [[0usize; BINS]; BINS];
            for _ in 0..N {
                let m = distro.sample(wo, sampling.next_array::<3>(), ax, ay);
                assert!(m.y >= 0.0, "{kind}: sampled normal below the surface {m}");
                assert!((m.length() - 1.0).abs() < 1.0e-4);
                let phi = (m.z as f64).atan2(m.x as f64).rem_euclid(2.0 * PI);
                let i = ((m.y as f64 * BINS as f64) as usize).min(BINS - 1);
                let j = ((phi / (2.0 * PI) * BINS as f64) as usize).min(BINS - 1);
                histogram[i][j] += 1;
            }
            let du = 1.0 / (BINS * SUB) as f64;
            let dphi = 2.0 * PI / (BINS * SUB) as f64;
            for i in 0..BINS {
                for j in 0..BINS {
                    let mut expected = 0.0;
                    for si in 0..SUB {
                        let u = ((i * SUB + si) as f64 + 0.5) * du;
                        for sj in 0..SUB {
                            let phi = ((j * SUB + sj) as f64 + 0.5) * dphi;
                            expected += distro.pdf(wo, dir(u, phi), ax, ay) as f64;
                        }
                    }
                    expected *= du * dphi;
                    let observed = histogram[i][j] as f64 / N as f64;
                    assert!(
                        (observed - expected).abs() < 0.004 + 0.05 * expected,
                        "{kind}: bin ({i}, {j}) observed {observed}, expected {expected}"
                    );
                }
            }
        }
    }

    #[test]
    fn sampling_mirrors_directions_below_the_surface() {
        for kind in KINDS {
            let distro = pick_distro(kind);
            let wo = sph_to_cart(0.6, 1.0);
            let u = [0.3, 0.8, 0.5];
            let m_up = distro.sample(wo, u, 0.4, 0.4);
            let m_down = distro.sample(-wo, u, 0.4, 0.4);
            assert!(m_up.abs_diff_eq(m_down, 1.0e-6));
            assert_eq!(distro.pdf(wo, m_up, 0.4, 0.4), distro.pdf(-wo, m_up, 0.4, 0.4));
        }
    }

    #[test]
    fn masking_shadowing_limits() {
        for kind in KINDS {
            let distro = pick_distro(kind);
            // No masking at normal incidence.
            assert_eq!(distro.eval_lambda(Vec3::Y, 0.5, 0.5), 0.0);
            assert_eq!(distro.eval_msf1(Vec3::Y, Vec3::Y, 0.5, 0.5), 1.0);
            // Backfacing microfacet.
            let v = sph_to_cart(1.0, 0.0);
            let m = sph_to_cart(1.0, std::f32::consts::PI);
            assert_eq!(distro.eval_msf1(v, m, 0.5, 0.5), 0.0);
        }
    }

    proptest! {
        #[test]
        fn masking_shadowing_in_unit_range(
            ti in 0.0f32..1.55, pi in 0.0f32..6.28,
            to in 0.0f32..1.55, po in 0.0f32..6.28,
            ax in 0.01f32..1.0, ay in 0.01f32..1.0,
        ) {
            let wi = sph_to_cart(ti, pi);
            let wo = sph_to_cart(to, po);
            let m = (wi + wo).normalize();
            for kind in KINDS {
                let distro = pick_distro(kind);
                let g = distro.eval_msf(wi, wo, m, ax, ay);
                prop_assert!((0.0..=1.0).contains(&g), "{} G = {}", kind, g);
                let lambda = distro.eval_lambda(wi, ax, ay);
                prop_assert!(lambda >= 0.0);
                prop_assert!(distro.eval_ndf(m, ax, ay) >= 0.0);
            }
        }

        #[test]
        fn sampled_normals_are_visible(
            to in 0.0f32..1.5, po in 0.0f32..6.28,
            u0 in 0.0f32..1.0, u1 in 0.0f32..1.0,
            ax in 0.05f32..1.0, ay in 0.05f32..1.0,
        ) {
            let wo = sph_to_cart(to, po);
            for kind in KINDS {
                let m = pick_distro(kind).sample(wo, [u0, u1, 0.5], ax, ay);
                prop_assert!(m.is_finite());
                prop_assert!(m.y >= 0.0, "{} m = {}", kind, m);
            }
        }
    }
}
