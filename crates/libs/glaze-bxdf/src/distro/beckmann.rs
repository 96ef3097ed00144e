use crate::distro::{upper, MicrofacetDistribution, MicrofacetDistroKind};
use base::math::{cos_phi, erf_inv, sin_phi, sqr, Vec3};
use std::f32::consts::PI;

/// Beckmann microfacet distribution function.
///
/// Beckman-Spizzichino distribution is based on the Gaussian distribution of
/// microfacet slopes. If σ is the RMS slope of the microfacets, then the alpha
/// parameter of the Beckmann distribution is given by: $\alpha = \sqrt{2}
/// \sigma$.
#[derive(Debug, Copy, Clone, Default)]
pub struct BeckmannDistribution;

impl MicrofacetDistribution for BeckmannDistribution {
    fn kind(&self) -> MicrofacetDistroKind { MicrofacetDistroKind::Beckmann }

    fn eval_ndf(&self, m: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        let cos_theta = m.y;
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let cos_theta2 = sqr(cos_theta);
        let exponent = -(sqr(m.x) / sqr(alpha_x) + sqr(m.z) / sqr(alpha_y)) / cos_theta2;
        exponent.exp() / (PI * alpha_x * alpha_y * sqr(cos_theta2))
    }

    #[rustfmt::skip]
    /// Under the assumption that there is no correlation of heights of the
    /// nearby points on the surface, the lambda function for the
    /// Beckmann-Spizzichino distribution has the analytical form:
    ///
    /// $$\Lambda(\mathbf{\omega})=\frac{erf(a)-1+\frac{e^{-a^2}}{a\sqrt{\pi}}}{2}$$
    ///
    /// where $a = 1 / (\alpha \tan\theta)$ and α is the roughness projected
    /// onto the azimuth of ω.
    fn eval_lambda(&self, w: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        let cos_theta = w.y.abs();
        if cos_theta == 0.0 {
            return f32::INFINITY;
        }
        // α·sinθ along the azimuth of w.
        let projected = (sqr(alpha_x * w.x) + sqr(alpha_y * w.z)).sqrt();
        if projected == 0.0 {
            return 0.0;
        }
        let a = cos_theta / projected;
        let erf_a = libm::erff(a);
        let exp_a2 = (-sqr(a)).exp();
        ((erf_a - 1.0 + exp_a2 / (a * PI.sqrt())) * 0.5).max(0.0)
    }

    fn sample(&self, wo: Vec3, u: [f32; 3], alpha_x: f32, alpha_y: f32) -> Vec3 {
        let wo = upper(wo);

        // 1. Stretch wo.
        let stretched = Vec3::new(alpha_x * wo.x, wo.y, alpha_y * wo.z).normalize();

        // 2. Simulate P22_{wo}(slope_x, slope_z, 1, 1).
        let (mut slope_x, mut slope_z) = sample_slopes(stretched.y, u[0], u[1]);

        // 3. Rotate.
        let (cos_phi, sin_phi) = (cos_phi(&stretched), sin_phi(&stretched));
        let tmp = cos_phi * slope_x - sin_phi * slope_z;
        slope_z = sin_phi * slope_x + cos_phi * slope_z;
        slope_x = tmp;

        // 4. Unstretch.
        slope_x *= alpha_x;
        slope_z *= alpha_y;

        // 5. Compute normal.
        Vec3::new(-slope_x, 1.0, -slope_z).normalize()
    }
}

/// Samples the slopes of the visible normals of the unit-roughness Beckmann
/// distribution seen under the given incident zenith angle.
///
/// The first slope is found by numerically inverting the CDF of visible
/// slopes (Newton steps safeguarded by bisection, in the erf domain), which
/// is continuous in the random numbers unlike the closed-form fit of Jakob's
/// original routine.
fn sample_slopes(cos_theta_i: f32, u1: f32, u2: f32) -> (f32, f32) {
    // Normal incidence.
    if cos_theta_i > 0.9999 {
        let r = (-(1.0 - u1).ln()).sqrt();
        let (sin_phi, cos_phi) = (2.0 * PI * u2).sin_cos();
        return (r * cos_phi, r * sin_phi);
    }

    let cos_theta_i = cos_theta_i.max(1.0e-6);
    let sin_theta_i = (1.0 - sqr(cos_theta_i)).max(0.0).sqrt();
    let tan_theta_i = sin_theta_i / cos_theta_i;
    let cot_theta_i = 1.0 / tan_theta_i;

    // Search interval, parameterized in the erf domain.
    let mut a = -1.0f32;
    let mut c = libm::erff(cot_theta_i);
    let sample_x = u1.max(1.0e-6);

    // Initial guess: inverse of a fitted approximation of the CDF.
    let theta_i = cos_theta_i.acos();
    let fit = 1.0 + theta_i * (-0.876 + theta_i * (0.4265 - 0.0594 * theta_i));
    let mut b = c - (1.0 + c) * (1.0 - sample_x).powf(fit);

    // Normalization factor of the CDF.
    let inv_sqrt_pi = 1.0 / PI.sqrt();
    let normalization =
        1.0 / (1.0 + c + inv_sqrt_pi * tan_theta_i * (-sqr(cot_theta_i)).exp());

    for _ in 0..10 {
        // Bisection criterion; the negated form also catches NaN.
        if !(b >= a && b <= c) {
            b = 0.5 * (a + c);
        }

        // CDF and its derivative (the density).
        let inv_erf = erf_inv(b);
        let value = normalization
            * (1.0 + b + inv_sqrt_pi * tan_theta_i * (-sqr(inv_erf)).exp())
            - sample_x;
        let derivative = normalization * (1.0 - inv_erf * tan_theta_i);

        if value.abs() < 1.0e-5 {
            break;
        }

        if value > 0.0 {
            c = b;
        } else {
            a = b;
        }

        b -= value / derivative;
    }

    // The last Newton step is unguarded.
    if !(b >= a && b <= c) {
        b = 0.5 * (a + c);
    }

    let slope_x = erf_inv(b);
    let slope_z = erf_inv(2.0 * u2.max(1.0e-6) - 1.0);

    (slope_x, slope_z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::math::sph_to_cart;

    #[test]
    fn ndf_peak() {
        let d = BeckmannDistribution.eval_ndf(Vec3::Y, 0.5, 0.25);
        approx::assert_relative_eq!(d, 1.0 / (PI * 0.5 * 0.25), max_relative = 1.0e-6);
    }

    #[test]
    fn lambda_matches_isotropic_closed_form() {
        let alpha = 0.4f32;
        for theta in [0.3f32, 0.8, 1.3] {
            let w = sph_to_cart(theta, 0.9);
            let a = 1.0 / (alpha * theta.tan());
            let expected =
                (libm::erff(a) - 1.0 + (-a * a).exp() / (a * PI.sqrt())) * 0.5;
            approx::assert_relative_eq!(
                BeckmannDistribution.eval_lambda(w, alpha, alpha),
                expected.max(0.0),
                epsilon = 1.0e-5
            );
        }
    }

    #[test]
    fn slopes_at_normal_incidence_are_gaussian() {
        // u1 = 1 - e^{-1} gives r = 1.
        let (x, z) = sample_slopes(1.0, 1.0 - (-1.0f32).exp(), 0.25);
        assert!(x.abs() < 1.0e-5);
        assert!((z - 1.0).abs() < 1.0e-5);
    }
}
