use crate::distro::{upper, MicrofacetDistribution, MicrofacetDistroKind};
use base::math::{sqr, Vec3};
use std::f32::consts::PI;

/// Trowbridge-Reitz(GGX) microfacet distribution.
///
/// $$ D(\mathbf{m}) = \frac{\alpha^2}{\pi \cos^4 \theta_m (\alpha^2 + \tan^2
/// \theta_m)^2} $$
///
/// where $\alpha$ is the width parameter of the NDF, $\theta_m$ is the angle
/// between the microfacet normal and the normal of the surface.
///
/// In case of anisotropic distribution, the NDF is defined as
///
/// $$ D(\mathbf{m}) = \frac{1}{\pi \alpha_x \alpha_y \cos^4 \theta_m (1 +
/// \tan^2 \theta_m (\frac{\cos^2\phi_m}{\alpha_x^2} +
/// \frac{\sin^2\phi_m}{\alpha_y^2}))^2} $$
#[derive(Debug, Copy, Clone, Default)]
pub struct TrowbridgeReitzDistribution;

impl MicrofacetDistribution for TrowbridgeReitzDistribution {
    fn kind(&self) -> MicrofacetDistroKind { MicrofacetDistroKind::TrowbridgeReitz }

    fn eval_ndf(&self, m: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        let cos_theta = m.y;
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let cos_theta2 = sqr(cos_theta);
        let tan_theta2 = (sqr(m.x) / sqr(alpha_x) + sqr(m.z) / sqr(alpha_y)) / cos_theta2;
        1.0 / (PI * alpha_x * alpha_y * sqr(cos_theta2) * sqr(1.0 + tan_theta2))
    }

    fn eval_lambda(&self, w: Vec3, alpha_x: f32, alpha_y: f32) -> f32 {
        let cos_theta2 = sqr(w.y);
        if cos_theta2 == 0.0 {
            return f32::INFINITY;
        }
        // α²·tan²θ along the azimuth of w.
        let alpha2_tan_theta2 = (sqr(alpha_x * w.x) + sqr(alpha_y * w.z)) / cos_theta2;
        ((1.0 + alpha2_tan_theta2).sqrt() - 1.0) * 0.5
    }

    /// Visible normal sampling by projection onto the stretched hemisphere,
    /// following Heitz, "A Simpler and Exact Sampling Routine for the GGX
    /// Distribution of Visible Normals", 2017.
    fn sample(&self, wo: Vec3, u: [f32; 3], alpha_x: f32, alpha_y: f32) -> Vec3 {
        let wo = upper(wo);

        // Stretch the view vector so we are sampling as though roughness == 1.
        let stretched = Vec3::new(alpha_x * wo.x, wo.y, alpha_y * wo.z).normalize();

        // Build an orthonormal basis with v, t1, and t2.
        let t1 = if stretched.y < 0.9999 {
            stretched.cross(Vec3::Y).normalize()
        } else {
            Vec3::X
        };
        let t2 = t1.cross(stretched);

        // Choose a point on a disk with each half of the disk weighted
        // proportionally to its projection onto direction v.
        let a = 1.0 / (1.0 + stretched.y);
        let r = u[0].sqrt();
        let phi = if u[1] < a {
            u[1] / a * PI
        } else {
            PI + (u[1] - a) / (1.0 - a) * PI
        };
        let (sin_phi, cos_phi) = phi.sin_cos();
        let p1 = r * cos_phi;
        let p2 = r * sin_phi * if u[1] < a { 1.0 } else { stretched.y };

        // Calculate the normal in this stretched tangent space.
        let h = p1 * t1 + p2 * t2 + (1.0 - sqr(p1) - sqr(p2)).max(0.0).sqrt() * stretched;

        // Unstretch and normalize the normal.
        Vec3::new(alpha_x * h.x, h.y.max(0.0), alpha_y * h.z).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::math::sph_to_cart;

    #[test]
    fn ndf_isotropic_closed_form() {
        let alpha = 0.35f32;
        for theta in [0.0f32, 0.4, 1.0] {
            let m = sph_to_cart(theta, 2.0);
            let expected = sqr(alpha)
                / (PI * sqr(sqr(theta.cos())) * sqr(sqr(alpha) + sqr(theta.tan())));
            approx::assert_relative_eq!(
                TrowbridgeReitzDistribution.eval_ndf(m, alpha, alpha),
                expected,
                max_relative = 1.0e-4
            );
        }
    }

    #[test]
    fn lambda_isotropic_closed_form() {
        let alpha = 0.5f32;
        let w = sph_to_cart(1.0, 0.3);
        let expected = ((1.0 + sqr(alpha * 1.0f32.tan())).sqrt() - 1.0) * 0.5;
        approx::assert_relative_eq!(
            TrowbridgeReitzDistribution.eval_lambda(w, alpha, alpha),
            expected,
            max_relative = 1.0e-4
        );
    }
}
