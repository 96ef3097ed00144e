//! # Fresnel equations
//!
//! Fresnel equations describe the amount of light reflected from a smooth
//! interface between two media; they are solutions to Maxwell's equations at
//! planar boundaries.
//!
//! For un-polarised light the reflectance is the average of the squares of the
//! _parallel_ and _perpendicular_ polarisation terms:
//!
//! $F_r = \frac{1}{2}(r_\parallel^2 + r_\perp^2)$
//!
//! + Dielectrics have real-valued indices of refraction and transmit the
//!   energy they don't reflect, $1 - F_r$.
//!
//! + Conductors have a complex index of refraction $\eta + ik$ and absorb what
//!   they don't reflect.
//!
//! Authoring a complex index per channel is impractical, hence the
//! artist-friendly parameterisation of Gulbrandsen ("Artist Friendly Metallic
//! Fresnel", JCGT 2014) mapping a normal-incidence reflectance `r` and an
//! edge tint `g` onto `(η, k)`, see [`artist_friendly_conductor`].
//!
//! All cosines taken by the functions below are expected to be measured on
//! the incident side of the interface, i.e. non-negative.

use crate::math::sqr;

/// Computes the unpolarised Fresnel reflectance at a planar interface between
/// two dielectric materials, given their relative index of refraction.
///
/// # Arguments
///
/// * `cos_i` - cosine of the angle between the normal and the incident
///   direction, in `[0, 1]`.
/// * `eta` - relative index of refraction $\eta_i / \eta_t$.
///
/// Returns 1 under total internal reflection.
pub fn reflectance_dielectric_eta(cos_i: f32, eta: f32) -> f32 {
    let cos_i = cos_i.clamp(0.0, 1.0);
    let sin_t2 = (1.0 - sqr(cos_i)) * sqr(eta);

    // Total internal reflection.
    if sin_t2 >= 1.0 {
        return 1.0;
    }

    let cos_t = (1.0 - sin_t2).sqrt();

    let r_parl = (cos_i - eta * cos_t) / (cos_i + eta * cos_t);
    let r_perp = (eta * cos_i - cos_t) / (eta * cos_i + cos_t);

    // No polarization.
    0.5 * (sqr(r_parl) + sqr(r_perp))
}

/// Computes the unpolarised Fresnel reflectance at a planar interface between
/// two dielectric materials.
///
/// # Arguments
///
/// * `cos_i` - cosine of the angle between the normal and the incident
///   direction, in `[0, 1]`.
/// * `eta_i` - refractive index of the incident medium.
/// * `eta_t` - refractive index of the transmitted medium.
pub fn reflectance_dielectric(cos_i: f32, eta_i: f32, eta_t: f32) -> f32 {
    reflectance_dielectric_eta(cos_i, eta_i / eta_t)
}

/// Fresnel reflectance of unpolarised light between dielectric and conductor.
///
/// Modified from "Optics" by K.D. Moeller, University Science Books, 1988.
///
/// # Arguments
///
/// * `cos_i` - cosine of the angle between normal and incident light.
/// * `eta_i` - refractive index of the incident medium.
/// * `eta_t` - refractive index of the transmitted medium.
/// * `k_t` - absorption coefficient of the transmitted medium.
///
/// Grazing incidence (`cos_i <= 0`) reflects everything.
pub fn reflectance_dielectric_conductor(cos_i: f32, eta_i: f32, eta_t: f32, k_t: f32) -> f32 {
    if cos_i <= 0.0 {
        return 1.0;
    }
    let cos_i = cos_i.min(1.0);
    // Relative index of refraction.
    let eta = eta_t / eta_i;
    let k = k_t / eta_i;

    let cos_i_2 = cos_i * cos_i;
    let sin_i_2 = 1.0 - cos_i_2;
    let eta_2 = eta * eta;
    let k_2 = k * k;
    let t0 = eta_2 - k_2 - sin_i_2;
    let a2_plus_b2 = (t0 * t0 + 4.0 * eta_2 * k_2).sqrt();
    let t1 = a2_plus_b2 + cos_i_2;
    let a = (0.5 * (a2_plus_b2 + t0)).max(0.0).sqrt();
    let t2 = 2.0 * a * cos_i;
    let rs = (t1 - t2) / (t1 + t2);
    let t3 = a2_plus_b2 * cos_i_2 + sin_i_2 * sin_i_2;
    let t4 = t2 * sin_i_2;
    let rp = rs * (t3 - t4) / (t3 + t4);

    0.5 * (rp + rs)
}

/// Largest normal-incidence reflectance accepted by
/// [`artist_friendly_conductor`]; `r = 1` makes the mapping singular.
pub const MAX_NORMAL_REFLECTANCE: f32 = 0.99;

/// Maps a normal-incidence reflectance `r` and an edge tint `g` to the
/// complex index of refraction `(η, k)` of a conductor.
pub fn artist_friendly_to_ior(r: f32, g: f32) -> (f32, f32) {
    let r = r.clamp(0.0, MAX_NORMAL_REFLECTANCE);
    let g = g.clamp(0.0, 1.0);
    let sqrt_r = r.sqrt();
    let n_min = (1.0 - r) / (1.0 + r);
    let n_max = (1.0 + sqrt_r) / (1.0 - sqrt_r);
    let n = g * n_min + (1.0 - g) * n_max;
    let k2 = (sqr(n + 1.0) * r - sqr(n - 1.0)) / (1.0 - r);
    (n, k2.max(0.0).sqrt())
}

/// Approximate conductor Fresnel reflectance from the artist-friendly
/// parameters: the reflectance at normal incidence `r` and the edge tint `g`
/// steering the colour towards grazing angles.
///
/// At normal incidence the result equals `r` (for `r` below
/// [`MAX_NORMAL_REFLECTANCE`]).
pub fn artist_friendly_conductor(cos_i: f32, r: f32, g: f32) -> f32 {
    let (eta, k) = artist_friendly_to_ior(r, g);
    reflectance_dielectric_conductor(cos_i, 1.0, eta, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn dielectric_normal_incidence() {
        // ((1 - 1.5) / (1 + 1.5))^2
        assert_relative_eq!(reflectance_dielectric(1.0, 1.0, 1.5), 0.04, epsilon = 1e-6);
        assert_relative_eq!(reflectance_dielectric_eta(1.0, 1.0 / 1.5), 0.04, epsilon = 1e-6);
    }

    #[test]
    fn dielectric_grazing_and_tir() {
        assert_relative_eq!(reflectance_dielectric(0.0, 1.0, 1.5), 1.0, epsilon = 1e-6);
        // From glass to air beyond the critical angle.
        assert_eq!(reflectance_dielectric(0.3, 1.5, 1.0), 1.0);
    }

    #[test]
    fn dielectric_is_monotonic_towards_grazing() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let cos_i = 1.0 - i as f32 / 100.0;
            let r = reflectance_dielectric(cos_i, 1.0, 1.5);
            assert!((0.0..=1.0).contains(&r));
            assert!(r >= prev - 1e-6, "reflectance decreased at cos {cos_i}");
            prev = r;
        }
    }

    #[test]
    fn conductor_matches_dielectric_without_absorption() {
        for cos_i in [1.0, 0.8, 0.5, 0.2] {
            assert_relative_eq!(
                reflectance_dielectric_conductor(cos_i, 1.0, 1.5, 0.0),
                reflectance_dielectric(cos_i, 1.0, 1.5),
                epsilon = 1e-5
            );
        }
    }

    #[test]
    fn artist_friendly_normal_incidence_reproduces_r() {
        for r in [0.04, 0.5, 0.9, 0.95] {
            for g in [0.0, 0.5, 1.0] {
                assert_relative_eq!(artist_friendly_conductor(1.0, r, g), r, epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn artist_friendly_grazing_is_white() {
        assert_eq!(artist_friendly_conductor(0.0, 0.9, 1.0), 1.0);
        let r = artist_friendly_conductor(0.05, 0.9, 1.0);
        assert!(r > 0.9 && r <= 1.0, "{r}");
    }
}
