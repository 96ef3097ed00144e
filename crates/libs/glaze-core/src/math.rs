//! Math utilities.
//!
//! All directions handled by the scattering models live in a local shading
//! frame which is **Y-up**: the y component of a direction is the cosine of
//! its angle to the macro-surface normal, and its sign tells on which side of
//! the surface the direction lies.

use num_traits::Float;

pub use glam::*;

/// The shading normal in the local frame.
pub const NORMAL: Vec3 = Vec3::Y;

/// Returns the square of the given value.
#[inline(always)]
pub fn sqr<F: Float>(x: F) -> F { x * x }

/// Returns the cube of the given value.
#[inline(always)]
pub fn cbr<F: Float>(x: F) -> F { x * x * x }

/// Returns the reciprocal of the given value.
///
/// Zero maps to a signed infinity instead of NaN.
#[inline(always)]
pub fn rcp_f32(x: f32) -> f32 {
    if x == 0.0 {
        return f32::INFINITY * x.signum();
    }
    1.0 / x
}

/// Linear interpolation between `a` and `b`.
#[inline(always)]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 { a + (b - a) * t }

/// Clamps the value into `[0, 1]`.
#[inline(always)]
pub fn saturate(x: f32) -> f32 { x.clamp(0.0, 1.0) }

/// Returns the cosine of the zenith angle of the given vector.
/// The vector must be normalized.
#[inline(always)]
pub fn cos_theta(v: &Vec3) -> f32 {
    debug_assert!(
        approx::ulps_eq!(v.length(), 1.0, epsilon = 1.0e-4),
        "Vec3 must be normalized, got {}",
        v.length()
    );
    v.y
}

/// Returns the square of the cosine of the zenith angle of the given vector.
#[inline(always)]
pub fn cos_theta2(v: &Vec3) -> f32 { sqr(cos_theta(v)) }

/// Returns the square of the sine of the zenith angle of the given vector.
pub fn sin_theta2(v: &Vec3) -> f32 { (1.0 - cos_theta2(v)).max(0.0) }

/// Returns the sine of the zenith angle of the given vector.
pub fn sin_theta(v: &Vec3) -> f32 { sin_theta2(v).sqrt() }

/// Returns the tangent of the zenith angle of the given vector.
pub fn tan_theta(v: &Vec3) -> f32 { sin_theta(v) / cos_theta(v) }

/// Returns the square of the tangent of the zenith angle of the given vector.
pub fn tan_theta2(v: &Vec3) -> f32 { sin_theta2(v) / cos_theta2(v) }

/// Returns the cosine of the azimuth angle of the given vector, measured from
/// the x axis towards the z axis.
pub fn cos_phi(v: &Vec3) -> f32 {
    let sin_theta = sin_theta(v);
    if sin_theta == 0.0 {
        1.0
    } else {
        (v.x / sin_theta).clamp(-1.0, 1.0)
    }
}

/// Returns the sine of the azimuth angle of the given vector.
pub fn sin_phi(v: &Vec3) -> f32 {
    let sin_theta = sin_theta(v);
    if sin_theta == 0.0 {
        0.0
    } else {
        (v.z / sin_theta).clamp(-1.0, 1.0)
    }
}

/// Converts a direction given by its zenith and azimuth angles (radians) into
/// a unit vector of the Y-up frame.
pub fn sph_to_cart(theta: f32, phi: f32) -> Vec3 {
    let (sin_theta, cos_theta) = theta.sin_cos();
    let (sin_phi, cos_phi) = phi.sin_cos();
    Vec3::new(sin_theta * cos_phi, cos_theta, sin_theta * sin_phi)
}

/// Whether the two directions lie on the same side of the shading plane.
#[inline(always)]
pub fn same_hemisphere(a: &Vec3, b: &Vec3) -> bool { a.y * b.y > 0.0 }

/// Mirrors `v` about the normal `n`; both point away from the surface.
#[inline(always)]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 { 2.0 * v.dot(n) * n - v }

/// Renormalizes a vector that is already close to unit length.
///
/// One Newton step on the inverse square root; cheaper than a full
/// normalisation and enough to undo rounding drift.
#[inline(always)]
pub fn improve_normalization(v: Vec3) -> Vec3 {
    let len2 = v.length_squared();
    v * ((3.0 - len2) * 0.5)
}

/// Inverse of the error function.
///
/// Single precision approximation from M. Giles, "Approximating the erfinv
/// function", GPU Computing Gems Jade Edition, 2011.
pub fn erf_inv(x: f32) -> f32 {
    let x = x.clamp(-0.99999, 0.99999);
    let mut w = -((1.0 - x) * (1.0 + x)).ln();
    let p = if w < 5.0 {
        w -= 2.5;
        let mut p = 2.810_226_4e-08;
        p = 3.432_739_4e-07 + p * w;
        p = -3.523_387_7e-06 + p * w;
        p = -4.391_506_5e-06 + p * w;
        p = 0.000_218_580_87 + p * w;
        p = -0.001_253_725 + p * w;
        p = -0.004_177_681_6 + p * w;
        p = 0.246_640_72 + p * w;
        1.501_409_4 + p * w
    } else {
        w = w.sqrt() - 3.0;
        let mut p = -0.000_200_214_26;
        p = 0.000_100_950_56 + p * w;
        p = 0.001_349_343_2 + p * w;
        p = -0.003_673_428_4 + p * w;
        p = 0.005_739_507_7 + p * w;
        p = -0.007_622_461_3 + p * w;
        p = 0.009_438_870_5 + p * w;
        p = 1.001_674_1 + p * w;
        2.832_976_8 + p * w
    };
    p * x
}

/// Orthonormal shading basis.
///
/// The normal is the Y axis of the local frame; the tangent and bitangent map
/// to X and Z respectively.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingBasis {
    /// First tangent direction (local X).
    pub tangent: Vec3,
    /// Shading normal (local Y).
    pub normal: Vec3,
    /// Second tangent direction (local Z).
    pub bitangent: Vec3,
}

impl Default for ShadingBasis {
    fn default() -> Self { Self::IDENTITY }
}

impl ShadingBasis {
    /// The basis whose local frame coincides with the parent frame.
    pub const IDENTITY: Self = Self {
        tangent: Vec3::X,
        normal: Vec3::Y,
        bitangent: Vec3::Z,
    };

    /// Builds a basis around the given unit normal.
    ///
    /// Uses the branchless construction of Duff et al., "Building an
    /// Orthonormal Basis, Revisited", JCGT 2017.
    pub fn from_normal(normal: Vec3) -> Self {
        debug_assert!(normal.is_normalized(), "Normal must be normalized.");
        let (tangent, bitangent) = normal.any_orthonormal_pair();
        Self {
            tangent,
            normal,
            bitangent,
        }
        .fix_handedness()
    }

    /// Builds a basis from a normal and a tangent hint; the tangent is
    /// re-orthogonalized against the normal.
    pub fn from_normal_tangent(normal: Vec3, tangent: Vec3) -> Self {
        let tangent = (tangent - normal * normal.dot(tangent)).normalize();
        let bitangent = tangent.cross(normal);
        Self {
            tangent,
            normal,
            bitangent,
        }
    }

    fn fix_handedness(self) -> Self {
        // Keep (tangent, normal, bitangent) right-handed like (X, Y, Z).
        if self.tangent.cross(self.normal).dot(self.bitangent) < 0.0 {
            Self {
                bitangent: -self.bitangent,
                ..self
            }
        } else {
            self
        }
    }

    /// Transforms a vector from the parent frame into the local frame.
    #[inline]
    pub fn to_local(&self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.tangent), v.dot(self.normal), v.dot(self.bitangent))
    }

    /// Transforms a vector from the local frame back into the parent frame.
    #[inline]
    pub fn to_parent(&self, v: Vec3) -> Vec3 {
        self.tangent * v.x + self.normal * v.y + self.bitangent * v.z
    }
}
