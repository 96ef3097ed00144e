//! RGB spectral values.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Formatter},
    ops::{Add, AddAssign, Index, Mul, MulAssign},
};

/// Spectral quantity sampled at three (RGB) wavelengths.
///
/// Used for reflectance tints, Fresnel values and the radiance contribution
/// accumulated by the scattering models.
#[derive(Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spectrum(Vec3);

impl Debug for Spectrum {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Spectrum({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl Spectrum {
    /// All channels zero.
    pub const ZERO: Self = Self(Vec3::ZERO);

    /// All channels one.
    pub const ONE: Self = Self(Vec3::ONE);

    /// Creates a spectrum from its three channels.
    pub const fn new(r: f32, g: f32, b: f32) -> Self { Self(Vec3::new(r, g, b)) }

    /// Creates a spectrum with every channel set to `v`.
    pub const fn splat(v: f32) -> Self { Self(Vec3::splat(v)) }

    /// Sets every channel to `v`.
    pub fn set(&mut self, v: f32) { self.0 = Vec3::splat(v); }

    /// Returns the largest channel.
    pub fn max_value(&self) -> f32 { self.0.max_element() }

    /// Returns the smallest channel.
    pub fn min_value(&self) -> f32 { self.0.min_element() }

    /// Average of the channels.
    pub fn average(&self) -> f32 { (self.0.x + self.0.y + self.0.z) / 3.0 }

    /// Whether every channel is exactly zero.
    pub fn is_zero(&self) -> bool { self.0 == Vec3::ZERO }

    /// Whether every channel is finite.
    pub fn is_finite(&self) -> bool { self.0.is_finite() }

    /// Whether every channel is finite and non-negative.
    pub fn is_valid(&self) -> bool { self.is_finite() && self.min_value() >= 0.0 }

    /// Adds `other * weight` to `self`.
    pub fn madd(&mut self, other: &Spectrum, weight: f32) { self.0 += other.0 * weight; }

    /// Applies `f` to every channel.
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(Vec3::new(f(self.0.x), f(self.0.y), f(self.0.z)))
    }

    /// Combines two spectra channel by channel.
    pub fn zip_map(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self(Vec3::new(
            f(self.0.x, other.0.x),
            f(self.0.y, other.0.y),
            f(self.0.z, other.0.z),
        ))
    }

    /// Returns the channels as an array.
    pub fn to_array(&self) -> [f32; 3] { self.0.to_array() }
}

impl From<[f32; 3]> for Spectrum {
    fn from(v: [f32; 3]) -> Self { Self(Vec3::from(v)) }
}

impl Index<usize> for Spectrum {
    type Output = f32;

    fn index(&self, index: usize) -> &Self::Output { &self.0[index] }
}

impl Add for Spectrum {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output { Self(self.0 + rhs.0) }
}

impl AddAssign for Spectrum {
    fn add_assign(&mut self, rhs: Self) { self.0 += rhs.0; }
}

impl Mul for Spectrum {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output { Self(self.0 * rhs.0) }
}

impl MulAssign for Spectrum {
    fn mul_assign(&mut self, rhs: Self) { self.0 *= rhs.0; }
}

impl Mul<f32> for Spectrum {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output { Self(self.0 * rhs) }
}

impl MulAssign<f32> for Spectrum {
    fn mul_assign(&mut self, rhs: f32) { self.0 *= rhs; }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_arithmetic() {
        let mut s = Spectrum::new(0.25, 0.5, 0.125);
        assert_eq!(s.max_value(), 0.5);
        assert_eq!(s.min_value(), 0.125);
        s *= 2.0;
        assert_eq!(s, Spectrum::new(0.5, 1.0, 0.25));
        s.madd(&Spectrum::ONE, 0.5);
        assert_eq!(s, Spectrum::new(1.0, 1.5, 0.75));
        assert_eq!(s * Spectrum::ZERO, Spectrum::ZERO);
        assert!(Spectrum::ZERO.is_zero());
        assert!(!Spectrum::new(f32::NAN, 0.0, 0.0).is_valid());
        assert_eq!(s[1], 1.5);
    }
}
