//! # glaze-core
//! Core library for glaze.
//! Contains the basic types and functions shared by the glaze crates: vector
//! math in the Y-up shading frame, RGB spectra, Fresnel optics and the
//! sampling stream consumed by the scattering models.
#![warn(missing_docs)]

use std::fmt::{Display, Formatter};

pub mod error;
pub mod math;
pub mod optics;
pub mod sampling;
pub mod spectrum;

#[cfg(feature = "cli")]
pub mod cli;

pub use spectrum::Spectrum;

/// Indicates whether something is uniform in all directions or not.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Symmetry {
    /// Uniformity in all directions.
    #[cfg_attr(feature = "cli", clap(alias = "iso"))]
    Isotropic,
    /// Non-uniformity in some directions.
    #[cfg_attr(feature = "cli", clap(alias = "aniso"))]
    Anisotropic,
}

impl Symmetry {
    /// Returns whether it's isotropic.
    pub const fn is_isotropic(&self) -> bool { matches!(self, Self::Isotropic) }

    /// Returns whether it's anisotropic.
    pub const fn is_anisotropic(&self) -> bool { matches!(self, Self::Anisotropic) }

    /// Classifies a pair of roughness parameters.
    pub fn from_alphas(alpha_x: f32, alpha_y: f32) -> Self {
        if (alpha_x - alpha_y).abs() < 1.0e-6 {
            Symmetry::Isotropic
        } else {
            Symmetry::Anisotropic
        }
    }
}

impl Display for Symmetry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Symmetry::Isotropic => "Isotropic",
                Symmetry::Anisotropic => "Anisotropic",
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetry_from_alphas() {
        assert_eq!(Symmetry::from_alphas(0.25, 0.25), Symmetry::Isotropic);
        assert_eq!(Symmetry::from_alphas(0.25, 0.5), Symmetry::Anisotropic);
        assert!(Symmetry::Isotropic.is_isotropic());
        assert!(Symmetry::Anisotropic.is_anisotropic());
        assert_eq!(format!("{}", Symmetry::Anisotropic), "Anisotropic");
    }
}
