//! Optics of smooth interfaces.

pub mod fresnel;
