//! Bxdf models and utilities.
//!
//! The centrepiece is the [`SurfaceLayerBrdf`](brdf::SurfaceLayerBrdf): a
//! rough glossy coat over an arbitrary substrate closure, with visible-normal
//! importance sampling of its microfacet distribution.
#![warn(missing_docs)]

pub mod brdf;
pub mod bsdf;
pub mod closure;
pub mod config;
pub mod distro;

pub use bsdf::{Bsdf, BsdfSample, ScatteringMode, ShadingPoint};
pub use closure::{ClosureArena, ClosureRef, ClosureTree, ShadingContext};
