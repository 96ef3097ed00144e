//! Scattering capability shared by every closure model.

use crate::closure::{ClosureArena, ClosureId};
use base::{
    math::{reflect, ShadingBasis, Vec3},
    sampling::SamplingContext,
    Spectrum,
};

bitflags::bitflags! {
    /// Kinds of scattering a model can produce or be asked for.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ScatteringMode: u8 {
        /// Lambertian-like scattering.
        const DIFFUSE = 1 << 0;
        /// Rough specular scattering.
        const GLOSSY = 1 << 1;
        /// Perfectly specular scattering.
        const SPECULAR = 1 << 2;
        /// Every mode.
        const ALL = Self::DIFFUSE.bits() | Self::GLOSSY.bits() | Self::SPECULAR.bits();
    }
}

impl ScatteringMode {
    /// Whether diffuse scattering is included.
    pub fn has_diffuse(self) -> bool { self.contains(Self::DIFFUSE) }

    /// Whether glossy scattering is included.
    pub fn has_glossy(self) -> bool { self.contains(Self::GLOSSY) }

    /// Whether specular scattering is included.
    pub fn has_specular(self) -> bool { self.contains(Self::SPECULAR) }
}

/// First order derivatives of a direction with respect to the image plane.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RayDifferentials {
    /// Derivative along the horizontal screen axis.
    pub dx: Vec3,
    /// Derivative along the vertical screen axis.
    pub dy: Vec3,
}

/// The geometry a closure tree is prepared for.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ShadingPoint {
    /// Shading frame at the point.
    pub basis: ShadingBasis,
    /// Normal of the underlying geometry, in the parent frame.
    pub geometric_normal: Vec3,
}

impl Default for ShadingPoint {
    fn default() -> Self {
        Self {
            basis: ShadingBasis::IDENTITY,
            geometric_normal: Vec3::Y,
        }
    }
}

impl ShadingPoint {
    /// Shading point whose shading and geometric normals coincide with `n`.
    pub fn from_normal(n: Vec3) -> Self {
        Self {
            basis: ShadingBasis::from_normal(n),
            geometric_normal: n,
        }
    }
}

/// Input and result of [`Bsdf::sample`].
///
/// Directions point away from the surface and are expressed in the parent
/// frame of `basis`. A sample whose `mode` is empty was absorbed.
#[derive(Debug, Clone, PartialEq)]
pub struct BsdfSample {
    /// Shading frame of the scattering event.
    pub basis: ShadingBasis,
    /// Geometric normal of the scattering event.
    pub geometric_normal: Vec3,
    /// Direction towards the observer.
    pub outgoing: Vec3,
    /// Differentials of the outgoing direction, if tracked.
    pub outgoing_differentials: Option<RayDifferentials>,
    /// Sampled direction towards the light.
    pub incoming: Vec3,
    /// Differentials of the incoming direction.
    pub incoming_differentials: Option<RayDifferentials>,
    /// Value of the scattering function for the sampled pair.
    pub value: Spectrum,
    /// Density the incoming direction was chosen with.
    pub probability: f32,
    /// Kind of scattering that happened.
    pub mode: ScatteringMode,
}

impl BsdfSample {
    /// Creates a sample request for the given outgoing direction.
    pub fn new(basis: ShadingBasis, geometric_normal: Vec3, outgoing: Vec3) -> Self {
        Self {
            basis,
            geometric_normal,
            outgoing,
            outgoing_differentials: None,
            incoming: Vec3::ZERO,
            incoming_differentials: None,
            value: Spectrum::ZERO,
            probability: 0.0,
            mode: ScatteringMode::empty(),
        }
    }

    /// Creates a sample request at the given shading point.
    pub fn at(point: &ShadingPoint, outgoing: Vec3) -> Self {
        Self::new(point.basis, point.geometric_normal, outgoing)
    }

    /// Attaches differentials to the outgoing direction.
    pub fn with_differentials(mut self, differentials: RayDifferentials) -> Self {
        self.outgoing_differentials = Some(differentials);
        self
    }

    /// Whether the sample was absorbed.
    pub fn is_absorbed(&self) -> bool { self.mode.is_empty() }

    /// Derives the differentials of a mirror-like incoming direction from the
    /// outgoing ones, reflecting them about the shading normal.
    pub fn compute_reflected_differentials(&mut self) {
        let n = self.basis.normal;
        self.incoming_differentials = self.outgoing_differentials.map(|d| RayDifferentials {
            dx: reflect(d.dx, n),
            dy: reflect(d.dy, n),
        });
    }
}

/// Scattering capability of a closure model.
///
/// Models are stateless; everything specific to a shading point lives in the
/// prepared [`Bsdf::Inputs`], possibly referring to nested closures stored in
/// the same [`ClosureArena`].
///
/// Value conventions: `evaluate` writes the scattering function without the
/// cosine of the incoming direction unless `cosine_mult` is set, and returns
/// the density `sample` would pick `incoming` with. Densities are finite and
/// non-negative; degenerate geometry yields exact zeros.
pub trait Bsdf: Send + Sync {
    /// User facing parameters of the model.
    type Values;

    /// Per shading point data derived from the parameters.
    type Inputs;

    /// Name of the model.
    fn model(&self) -> &'static str;

    /// Identifier of the closure kind the model implements.
    fn closure_id(&self) -> ClosureId;

    /// Size in bytes of the prepared data.
    fn input_data_size(&self) -> usize { std::mem::size_of::<Self::Inputs>() }

    /// Derives the per shading point data, preparing nested closures into
    /// `arena` on the way.
    fn prepare_inputs(
        &self,
        arena: &mut ClosureArena,
        point: &ShadingPoint,
        values: &Self::Values,
    ) -> Self::Inputs;

    /// Samples an incoming direction for `sample.outgoing`.
    ///
    /// Leaves `sample.mode` empty when no direction could be produced.
    fn sample(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
        adjoint: bool,
        cosine_mult: bool,
        sample: &mut BsdfSample,
    );

    /// Evaluates the scattering function for a pair of directions.
    #[allow(clippy::too_many_arguments)]
    fn evaluate(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        adjoint: bool,
        cosine_mult: bool,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
        value: &mut Spectrum,
    ) -> f32;

    /// Density `sample` would pick `incoming` with.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_pdf(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> f32;

    /// Index of refraction of the medium below the surface.
    fn sample_ior(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
    ) -> f32;

    /// Fraction of light surviving `distance` inside the medium below the
    /// surface.
    fn compute_absorption(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        distance: f32,
        absorption: &mut Spectrum,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scattering_modes() {
        assert!(ScatteringMode::ALL.has_glossy());
        assert!(ScatteringMode::ALL.has_diffuse());
        assert!(!ScatteringMode::DIFFUSE.has_glossy());
        assert!((ScatteringMode::DIFFUSE | ScatteringMode::SPECULAR).has_specular());
    }

    #[test]
    fn reflected_differentials() {
        let mut sample = BsdfSample::new(ShadingBasis::IDENTITY, Vec3::Y, Vec3::Y);
        sample.compute_reflected_differentials();
        assert_eq!(sample.incoming_differentials, None);

        let mut sample = sample.with_differentials(RayDifferentials {
            dx: Vec3::new(0.1, 0.0, 0.0),
            dy: Vec3::new(0.0, 0.1, 0.2),
        });
        sample.compute_reflected_differentials();
        let d = sample.incoming_differentials.unwrap();
        assert!(d.dx.abs_diff_eq(Vec3::new(-0.1, 0.0, 0.0), 1.0e-6));
        assert!(d.dy.abs_diff_eq(Vec3::new(0.0, 0.1, -0.2), 1.0e-6));
        assert!(sample.is_absorbed());
    }
}
