//! Lambertian BRDF model.

use crate::{
    bsdf::{Bsdf, BsdfSample, ScatteringMode, ShadingPoint},
    closure::{ClosureArena, ClosureId},
};
use base::{
    error::Error,
    math::{same_hemisphere, ShadingBasis, Vec3},
    sampling::SamplingContext,
    Spectrum,
};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_1_PI, PI};

/// Parameters of the Lambertian model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LambertianParams {
    /// Reflectance of the surface, i.e. the fraction of light that is
    /// reflected.
    pub reflectance: Spectrum,
}

impl Default for LambertianParams {
    fn default() -> Self {
        Self {
            reflectance: Spectrum::splat(0.8),
        }
    }
}

impl LambertianParams {
    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), Error> {
        (0..3).try_for_each(|i| Error::check_range("reflectance", self.reflectance[i], 0.0, 1.0))
    }
}

/// Prepared Lambertian closure.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LambertianInputs {
    /// Reflectance of the surface.
    pub reflectance: Spectrum,
}

/// Lambertian BRDF model.
#[derive(Debug, Copy, Clone, Default)]
pub struct LambertianBrdf;

/// Shared Lambertian model.
pub static LAMBERTIAN_BRDF: LambertianBrdf = LambertianBrdf;

impl Bsdf for LambertianBrdf {
    type Values = LambertianParams;
    type Inputs = LambertianInputs;

    fn model(&self) -> &'static str { "lambertian_brdf" }

    fn closure_id(&self) -> ClosureId { ClosureId::LAMBERT }

    fn prepare_inputs(
        &self,
        _arena: &mut ClosureArena,
        _point: &ShadingPoint,
        values: &Self::Values,
    ) -> Self::Inputs {
        LambertianInputs {
            reflectance: values.reflectance,
        }
    }

    fn sample(
        &self,
        _arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
        _adjoint: bool,
        cosine_mult: bool,
        sample: &mut BsdfSample,
    ) {
        let wo = sample.basis.to_local(sample.outgoing);
        if wo.y == 0.0 {
            return;
        }

        // Cosine-weighted direction on the side of the outgoing direction.
        let [u0, u1] = sampling.next_array::<2>();
        let r = u0.sqrt();
        let (sin_phi, cos_phi) = (2.0 * PI * u1).sin_cos();
        let cos_theta = (1.0 - u0).max(0.0).sqrt();
        if cos_theta == 0.0 {
            return;
        }
        let wi = Vec3::new(r * cos_phi, cos_theta.copysign(wo.y), r * sin_phi);

        sample.value = data.reflectance * FRAC_1_PI;
        if cosine_mult {
            sample.value *= cos_theta;
        }
        sample.probability = cos_theta * FRAC_1_PI;
        sample.mode = ScatteringMode::DIFFUSE;
        sample.incoming = sample.basis.to_parent(wi);
        sample.incoming_differentials = None;
    }

    fn evaluate(
        &self,
        _arena: &ClosureArena,
        data: &Self::Inputs,
        _adjoint: bool,
        cosine_mult: bool,
        _geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
        value: &mut Spectrum,
    ) -> f32 {
        let wo = basis.to_local(outgoing);
        let wi = basis.to_local(incoming);
        if !modes.has_diffuse() || !same_hemisphere(&wo, &wi) {
            value.set(0.0);
            return 0.0;
        }
        let cos_in = wi.y.abs();
        *value = data.reflectance * FRAC_1_PI;
        if cosine_mult {
            *value *= cos_in;
        }
        cos_in * FRAC_1_PI
    }

    fn evaluate_pdf(
        &self,
        _arena: &ClosureArena,
        _data: &Self::Inputs,
        _geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> f32 {
        let wo = basis.to_local(outgoing);
        let wi = basis.to_local(incoming);
        if !modes.has_diffuse() || !same_hemisphere(&wo, &wi) {
            return 0.0;
        }
        wi.y.abs() * FRAC_1_PI
    }

    fn sample_ior(
        &self,
        _arena: &ClosureArena,
        _data: &Self::Inputs,
        _sampling: &mut SamplingContext,
    ) -> f32 {
        1.0
    }

    fn compute_absorption(
        &self,
        _arena: &ClosureArena,
        _data: &Self::Inputs,
        _distance: f32,
        absorption: &mut Spectrum,
    ) {
        absorption.set(1.0);
    }
}
