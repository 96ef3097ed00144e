//! Glossy coat layered over an arbitrary substrate closure.
//!
//! The coat is a rough dielectric or conductor interface described by a
//! microfacet distribution. Light either reflects off the coat or reaches
//! the substrate; the two paths are combined as a mixture whose weight is the
//! Fresnel reflectance of the coat, saturated to `[0, 1]`:
//!
//! $$f = f_{coat} + (1 - w(h)) f_{substrate}$$
//!
//! with $w(h) = \min(1, \max_\lambda F_\lambda(\omega_o \cdot h))$.

use crate::{
    bsdf::{Bsdf, BsdfSample, ScatteringMode, ShadingPoint},
    closure::{ClosureArena, ClosureId, ClosureRef, ClosureTree},
    distro::{pick_distro, MicrofacetDistribution, MicrofacetDistroKind},
};
use base::{
    error::Error,
    math::{improve_normalization, lerp, reflect, saturate, sqr, ShadingBasis, Vec3},
    optics::fresnel,
    sampling::SamplingContext,
    Spectrum, Symmetry,
};
use serde::{Deserialize, Serialize};

/// Smallest roughness parameter handed to the distributions; keeps the peak
/// of the NDF well inside the f32 range. Only roughness under ~3e-4 is
/// affected.
pub const MIN_ALPHA: f32 = 1.0e-7;

/// How the coat reflects light.
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FresnelMode {
    /// Dielectric coat described by its index of refraction.
    #[default]
    Dielectric,
    /// Metallic coat described by its normal reflectance and edge tint.
    #[serde(alias = "metallic")]
    Conductor,
}

/// Parameters of the surface layer model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceLayerParams {
    /// Perceptual roughness of the coat, in `[0, 1]`.
    pub roughness: f32,
    /// Stretch of the highlight along the tangent (< 0.5) or the bitangent
    /// (> 0.5); 0.5 is isotropic.
    pub anisotropy: f32,
    /// Microfacet distribution of the coat.
    pub distribution: MicrofacetDistroKind,
    /// Reflection behaviour of the coat.
    pub fresnel_mode: FresnelMode,
    /// Tint multiplied onto the Fresnel reflectance.
    pub reflectance: Spectrum,
    /// Index of refraction of a dielectric coat.
    pub ior: f32,
    /// Reflectance at normal incidence of a conductor coat.
    pub normal_reflectance: Spectrum,
    /// Reflectance towards grazing angles of a conductor coat.
    pub edge_tint: Spectrum,
    /// What lies beneath the coat.
    pub substrate: Box<ClosureTree>,
}

impl Default for SurfaceLayerParams {
    fn default() -> Self {
        Self {
            roughness: 0.1,
            anisotropy: 0.5,
            distribution: MicrofacetDistroKind::Beckmann,
            fresnel_mode: FresnelMode::Dielectric,
            reflectance: Spectrum::ONE,
            ior: 1.5,
            normal_reflectance: Spectrum::splat(0.9),
            edge_tint: Spectrum::ONE,
            substrate: Box::default(),
        }
    }
}

impl SurfaceLayerParams {
    /// Checks the coat parameters; the substrate is checked by its own model.
    pub fn validate(&self) -> Result<(), Error> {
        Error::check_range("roughness", self.roughness, 0.0, 1.0)?;
        Error::check_range("anisotropy", self.anisotropy, 0.0, 1.0)?;
        Error::check_range("ior", self.ior, 0.0, f32::MAX)?;
        if self.ior == 0.0 {
            return Err(Error::InvalidParameter {
                name: "ior",
                value: self.ior,
                reason: "must be positive",
            });
        }
        for i in 0..3 {
            Error::check_range("reflectance", self.reflectance[i], 0.0, f32::MAX)?;
            Error::check_range("normal_reflectance", self.normal_reflectance[i], 0.0, 1.0)?;
            Error::check_range("edge_tint", self.edge_tint[i], 0.0, 1.0)?;
        }
        Ok(())
    }
}

/// Maps roughness and anisotropy to the roughness parameters of the
/// distribution along the tangent and the bitangent.
pub fn compute_alphas(roughness: f32, anisotropy: f32) -> (f32, f32) {
    let alpha = sqr(roughness).max(MIN_ALPHA);
    if anisotropy == 0.5 {
        return (alpha, alpha);
    }
    let t = sqr(2.0 * anisotropy - 1.0);
    if anisotropy < 0.5 {
        (lerp(alpha, 1.0, t), alpha)
    } else {
        (alpha, lerp(alpha, 1.0, t))
    }
}

/// Prepared surface layer closure.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLayerInputs {
    /// Roughness of the distribution along the tangent.
    pub alpha_x: f32,
    /// Roughness of the distribution along the bitangent.
    pub alpha_y: f32,
    /// Microfacet distribution of the coat.
    pub distribution: MicrofacetDistroKind,
    /// Reflection behaviour of the coat.
    pub fresnel_mode: FresnelMode,
    /// Tint multiplied onto the Fresnel reflectance.
    pub reflectance: Spectrum,
    /// Index of refraction of a dielectric coat.
    pub ior: f32,
    /// Reflectance at normal incidence of a conductor coat.
    pub normal_reflectance: Spectrum,
    /// Reflectance towards grazing angles of a conductor coat.
    pub edge_tint: Spectrum,
    /// The prepared substrate.
    pub substrate: ClosureRef,
}

impl SurfaceLayerInputs {
    /// Whether the coat highlight is isotropic.
    pub fn symmetry(&self) -> Symmetry { Symmetry::from_alphas(self.alpha_x, self.alpha_y) }

    fn distro(&self) -> &'static dyn MicrofacetDistribution { pick_distro(self.distribution) }
}

/// Fresnel reflectance of the coat at microfacet `m` seen from `wo`, written
/// into `value`. Returns the probability of reflecting off the coat.
pub fn fresnel_term(data: &SurfaceLayerInputs, wo: Vec3, m: Vec3, value: &mut Spectrum) -> f32 {
    let wo = if wo.y < 0.0 { -wo } else { wo };
    let cos_om = wo.dot(m).min(1.0);
    *value = match data.fresnel_mode {
        FresnelMode::Dielectric => {
            data.reflectance * fresnel::reflectance_dielectric_eta(cos_om, 1.0 / data.ior)
        },
        FresnelMode::Conductor => {
            data.normal_reflectance
                .zip_map(data.edge_tint, |r, g| {
                    fresnel::artist_friendly_conductor(cos_om, r, g)
                })
                * data.reflectance
        },
    };
    saturate(value.max_value())
}

/// Half vector of a reflection pair, in the upper hemisphere.
pub fn half_reflection_vector(wi: Vec3, wo: Vec3) -> Vec3 {
    let h = (wi + wo).normalize_or_zero();
    if h.y < 0.0 {
        -h
    } else {
        h
    }
}

/// Multiplies the Fresnel reflectance in `value` by the microfacet terms of
/// the coat reflection.
fn evaluate_reflection(
    data: &SurfaceLayerInputs,
    distro: &dyn MicrofacetDistribution,
    wi: Vec3,
    wo: Vec3,
    m: Vec3,
    value: &mut Spectrum,
) {
    let denom = (4.0 * wo.y * wi.y).abs();
    if denom == 0.0 {
        value.set(0.0);
        return;
    }
    let d = distro.eval_ndf(m, data.alpha_x, data.alpha_y);
    let g = distro.eval_msf(wi, wo, m, data.alpha_x, data.alpha_y);
    *value *= d * g / denom;
}

/// Density of the coat reflection: the density of the microfacet normal
/// times the Jacobian of the reflection mapping.
fn reflection_pdf(
    data: &SurfaceLayerInputs,
    distro: &dyn MicrofacetDistribution,
    wo: Vec3,
    m: Vec3,
) -> f32 {
    let cos_om = wo.dot(m);
    if cos_om == 0.0 {
        return 0.0;
    }
    let jacobian = 1.0 / (4.0 * cos_om.abs());
    jacobian * distro.pdf(wo, m, data.alpha_x, data.alpha_y)
}

/// Glossy coat over a substrate closure.
#[derive(Debug, Copy, Clone, Default)]
pub struct SurfaceLayerBrdf;

/// Shared surface layer model.
pub static SURFACE_LAYER_BRDF: SurfaceLayerBrdf = SurfaceLayerBrdf;

impl SurfaceLayerBrdf {
    /// Display name of the model.
    pub const LABEL: &'static str = "Surface Layer BRDF";
}

impl Bsdf for SurfaceLayerBrdf {
    type Values = SurfaceLayerParams;
    type Inputs = SurfaceLayerInputs;

    fn model(&self) -> &'static str { "surface_layer_brdf" }

    fn closure_id(&self) -> ClosureId { ClosureId::SURFACE_LAYER }

    fn prepare_inputs(
        &self,
        arena: &mut ClosureArena,
        point: &ShadingPoint,
        values: &Self::Values,
    ) -> Self::Inputs {
        let (alpha_x, alpha_y) = compute_alphas(values.roughness, values.anisotropy);
        let substrate = arena.prepare(&values.substrate, point);
        log::trace!(
            "{}: {} coat, α = ({alpha_x}, {alpha_y}), substrate {}",
            Self::LABEL,
            values.distribution,
            values.substrate.model()
        );
        SurfaceLayerInputs {
            alpha_x,
            alpha_y,
            distribution: values.distribution,
            fresnel_mode: values.fresnel_mode,
            reflectance: values.reflectance,
            ior: values.ior,
            normal_reflectance: values.normal_reflectance,
            edge_tint: values.edge_tint,
            substrate,
        }
    }

    fn sample(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
        adjoint: bool,
        _cosine_mult: bool,
        sample: &mut BsdfSample,
    ) {
        let basis = sample.basis;
        let wo = basis.to_local(sample.outgoing);

        // Compute the microfacet normal by sampling the distribution.
        let distro = data.distro();
        let s = sampling.next_array::<4>();
        let m = distro.sample(wo, [s[0], s[1], s[2]], data.alpha_x, data.alpha_y);

        // Choose between layer and substrate.
        let mut fresnel = Spectrum::ZERO;
        let layer_probability = fresnel_term(data, wo, m, &mut fresnel);

        if s[3] < layer_probability {
            let wi = improve_normalization(reflect(wo, m));
            if wi.y * wo.y <= 0.0 {
                return;
            }
            let pdf = reflection_pdf(data, distro, wo, m);
            if pdf == 0.0 {
                return;
            }

            evaluate_reflection(data, distro, wi, wo, m, &mut fresnel);
            sample.value = fresnel;
            sample.probability = layer_probability * pdf;
            sample.mode = ScatteringMode::GLOSSY;
            sample.incoming = basis.to_parent(wi);
            sample.compute_reflected_differentials();
        } else {
            // The substrate is never asked to multiply by the cosine.
            arena.sample(data.substrate, sampling, adjoint, false, sample);
            if sample.is_absorbed() {
                return;
            }

            // Scaling the density by (1 - F(m)) cancels the chance of taking this branch;
            // the value gets the (1 - F(h)) weight `evaluate` applies.
            sample.probability *= 1.0 - layer_probability;
            let wi = basis.to_local(sample.incoming);
            if wi.y * wo.y >= 0.0 {
                let h = half_reflection_vector(wi, wo);
                let mut unused = Spectrum::ZERO;
                let layer_weight = fresnel_term(data, wo, h, &mut unused);
                sample.value *= 1.0 - layer_weight;
            }
        }
    }

    fn evaluate(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        adjoint: bool,
        _cosine_mult: bool,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
        value: &mut Spectrum,
    ) -> f32 {
        let wi = basis.to_local(incoming);
        let wo = basis.to_local(outgoing);

        if !modes.has_glossy() || wi.y * wo.y < 0.0 {
            return arena.evaluate(
                data.substrate,
                adjoint,
                false,
                geometric_normal,
                basis,
                outgoing,
                incoming,
                modes,
                value,
            );
        }

        let m = half_reflection_vector(wi, wo);
        let layer_weight = fresnel_term(data, wo, m, value);

        let distro = data.distro();
        evaluate_reflection(data, distro, wi, wo, m, value);

        let mut probability = layer_weight * reflection_pdf(data, distro, wo, m);

        let mut substrate_value = Spectrum::ZERO;
        let substrate_weight = 1.0 - layer_weight;

        probability += arena.evaluate(
            data.substrate,
            adjoint,
            false,
            geometric_normal,
            basis,
            outgoing,
            incoming,
            modes,
            &mut substrate_value,
        ) * substrate_weight;

        value.madd(&substrate_value, substrate_weight);
        probability
    }

    fn evaluate_pdf(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> f32 {
        let wi = basis.to_local(incoming);
        let wo = basis.to_local(outgoing);

        if !modes.has_glossy() || wi.y * wo.y < 0.0 {
            return arena.evaluate_pdf(
                data.substrate,
                geometric_normal,
                basis,
                outgoing,
                incoming,
                modes,
            );
        }

        let m = half_reflection_vector(wi, wo);
        let mut fresnel = Spectrum::ZERO;
        let layer_probability = fresnel_term(data, wo, m, &mut fresnel);

        let distro = data.distro();
        let probability = layer_probability * reflection_pdf(data, distro, wo, m);

        probability
            + arena.evaluate_pdf(
                data.substrate,
                geometric_normal,
                basis,
                outgoing,
                incoming,
                modes,
            ) * (1.0 - layer_probability)
    }

    fn sample_ior(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
    ) -> f32 {
        arena.sample_ior(data.substrate, sampling)
    }

    fn compute_absorption(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        distance: f32,
        absorption: &mut Spectrum,
    ) {
        arena.compute_absorption(data.substrate, distance, absorption);
    }
}
