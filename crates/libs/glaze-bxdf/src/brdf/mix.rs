//! Weighted mixture of closures.

use crate::{
    bsdf::{Bsdf, BsdfSample, ScatteringMode, ShadingPoint},
    closure::{ClosureArena, ClosureId, ClosureRef, ClosureTree},
};
use base::{
    error::Error,
    math::{ShadingBasis, Vec3},
    sampling::SamplingContext,
    Spectrum,
};
use serde::{Deserialize, Serialize};

/// One weighted member of a mixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixComponent {
    /// Weight of the component, in `[0, 1]`.
    #[serde(default = "MixComponent::default_weight")]
    pub weight: f32,
    /// The component itself.
    pub closure: ClosureTree,
}

impl MixComponent {
    fn default_weight() -> f32 { 1.0 }
}

/// Parameters of a mixture.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MixParams {
    /// Members of the mixture.
    pub components: Vec<MixComponent>,
}

impl MixParams {
    /// Checks the weights; the components are checked by their own models.
    pub fn validate(&self) -> Result<(), Error> {
        if self.components.is_empty() {
            return Err(Error::InvalidClosure(
                "mix requires at least one component".to_string(),
            ));
        }
        self.components
            .iter()
            .try_for_each(|c| Error::check_range("weight", c.weight, 0.0, 1.0))
    }
}

/// A prepared mixture member.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MixedClosure {
    /// Weight normalised over the mixture.
    pub weight: f32,
    /// The prepared component.
    pub closure: ClosureRef,
}

/// Prepared mixture; weights sum to one unless the mixture is empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MixInputs {
    /// Members with a non-zero weight.
    pub components: Vec<MixedClosure>,
}

impl MixInputs {
    /// Picks a member with probability proportional to its weight.
    fn pick(&self, u: f32) -> Option<&MixedClosure> {
        let mut cdf = 0.0;
        for c in &self.components {
            cdf += c.weight;
            if u < cdf {
                return Some(c);
            }
        }
        // Rounding in the cdf.
        self.components.last()
    }
}

/// Mixture of closures.
#[derive(Debug, Copy, Clone, Default)]
pub struct MixBrdf;

/// Shared mixture model.
pub static MIX_BRDF: MixBrdf = MixBrdf;

impl Bsdf for MixBrdf {
    type Values = MixParams;
    type Inputs = MixInputs;

    fn model(&self) -> &'static str { "mix_brdf" }

    fn closure_id(&self) -> ClosureId { ClosureId::MIX }

    fn prepare_inputs(
        &self,
        arena: &mut ClosureArena,
        point: &ShadingPoint,
        values: &Self::Values,
    ) -> Self::Inputs {
        let total: f32 = values.components.iter().map(|c| c.weight.max(0.0)).sum();
        if total <= 0.0 {
            return MixInputs::default();
        }
        let components = values
            .components
            .iter()
            .filter(|c| c.weight > 0.0)
            .map(|c| MixedClosure {
                weight: c.weight / total,
                closure: arena.prepare(&c.closure, point),
            })
            .collect();
        MixInputs { components }
    }

    fn sample(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
        adjoint: bool,
        cosine_mult: bool,
        sample: &mut BsdfSample,
    ) {
        let Some(component) = data.pick(sampling.next_f32()) else {
            return;
        };
        arena.sample(component.closure, sampling, adjoint, cosine_mult, sample);
        if sample.is_absorbed() {
            return;
        }

        // One-sample estimate: the picked member stands for the whole mixture.
        sample.value *= component.weight;
        sample.probability *= component.weight;
    }

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
    ) -> f32 {
        value.set(0.0);
        let mut probability = 0.0;
        for c in &data.components {
            let mut component_value = Spectrum::ZERO;
            probability += c.weight
                * arena.evaluate(
                    c.closure,
                    adjoint,
                    cosine_mult,
                    geometric_normal,
                    basis,
                    outgoing,
                    incoming,
                    modes,
                    &mut component_value,
                );
            value.madd(&component_value, c.weight);
        }
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
        data.components
            .iter()
            .map(|c| {
                c.weight
                    * arena.evaluate_pdf(
                        c.closure,
                        geometric_normal,
                        basis,
                        outgoing,
                        incoming,
                        modes,
                    )
            })
            .sum()
    }

    fn sample_ior(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        sampling: &mut SamplingContext,
    ) -> f32 {
        match data.pick(sampling.next_f32()) {
            Some(c) => arena.sample_ior(c.closure, sampling),
            None => 1.0,
        }
    }

    fn compute_absorption(
        &self,
        arena: &ClosureArena,
        data: &Self::Inputs,
        distance: f32,
        absorption: &mut Spectrum,
    ) {
        if data.components.is_empty() {
            absorption.set(1.0);
            return;
        }
        let mut total = Spectrum::ZERO;
        for c in &data.components {
            let mut component = Spectrum::ONE;
            arena.compute_absorption(c.closure, distance, &mut component);
            total.madd(&component, c.weight);
        }
        *absorption = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{brdf::LambertianParams, ShadingContext};
    use base::math::sph_to_cart;
    use std::f32::consts::FRAC_1_PI;

    fn lambert(r: f32) -> ClosureTree {
        ClosureTree::Lambert(LambertianParams {
            reflectance: Spectrum::splat(r),
        })
    }

    fn mix(weights: &[(f32, f32)]) -> ClosureTree {
        ClosureTree::Mix(MixParams {
            components: weights
                .iter()
                .map(|&(weight, r)| MixComponent {
                    weight,
                    closure: lambert(r),
                })
                .collect(),
        })
    }

    #[test]
    fn weights_are_normalised() {
        let mut arena = ClosureArena::new();
        let tree = mix(&[(0.25, 0.2), (0.75, 0.6), (0.0, 1.0)]);
        let root = arena.prepare(&tree, &ShadingPoint::default());
        match arena.get(root) {
            crate::closure::PreparedClosure::Mix(inputs) => {
                assert_eq!(inputs.components.len(), 2);
                let total: f32 = inputs.components.iter().map(|c| c.weight).sum();
                approx::assert_relative_eq!(total, 1.0, epsilon = 1e-6);
            },
            other => panic!("unexpected closure {other:?}"),
        }

        let tree = mix(&[(0.5, 0.2), (0.5, 0.6)]);
        let root = arena.prepare(&tree, &ShadingPoint::default());
        let wo = sph_to_cart(0.4, 0.0);
        let mut value = Spectrum::ZERO;
        let pdf = arena.evaluate(
            root,
            false,
            false,
            Vec3::Y,
            &ShadingBasis::IDENTITY,
            wo,
            Vec3::Y,
            ScatteringMode::ALL,
            &mut value,
        );
        approx::assert_relative_eq!(value[1], 0.4 * FRAC_1_PI, epsilon = 1e-6);
        approx::assert_relative_eq!(pdf, FRAC_1_PI, epsilon = 1e-6);
    }

    #[test]
    fn samples_stand_for_the_picked_member() {
        let mut ctx = ShadingContext::new();
        let root = ctx.prepare(&mix(&[(0.3, 0.1), (0.6, 0.9)]), &ShadingPoint::default());
        let mut sampling = SamplingContext::new(3);
        let wo = sph_to_cart(0.8, 1.3);
        let (mut dark, mut bright) = (0usize, 0usize);
        let n = 4096;
        for _ in 0..n {
            let sample = ctx.sample(root, &mut sampling, wo);
            assert!(!sample.is_absorbed());
            let cos_in = sample.incoming.y.abs();
            let throughput = sample.value[0] * cos_in / sample.probability;
            if (throughput - 0.1).abs() < 1e-4 {
                dark += 1;
                approx::assert_relative_eq!(
                    sample.probability,
                    cos_in * FRAC_1_PI / 3.0,
                    max_relative = 1e-5
                );
            } else {
                approx::assert_relative_eq!(throughput, 0.9, max_relative = 1e-4);
                bright += 1;
            }
        }
        assert_eq!(dark + bright, n);
        let fraction = dark as f32 / n as f32;
        assert!((0.3..0.37).contains(&fraction), "dark fraction {fraction}");
    }

    #[test]
    fn empty_mixture_absorbs() {
        let mut ctx = ShadingContext::new();
        let root = ctx.prepare(&mix(&[(0.0, 0.5)]), &ShadingPoint::default());
        let mut sampling = SamplingContext::new(3);
        assert!(ctx.sample(root, &mut sampling, Vec3::Y).is_absorbed());
        let (value, pdf) = ctx.evaluate(root, Vec3::Y, Vec3::Y, ScatteringMode::ALL);
        assert!(value.is_zero());
        assert_eq!(pdf, 0.0);
        assert_eq!(ctx.compute_absorption(root, 1.0), Spectrum::ONE);
        assert!(mix(&[]).validate().is_err());
        assert!(mix(&[(1.5, 0.5)]).validate().is_err());
    }
}
