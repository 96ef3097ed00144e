//! Closure trees: the per shading point description of how a surface
//! scatters light.
//!
//! A [`ClosureTree`] is plain data (usually read from a configuration file).
//! Before the scattering functions can be queried, the tree is prepared into a
//! [`ClosureArena`], each node turning into a [`PreparedClosure`] holding its
//! derived data and [`ClosureRef`] handles to its prepared children. The arena
//! lives for one shading evaluation; [`ClosureArena::reset`] drops every
//! prepared closure while keeping the allocation around for the next one.

use crate::{
    brdf::{
        LambertianBrdf, LambertianInputs, LambertianParams, MixBrdf, MixInputs, MixParams,
        SurfaceLayerBrdf, SurfaceLayerInputs, SurfaceLayerParams, LAMBERTIAN_BRDF, MIX_BRDF,
        SURFACE_LAYER_BRDF,
    },
    bsdf::{Bsdf, BsdfSample, ScatteringMode, ShadingPoint},
};
use base::{
    error::Error,
    math::{ShadingBasis, Vec3},
    sampling::SamplingContext,
    Spectrum,
};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Identifies the kind of a closure.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureId(pub u8);

impl ClosureId {
    /// Lambertian reflection.
    pub const LAMBERT: Self = Self(0);
    /// Glossy coat over a substrate closure.
    pub const SURFACE_LAYER: Self = Self(1);
    /// Weighted mixture of closures.
    pub const MIX: Self = Self(2);
}

impl Display for ClosureId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::LAMBERT => f.write_str("lambert"),
            Self::SURFACE_LAYER => f.write_str("surface_layer"),
            Self::MIX => f.write_str("mix"),
            Self(id) => write!(f, "closure#{id}"),
        }
    }
}

/// Description of the scattering at a shading point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ClosureTree {
    /// Lambertian reflection.
    Lambert(LambertianParams),
    /// Glossy coat over a substrate.
    SurfaceLayer(SurfaceLayerParams),
    /// Weighted mixture of closures.
    Mix(MixParams),
}

impl Default for ClosureTree {
    fn default() -> Self { ClosureTree::Lambert(LambertianParams::default()) }
}

impl ClosureTree {
    /// Identifier of the root closure.
    pub fn closure_id(&self) -> ClosureId {
        match self {
            ClosureTree::Lambert(_) => LAMBERTIAN_BRDF.closure_id(),
            ClosureTree::SurfaceLayer(_) => SURFACE_LAYER_BRDF.closure_id(),
            ClosureTree::Mix(_) => MIX_BRDF.closure_id(),
        }
    }

    /// Model name of the root closure.
    pub fn model(&self) -> &'static str {
        match self {
            ClosureTree::Lambert(_) => LAMBERTIAN_BRDF.model(),
            ClosureTree::SurfaceLayer(_) => SURFACE_LAYER_BRDF.model(),
            ClosureTree::Mix(_) => MIX_BRDF.model(),
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        match self {
            ClosureTree::Lambert(_) => 1,
            ClosureTree::SurfaceLayer(params) => 1 + params.substrate.node_count(),
            ClosureTree::Mix(params) => {
                1 + params
                    .components
                    .iter()
                    .map(|c| c.closure.node_count())
                    .sum::<usize>()
            },
        }
    }

    /// Checks every parameter of the tree.
    pub fn validate(&self) -> Result<(), Error> {
        match self {
            ClosureTree::Lambert(params) => params.validate(),
            ClosureTree::SurfaceLayer(params) => {
                params.validate()?;
                params.substrate.validate()
            },
            ClosureTree::Mix(params) => {
                params.validate()?;
                params
                    .components
                    .iter()
                    .try_for_each(|c| c.closure.validate())
            },
        }
    }
}

/// Handle to a closure prepared in a [`ClosureArena`].
///
/// Only valid until the arena is reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ClosureRef(u32);

impl ClosureRef {
    /// Position of the closure in its arena.
    pub fn index(&self) -> usize { self.0 as usize }
}

/// A closure together with the data derived for one shading point.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedClosure {
    /// Prepared Lambertian closure.
    Lambert(LambertianInputs),
    /// Prepared surface layer closure.
    SurfaceLayer(SurfaceLayerInputs),
    /// Prepared mixture.
    Mix(MixInputs),
}

impl PreparedClosure {
    /// Identifier of the closure kind.
    pub fn closure_id(&self) -> ClosureId {
        match self {
            PreparedClosure::Lambert(_) => LAMBERTIAN_BRDF.closure_id(),
            PreparedClosure::SurfaceLayer(_) => SURFACE_LAYER_BRDF.closure_id(),
            PreparedClosure::Mix(_) => MIX_BRDF.closure_id(),
        }
    }
}

/// Calls `$body` with the model singleton and the prepared data of a closure.
macro_rules! dispatch {
    ($arena:expr, $closure:expr, |$bsdf:ident, $data:ident| $body:expr) => {
        match $arena.get($closure) {
            PreparedClosure::Lambert($data) => {
                let $bsdf: &LambertianBrdf = &LAMBERTIAN_BRDF;
                $body
            },
            PreparedClosure::SurfaceLayer($data) => {
                let $bsdf: &SurfaceLayerBrdf = &SURFACE_LAYER_BRDF;
                $body
            },
            PreparedClosure::Mix($data) => {
                let $bsdf: &MixBrdf = &MIX_BRDF;
                $body
            },
        }
    };
}

/// Storage of the closures prepared for one shading evaluation.
#[derive(Debug, Default)]
pub struct ClosureArena {
    closures: Vec<PreparedClosure>,
}

impl ClosureArena {
    /// Creates an empty arena.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty arena with room for `capacity` closures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            closures: Vec::with_capacity(capacity),
        }
    }

    /// Number of prepared closures.
    pub fn len(&self) -> usize { self.closures.len() }

    /// Whether no closure has been prepared.
    pub fn is_empty(&self) -> bool { self.closures.is_empty() }

    /// Drops every prepared closure, invalidating outstanding handles.
    pub fn reset(&mut self) { self.closures.clear(); }

    /// Returns the prepared closure behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle does not come from this arena since its last
    /// reset.
    pub fn get(&self, closure: ClosureRef) -> &PreparedClosure { &self.closures[closure.index()] }

    /// Stores a prepared closure.
    pub fn push(&mut self, closure: PreparedClosure) -> ClosureRef {
        let handle = ClosureRef(self.closures.len() as u32);
        self.closures.push(closure);
        handle
    }

    /// Prepares a closure tree for the given shading point; children are
    /// prepared before their parent.
    pub fn prepare(&mut self, tree: &ClosureTree, point: &ShadingPoint) -> ClosureRef {
        let prepared = match tree {
            ClosureTree::Lambert(values) => {
                PreparedClosure::Lambert(LAMBERTIAN_BRDF.prepare_inputs(self, point, values))
            },
            ClosureTree::SurfaceLayer(values) => PreparedClosure::SurfaceLayer(
                SURFACE_LAYER_BRDF.prepare_inputs(self, point, values),
            ),
            ClosureTree::Mix(values) => {
                PreparedClosure::Mix(MIX_BRDF.prepare_inputs(self, point, values))
            },
        };
        self.push(prepared)
    }

    /// Samples the closure, see [`Bsdf::sample`].
    pub fn sample(
        &self,
        closure: ClosureRef,
        sampling: &mut SamplingContext,
        adjoint: bool,
        cosine_mult: bool,
        sample: &mut BsdfSample,
    ) {
        dispatch!(self, closure, |bsdf, data| bsdf.sample(
            self,
            data,
            sampling,
            adjoint,
            cosine_mult,
            sample
        ))
    }

    /// Evaluates the closure, see [`Bsdf::evaluate`].
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        closure: ClosureRef,
        adjoint: bool,
        cosine_mult: bool,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
        value: &mut Spectrum,
    ) -> f32 {
        dispatch!(self, closure, |bsdf, data| bsdf.evaluate(
            self,
            data,
            adjoint,
            cosine_mult,
            geometric_normal,
            basis,
            outgoing,
            incoming,
            modes,
            value
        ))
    }

    /// Density of sampling `incoming`, see [`Bsdf::evaluate_pdf`].
    pub fn evaluate_pdf(
        &self,
        closure: ClosureRef,
        geometric_normal: Vec3,
        basis: &ShadingBasis,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> f32 {
        dispatch!(self, closure, |bsdf, data| bsdf.evaluate_pdf(
            self,
            data,
            geometric_normal,
            basis,
            outgoing,
            incoming,
            modes
        ))
    }

    /// See [`Bsdf::sample_ior`].
    pub fn sample_ior(&self, closure: ClosureRef, sampling: &mut SamplingContext) -> f32 {
        dispatch!(self, closure, |bsdf, data| bsdf.sample_ior(self, data, sampling))
    }

    /// See [`Bsdf::compute_absorption`].
    pub fn compute_absorption(&self, closure: ClosureRef, distance: f32, absorption: &mut Spectrum) {
        dispatch!(self, closure, |bsdf, data| bsdf.compute_absorption(
            self, data, distance, absorption
        ))
    }
}

/// Owns the closure storage of one thread's shading evaluations.
///
/// Typical use: [`ShadingContext::prepare`] a tree at a shading point, query
/// it any number of times, then [`ShadingContext::reset`] before moving on to
/// the next point.
#[derive(Debug, Default)]
pub struct ShadingContext {
    arena: ClosureArena,
    point: ShadingPoint,
}

impl ShadingContext {
    /// Creates a context with an empty arena.
    pub fn new() -> Self { Self::default() }

    /// The closure storage.
    pub fn arena(&self) -> &ClosureArena { &self.arena }

    /// The shading point of the last preparation.
    pub fn point(&self) -> &ShadingPoint { &self.point }

    /// Prepares `tree` at `point`.
    pub fn prepare(&mut self, tree: &ClosureTree, point: &ShadingPoint) -> ClosureRef {
        self.point = *point;
        let root = self.arena.prepare(tree, point);
        log::trace!(
            "Prepared {} closure(s) rooted at {} ({})",
            self.arena.len(),
            tree.model(),
            root.index()
        );
        root
    }

    /// Ends the current shading evaluation.
    pub fn reset(&mut self) { self.arena.reset(); }

    /// Samples an incoming direction for `outgoing` (parent frame) at the
    /// prepared shading point.
    pub fn sample(
        &self,
        closure: ClosureRef,
        sampling: &mut SamplingContext,
        outgoing: Vec3,
    ) -> BsdfSample {
        let mut sample = BsdfSample::at(&self.point, outgoing);
        self.arena.sample(closure, sampling, false, false, &mut sample);
        sample
    }

    /// Evaluates the closure for a pair of directions in the parent frame,
    /// returning the value and the density.
    pub fn evaluate(
        &self,
        closure: ClosureRef,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> (Spectrum, f32) {
        let mut value = Spectrum::ZERO;
        let pdf = self.arena.evaluate(
            closure,
            false,
            false,
            self.point.geometric_normal,
            &self.point.basis,
            outgoing,
            incoming,
            modes,
            &mut value,
        );
        (value, pdf)
    }

    /// Density of sampling `incoming` given `outgoing`.
    pub fn evaluate_pdf(
        &self,
        closure: ClosureRef,
        outgoing: Vec3,
        incoming: Vec3,
        modes: ScatteringMode,
    ) -> f32 {
        self.arena.evaluate_pdf(
            closure,
            self.point.geometric_normal,
            &self.point.basis,
            outgoing,
            incoming,
            modes,
        )
    }

    /// See [`Bsdf::sample_ior`].
    pub fn sample_ior(&self, closure: ClosureRef, sampling: &mut SamplingContext) -> f32 {
        self.arena.sample_ior(closure, sampling)
    }

    /// See [`Bsdf::compute_absorption`].
    pub fn compute_absorption(&self, closure: ClosureRef, distance: f32) -> Spectrum {
        let mut absorption = Spectrum::ONE;
        self.arena.compute_absorption(closure, distance, &mut absorption);
        absorption
    }
}
