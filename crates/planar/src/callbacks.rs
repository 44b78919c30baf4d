//! Callback trampolines
//!
//! Each callback family pairs a Rust trait with an `extern "C"` shim whose
//! signature matches the engine's function-pointer type. The shim receives a
//! context pointer, recovers the managed callback and the owning world's
//! registry from it, resolves the involved shape identifiers, and forwards
//! the call.
//!
//! # Scope
//!
//! Two lifetimes exist, chosen by construction rather than checked at
//! runtime (the engine offers no detection; a dangling trampoline is
//! undefined behavior on the native side):
//!
//! - **Query scope**: [`CastScope`]/[`OverlapScope`] live on the caller's
//!   stack for the duration of one blocking query call. The borrow checker
//!   makes outliving that call impossible.
//! - **World scope**: [`FilterSlot`]/[`PreSolveSlot`] are boxed, owned by the
//!   `World`, and deregistered from the engine before they drop.
//!
//! Custom-filter and pre-solve callbacks may arrive on engine worker threads
//! during one blocking step call, so those hooks are `Send + Sync` and must
//! not mutate the simulation from inside the callback. The shims themselves
//! add no locking of their own beyond the registry read, which is
//! uncontended during a step. A panic that reaches a shim aborts the
//! process; keep hooks panic-free.

use crate::registry::{InstanceRegistry, SharedRegistry};
use crate::shape::Shape;
use planar_sys::{Manifold, ShapeId, Vec2};
use std::ffi::c_void;
use std::sync::Arc;

/// What a cast-result handler wants done with the cast
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CastDecision {
    /// Skip this hit and continue
    Ignore,
    /// Stop the cast immediately
    Terminate,
    /// Keep this hit and continue unclipped
    Accept,
    /// Keep this hit and clip the cast to the given fraction
    Clip(f32),
}

impl CastDecision {
    /// Raw protocol: -1 ignore, 0 terminate, 1 accept, (0, 1) clip
    pub(crate) fn to_raw(self) -> f32 {
        match self {
            CastDecision::Ignore => -1.0,
            CastDecision::Terminate => 0.0,
            CastDecision::Accept => 1.0,
            CastDecision::Clip(fraction) => fraction.clamp(f32::EPSILON, 1.0),
        }
    }
}

/// One resolved hit along a ray or shape cast
#[derive(Clone, Debug)]
pub struct CastHit {
    /// Absent when the shape was destroyed since the engine buffered it
    pub shape: Option<Arc<Shape>>,
    /// Hit point in world space
    pub point: Vec2,
    /// Surface normal at the hit point
    pub normal: Vec2,
    /// Fraction along the cast translation, in [0, 1]
    pub fraction: f32,
}

/// Receives ray/shape-cast hits during a query call
pub trait CastResultHandler {
    fn on_hit(&mut self, hit: CastHit) -> CastDecision;
}

impl<F: FnMut(CastHit) -> CastDecision> CastResultHandler for F {
    fn on_hit(&mut self, hit: CastHit) -> CastDecision {
        self(hit)
    }
}

/// Receives overlapping shapes during an overlap query; return false to
/// terminate the query early.
pub trait OverlapHandler {
    fn on_overlap(&mut self, shape: Option<Arc<Shape>>) -> bool;
}

impl<F: FnMut(Option<Arc<Shape>>) -> bool> OverlapHandler for F {
    fn on_overlap(&mut self, shape: Option<Arc<Shape>>) -> bool {
        self(shape)
    }
}

/// Pair filter installed on a world; return false to disable collision
/// between the pair. May be invoked from engine worker threads.
pub trait CustomFilter: Send + Sync {
    fn should_collide(&self, shape_a: Option<Arc<Shape>>, shape_b: Option<Arc<Shape>>) -> bool;
}

impl<F> CustomFilter for F
where
    F: Fn(Option<Arc<Shape>>, Option<Arc<Shape>>) -> bool + Send + Sync,
{
    fn should_collide(&self, shape_a: Option<Arc<Shape>>, shape_b: Option<Arc<Shape>>) -> bool {
        self(shape_a, shape_b)
    }
}

/// Contact inspection installed on a world; return false to disable the
/// contact for this step only. May be invoked from engine worker threads.
pub trait PreSolve: Send + Sync {
    fn pre_solve(
        &self,
        shape_a: Option<Arc<Shape>>,
        shape_b: Option<Arc<Shape>>,
        manifold: &Manifold,
    ) -> bool;
}

impl<F> PreSolve for F
where
    F: Fn(Option<Arc<Shape>>, Option<Arc<Shape>>, &Manifold) -> bool + Send + Sync,
{
    fn pre_solve(
        &self,
        shape_a: Option<Arc<Shape>>,
        shape_b: Option<Arc<Shape>>,
        manifold: &Manifold,
    ) -> bool {
        self(shape_a, shape_b, manifold)
    }
}

// ---------------------------------------------------------------------------
// Query scope: stack-owned context for one blocking query call
// ---------------------------------------------------------------------------

pub(crate) struct CastScope<'a> {
    pub(crate) registry: &'a InstanceRegistry,
    pub(crate) handler: &'a mut dyn CastResultHandler,
}

pub(crate) extern "C" fn cast_result_shim(
    shape: ShapeId,
    point: Vec2,
    normal: Vec2,
    fraction: f32,
    context: *mut c_void,
) -> f32 {
    // Safety: context points at the CastScope the query call placed on its
    // stack; the engine only invokes this inside that call.
    let scope = unsafe { &mut *(context as *mut CastScope) };
    let shape = scope.registry.lookup_shape(shape);
    scope
        .handler
        .on_hit(CastHit {
            shape,
            point,
            normal,
            fraction,
        })
        .to_raw()
}

pub(crate) struct OverlapScope<'a> {
    pub(crate) registry: &'a InstanceRegistry,
    pub(crate) handler: &'a mut dyn OverlapHandler,
}

pub(crate) extern "C" fn overlap_result_shim(shape: ShapeId, context: *mut c_void) -> bool {
    // Safety: as for cast_result_shim.
    let scope = unsafe { &mut *(context as *mut OverlapScope) };
    let shape = scope.registry.lookup_shape(shape);
    scope.handler.on_overlap(shape)
}

// ---------------------------------------------------------------------------
// World scope: boxed slots owned by the World for its whole lifetime
// ---------------------------------------------------------------------------

pub(crate) struct FilterSlot {
    pub(crate) registry: SharedRegistry,
    pub(crate) hook: Box<dyn CustomFilter>,
}

pub(crate) extern "C" fn custom_filter_shim(
    shape_a: ShapeId,
    shape_b: ShapeId,
    context: *mut c_void,
) -> bool {
    // Safety: context points at the FilterSlot boxed inside the World; the
    // World deregisters the pointer before dropping the slot.
    let slot = unsafe { &*(context as *const FilterSlot) };
    let registry = slot
        .registry
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.hook
        .should_collide(registry.lookup_shape(shape_a), registry.lookup_shape(shape_b))
}

pub(crate) struct PreSolveSlot {
    pub(crate) registry: SharedRegistry,
    pub(crate) hook: Box<dyn PreSolve>,
}

pub(crate) extern "C" fn pre_solve_shim(
    shape_a: ShapeId,
    shape_b: ShapeId,
    manifold: *const Manifold,
    context: *mut c_void,
) -> bool {
    // Safety: as for custom_filter_shim; the manifold pointer is only valid
    // for the duration of this call, so it is copied out.
    let slot = unsafe { &*(context as *const PreSolveSlot) };
    let manifold = unsafe { manifold.as_ref() }.copied().unwrap_or_default();
    let registry = slot
        .registry
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    slot.hook.pre_solve(
        registry.lookup_shape(shape_a),
        registry.lookup_shape(shape_b),
        &manifold,
    )
}
