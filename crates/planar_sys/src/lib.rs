//! Raw C ABI surface of the planar2d native physics engine
//!
//! This crate mirrors the records, callback signatures, and entry points of
//! the native library exactly as the C headers declare them. Everything here
//! is layout-sensitive: each `#[repr(C)]` record matches the native struct
//! byte for byte, including trailing padding.
//!
//! # Linking
//!
//! With the `native` feature enabled we link against `libplanar2d` and every
//! entry point goes straight to the engine. Without it (the default) the
//! same functions are served by an in-process bookkeeping double, so the
//! crate compiles and its consumers' tests run on any host. The double
//! allocates identifiers with the same index/revision scheme as the engine;
//! it does not simulate contacts or solve constraints.

mod types;

#[cfg(feature = "native")]
mod ffi;
#[cfg(not(feature = "native"))]
mod stub;

// Entry points live at the crate root, whichever backing serves them.
#[cfg(feature = "native")]
pub use ffi::*;
#[cfg(not(feature = "native"))]
pub use stub::*;

pub use types::{
    BodyDefRaw, BodyId, BodyMoveEvent, CastResultFn, ChainDefRaw, ChainId, Circle,
    CustomFilterFn, DistanceJointDefRaw, Filter, JointId, Manifold, ManifoldPoint, MoveEvents,
    OverlapResultFn, PreSolveFn, Rot, Segment, ShapeDefRaw, ShapeId, Transform, Vec2, Version,
    WorldDefRaw, WorldId, Aabb,
};

/// Body motion model, as the native engine encodes it.
pub mod body_type {
    pub const STATIC: i32 = 0;
    pub const KINEMATIC: i32 = 1;
    pub const DYNAMIC: i32 = 2;
}
