//! Planar - Safe Rust binding for the planar2d native 2D physics engine
//!
//! The engine simulates; this crate correlates. Its job is the identity and
//! memory layer between Rust and the native library:
//!
//! - a per-world **registry** mapping opaque native identifiers to shared
//!   wrapper objects, for bodies, shapes, chain shapes, and joints
//! - **fixed-layout record access** for everything crossing the boundary
//!   (via [`planar_wire`])
//! - **callback trampolines** that expose Rust callbacks through the
//!   engine's function-pointer signatures, with scopes that make dangling
//!   pointers unrepresentable
//! - a **buffered move-event decoder** turning the engine's per-step array
//!   into resolved [`MoveEvent`] values
//!
//! # Data flow
//!
//! ```text
//! World::new ──────────► registry maps allocated
//! create_body/shape ───► engine id ──► wrapper registered
//! World::step ─────────► engine runs; trampolines resolve ids ──┐
//!                                 (filter / pre-solve / query)  │
//! move_events ─────────► decode array ──► lookup ──► handler ◄──┘
//! World::destroy ──────► engine world freed; all maps cleared
//! ```
//!
//! # Example
//!
//! ```
//! use planar::{BodyDef, ShapeDef, ShapeGeometry, Vec2, World, WorldDef};
//!
//! let mut world = World::new(&WorldDef::default())?;
//! let ball = world.create_body(&BodyDef::dynamic().with_position(Vec2::new(0.0, 10.0)))?;
//! world.create_shape(
//!     &ball,
//!     &ShapeDef::default(),
//!     ShapeGeometry::Circle { center: Vec2::ZERO, radius: 0.5 },
//! )?;
//! world.step_and_collect(1.0 / 60.0, 4, |event| {
//!     if let Some(body) = &event.body {
//!         println!("{:?} moved to {:?}", body.raw_id(), event.transform.p);
//!     }
//! });
//! # Ok::<(), planar::Error>(())
//! ```
//!
//! # Threading
//!
//! The binding owns no threads. Steps, queries, and decodes block the
//! calling thread; the engine may invoke installed custom-filter and
//! pre-solve hooks from its own worker threads *during* a step, which is
//! why those hooks are `Send + Sync` and must not mutate the world.

mod body;
mod callbacks;
mod error;
mod events;
mod joint;
mod registry;
mod shape;
mod version;
mod world;

pub use body::{Body, BodyDef, BodyType};
pub use callbacks::{
    CastDecision, CastHit, CastResultHandler, CustomFilter, OverlapHandler, PreSolve,
};
pub use error::{Error, Result};
pub use events::MoveEvent;
pub use registry::EntityKind;
pub use shape::{
    Categories, ChainDef, ChainShape, CollisionFilter, Shape, ShapeDef, ShapeGeometry,
};
pub use joint::{DistanceJointDef, Joint};
pub use version::version;
pub use world::{World, WorldDef};

// Boundary value types, re-exported from the raw layer.
pub use planar_sys::{Aabb, Manifold, ManifoldPoint, Rot, Transform, Vec2};

/// Prelude for common imports
pub mod prelude {
    pub use super::{
        Aabb, Body, BodyDef, BodyType, CastDecision, CastHit, Categories, CollisionFilter,
        MoveEvent, Shape, ShapeDef, ShapeGeometry, Vec2, World, WorldDef,
    };
}
