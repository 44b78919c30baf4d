//! Per-world identifier registry
//!
//! Maps the raw bits of native identifiers to the shared wrapper objects,
//! one map per entity kind. The registry is the single source of truth for
//! wrapper identity: at most one wrapper exists per (world, identifier)
//! pair, and every native-to-managed crossing resolves through it.
//!
//! Mutation happens only from the thread that owns the `World`, strictly
//! outside step and query calls; trampolines on engine worker threads only
//! read. The `RwLock` in [`SharedRegistry`] expresses that sharing to the
//! borrow checker; the native contract means a writer never overlaps a
//! callback, so the lock is uncontended during a step.

use crate::body::Body;
use crate::joint::Joint;
use crate::shape::{ChainShape, Shape};
use planar_sys::{BodyId, ChainId, JointId, ShapeId};
use rustc_hash::{FxBuildHasher, FxHashMap};
use std::fmt;
use std::sync::{Arc, RwLock};

/// Bodies and shapes dominate entity counts; pre-size their maps.
const BODY_MAP_CAPACITY: usize = 256;
const SHAPE_MAP_CAPACITY: usize = 512;

/// Registry handle shared with world-scoped trampolines
pub(crate) type SharedRegistry = Arc<RwLock<InstanceRegistry>>;

/// The four entity kinds one world tracks
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Body,
    Shape,
    Chain,
    Joint,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Body => write!(f, "body"),
            EntityKind::Shape => write!(f, "shape"),
            EntityKind::Chain => write!(f, "chain shape"),
            EntityKind::Joint => write!(f, "joint"),
        }
    }
}

/// Identifier-to-wrapper maps for one simulation world
pub(crate) struct InstanceRegistry {
    bodies: FxHashMap<u64, Arc<Body>>,
    shapes: FxHashMap<u64, Arc<Shape>>,
    chains: FxHashMap<u64, Arc<ChainShape>>,
    joints: FxHashMap<u64, Arc<Joint>>,
}

macro_rules! kind_ops {
    ($register:ident, $lookup:ident, $evict:ident, $map:ident, $wrapper:ty, $id:ty, $kind:expr) => {
        /// Insert a mapping; double registration is a programmer error.
        pub(crate) fn $register(&mut self, wrapper: Arc<$wrapper>) {
            let key = wrapper.raw_id().bits();
            let previous = self.$map.insert(key, wrapper);
            if previous.is_some() {
                debug_assert!(false, "double registration of {} id {key:#x}", $kind);
                tracing::error!(
                    kind = %$kind,
                    id = key,
                    "double registration; replacing existing wrapper"
                );
            }
        }

        /// Resolve an identifier; absent means never registered or evicted.
        pub(crate) fn $lookup(&self, id: $id) -> Option<Arc<$wrapper>> {
            self.$map.get(&id.bits()).cloned()
        }

        /// Remove a mapping; evicting an absent key is a no-op.
        pub(crate) fn $evict(&mut self, id: $id) -> Option<Arc<$wrapper>> {
            self.$map.remove(&id.bits())
        }
    };
}

impl InstanceRegistry {
    pub(crate) fn new() -> Self {
        Self {
            bodies: FxHashMap::with_capacity_and_hasher(BODY_MAP_CAPACITY, FxBuildHasher),
            shapes: FxHashMap::with_capacity_and_hasher(SHAPE_MAP_CAPACITY, FxBuildHasher),
            chains: FxHashMap::default(),
            joints: FxHashMap::default(),
        }
    }

    kind_ops!(register_body, lookup_body, evict_body, bodies, Body, BodyId, EntityKind::Body);
    kind_ops!(register_shape, lookup_shape, evict_shape, shapes, Shape, ShapeId, EntityKind::Shape);
    kind_ops!(register_chain, lookup_chain, evict_chain, chains, ChainShape, ChainId, EntityKind::Chain);
    kind_ops!(register_joint, lookup_joint, evict_joint, joints, Joint, JointId, EntityKind::Joint);

    /// Evict every shape, chain, and joint attached to a body, mirroring the
    /// engine's cascading destruction.
    pub(crate) fn evict_attached_to(&mut self, body: BodyId) {
        let before =
            self.shapes.len() + self.chains.len() + self.joints.len();
        self.shapes.retain(|_, shape| shape.body_id() != body);
        self.chains.retain(|_, chain| chain.body_id() != body);
        self.joints
            .retain(|_, joint| joint.body_a() != body && joint.body_b() != body);
        let evicted =
            before - (self.shapes.len() + self.chains.len() + self.joints.len());
        if evicted > 0 {
            tracing::trace!(body = body.bits(), evicted, "evicted attached entities");
        }
    }

    /// Drop all four maps' contents in one go (world teardown).
    pub(crate) fn clear_all(&mut self) {
        self.bodies.clear();
        self.shapes.clear();
        self.chains.clear();
        self.joints.clear();
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.bodies.is_empty()
            && self.shapes.is_empty()
            && self.chains.is_empty()
            && self.joints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_id(index1: i32) -> BodyId {
        BodyId {
            index1,
            world0: 0,
            revision: 1,
        }
    }

    #[test]
    fn test_register_then_lookup_returns_same_wrapper() {
        let mut registry = InstanceRegistry::new();
        let body = Body::new(body_id(1));
        registry.register_body(body.clone());
        let found = registry.lookup_body(body_id(1)).unwrap();
        assert!(Arc::ptr_eq(&body, &found));
    }

    #[test]
    fn test_evict_then_lookup_is_absent() {
        let mut registry = InstanceRegistry::new();
        registry.register_body(Body::new(body_id(1)));
        assert!(registry.evict_body(body_id(1)).is_some());
        assert!(registry.lookup_body(body_id(1)).is_none());
        // Idempotent: evicting again is a no-op.
        assert!(registry.evict_body(body_id(1)).is_none());
    }

    #[test]
    fn test_revision_distinguishes_recreated_slot() {
        let mut registry = InstanceRegistry::new();
        registry.register_body(Body::new(body_id(1)));
        let recreated = BodyId {
            index1: 1,
            world0: 0,
            revision: 2,
        };
        assert!(registry.lookup_body(recreated).is_none());
    }

    #[test]
    fn test_clear_all_empties_every_kind() {
        let mut registry = InstanceRegistry::new();
        registry.register_body(Body::new(body_id(1)));
        registry.register_shape(Shape::new(
            ShapeId {
                index1: 1,
                world0: 0,
                revision: 1,
            },
            body_id(1),
        ));
        registry.clear_all();
        assert!(registry.is_empty());
        assert!(registry.lookup_body(body_id(1)).is_none());
    }

    #[test]
    fn test_evict_attached_cascades() {
        let mut registry = InstanceRegistry::new();
        let owner = body_id(1);
        let other = body_id(2);
        registry.register_body(Body::new(owner));
        registry.register_body(Body::new(other));
        registry.register_shape(Shape::new(
            ShapeId {
                index1: 1,
                world0: 0,
                revision: 1,
            },
            owner,
        ));
        registry.register_shape(Shape::new(
            ShapeId {
                index1: 2,
                world0: 0,
                revision: 1,
            },
            other,
        ));
        registry.evict_body(owner);
        registry.evict_attached_to(owner);
        assert!(registry
            .lookup_shape(ShapeId {
                index1: 1,
                world0: 0,
                revision: 1,
            })
            .is_none());
        assert!(registry
            .lookup_shape(ShapeId {
                index1: 2,
                world0: 0,
                revision: 1,
            })
            .is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "double registration")]
    fn test_double_registration_fails_loudly() {
        let mut registry = InstanceRegistry::new();
        registry.register_body(Body::new(body_id(1)));
        registry.register_body(Body::new(body_id(1)));
    }
}
