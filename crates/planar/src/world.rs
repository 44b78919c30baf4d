//! Simulation world facade
//!
//! One [`World`] owns one native simulation instance and the registry that
//! correlates its native identifiers with managed wrappers. All mutation
//! goes through `&mut self` and therefore cannot overlap a step or query
//! call; trampolines invoked by the engine during those calls only read.

use crate::body::{Body, BodyDef};
use crate::callbacks::{
    cast_result_shim, custom_filter_shim, overlap_result_shim, pre_solve_shim, CastResultHandler,
    CastScope, CustomFilter, FilterSlot, OverlapHandler, OverlapScope, PreSolve, PreSolveSlot,
};
use crate::error::{Error, Result};
use crate::events::{decode_move_events, MoveEvent};
use crate::joint::{DistanceJointDef, Joint};
use crate::registry::{EntityKind, InstanceRegistry, SharedRegistry};
use crate::shape::{ChainDef, ChainShape, CollisionFilter, Shape, ShapeDef, ShapeGeometry};
use planar_sys::{self as native, Aabb, BodyMoveEvent, Vec2, WorldDefRaw, WorldId};
use std::ffi::c_void;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// World creation parameters
#[derive(Clone, Debug)]
pub struct WorldDef {
    pub gravity: Vec2,
    /// Relative speed below which restitution is ignored
    pub restitution_threshold: f32,
    pub enable_sleep: bool,
}

impl Default for WorldDef {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            restitution_threshold: 1.0,
            enable_sleep: true,
        }
    }
}

impl WorldDef {
    /// Zero gravity preset
    pub fn zero_gravity() -> Self {
        Self::default().with_gravity(Vec2::ZERO)
    }

    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_sleep(mut self, enabled: bool) -> Self {
        self.enable_sleep = enabled;
        self
    }

    pub fn with_restitution_threshold(mut self, threshold: f32) -> Self {
        self.restitution_threshold = threshold;
        self
    }

    fn to_raw(&self) -> WorldDefRaw {
        WorldDefRaw {
            gravity: self.gravity,
            restitution_threshold: self.restitution_threshold,
            enable_sleep: self.enable_sleep as u8,
            _pad: [0; 3],
        }
    }
}

/// One independent simulation instance
///
/// Destroying the world (explicitly or by drop) synchronously invalidates
/// every wrapper registered beneath it: later lookups resolve to absent,
/// never to freed memory.
pub struct World {
    raw: WorldId,
    registry: SharedRegistry,
    filter_slot: Option<Box<FilterSlot>>,
    pre_solve_slot: Option<Box<PreSolveSlot>>,
}

impl World {
    /// Create a simulation instance
    pub fn new(def: &WorldDef) -> Result<Self> {
        let raw = native::world_create(&def.to_raw());
        if raw.is_null() {
            return Err(Error::WorldCreate);
        }
        debug!(world = ?raw, engine = crate::version(), "created world");
        Ok(Self {
            raw,
            registry: Arc::new(RwLock::new(InstanceRegistry::new())),
            filter_slot: None,
            pre_solve_slot: None,
        })
    }

    fn read_registry(&self) -> RwLockReadGuard<'_, InstanceRegistry> {
        self.registry
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_registry(&self) -> RwLockWriteGuard<'_, InstanceRegistry> {
        self.registry
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a rigid body
    pub fn create_body(&mut self, def: &BodyDef) -> Result<Arc<Body>> {
        let id = native::body_create(self.raw, &def.to_raw());
        if id.is_null() {
            return Err(Error::EntityCreate(EntityKind::Body));
        }
        let wrapper = Body::new(id);
        self.write_registry().register_body(wrapper.clone());
        Ok(wrapper)
    }

    /// Destroy a body and everything attached to it
    pub fn destroy_body(&mut self, body: &Body) {
        {
            let mut registry = self.write_registry();
            registry.evict_body(body.raw_id());
            registry.evict_attached_to(body.raw_id());
        }
        native::body_destroy(body.raw_id());
    }

    /// Attach a shape to a body
    pub fn create_shape(
        &mut self,
        body: &Body,
        def: &ShapeDef,
        geometry: ShapeGeometry,
    ) -> Result<Arc<Shape>> {
        let raw_def = def.to_raw();
        let id = match geometry {
            ShapeGeometry::Circle { center, radius } => native::shape_create_circle(
                body.raw_id(),
                &raw_def,
                &planar_sys::Circle { center, radius },
            ),
            ShapeGeometry::Segment { point1, point2 } => native::shape_create_segment(
                body.raw_id(),
                &raw_def,
                &planar_sys::Segment { point1, point2 },
            ),
        };
        if id.is_null() {
            return Err(Error::EntityCreate(EntityKind::Shape));
        }
        let wrapper = Shape::new(id, body.raw_id());
        self.write_registry().register_shape(wrapper.clone());
        Ok(wrapper)
    }

    /// Destroy a shape
    pub fn destroy_shape(&mut self, shape: &Shape) {
        self.write_registry().evict_shape(shape.raw_id());
        native::shape_destroy(shape.raw_id());
    }

    /// Attach a chain shape to a body
    pub fn create_chain(&mut self, body: &Body, def: &ChainDef) -> Result<Arc<ChainShape>> {
        let id = native::chain_create(body.raw_id(), &def.to_raw());
        if id.is_null() {
            return Err(Error::EntityCreate(EntityKind::Chain));
        }
        let wrapper = ChainShape::new(id, body.raw_id());
        self.write_registry().register_chain(wrapper.clone());
        Ok(wrapper)
    }

    /// Destroy a chain shape
    pub fn destroy_chain(&mut self, chain: &ChainShape) {
        self.write_registry().evict_chain(chain.raw_id());
        native::chain_destroy(chain.raw_id());
    }

    /// Connect two bodies with a distance joint
    pub fn create_joint(
        &mut self,
        body_a: &Body,
        body_b: &Body,
        def: &DistanceJointDef,
    ) -> Result<Arc<Joint>> {
        let id =
            native::joint_create_distance(self.raw, &def.to_raw(body_a.raw_id(), body_b.raw_id()));
        if id.is_null() {
            return Err(Error::EntityCreate(EntityKind::Joint));
        }
        let wrapper = Joint::new(id, body_a.raw_id(), body_b.raw_id());
        self.write_registry().register_joint(wrapper.clone());
        Ok(wrapper)
    }

    /// Destroy a joint
    pub fn destroy_joint(&mut self, joint: &Joint) {
        self.write_registry().evict_joint(joint.raw_id());
        native::joint_destroy(joint.raw_id());
    }

    /// Advance the simulation by `dt` seconds
    ///
    /// Blocks until the engine finishes the step. Installed custom-filter
    /// and pre-solve hooks may run on engine worker threads during the call.
    pub fn step(&mut self, dt: f32, substeps: i32) {
        native::world_step(self.raw, dt, substeps);
    }

    /// Decode the last step's move events, invoking the handler once per
    /// event in the engine's array order
    ///
    /// An event whose body was destroyed since the step still arrives, with
    /// an absent body and intact transform and sleep flag.
    pub fn move_events(&self, mut handler: impl FnMut(MoveEvent)) {
        let raw = native::world_move_events(self.raw);
        if raw.count <= 0 || raw.events.is_null() {
            return;
        }
        let count = raw.count as usize;
        let stride = std::mem::size_of::<BodyMoveEvent>();
        // Safety: the engine keeps the snapshot alive and unchanged until
        // the next step; we only read it within this call.
        let bytes =
            unsafe { std::slice::from_raw_parts(raw.events as *const u8, count * stride) };
        let registry = self.read_registry();
        decode_move_events(bytes, count, &registry, &mut handler);
    }

    /// Step, then decode the resulting move events
    pub fn step_and_collect(
        &mut self,
        dt: f32,
        substeps: i32,
        handler: impl FnMut(MoveEvent),
    ) {
        self.step(dt, substeps);
        self.move_events(handler);
    }

    /// Cast a ray from `origin` along `translation`
    ///
    /// The handler's trampoline is valid only for the duration of this call;
    /// the engine stops early when the handler returns
    /// [`CastDecision::Terminate`](crate::CastDecision::Terminate).
    pub fn cast_ray(
        &self,
        origin: Vec2,
        translation: Vec2,
        filter: CollisionFilter,
        handler: &mut dyn CastResultHandler,
    ) {
        let registry = self.read_registry();
        let mut scope = CastScope {
            registry: &registry,
            handler,
        };
        native::world_cast_ray(
            self.raw,
            origin,
            translation,
            filter.to_raw(),
            cast_result_shim,
            &mut scope as *mut CastScope as *mut c_void,
        );
        // Scope and registry guard end here; the trampoline pointer dies
        // with the query.
    }

    /// Invoke the handler for every shape whose bounds overlap `aabb`, until
    /// it returns false
    pub fn overlap_aabb(
        &self,
        aabb: Aabb,
        filter: CollisionFilter,
        handler: &mut dyn OverlapHandler,
    ) {
        let registry = self.read_registry();
        let mut scope = OverlapScope {
            registry: &registry,
            handler,
        };
        native::world_overlap_aabb(
            self.raw,
            aabb,
            filter.to_raw(),
            overlap_result_shim,
            &mut scope as *mut OverlapScope as *mut c_void,
        );
    }

    /// Install a pair filter for the lifetime of this world
    pub fn set_custom_filter(&mut self, hook: impl CustomFilter + 'static) {
        let slot = Box::new(FilterSlot {
            registry: self.registry.clone(),
            hook: Box::new(hook),
        });
        native::world_set_custom_filter(
            self.raw,
            Some(custom_filter_shim),
            &*slot as *const FilterSlot as *mut c_void,
        );
        // The slot must outlive the registration; it is dropped only after
        // the pointer is deregistered or the world is destroyed.
        self.filter_slot = Some(slot);
        debug!(world = ?self.raw, "installed custom filter");
    }

    /// Remove the installed pair filter
    pub fn clear_custom_filter(&mut self) {
        native::world_set_custom_filter(self.raw, None, std::ptr::null_mut());
        self.filter_slot = None;
    }

    /// Install a pre-solve hook for the lifetime of this world
    pub fn set_pre_solve(&mut self, hook: impl PreSolve + 'static) {
        let slot = Box::new(PreSolveSlot {
            registry: self.registry.clone(),
            hook: Box::new(hook),
        });
        native::world_set_pre_solve(
            self.raw,
            Some(pre_solve_shim),
            &*slot as *const PreSolveSlot as *mut c_void,
        );
        self.pre_solve_slot = Some(slot);
        debug!(world = ?self.raw, "installed pre-solve hook");
    }

    /// Remove the installed pre-solve hook
    pub fn clear_pre_solve(&mut self) {
        native::world_set_pre_solve(self.raw, None, std::ptr::null_mut());
        self.pre_solve_slot = None;
    }

    /// Destroy the world now instead of waiting for drop
    pub fn destroy(mut self) {
        self.teardown();
    }

    #[cfg(test)]
    pub(crate) fn registry_handle(&self) -> SharedRegistry {
        self.registry.clone()
    }

    fn teardown(&mut self) {
        if self.raw.is_null() {
            return;
        }
        // Detach trampolines before their slots can drop.
        native::world_set_custom_filter(self.raw, None, std::ptr::null_mut());
        native::world_set_pre_solve(self.raw, None, std::ptr::null_mut());
        self.filter_slot = None;
        self.pre_solve_slot = None;
        native::world_destroy(self.raw);
        // All four kind maps are cleared together: every identifier under
        // this world now resolves to absent.
        self.write_registry().clear_all();
        debug!(world = ?self.raw, "destroyed world");
        self.raw = WorldId::NULL;
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::{CastDecision, CastHit};

    fn circle(radius: f32) -> ShapeGeometry {
        ShapeGeometry::Circle {
            center: Vec2::ZERO,
            radius,
        }
    }

    #[test]
    fn test_create_and_lookup_single_wrapper() {
        let mut world = World::new(&WorldDef::default()).unwrap();
        let body = world.create_body(&BodyDef::dynamic()).unwrap();
        let found = world
            .read_registry()
            .lookup_body(body.raw_id())
            .unwrap();
        assert!(Arc::ptr_eq(&body, &found));
    }

    #[test]
    fn test_destroy_world_invalidates_all_wrappers() {
        let mut world = World::new(&WorldDef::default()).unwrap();
        let body = world.create_body(&BodyDef::dynamic()).unwrap();
        let shape = world
            .create_shape(&body, &ShapeDef::default(), circle(0.5))
            .unwrap();
        let registry = world.registry_handle();
        world.destroy();
        let registry = registry.read().unwrap();
        assert!(registry.lookup_body(body.raw_id()).is_none());
        assert!(registry.lookup_shape(shape.raw_id()).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_destroy_body_cascades_to_attached() {
        let mut world = World::new(&WorldDef::default()).unwrap();
        let a = world.create_body(&BodyDef::dynamic()).unwrap();
        let b = world.create_body(&BodyDef::dynamic()).unwrap();
        let shape = world
            .create_shape(&a, &ShapeDef::default(), circle(0.5))
            .unwrap();
        let joint = world
            .create_joint(&a, &b, &DistanceJointDef::default())
            .unwrap();
        world.destroy_body(&a);
        let registry = world.read_registry();
        assert!(registry.lookup_body(a.raw_id()).is_none());
        assert!(registry.lookup_shape(shape.raw_id()).is_none());
        assert!(registry.lookup_joint(joint.raw_id()).is_none());
        assert!(registry.lookup_body(b.raw_id()).is_some());
    }

    #[test]
    fn test_chain_register_evict_roundtrip() {
        let mut world = World::new(&WorldDef::default()).unwrap();
        let ground = world.create_body(&BodyDef::fixed()).unwrap();
        let chain = world
            .create_chain(
                &ground,
                &ChainDef::new(vec![
                    Vec2::new(-5.0, 0.0),
                    Vec2::new(0.0, 0.0),
                    Vec2::new(5.0, 1.0),
                ]),
            )
            .unwrap();
        let found = world.read_registry().lookup_chain(chain.raw_id()).unwrap();
        assert!(Arc::ptr_eq(&chain, &found));
        world.destroy_chain(&chain);
        assert!(world.read_registry().lookup_chain(chain.raw_id()).is_none());
    }

    #[test]
    fn test_step_and_collect_resolves_wrappers() {
        let mut world = World::new(&WorldDef::zero_gravity().with_sleep(false)).unwrap();
        let mover = world
            .create_body(&BodyDef::dynamic().with_linear_velocity(Vec2::new(1.0, 0.0)))
            .unwrap();
        let _still = world
            .create_body(&BodyDef::fixed().with_position(Vec2::new(5.0, 5.0)))
            .unwrap();
        let mut seen = Vec::new();
        world.step_and_collect(0.1, 4, |event| {
            seen.push((
                event.body.as_ref().map(|b| b.raw_id()),
                event.transform.p,
                event.fell_asleep,
            ));
        });
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Some(mover.raw_id()));
        assert!(seen[0].1.x > 0.0);
        assert!(!seen[0].2);
    }

    #[test]
    fn test_move_event_for_destroyed_body_is_absent() {
        let mut world = World::new(&WorldDef::zero_gravity().with_sleep(false)).unwrap();
        let mover = world
            .create_body(&BodyDef::dynamic().with_linear_velocity(Vec2::new(1.0, 0.0)))
            .unwrap();
        world.step(0.1, 4);
        // Destroyed after the step: the buffered event still decodes, with
        // an absent body.
        world.write_registry().evict_body(mover.raw_id());
        let mut events = 0;
        let mut absent = false;
        world.move_events(|event| {
            events += 1;
            absent = event.body.is_none();
        });
        assert_eq!(events, 1);
        assert!(absent);
    }

    #[test]
    fn test_sleeping_body_reports_fell_asleep_once() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        let sleeper = world
            .create_body(&BodyDef::dynamic().with_linear_velocity(Vec2::new(0.01, 0.0)))
            .unwrap();
        let mut flags = Vec::new();
        world.step_and_collect(0.1, 4, |event| {
            assert_eq!(event.body.as_ref().map(|b| b.raw_id()), Some(sleeper.raw_id()));
            flags.push(event.fell_asleep);
        });
        assert_eq!(flags, vec![true]);
        // Asleep now: no further events.
        let mut later = 0;
        world.step_and_collect(0.1, 4, |_| later += 1);
        assert_eq!(later, 0);
    }

    #[test]
    fn test_cast_terminate_stops_after_first_hit() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        let near = world
            .create_body(&BodyDef::fixed().with_position(Vec2::new(2.0, 0.0)))
            .unwrap();
        let far = world
            .create_body(&BodyDef::fixed().with_position(Vec2::new(5.0, 0.0)))
            .unwrap();
        world.create_shape(&near, &ShapeDef::default(), circle(0.5)).unwrap();
        world.create_shape(&far, &ShapeDef::default(), circle(0.5)).unwrap();
        let mut hits = 0;
        world.cast_ray(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            CollisionFilter::default(),
            &mut |_: CastHit| {
                hits += 1;
                CastDecision::Terminate
            },
        );
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_cast_ignore_does_not_terminate() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        for x in [2.0f32, 5.0] {
            let body = world
                .create_body(&BodyDef::fixed().with_position(Vec2::new(x, 0.0)))
                .unwrap();
            world.create_shape(&body, &ShapeDef::default(), circle(0.5)).unwrap();
        }
        let mut fractions = Vec::new();
        world.cast_ray(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            CollisionFilter::default(),
            &mut |hit: CastHit| {
                fractions.push(hit.fraction);
                if fractions.len() == 1 {
                    CastDecision::Ignore
                } else {
                    CastDecision::Accept
                }
            },
        );
        assert_eq!(fractions.len(), 2);
        assert!(fractions[0] < fractions[1]);
    }

    #[test]
    fn test_cast_resolves_shape_wrapper() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        let body = world
            .create_body(&BodyDef::fixed().with_position(Vec2::new(3.0, 0.0)))
            .unwrap();
        let shape = world
            .create_shape(&body, &ShapeDef::default(), circle(1.0))
            .unwrap();
        let mut resolved = None;
        world.cast_ray(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            CollisionFilter::default(),
            &mut |hit: CastHit| {
                resolved = hit.shape.clone();
                CastDecision::Terminate
            },
        );
        assert!(Arc::ptr_eq(&resolved.unwrap(), &shape));
    }

    #[test]
    fn test_overlap_early_termination() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        for x in [0.0f32, 1.0, 2.0] {
            let body = world
                .create_body(&BodyDef::fixed().with_position(Vec2::new(x, 0.0)))
                .unwrap();
            world.create_shape(&body, &ShapeDef::default(), circle(0.4)).unwrap();
        }
        let everything = Aabb::new(Vec2::new(-10.0, -10.0), Vec2::new(10.0, 10.0));
        let mut count = 0;
        world.overlap_aabb(everything, CollisionFilter::default(), &mut |_| {
            count += 1;
            false
        });
        assert_eq!(count, 1);
        let mut all = 0;
        world.overlap_aabb(everything, CollisionFilter::default(), &mut |_| {
            all += 1;
            true
        });
        assert_eq!(all, 3);
    }

    #[test]
    fn test_query_filter_excludes_categories() {
        let mut world = World::new(&WorldDef::zero_gravity()).unwrap();
        let body = world
            .create_body(&BodyDef::fixed().with_position(Vec2::new(2.0, 0.0)))
            .unwrap();
        let terrain = crate::Categories::bit(3);
        world
            .create_shape(
                &body,
                &ShapeDef::default()
                    .with_filter(crate::CollisionFilter::new(terrain, crate::Categories::ALL)),
                circle(0.5),
            )
            .unwrap();
        let mut hits = 0;
        // Query that cannot see the terrain category.
        world.cast_ray(
            Vec2::ZERO,
            Vec2::new(10.0, 0.0),
            CollisionFilter::new(crate::Categories::DEFAULT, crate::Categories::DEFAULT),
            &mut |_: CastHit| {
                hits += 1;
                CastDecision::Accept
            },
        );
        assert_eq!(hits, 0);
    }

    #[test]
    fn test_install_and_clear_world_callbacks() {
        let mut world = World::new(&WorldDef::default()).unwrap();
        world.set_custom_filter(|a: Option<Arc<Shape>>, b: Option<Arc<Shape>>| {
            a.is_some() && b.is_some()
        });
        world.set_pre_solve(
            |_a: Option<Arc<Shape>>, _b: Option<Arc<Shape>>, m: &planar_sys::Manifold| {
                m.point_count > 0
            },
        );
        assert!(world.filter_slot.is_some());
        assert!(world.pre_solve_slot.is_some());
        world.step(0.1, 4);
        world.clear_custom_filter();
        world.clear_pre_solve();
        assert!(world.filter_slot.is_none());
        assert!(world.pre_solve_slot.is_none());
    }
}
