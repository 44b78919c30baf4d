//! In-process double of the native engine (default, no `native` feature)
//!
//! Lets the workspace compile and its tests run on hosts without
//! `libplanar2d`. The double keeps the parts of the engine contract the
//! binding layer depends on: index/revision identifier allocation, per-step
//! move-event snapshots, the cast/overlap callback return protocol, and the
//! version triple. It is not a physics engine: there is no broad phase, no
//! contact generation, and no solver, so custom-filter and pre-solve
//! callbacks are registered but never invoked.
//!
//! Query callbacks run after the engine lock is released, so a callback may
//! call back into this module without deadlocking. Only circles participate
//! in ray casts.

#![cfg(not(feature = "native"))]
// Registered-but-never-invoked callback slots and copied chain vertices are
// bookkeeping the double stores without reading back.
#![allow(dead_code)]

use crate::body_type;
use crate::types::*;
use std::ffi::c_void;
use std::sync::{Mutex, MutexGuard};

/// Bodies slower than this fall asleep when sleeping is enabled
const SLEEP_VELOCITY: f32 = 0.05;

struct Slot<T> {
    revision: u16,
    value: Option<T>,
}

fn alloc<T>(slots: &mut Vec<Slot<T>>, value: T) -> (usize, u16) {
    if let Some(index) = slots.iter().position(|slot| slot.value.is_none()) {
        let slot = &mut slots[index];
        slot.revision = slot.revision.wrapping_add(1).max(1);
        slot.value = Some(value);
        (index, slot.revision)
    } else {
        slots.push(Slot {
            revision: 1,
            value: Some(value),
        });
        (slots.len() - 1, 1)
    }
}

enum Geometry {
    Circle(Circle),
    Segment(Segment),
}

struct StubShape {
    body: BodyId,
    filter: Filter,
    geometry: Geometry,
}

struct StubChain {
    body: BodyId,
    points: Vec<Vec2>,
    is_loop: bool,
}

struct StubJoint {
    body_a: BodyId,
    body_b: BodyId,
}

struct StubBody {
    body_type: i32,
    transform: Transform,
    linear_velocity: Vec2,
    angular_velocity: f32,
    gravity_scale: f32,
    enable_sleep: bool,
    awake: bool,
}

struct StubWorld {
    gravity: Vec2,
    enable_sleep: bool,
    bodies: Vec<Slot<StubBody>>,
    shapes: Vec<Slot<StubShape>>,
    chains: Vec<Slot<StubChain>>,
    joints: Vec<Slot<StubJoint>>,
    move_events: Vec<BodyMoveEvent>,
    // Context pointers are stashed as usize: the double never invokes these,
    // it only has to remember what was registered.
    custom_filter: Option<(CustomFilterFn, usize)>,
    pre_solve: Option<(PreSolveFn, usize)>,
}

struct Engine {
    worlds: Vec<Slot<StubWorld>>,
}

static ENGINE: Mutex<Engine> = Mutex::new(Engine { worlds: Vec::new() });

fn engine() -> MutexGuard<'static, Engine> {
    ENGINE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Engine {
    fn world(&self, id: WorldId) -> Option<&StubWorld> {
        let slot = self.worlds.get(id.index1.checked_sub(1)? as usize)?;
        if slot.revision != id.revision {
            return None;
        }
        slot.value.as_ref()
    }

    fn world_mut(&mut self, id: WorldId) -> Option<&mut StubWorld> {
        let slot = self.worlds.get_mut(id.index1.checked_sub(1)? as usize)?;
        if slot.revision != id.revision {
            return None;
        }
        slot.value.as_mut()
    }

    fn body_world_mut(&mut self, id: BodyId) -> Option<&mut StubWorld> {
        let slot = self.worlds.get_mut(id.world0 as usize)?;
        slot.value.as_mut()
    }
}

impl StubWorld {
    fn body(&self, id: BodyId) -> Option<&StubBody> {
        let slot = self.bodies.get((id.index1 as usize).checked_sub(1)?)?;
        if slot.revision != id.revision {
            return None;
        }
        slot.value.as_ref()
    }

    fn body_mut(&mut self, id: BodyId) -> Option<&mut StubBody> {
        let slot = self.bodies.get_mut((id.index1 as usize).checked_sub(1)?)?;
        if slot.revision != id.revision {
            return None;
        }
        slot.value.as_mut()
    }

    fn shape_world_aabb(&self, shape: &StubShape) -> Option<Aabb> {
        let body = self.body(shape.body)?;
        Some(match &shape.geometry {
            Geometry::Circle(circle) => {
                let center = body.transform.apply(circle.center);
                Aabb::new(
                    Vec2::new(center.x - circle.radius, center.y - circle.radius),
                    Vec2::new(center.x + circle.radius, center.y + circle.radius),
                )
            }
            Geometry::Segment(segment) => {
                let p1 = body.transform.apply(segment.point1);
                let p2 = body.transform.apply(segment.point2);
                Aabb::new(
                    Vec2::new(p1.x.min(p2.x), p1.y.min(p2.y)),
                    Vec2::new(p1.x.max(p2.x), p1.y.max(p2.y)),
                )
            }
        })
    }
}

pub fn world_create(def: &WorldDefRaw) -> WorldId {
    let mut engine = engine();
    let (index, revision) = alloc(
        &mut engine.worlds,
        StubWorld {
            gravity: def.gravity,
            enable_sleep: def.enable_sleep != 0,
            bodies: Vec::new(),
            shapes: Vec::new(),
            chains: Vec::new(),
            joints: Vec::new(),
            move_events: Vec::new(),
            custom_filter: None,
            pre_solve: None,
        },
    );
    WorldId {
        index1: (index + 1) as u16,
        revision,
    }
}

pub fn world_destroy(world: WorldId) {
    let mut engine = engine();
    if let Some(index) = world.index1.checked_sub(1) {
        if let Some(slot) = engine.worlds.get_mut(index as usize) {
            if slot.revision == world.revision {
                slot.value = None;
            }
        }
    }
}

pub fn world_step(world: WorldId, dt: f32, _substeps: i32) {
    let mut engine = engine();
    let world_index = world.index1.wrapping_sub(1) as u16;
    let Some(w) = engine.world_mut(world) else {
        return;
    };
    let StubWorld {
        gravity,
        enable_sleep,
        bodies,
        move_events,
        ..
    } = w;
    move_events.clear();
    for (index, slot) in bodies.iter_mut().enumerate() {
        let Some(body) = slot.value.as_mut() else {
            continue;
        };
        if body.body_type == body_type::STATIC || !body.awake {
            continue;
        }
        let before = body.transform;
        if body.body_type == body_type::DYNAMIC {
            body.linear_velocity = body
                .linear_velocity
                .add(gravity.scale(body.gravity_scale * dt));
        }
        body.transform.p = body.transform.p.add(body.linear_velocity.scale(dt));
        if body.angular_velocity != 0.0 {
            let angle = body.transform.q.s.atan2(body.transform.q.c);
            body.transform.q = Rot::from_angle(angle + body.angular_velocity * dt);
        }
        let mut fell_asleep = 0u8;
        if *enable_sleep
            && body.enable_sleep
            && body.body_type == body_type::DYNAMIC
            && body.linear_velocity.length_squared() < SLEEP_VELOCITY * SLEEP_VELOCITY
            && body.angular_velocity.abs() < SLEEP_VELOCITY
        {
            body.awake = false;
            fell_asleep = 1;
        }
        let moved = body.transform != before;
        if moved || fell_asleep != 0 {
            move_events.push(BodyMoveEvent {
                transform: body.transform,
                body_id: BodyId {
                    index1: (index + 1) as i32,
                    world0: world_index,
                    revision: slot.revision,
                },
                fell_asleep,
                _pad: [0; 3],
            });
        }
    }
}

/// Snapshot of the last step's move events; valid until the next step.
pub fn world_move_events(world: WorldId) -> MoveEvents {
    let engine = engine();
    match engine.world(world) {
        Some(w) => MoveEvents {
            events: w.move_events.as_ptr(),
            count: w.move_events.len() as i32,
        },
        None => MoveEvents {
            events: std::ptr::null(),
            count: 0,
        },
    }
}

struct CastCandidate {
    shape: ShapeId,
    point: Vec2,
    normal: Vec2,
    fraction: f32,
}

pub fn world_cast_ray(
    world: WorldId,
    origin: Vec2,
    translation: Vec2,
    filter: Filter,
    fcn: CastResultFn,
    context: *mut c_void,
) {
    // Gather candidates under the lock, run the callback protocol outside it.
    let mut candidates: Vec<CastCandidate> = Vec::new();
    {
        let engine = engine();
        let Some(w) = engine.world(world) else {
            return;
        };
        let world_index = world.index1 - 1;
        for (index, slot) in w.shapes.iter().enumerate() {
            let Some(shape) = slot.value.as_ref() else {
                continue;
            };
            if !filter.should_collide(shape.filter) {
                continue;
            }
            let Geometry::Circle(circle) = &shape.geometry else {
                continue;
            };
            let Some(body) = w.body(shape.body) else {
                continue;
            };
            let center = body.transform.apply(circle.center);
            if let Some((fraction, point, normal)) =
                ray_circle(origin, translation, center, circle.radius)
            {
                candidates.push(CastCandidate {
                    shape: ShapeId {
                        index1: (index + 1) as i32,
                        world0: world_index,
                        revision: slot.revision,
                    },
                    point,
                    normal,
                    fraction,
                });
            }
        }
    }

    let mut max_fraction = 1.0f32;
    for candidate in candidates {
        if candidate.fraction > max_fraction {
            continue;
        }
        let result = unsafe {
            fcn(
                candidate.shape,
                candidate.point,
                candidate.normal,
                candidate.fraction,
                context,
            )
        };
        if result == 0.0 {
            return;
        }
        if result > 0.0 && result < 1.0 {
            max_fraction = result;
        }
    }
}

pub fn world_overlap_aabb(
    world: WorldId,
    aabb: Aabb,
    filter: Filter,
    fcn: OverlapResultFn,
    context: *mut c_void,
) {
    let mut hits: Vec<ShapeId> = Vec::new();
    {
        let engine = engine();
        let Some(w) = engine.world(world) else {
            return;
        };
        let world_index = world.index1 - 1;
        for (index, slot) in w.shapes.iter().enumerate() {
            let Some(shape) = slot.value.as_ref() else {
                continue;
            };
            if !filter.should_collide(shape.filter) {
                continue;
            }
            let Some(shape_aabb) = w.shape_world_aabb(shape) else {
                continue;
            };
            if aabb.overlaps(shape_aabb) {
                hits.push(ShapeId {
                    index1: (index + 1) as i32,
                    world0: world_index,
                    revision: slot.revision,
                });
            }
        }
    }

    for shape in hits {
        if !unsafe { fcn(shape, context) } {
            return;
        }
    }
}

pub fn world_set_custom_filter(world: WorldId, fcn: Option<CustomFilterFn>, context: *mut c_void) {
    let mut engine = engine();
    if let Some(w) = engine.world_mut(world) {
        w.custom_filter = fcn.map(|f| (f, context as usize));
    }
}

pub fn world_set_pre_solve(world: WorldId, fcn: Option<PreSolveFn>, context: *mut c_void) {
    let mut engine = engine();
    if let Some(w) = engine.world_mut(world) {
        w.pre_solve = fcn.map(|f| (f, context as usize));
    }
}

pub fn body_create(world: WorldId, def: &BodyDefRaw) -> BodyId {
    let mut engine = engine();
    let Some(w) = engine.world_mut(world) else {
        return BodyId::NULL;
    };
    let (index, revision) = alloc(
        &mut w.bodies,
        StubBody {
            body_type: def.body_type,
            transform: Transform {
                p: def.position,
                q: def.rotation,
            },
            linear_velocity: def.linear_velocity,
            angular_velocity: def.angular_velocity,
            gravity_scale: def.gravity_scale,
            enable_sleep: def.enable_sleep != 0,
            awake: def.is_awake != 0,
        },
    );
    BodyId {
        index1: (index + 1) as i32,
        world0: world.index1 - 1,
        revision,
    }
}

pub fn body_destroy(body: BodyId) {
    let mut engine = engine();
    let Some(w) = engine.body_world_mut(body) else {
        return;
    };
    let Some(index) = (body.index1 as usize).checked_sub(1) else {
        return;
    };
    let Some(slot) = w.bodies.get_mut(index) else {
        return;
    };
    if slot.revision != body.revision {
        return;
    }
    slot.value = None;
    // The engine frees everything attached to the body.
    for shape_slot in w.shapes.iter_mut() {
        if shape_slot.value.as_ref().is_some_and(|s| s.body == body) {
            shape_slot.value = None;
        }
    }
    for chain_slot in w.chains.iter_mut() {
        if chain_slot.value.as_ref().is_some_and(|c| c.body == body) {
            chain_slot.value = None;
        }
    }
    for joint_slot in w.joints.iter_mut() {
        if joint_slot
            .value
            .as_ref()
            .is_some_and(|j| j.body_a == body || j.body_b == body)
        {
            joint_slot.value = None;
        }
    }
}

pub fn body_transform(body: BodyId) -> Transform {
    let mut engine = engine();
    engine
        .body_world_mut(body)
        .and_then(|w| w.body(body))
        .map(|b| b.transform)
        .unwrap_or(Transform::IDENTITY)
}

pub fn body_set_transform(body: BodyId, position: Vec2, rotation: Rot) {
    let mut engine = engine();
    if let Some(b) = engine.body_world_mut(body).and_then(|w| w.body_mut(body)) {
        b.transform = Transform {
            p: position,
            q: rotation,
        };
    }
}

fn shape_create(body: BodyId, def: &ShapeDefRaw, geometry: Geometry) -> ShapeId {
    let mut engine = engine();
    let Some(w) = engine.body_world_mut(body) else {
        return ShapeId::NULL;
    };
    if w.body(body).is_none() {
        return ShapeId::NULL;
    }
    let (index, revision) = alloc(
        &mut w.shapes,
        StubShape {
            body,
            filter: def.filter,
            geometry,
        },
    );
    ShapeId {
        index1: (index + 1) as i32,
        world0: body.world0,
        revision,
    }
}

pub fn shape_create_circle(body: BodyId, def: &ShapeDefRaw, circle: &Circle) -> ShapeId {
    shape_create(body, def, Geometry::Circle(*circle))
}

pub fn shape_create_segment(body: BodyId, def: &ShapeDefRaw, segment: &Segment) -> ShapeId {
    shape_create(body, def, Geometry::Segment(*segment))
}

pub fn shape_destroy(shape: ShapeId) {
    let mut engine = engine();
    let Some(slot) = engine
        .worlds
        .get_mut(shape.world0 as usize)
        .and_then(|s| s.value.as_mut())
        .and_then(|w| w.shapes.get_mut((shape.index1 as usize).wrapping_sub(1)))
    else {
        return;
    };
    if slot.revision == shape.revision {
        slot.value = None;
    }
}

pub fn chain_create(body: BodyId, def: &ChainDefRaw) -> ChainId {
    let mut engine = engine();
    let Some(w) = engine.body_world_mut(body) else {
        return ChainId::NULL;
    };
    if w.body(body).is_none() || def.count < 2 || def.points.is_null() {
        return ChainId::NULL;
    }
    // Vertices are copied, as the engine documents.
    let points =
        unsafe { std::slice::from_raw_parts(def.points, def.count as usize) }.to_vec();
    let (index, revision) = alloc(
        &mut w.chains,
        StubChain {
            body,
            points,
            is_loop: def.is_loop != 0,
        },
    );
    ChainId {
        index1: (index + 1) as i32,
        world0: body.world0,
        revision,
    }
}

pub fn chain_destroy(chain: ChainId) {
    let mut engine = engine();
    let Some(slot) = engine
        .worlds
        .get_mut(chain.world0 as usize)
        .and_then(|s| s.value.as_mut())
        .and_then(|w| w.chains.get_mut((chain.index1 as usize).wrapping_sub(1)))
    else {
        return;
    };
    if slot.revision == chain.revision {
        slot.value = None;
    }
}

pub fn joint_create_distance(world: WorldId, def: &DistanceJointDefRaw) -> JointId {
    let mut engine = engine();
    let Some(w) = engine.world_mut(world) else {
        return JointId::NULL;
    };
    if w.body(def.body_a).is_none() || w.body(def.body_b).is_none() {
        return JointId::NULL;
    }
    let (index, revision) = alloc(
        &mut w.joints,
        StubJoint {
            body_a: def.body_a,
            body_b: def.body_b,
        },
    );
    JointId {
        index1: (index + 1) as i32,
        world0: world.index1 - 1,
        revision,
    }
}

pub fn joint_destroy(joint: JointId) {
    let mut engine = engine();
    let Some(slot) = engine
        .worlds
        .get_mut(joint.world0 as usize)
        .and_then(|s| s.value.as_mut())
        .and_then(|w| w.joints.get_mut((joint.index1 as usize).wrapping_sub(1)))
    else {
        return;
    };
    if slot.revision == joint.revision {
        slot.value = None;
    }
}

pub fn version() -> Version {
    Version {
        major: 3,
        minor: 1,
        revision: 0,
    }
}

/// Ray-circle intersection; returns (fraction, point, normal) for the first
/// crossing along `translation`, or None when the ray misses or starts
/// inside the circle.
fn ray_circle(origin: Vec2, translation: Vec2, center: Vec2, radius: f32) -> Option<(f32, Vec2, Vec2)> {
    let m = origin.sub(center);
    let a = translation.dot(translation);
    if a <= f32::EPSILON {
        return None;
    }
    let b = 2.0 * m.dot(translation);
    let k = m.dot(m) - radius * radius;
    let disc = b * b - 4.0 * a * k;
    if disc < 0.0 {
        return None;
    }
    let t = (-b - disc.sqrt()) / (2.0 * a);
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    let point = origin.add(translation.scale(t));
    let n = point.sub(center);
    let len = n.length_squared().sqrt();
    let normal = if len > f32::EPSILON {
        n.scale(1.0 / len)
    } else {
        Vec2::new(1.0, 0.0)
    };
    Some((t, point, normal))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world() -> WorldId {
        world_create(&WorldDefRaw {
            gravity: Vec2::new(0.0, -10.0),
            restitution_threshold: 1.0,
            enable_sleep: 1,
            _pad: [0; 3],
        })
    }

    fn dynamic_body(world: WorldId, position: Vec2, velocity: Vec2) -> BodyId {
        body_create(
            world,
            &BodyDefRaw {
                body_type: body_type::DYNAMIC,
                position,
                rotation: Rot::IDENTITY,
                linear_velocity: velocity,
                angular_velocity: 0.0,
                gravity_scale: 1.0,
                enable_sleep: 0,
                is_awake: 1,
                _pad: [0; 2],
            },
        )
    }

    #[test]
    fn test_world_slot_reuse_bumps_revision() {
        let first = test_world();
        world_destroy(first);
        let second = test_world();
        if second.index1 == first.index1 {
            assert_ne!(second.revision, first.revision);
        }
        world_destroy(second);
    }

    #[test]
    fn test_step_snapshots_moving_bodies() {
        let world = test_world();
        let body = dynamic_body(world, Vec2::ZERO, Vec2::new(1.0, 0.0));
        world_step(world, 0.1, 4);
        let events = world_move_events(world);
        assert_eq!(events.count, 1);
        let event = unsafe { *events.events };
        assert_eq!(event.body_id, body);
        assert!(event.transform.p.x > 0.0);
        world_destroy(world);
    }

    #[test]
    fn test_version_triple() {
        let v = version();
        assert_eq!((v.major, v.minor, v.revision), (3, 1, 0));
    }
}
