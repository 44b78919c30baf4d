//! Real entry points of the native engine (feature `native`)
//!
//! Declarations match `planar2d/planar2d.h`. We link against `libplanar2d`;
//! every wrapper is a thin pass-through so the safe layer above sees the
//! same surface whether it runs against the engine or the host double.

#![cfg(feature = "native")]

use crate::types::*;
use std::ffi::c_void;

#[link(name = "planar2d")]
extern "C" {
    fn pl2d_world_create(def: *const WorldDefRaw) -> WorldId;
    fn pl2d_world_destroy(world: WorldId);
    fn pl2d_world_step(world: WorldId, dt: f32, substeps: i32);
    fn pl2d_world_move_events(world: WorldId) -> MoveEvents;
    fn pl2d_world_cast_ray(
        world: WorldId,
        origin: Vec2,
        translation: Vec2,
        filter: Filter,
        fcn: CastResultFn,
        context: *mut c_void,
    );
    fn pl2d_world_overlap_aabb(
        world: WorldId,
        aabb: Aabb,
        filter: Filter,
        fcn: OverlapResultFn,
        context: *mut c_void,
    );
    fn pl2d_world_set_custom_filter(
        world: WorldId,
        fcn: Option<CustomFilterFn>,
        context: *mut c_void,
    );
    fn pl2d_world_set_pre_solve(world: WorldId, fcn: Option<PreSolveFn>, context: *mut c_void);

    fn pl2d_body_create(world: WorldId, def: *const BodyDefRaw) -> BodyId;
    fn pl2d_body_destroy(body: BodyId);
    fn pl2d_body_transform(body: BodyId) -> Transform;
    fn pl2d_body_set_transform(body: BodyId, position: Vec2, rotation: Rot);

    fn pl2d_shape_create_circle(body: BodyId, def: *const ShapeDefRaw, circle: *const Circle)
        -> ShapeId;
    fn pl2d_shape_create_segment(
        body: BodyId,
        def: *const ShapeDefRaw,
        segment: *const Segment,
    ) -> ShapeId;
    fn pl2d_shape_destroy(shape: ShapeId);

    fn pl2d_chain_create(body: BodyId, def: *const ChainDefRaw) -> ChainId;
    fn pl2d_chain_destroy(chain: ChainId);

    fn pl2d_joint_create_distance(world: WorldId, def: *const DistanceJointDefRaw) -> JointId;
    fn pl2d_joint_destroy(joint: JointId);

    fn pl2d_version() -> Version;
}

pub fn world_create(def: &WorldDefRaw) -> WorldId {
    unsafe { pl2d_world_create(def) }
}

pub fn world_destroy(world: WorldId) {
    unsafe { pl2d_world_destroy(world) }
}

pub fn world_step(world: WorldId, dt: f32, substeps: i32) {
    unsafe { pl2d_world_step(world, dt, substeps) }
}

pub fn world_move_events(world: WorldId) -> MoveEvents {
    unsafe { pl2d_world_move_events(world) }
}

pub fn world_cast_ray(
    world: WorldId,
    origin: Vec2,
    translation: Vec2,
    filter: Filter,
    fcn: CastResultFn,
    context: *mut c_void,
) {
    unsafe { pl2d_world_cast_ray(world, origin, translation, filter, fcn, context) }
}

pub fn world_overlap_aabb(
    world: WorldId,
    aabb: Aabb,
    filter: Filter,
    fcn: OverlapResultFn,
    context: *mut c_void,
) {
    unsafe { pl2d_world_overlap_aabb(world, aabb, filter, fcn, context) }
}

pub fn world_set_custom_filter(world: WorldId, fcn: Option<CustomFilterFn>, context: *mut c_void) {
    unsafe { pl2d_world_set_custom_filter(world, fcn, context) }
}

pub fn world_set_pre_solve(world: WorldId, fcn: Option<PreSolveFn>, context: *mut c_void) {
    unsafe { pl2d_world_set_pre_solve(world, fcn, context) }
}

pub fn body_create(world: WorldId, def: &BodyDefRaw) -> BodyId {
    unsafe { pl2d_body_create(world, def) }
}

pub fn body_destroy(body: BodyId) {
    unsafe { pl2d_body_destroy(body) }
}

pub fn body_transform(body: BodyId) -> Transform {
    unsafe { pl2d_body_transform(body) }
}

pub fn body_set_transform(body: BodyId, position: Vec2, rotation: Rot) {
    unsafe { pl2d_body_set_transform(body, position, rotation) }
}

pub fn shape_create_circle(body: BodyId, def: &ShapeDefRaw, circle: &Circle) -> ShapeId {
    unsafe { pl2d_shape_create_circle(body, def, circle) }
}

pub fn shape_create_segment(body: BodyId, def: &ShapeDefRaw, segment: &Segment) -> ShapeId {
    unsafe { pl2d_shape_create_segment(body, def, segment) }
}

pub fn shape_destroy(shape: ShapeId) {
    unsafe { pl2d_shape_destroy(shape) }
}

pub fn chain_create(body: BodyId, def: &ChainDefRaw) -> ChainId {
    unsafe { pl2d_chain_create(body, def) }
}

pub fn chain_destroy(chain: ChainId) {
    unsafe { pl2d_chain_destroy(chain) }
}

pub fn joint_create_distance(world: WorldId, def: &DistanceJointDefRaw) -> JointId {
    unsafe { pl2d_joint_create_distance(world, def) }
}

pub fn joint_destroy(joint: JointId) {
    unsafe { pl2d_joint_destroy(joint) }
}

pub fn version() -> Version {
    unsafe { pl2d_version() }
}
