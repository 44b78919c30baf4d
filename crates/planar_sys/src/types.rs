//! C-compatible records shared with the native engine
//!
//! Field order, alignment, and trailing padding here must match the
//! `planar2d` headers exactly; every record crosses the boundary by value or
//! through a raw pointer.

use bytemuck::{Pod, Zeroable};
use std::ffi::c_void;

/// 2D vector (matches the native `pl2d_vec2`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(self, s: f32) -> Self {
        Self::new(self.x * s, self.y * s)
    }
}

/// Rotation stored as cosine/sine (matches `pl2d_rot`)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Rot {
    pub c: f32,
    pub s: f32,
}

impl Rot {
    pub const IDENTITY: Self = Self { c: 1.0, s: 0.0 };

    pub fn from_angle(radians: f32) -> Self {
        Self {
            c: radians.cos(),
            s: radians.sin(),
        }
    }

    /// Rotate a vector by this rotation
    pub fn apply(self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }
}

impl Default for Rot {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Rigid transform: translation plus rotation (matches `pl2d_transform`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Transform {
    pub p: Vec2,
    pub q: Rot,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    /// Transform a local point into world space
    pub fn apply(self, v: Vec2) -> Vec2 {
        self.q.apply(v).add(self.p)
    }
}

/// Axis-aligned bounding box (matches `pl2d_aabb`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Aabb {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Aabb {
    pub const fn new(lower: Vec2, upper: Vec2) -> Self {
        Self { lower, upper }
    }

    pub fn overlaps(self, other: Self) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
    }
}

// ---------------------------------------------------------------------------
// Identifiers
//
// The engine hands out index-plus-revision identifiers: `index1` is the slot
// index plus one (zero means null), `revision` distinguishes reuse of the
// same slot, and entity identifiers carry the owning world's index. The
// binding never interprets these beyond equality, hashing, and null checks.
// ---------------------------------------------------------------------------

/// Identifier of one simulation world (matches `pl2d_world_id`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct WorldId {
    pub index1: u16,
    pub revision: u16,
}

impl WorldId {
    pub const NULL: Self = Self {
        index1: 0,
        revision: 0,
    };

    pub fn is_null(self) -> bool {
        self.index1 == 0
    }
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[repr(C)]
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
        pub struct $name {
            pub index1: i32,
            pub world0: u16,
            pub revision: u16,
        }

        impl $name {
            pub const NULL: Self = Self {
                index1: 0,
                world0: 0,
                revision: 0,
            };

            pub fn is_null(self) -> bool {
                self.index1 == 0
            }

            /// Raw bit packing, used as a map key by the binding
            pub fn bits(self) -> u64 {
                ((self.index1 as u32 as u64) << 32)
                    | ((self.world0 as u64) << 16)
                    | self.revision as u64
            }
        }
    };
}

entity_id! {
    /// Identifier of one rigid body (matches `pl2d_body_id`)
    BodyId
}
entity_id! {
    /// Identifier of one shape (matches `pl2d_shape_id`)
    ShapeId
}
entity_id! {
    /// Identifier of one chain shape (matches `pl2d_chain_id`)
    ChainId
}
entity_id! {
    /// Identifier of one joint (matches `pl2d_joint_id`)
    JointId
}

// ---------------------------------------------------------------------------
// Geometry and definitions
// ---------------------------------------------------------------------------

/// Circle primitive in body-local coordinates (matches `pl2d_circle`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
}

/// Line segment primitive in body-local coordinates (matches `pl2d_segment`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Segment {
    pub point1: Vec2,
    pub point2: Vec2,
}

/// Collision category/mask pair (matches `pl2d_filter`)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Filter {
    pub category_bits: u64,
    pub mask_bits: u64,
}

impl Filter {
    /// Default filter: category 1, collides with everything
    pub const DEFAULT: Self = Self {
        category_bits: 1,
        mask_bits: u64::MAX,
    };

    /// Two filters pass when each accepts the other's category
    pub fn should_collide(self, other: Self) -> bool {
        (self.category_bits & other.mask_bits) != 0
            && (other.category_bits & self.mask_bits) != 0
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// World creation parameters (matches `pl2d_world_def`)
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct WorldDefRaw {
    pub gravity: Vec2,
    pub restitution_threshold: f32,
    pub enable_sleep: u8,
    pub _pad: [u8; 3],
}

/// Body creation parameters (matches `pl2d_body_def`)
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct BodyDefRaw {
    pub body_type: i32,
    pub position: Vec2,
    pub rotation: Rot,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub enable_sleep: u8,
    pub is_awake: u8,
    pub _pad: [u8; 2],
}

/// Shape creation parameters (matches `pl2d_shape_def`)
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ShapeDefRaw {
    pub filter: Filter,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub is_sensor: u8,
    pub _pad: [u8; 3],
}

/// Chain creation parameters (matches `pl2d_chain_def`)
///
/// `points` must stay valid for the duration of the create call only; the
/// engine copies the vertices.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct ChainDefRaw {
    pub points: *const Vec2,
    pub count: i32,
    pub is_loop: u8,
    pub _pad: [u8; 3],
    pub filter: Filter,
    pub friction: f32,
    pub restitution: f32,
}

/// Distance joint creation parameters (matches `pl2d_distance_joint_def`)
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct DistanceJointDefRaw {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    pub length: f32,
    pub hertz: f32,
    pub damping_ratio: f32,
    pub collide_connected: u8,
    pub _pad: [u8; 3],
}

// ---------------------------------------------------------------------------
// Events and contacts
// ---------------------------------------------------------------------------

/// One per-step move event (matches `pl2d_body_move_event`)
///
/// 28 bytes: transform at 0, body id at 16, flag at 24, then explicit
/// padding to the record's 4-byte alignment.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct BodyMoveEvent {
    pub transform: Transform,
    pub body_id: BodyId,
    /// Non-zero when the body fell asleep this step
    pub fell_asleep: u8,
    pub _pad: [u8; 3],
}

/// Step-owned move event array (matches `pl2d_move_events`)
///
/// Valid until the next step or entity destruction; read-only snapshot.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct MoveEvents {
    pub events: *const BodyMoveEvent,
    pub count: i32,
}

/// One contact point inside a manifold (matches `pl2d_manifold_point`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct ManifoldPoint {
    pub point: Vec2,
    pub separation: f32,
    pub normal_impulse: f32,
}

/// Contact manifold handed to pre-solve callbacks (matches `pl2d_manifold`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct Manifold {
    pub points: [ManifoldPoint; 2],
    pub normal: Vec2,
    pub point_count: i32,
}

/// Native engine version triple (matches `pl2d_version`)
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Version {
    pub major: i32,
    pub minor: i32,
    pub revision: i32,
}

// ---------------------------------------------------------------------------
// Callback signatures
//
// Invoked by the engine during a blocking step or query call. Custom-filter
// and pre-solve callbacks may arrive on engine worker threads.
// ---------------------------------------------------------------------------

/// Ray/shape-cast result callback.
///
/// Return -1 to ignore the hit and continue, 0 to terminate the cast, 1 to
/// accept the hit and continue unclipped, or a fraction in (0, 1) to clip
/// the cast to that fraction.
pub type CastResultFn = unsafe extern "C" fn(
    shape: ShapeId,
    point: Vec2,
    normal: Vec2,
    fraction: f32,
    context: *mut c_void,
) -> f32;

/// Overlap result callback; returning false terminates the query.
pub type OverlapResultFn = unsafe extern "C" fn(shape: ShapeId, context: *mut c_void) -> bool;

/// Pair filter callback; returning false disables collision for the pair.
pub type CustomFilterFn =
    unsafe extern "C" fn(shape_a: ShapeId, shape_b: ShapeId, context: *mut c_void) -> bool;

/// Pre-solve callback; returning false disables the contact for this step.
pub type PreSolveFn = unsafe extern "C" fn(
    shape_a: ShapeId,
    shape_b: ShapeId,
    manifold: *const Manifold,
    context: *mut c_void,
) -> bool;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, offset_of, size_of};

    #[test]
    fn test_record_layouts_match_native_abi() {
        assert_eq!(size_of::<Vec2>(), 8);
        assert_eq!(size_of::<Transform>(), 16);
        assert_eq!(size_of::<WorldId>(), 4);
        assert_eq!(size_of::<BodyId>(), 8);
        assert_eq!(align_of::<BodyId>(), 4);
        assert_eq!(size_of::<Version>(), 12);
        assert_eq!(size_of::<Filter>(), 16);
    }

    #[test]
    fn test_move_event_layout() {
        assert_eq!(offset_of!(BodyMoveEvent, transform), 0);
        assert_eq!(offset_of!(BodyMoveEvent, body_id), 16);
        assert_eq!(offset_of!(BodyMoveEvent, fell_asleep), 24);
        assert_eq!(size_of::<BodyMoveEvent>(), 28);
        assert_eq!(align_of::<BodyMoveEvent>(), 4);
    }

    #[test]
    fn test_id_bits_distinguish_revisions() {
        let first = BodyId {
            index1: 7,
            world0: 0,
            revision: 1,
        };
        let recreated = BodyId {
            index1: 7,
            world0: 0,
            revision: 2,
        };
        assert_ne!(first.bits(), recreated.bits());
        assert!(BodyId::NULL.is_null());
        assert!(!first.is_null());
    }

    #[test]
    fn test_filter_should_collide() {
        let a = Filter {
            category_bits: 0b01,
            mask_bits: 0b10,
        };
        let b = Filter {
            category_bits: 0b10,
            mask_bits: 0b01,
        };
        let c = Filter {
            category_bits: 0b100,
            mask_bits: 0b100,
        };
        assert!(a.should_collide(b));
        assert!(!a.should_collide(c));
        assert!(Filter::DEFAULT.should_collide(Filter::DEFAULT));
    }
}
