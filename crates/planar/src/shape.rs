//! Shape and chain-shape wrappers, definitions, and collision filtering

use bitflags::bitflags;
use planar_sys::{BodyId, ChainDefRaw, ChainId, Filter, ShapeDefRaw, ShapeId, Vec2};
use std::sync::Arc;

bitflags! {
    /// Collision category bits
    ///
    /// Categories above bit 0 are application-defined; use [`Categories::bit`]
    /// to name them.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Categories: u64 {
        const DEFAULT = 1;
        const ALL = u64::MAX;
    }
}

impl Categories {
    /// Single application-defined category bit
    pub fn bit(index: u32) -> Self {
        Self::from_bits_retain(1u64 << index)
    }
}

/// Category/mask pair used by shapes and queries
///
/// Two parties interact when each one's category intersects the other's
/// mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollisionFilter {
    pub categories: Categories,
    pub mask: Categories,
}

impl Default for CollisionFilter {
    fn default() -> Self {
        Self {
            categories: Categories::DEFAULT,
            mask: Categories::ALL,
        }
    }
}

impl CollisionFilter {
    pub fn new(categories: Categories, mask: Categories) -> Self {
        Self { categories, mask }
    }

    pub(crate) fn to_raw(self) -> Filter {
        Filter {
            category_bits: self.categories.bits(),
            mask_bits: self.mask.bits(),
        }
    }
}

/// Shape geometry in body-local coordinates
#[derive(Clone, Copy, Debug)]
pub enum ShapeGeometry {
    Circle { center: Vec2, radius: f32 },
    Segment { point1: Vec2, point2: Vec2 },
}

/// Shape creation parameters
#[derive(Clone, Debug)]
pub struct ShapeDef {
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    /// Sensors detect overlap but generate no contact response
    pub is_sensor: bool,
    pub filter: CollisionFilter,
}

impl Default for ShapeDef {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.6,
            restitution: 0.0,
            is_sensor: false,
            filter: CollisionFilter::default(),
        }
    }
}

impl ShapeDef {
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    pub fn with_filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub(crate) fn to_raw(&self) -> ShapeDefRaw {
        ShapeDefRaw {
            filter: self.filter.to_raw(),
            density: self.density,
            friction: self.friction,
            restitution: self.restitution,
            is_sensor: self.is_sensor as u8,
            _pad: [0; 3],
        }
    }
}

/// Chain-shape creation parameters
///
/// A chain is a sequence of connected segments, usually static terrain.
#[derive(Clone, Debug)]
pub struct ChainDef {
    pub points: Vec<Vec2>,
    /// Connect the last point back to the first
    pub is_loop: bool,
    pub friction: f32,
    pub restitution: f32,
    pub filter: CollisionFilter,
}

impl Default for ChainDef {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            is_loop: false,
            friction: 0.6,
            restitution: 0.0,
            filter: CollisionFilter::default(),
        }
    }
}

impl ChainDef {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    pub fn looped(mut self) -> Self {
        self.is_loop = true;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    /// The raw def borrows `self.points`; it must not outlive the create
    /// call (the engine copies the vertices).
    pub(crate) fn to_raw(&self) -> ChainDefRaw {
        ChainDefRaw {
            points: self.points.as_ptr(),
            count: self.points.len() as i32,
            is_loop: self.is_loop as u8,
            _pad: [0; 3],
            filter: self.filter.to_raw(),
            friction: self.friction,
            restitution: self.restitution,
        }
    }
}

/// Managed wrapper for one native shape
#[derive(Debug)]
pub struct Shape {
    id: ShapeId,
    body: BodyId,
}

impl Shape {
    pub(crate) fn new(id: ShapeId, body: BodyId) -> Arc<Self> {
        Arc::new(Self { id, body })
    }

    /// The native identifier backing this wrapper
    pub fn raw_id(&self) -> ShapeId {
        self.id
    }

    /// Identifier of the owning body
    pub fn body_id(&self) -> BodyId {
        self.body
    }
}

/// Managed wrapper for one native chain shape
#[derive(Debug)]
pub struct ChainShape {
    id: ChainId,
    body: BodyId,
}

impl ChainShape {
    pub(crate) fn new(id: ChainId, body: BodyId) -> Arc<Self> {
        Arc::new(Self { id, body })
    }

    pub fn raw_id(&self) -> ChainId {
        self.id
    }

    pub fn body_id(&self) -> BodyId {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let raw = CollisionFilter::default().to_raw();
        assert_eq!(raw.category_bits, 1);
        assert_eq!(raw.mask_bits, u64::MAX);
    }

    #[test]
    fn test_category_bit_helper() {
        let terrain = Categories::bit(3);
        assert_eq!(terrain.bits(), 0b1000);
        let filter = CollisionFilter::new(terrain, Categories::DEFAULT | terrain);
        assert_eq!(filter.to_raw().mask_bits, 0b1001);
    }

    #[test]
    fn test_shape_def_to_raw() {
        let raw = ShapeDef::default().with_restitution(0.5).sensor().to_raw();
        assert_eq!(raw.restitution, 0.5);
        assert_eq!(raw.is_sensor, 1);
        assert_eq!(raw.density, 1.0);
    }

    #[test]
    fn test_chain_def_to_raw_borrows_points() {
        let def = ChainDef::new(vec![Vec2::ZERO, Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0)]).looped();
        let raw = def.to_raw();
        assert_eq!(raw.count, 3);
        assert_eq!(raw.is_loop, 1);
        assert!(!raw.points.is_null());
    }
}
