//! Rigid body wrapper and definition

use planar_sys::{self as native, body_type, BodyDefRaw, BodyId, Rot, Transform, Vec2};
use std::sync::Arc;

/// Motion model of a body
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyType {
    /// Never moves; zero mass
    #[default]
    Fixed,
    /// Moves by velocity only, unaffected by forces
    Kinematic,
    /// Fully simulated
    Dynamic,
}

impl BodyType {
    fn to_raw(self) -> i32 {
        match self {
            BodyType::Fixed => body_type::STATIC,
            BodyType::Kinematic => body_type::KINEMATIC,
            BodyType::Dynamic => body_type::DYNAMIC,
        }
    }
}

/// Body creation parameters
#[derive(Clone, Debug)]
pub struct BodyDef {
    pub body_type: BodyType,
    pub position: Vec2,
    /// Initial rotation in radians
    pub angle: f32,
    pub linear_velocity: Vec2,
    /// Radians per second
    pub angular_velocity: f32,
    pub gravity_scale: f32,
    pub enable_sleep: bool,
    pub awake: bool,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            body_type: BodyType::Fixed,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity_scale: 1.0,
            enable_sleep: true,
            awake: true,
        }
    }
}

impl BodyDef {
    /// Dynamic body preset
    pub fn dynamic() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            ..Self::default()
        }
    }

    /// Kinematic body preset
    pub fn kinematic() -> Self {
        Self {
            body_type: BodyType::Kinematic,
            ..Self::default()
        }
    }

    /// Fixed (non-moving) body preset
    pub fn fixed() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_angle(mut self, radians: f32) -> Self {
        self.angle = radians;
        self
    }

    pub fn with_linear_velocity(mut self, velocity: Vec2) -> Self {
        self.linear_velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, radians_per_second: f32) -> Self {
        self.angular_velocity = radians_per_second;
        self
    }

    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    pub fn with_sleep(mut self, enabled: bool) -> Self {
        self.enable_sleep = enabled;
        self
    }

    pub(crate) fn to_raw(&self) -> BodyDefRaw {
        BodyDefRaw {
            body_type: self.body_type.to_raw(),
            position: self.position,
            rotation: Rot::from_angle(self.angle),
            linear_velocity: self.linear_velocity,
            angular_velocity: self.angular_velocity,
            gravity_scale: self.gravity_scale,
            enable_sleep: self.enable_sleep as u8,
            is_awake: self.awake as u8,
            _pad: [0; 2],
        }
    }
}

/// Managed wrapper for one native rigid body
///
/// Obtained from [`World::create_body`](crate::World::create_body) or by
/// registry resolution inside events and callbacks; never constructed by
/// application code, so each identifier has exactly one wrapper.
#[derive(Debug)]
pub struct Body {
    id: BodyId,
}

impl Body {
    pub(crate) fn new(id: BodyId) -> Arc<Self> {
        Arc::new(Self { id })
    }

    /// The native identifier backing this wrapper
    pub fn raw_id(&self) -> BodyId {
        self.id
    }

    /// Current transform, read from the engine
    pub fn transform(&self) -> Transform {
        native::body_transform(self.id)
    }

    /// Current world position
    pub fn position(&self) -> Vec2 {
        self.transform().p
    }

    /// Teleport the body; do not call from inside a callback.
    pub fn set_transform(&self, position: Vec2, angle: f32) {
        native::body_set_transform(self.id, position, Rot::from_angle(angle));
    }
}
