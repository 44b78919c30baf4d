//! Joint wrapper and definitions

use planar_sys::{BodyId, DistanceJointDefRaw, JointId, Vec2};
use std::sync::Arc;

/// Distance joint creation parameters
///
/// Keeps two anchor points a fixed distance apart, optionally softened into
/// a spring by a nonzero `hertz`.
#[derive(Clone, Debug)]
pub struct DistanceJointDef {
    pub local_anchor_a: Vec2,
    pub local_anchor_b: Vec2,
    /// Rest length between the anchors
    pub length: f32,
    /// Spring stiffness; 0 means rigid
    pub hertz: f32,
    pub damping_ratio: f32,
    /// Let the connected bodies still collide with each other
    pub collide_connected: bool,
}

impl Default for DistanceJointDef {
    fn default() -> Self {
        Self {
            local_anchor_a: Vec2::ZERO,
            local_anchor_b: Vec2::ZERO,
            length: 1.0,
            hertz: 0.0,
            damping_ratio: 0.0,
            collide_connected: false,
        }
    }
}

impl DistanceJointDef {
    pub fn with_length(mut self, length: f32) -> Self {
        self.length = length;
        self
    }

    pub fn with_anchors(mut self, a: Vec2, b: Vec2) -> Self {
        self.local_anchor_a = a;
        self.local_anchor_b = b;
        self
    }

    pub fn with_spring(mut self, hertz: f32, damping_ratio: f32) -> Self {
        self.hertz = hertz;
        self.damping_ratio = damping_ratio;
        self
    }

    pub fn collide_connected(mut self) -> Self {
        self.collide_connected = true;
        self
    }

    pub(crate) fn to_raw(&self, body_a: BodyId, body_b: BodyId) -> DistanceJointDefRaw {
        DistanceJointDefRaw {
            body_a,
            body_b,
            local_anchor_a: self.local_anchor_a,
            local_anchor_b: self.local_anchor_b,
            length: self.length,
            hertz: self.hertz,
            damping_ratio: self.damping_ratio,
            collide_connected: self.collide_connected as u8,
            _pad: [0; 3],
        }
    }
}

/// Managed wrapper for one native joint
#[derive(Debug)]
pub struct Joint {
    id: JointId,
    body_a: BodyId,
    body_b: BodyId,
}

impl Joint {
    pub(crate) fn new(id: JointId, body_a: BodyId, body_b: BodyId) -> Arc<Self> {
        Arc::new(Self { id, body_a, body_b })
    }

    /// The native identifier backing this wrapper
    pub fn raw_id(&self) -> JointId {
        self.id
    }

    pub fn body_a(&self) -> BodyId {
        self.body_a
    }

    pub fn body_b(&self) -> BodyId {
        self.body_b
    }
}
