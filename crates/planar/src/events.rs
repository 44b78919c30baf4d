//! Buffered move-event decoding
//!
//! After a step the engine exposes a contiguous, step-owned array of
//! fixed-layout move-event records. Decoding walks the array in order,
//! reads each record field by field through the layout descriptors, and
//! resolves the embedded body identifier through the world's registry.
//! Each handler invocation receives an immutable [`MoveEvent`] value, so
//! there is nothing a consumer could accidentally retain into the next
//! decode.

use crate::body::Body;
use crate::registry::InstanceRegistry;
use planar_sys::{BodyId, BodyMoveEvent, Rot, Transform, Vec2};
use planar_wire::{FieldKind, StructLayout};
use std::sync::{Arc, OnceLock};

/// One decoded move event
///
/// `body` is absent when the body was destroyed between the step and the
/// decode; the transform and sleep flag are still delivered.
#[derive(Clone, Debug)]
pub struct MoveEvent {
    pub body: Option<Arc<Body>>,
    pub transform: Transform,
    pub fell_asleep: bool,
}

fn transform_layout() -> &'static StructLayout {
    static LAYOUT: OnceLock<StructLayout> = OnceLock::new();
    LAYOUT.get_or_init(|| {
        StructLayout::builder()
            .field("p.x", FieldKind::F32)
            .field("p.y", FieldKind::F32)
            .field("q.c", FieldKind::F32)
            .field("q.s", FieldKind::F32)
            .build()
    })
}

fn body_id_layout() -> &'static StructLayout {
    static LAYOUT: OnceLock<StructLayout> = OnceLock::new();
    LAYOUT.get_or_init(|| {
        StructLayout::builder()
            .field("index1", FieldKind::I32)
            .field("world0", FieldKind::U16)
            .field("revision", FieldKind::U16)
            .build()
    })
}

pub(crate) fn move_event_layout() -> &'static StructLayout {
    static LAYOUT: OnceLock<StructLayout> = OnceLock::new();
    LAYOUT.get_or_init(|| {
        let layout = StructLayout::builder()
            .field("transform", transform_layout().as_record())
            .field("body_id", body_id_layout().as_record())
            .field("fell_asleep", FieldKind::Bool)
            .build();
        // The descriptor and the repr(C) mirror must agree byte for byte.
        assert_eq!(layout.size(), std::mem::size_of::<BodyMoveEvent>());
        layout
    })
}

/// Decode `count` move-event records from `bytes`, invoking the handler
/// once per record in array order.
pub(crate) fn decode_move_events(
    bytes: &[u8],
    count: usize,
    registry: &InstanceRegistry,
    handler: &mut dyn FnMut(MoveEvent),
) {
    let layout = move_event_layout();
    let stride = layout.size();
    debug_assert!(bytes.len() >= count * stride);
    for index in 0..count {
        let record = &bytes[index * stride..(index + 1) * stride];

        let transform_bytes = layout.record_bytes(record, "transform");
        let tl = transform_layout();
        let transform = Transform {
            p: Vec2::new(tl.read_f32(transform_bytes, "p.x"), tl.read_f32(transform_bytes, "p.y")),
            q: Rot {
                c: tl.read_f32(transform_bytes, "q.c"),
                s: tl.read_f32(transform_bytes, "q.s"),
            },
        };

        let id_bytes = layout.record_bytes(record, "body_id");
        let il = body_id_layout();
        let body_id = BodyId {
            index1: il.read_i32(id_bytes, "index1"),
            world0: il.read_u16(id_bytes, "world0"),
            revision: il.read_u16(id_bytes, "revision"),
        };

        handler(MoveEvent {
            body: registry.lookup_body(body_id),
            transform,
            fell_asleep: layout.read_bool(record, "fell_asleep"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    fn body_id(index1: i32) -> BodyId {
        BodyId {
            index1,
            world0: 0,
            revision: 1,
        }
    }

    fn move_event(index1: i32, x: f32, fell_asleep: bool) -> BodyMoveEvent {
        BodyMoveEvent {
            transform: Transform {
                p: Vec2::new(x, -1.0),
                q: Rot::IDENTITY,
            },
            body_id: body_id(index1),
            fell_asleep: fell_asleep as u8,
            _pad: [0; 3],
        }
    }

    fn decode_all(events: &[BodyMoveEvent], registry: &InstanceRegistry) -> Vec<MoveEvent> {
        let bytes: &[u8] = bytemuck::cast_slice(events);
        let mut decoded = Vec::new();
        decode_move_events(bytes, events.len(), registry, &mut |event| {
            decoded.push(event)
        });
        decoded
    }

    #[test]
    fn test_layout_agrees_with_native_record() {
        let layout = move_event_layout();
        assert_eq!(layout.offset_of("transform"), offset_of!(BodyMoveEvent, transform));
        assert_eq!(layout.offset_of("body_id"), offset_of!(BodyMoveEvent, body_id));
        assert_eq!(
            layout.offset_of("fell_asleep"),
            offset_of!(BodyMoveEvent, fell_asleep)
        );
        assert_eq!(layout.size(), size_of::<BodyMoveEvent>());
    }

    #[test]
    fn test_empty_buffer_invokes_handler_zero_times() {
        let registry = InstanceRegistry::new();
        let decoded = decode_all(&[], &registry);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_decode_preserves_array_order() {
        let mut registry = InstanceRegistry::new();
        for index1 in 1..=3 {
            registry.register_body(Body::new(body_id(index1)));
        }
        let events = [
            move_event(3, 30.0, false),
            move_event(1, 10.0, false),
            move_event(2, 20.0, true),
        ];
        let decoded = decode_all(&events, &registry);
        assert_eq!(decoded.len(), 3);
        let order: Vec<i32> = decoded
            .iter()
            .map(|e| e.body.as_ref().map(|b| b.raw_id().index1).unwrap_or(0))
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(decoded[1].transform.p.x, 10.0);
        assert!(decoded[2].fell_asleep);
    }

    #[test]
    fn test_evicted_body_yields_absent_but_complete_event() {
        let mut registry = InstanceRegistry::new();
        registry.register_body(Body::new(body_id(1)));
        registry.register_body(Body::new(body_id(2)));
        registry.evict_body(body_id(2));
        let events = [move_event(2, 5.0, true)];
        let decoded = decode_all(&events, &registry);
        assert_eq!(decoded.len(), 1);
        assert!(decoded[0].body.is_none());
        assert_eq!(decoded[0].transform.p.x, 5.0);
        assert!(decoded[0].fell_asleep);
    }

    #[test]
    fn test_step_scenario_reports_movers_only() {
        // Bodies {1, 2, 3} exist; the step reports moves for {2, 3} with
        // fell_asleep {false, true}. Exactly two handler calls, in order.
        let mut registry = InstanceRegistry::new();
        let bodies: Vec<Arc<Body>> =
            (1..=3).map(|i| {
                let body = Body::new(body_id(i));
                registry.register_body(body.clone());
                body
            }).collect();
        let events = [move_event(2, 2.0, false), move_event(3, 3.0, true)];
        let decoded = decode_all(&events, &registry);
        assert_eq!(decoded.len(), 2);
        assert!(Arc::ptr_eq(decoded[0].body.as_ref().unwrap(), &bodies[1]));
        assert!(!decoded[0].fell_asleep);
        assert!(Arc::ptr_eq(decoded[1].body.as_ref().unwrap(), &bodies[2]));
        assert!(decoded[1].fell_asleep);
    }
}
