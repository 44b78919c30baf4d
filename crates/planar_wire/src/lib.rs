//! Planar Wire - Fixed-Layout Native Record Access
//!
//! This crate describes the byte layout of fixed-size native records and
//! provides typed field access by computed offset. The native engine shares
//! records with the binding by pointer, so every layout here must agree with
//! the platform C ABI: natural alignment per field, total size rounded up to
//! the record's own alignment, host byte order.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 move-event record (28 bytes)            │
//! │  ┌──────────────┬─────────────┬──────────┬───────────┐  │
//! │  │ transform(16)│ body_id(8)  │ flag(1)  │  pad(3)   │  │
//! │  └──────────────┴─────────────┴──────────┴───────────┘  │
//! │   0              16            24         25..28        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use planar_wire::{FieldKind, StructLayout};
//!
//! let layout = StructLayout::builder()
//!     .field("index1", FieldKind::I32)
//!     .field("world0", FieldKind::U16)
//!     .field("revision", FieldKind::U16)
//!     .build();
//!
//! assert_eq!(layout.size(), 8);
//! assert_eq!(layout.offset_of("revision"), 6);
//! ```
//!
//! Requesting a field the layout does not declare, or reading past the end
//! of a buffer, is a configuration error against a fixed ABI; both panic
//! rather than returning a recoverable error. Layouts are immutable after
//! construction and safe to share across threads.

mod layout;

pub use layout::{Field, FieldKind, LayoutBuilder, StructLayout};
