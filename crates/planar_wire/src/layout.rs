//! Struct layout descriptors with natural-alignment offset computation

use std::mem;

/// Primitive kind of one record field
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Bool,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Pointer-sized word (raw address)
    Pointer,
    /// Embedded record with a known size and alignment
    Record { size: usize, align: usize },
}

impl FieldKind {
    /// Size of the field in bytes
    pub const fn size(self) -> usize {
        match self {
            FieldKind::Bool | FieldKind::U8 => 1,
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 => 8,
            FieldKind::Pointer => mem::size_of::<usize>(),
            FieldKind::Record { size, .. } => size,
        }
    }

    /// Natural alignment of the field in bytes
    pub const fn align(self) -> usize {
        match self {
            FieldKind::Bool | FieldKind::U8 => 1,
            FieldKind::I16 | FieldKind::U16 => 2,
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => 4,
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 => 8,
            FieldKind::Pointer => mem::align_of::<usize>(),
            FieldKind::Record { align, .. } => align,
        }
    }
}

/// One field of a layout, with its computed offset
#[derive(Clone, Debug)]
pub struct Field {
    name: &'static str,
    kind: FieldKind,
    offset: usize,
}

impl Field {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Byte layout of one fixed-size native record
///
/// Built once from an ordered field list; immutable afterwards.
#[derive(Clone, Debug)]
pub struct StructLayout {
    fields: Vec<Field>,
    size: usize,
    align: usize,
}

/// Ordered field list for a [`StructLayout`]
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    fields: Vec<(&'static str, FieldKind)>,
}

impl LayoutBuilder {
    /// Append a field in declaration order
    pub fn field(mut self, name: &'static str, kind: FieldKind) -> Self {
        self.fields.push((name, kind));
        self
    }

    /// Compute offsets and total size under natural alignment rules
    ///
    /// Panics on a duplicate field name.
    pub fn build(self) -> StructLayout {
        let mut fields: Vec<Field> = Vec::with_capacity(self.fields.len());
        let mut cursor = 0usize;
        let mut align = 1usize;
        for (name, kind) in self.fields {
            if fields.iter().any(|f| f.name == name) {
                panic!("duplicate field '{name}' in layout");
            }
            let field_align = kind.align().max(1);
            let offset = round_up(cursor, field_align);
            cursor = offset + kind.size();
            align = align.max(field_align);
            fields.push(Field { name, kind, offset });
        }
        StructLayout {
            fields,
            size: round_up(cursor, align),
            align,
        }
    }
}

impl StructLayout {
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::default()
    }

    /// Total size including trailing padding
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment requirement of the whole record
    pub fn align(&self) -> usize {
        self.align
    }

    /// This layout as an embeddable field kind
    pub fn as_record(&self) -> FieldKind {
        FieldKind::Record {
            size: self.size,
            align: self.align,
        }
    }

    /// Byte offset of a field; panics on an unknown name
    pub fn offset_of(&self, name: &str) -> usize {
        self.field(name).offset
    }

    /// Kind of a field; panics on an unknown name
    pub fn kind_of(&self, name: &str) -> FieldKind {
        self.field(name).kind
    }

    fn field(&self, name: &str) -> &Field {
        self.fields.iter().find(|f| f.name == name).unwrap_or_else(|| {
            let known: Vec<&str> = self.fields.iter().map(|f| f.name).collect();
            panic!("unknown field '{name}'; layout has {known:?}")
        })
    }

    fn expect(&self, name: &str, kind: FieldKind) -> &Field {
        let field = self.field(name);
        if field.kind != kind {
            panic!(
                "field '{name}' is {:?}, accessed as {:?}",
                field.kind, kind
            );
        }
        field
    }

    pub fn read_bool(&self, buf: &[u8], name: &str) -> bool {
        let field = self.expect(name, FieldKind::Bool);
        take::<1>(buf, field.offset)[0] != 0
    }

    pub fn read_u8(&self, buf: &[u8], name: &str) -> u8 {
        let field = self.expect(name, FieldKind::U8);
        take::<1>(buf, field.offset)[0]
    }

    pub fn read_i16(&self, buf: &[u8], name: &str) -> i16 {
        i16::from_ne_bytes(take(buf, self.expect(name, FieldKind::I16).offset))
    }

    pub fn read_u16(&self, buf: &[u8], name: &str) -> u16 {
        u16::from_ne_bytes(take(buf, self.expect(name, FieldKind::U16).offset))
    }

    pub fn read_i32(&self, buf: &[u8], name: &str) -> i32 {
        i32::from_ne_bytes(take(buf, self.expect(name, FieldKind::I32).offset))
    }

    pub fn read_u32(&self, buf: &[u8], name: &str) -> u32 {
        u32::from_ne_bytes(take(buf, self.expect(name, FieldKind::U32).offset))
    }

    pub fn read_i64(&self, buf: &[u8], name: &str) -> i64 {
        i64::from_ne_bytes(take(buf, self.expect(name, FieldKind::I64).offset))
    }

    pub fn read_u64(&self, buf: &[u8], name: &str) -> u64 {
        u64::from_ne_bytes(take(buf, self.expect(name, FieldKind::U64).offset))
    }

    pub fn read_f32(&self, buf: &[u8], name: &str) -> f32 {
        f32::from_ne_bytes(take(buf, self.expect(name, FieldKind::F32).offset))
    }

    pub fn read_f64(&self, buf: &[u8], name: &str) -> f64 {
        f64::from_ne_bytes(take(buf, self.expect(name, FieldKind::F64).offset))
    }

    /// Read a pointer-sized word as a raw address
    pub fn read_pointer(&self, buf: &[u8], name: &str) -> usize {
        usize::from_ne_bytes(take(buf, self.expect(name, FieldKind::Pointer).offset))
    }

    /// Borrow the bytes of an embedded record field, for decoding with the
    /// sub-record's own layout
    pub fn record_bytes<'a>(&self, buf: &'a [u8], name: &str) -> &'a [u8] {
        let field = self.field(name);
        let FieldKind::Record { size, .. } = field.kind else {
            panic!("field '{name}' is {:?}, accessed as a record", field.kind);
        };
        check_len(buf, field.offset, size);
        &buf[field.offset..field.offset + size]
    }

    pub fn write_bool(&self, buf: &mut [u8], name: &str, value: bool) {
        let field = self.expect(name, FieldKind::Bool);
        put(buf, field.offset, [value as u8]);
    }

    pub fn write_u8(&self, buf: &mut [u8], name: &str, value: u8) {
        let field = self.expect(name, FieldKind::U8);
        put(buf, field.offset, [value]);
    }

    pub fn write_i16(&self, buf: &mut [u8], name: &str, value: i16) {
        put(buf, self.expect(name, FieldKind::I16).offset, value.to_ne_bytes());
    }

    pub fn write_u16(&self, buf: &mut [u8], name: &str, value: u16) {
        put(buf, self.expect(name, FieldKind::U16).offset, value.to_ne_bytes());
    }

    pub fn write_i32(&self, buf: &mut [u8], name: &str, value: i32) {
        put(buf, self.expect(name, FieldKind::I32).offset, value.to_ne_bytes());
    }

    pub fn write_u32(&self, buf: &mut [u8], name: &str, value: u32) {
        put(buf, self.expect(name, FieldKind::U32).offset, value.to_ne_bytes());
    }

    pub fn write_i64(&self, buf: &mut [u8], name: &str, value: i64) {
        put(buf, self.expect(name, FieldKind::I64).offset, value.to_ne_bytes());
    }

    pub fn write_u64(&self, buf: &mut [u8], name: &str, value: u64) {
        put(buf, self.expect(name, FieldKind::U64).offset, value.to_ne_bytes());
    }

    pub fn write_f32(&self, buf: &mut [u8], name: &str, value: f32) {
        put(buf, self.expect(name, FieldKind::F32).offset, value.to_ne_bytes());
    }

    pub fn write_f64(&self, buf: &mut [u8], name: &str, value: f64) {
        put(buf, self.expect(name, FieldKind::F64).offset, value.to_ne_bytes());
    }

    /// Borrow the bytes of an embedded record field mutably
    pub fn record_bytes_mut<'a>(&self, buf: &'a mut [u8], name: &str) -> &'a mut [u8] {
        let field = self.field(name);
        let FieldKind::Record { size, .. } = field.kind else {
            panic!("field '{name}' is {:?}, accessed as a record", field.kind);
        };
        check_len(buf, field.offset, size);
        &mut buf[field.offset..field.offset + size]
    }
}

fn round_up(value: usize, align: usize) -> usize {
    (value + align - 1) / align * align
}

fn check_len(buf: &[u8], offset: usize, len: usize) {
    if offset + len > buf.len() {
        panic!(
            "record buffer too short: need {} bytes at offset {offset}, have {}",
            len,
            buf.len()
        );
    }
}

fn take<const N: usize>(buf: &[u8], offset: usize) -> [u8; N] {
    check_len(buf, offset, N);
    let mut bytes = [0u8; N];
    bytes.copy_from_slice(&buf[offset..offset + N]);
    bytes
}

fn put<const N: usize>(buf: &mut [u8], offset: usize, bytes: [u8; N]) {
    check_len(buf, offset, N);
    buf[offset..offset + N].copy_from_slice(&bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_int_offsets() {
        let layout = StructLayout::builder()
            .field("a", FieldKind::I32)
            .field("b", FieldKind::I32)
            .field("c", FieldKind::I32)
            .build();
        assert_eq!(layout.offset_of("a"), 0);
        assert_eq!(layout.offset_of("b"), 4);
        assert_eq!(layout.offset_of("c"), 8);
        assert_eq!(layout.size(), 12);
        assert_eq!(layout.align(), 4);
    }

    #[test]
    fn test_interior_padding() {
        let layout = StructLayout::builder()
            .field("tag", FieldKind::U8)
            .field("count", FieldKind::U16)
            .build();
        assert_eq!(layout.offset_of("count"), 2);
        assert_eq!(layout.size(), 4);
    }

    #[test]
    fn test_trailing_padding_with_mixed_fields() {
        let transform = StructLayout::builder()
            .field("px", FieldKind::F32)
            .field("py", FieldKind::F32)
            .field("qc", FieldKind::F32)
            .field("qs", FieldKind::F32)
            .build();
        let layout = StructLayout::builder()
            .field("transform", transform.as_record())
            .field("handle", FieldKind::U64)
            .field("context", FieldKind::Pointer)
            .field("flag", FieldKind::Bool)
            .build();
        assert_eq!(layout.offset_of("transform"), 0);
        assert_eq!(layout.offset_of("handle"), 16);
        assert_eq!(layout.offset_of("context"), 24);
        assert_eq!(layout.offset_of("flag"), 24 + std::mem::size_of::<usize>());
        // Trailing padding rounds up to the 8-byte record alignment.
        assert_eq!(layout.size() % layout.align(), 0);
        assert_eq!(layout.align(), 8);
    }

    #[test]
    fn test_read_write_roundtrip() {
        let layout = StructLayout::builder()
            .field("id", FieldKind::U64)
            .field("x", FieldKind::F32)
            .field("asleep", FieldKind::Bool)
            .build();
        let mut buf = vec![0u8; layout.size()];
        layout.write_u64(&mut buf, "id", 0xDEAD_BEEF);
        layout.write_f32(&mut buf, "x", 2.5);
        layout.write_bool(&mut buf, "asleep", true);
        assert_eq!(layout.read_u64(&buf, "id"), 0xDEAD_BEEF);
        assert_eq!(layout.read_f32(&buf, "x"), 2.5);
        assert!(layout.read_bool(&buf, "asleep"));
    }

    #[test]
    fn test_nested_record_decode() {
        let inner = StructLayout::builder()
            .field("x", FieldKind::F32)
            .field("y", FieldKind::F32)
            .build();
        let outer = StructLayout::builder()
            .field("point", inner.as_record())
            .field("weight", FieldKind::F32)
            .build();
        let mut buf = vec![0u8; outer.size()];
        inner.write_f32(outer.record_bytes_mut(&mut buf, "point"), "y", -1.0);
        outer.write_f32(&mut buf, "weight", 3.0);
        assert_eq!(inner.read_f32(outer.record_bytes(&buf, "point"), "y"), -1.0);
        assert_eq!(outer.read_f32(&buf, "weight"), 3.0);
    }

    #[test]
    #[should_panic(expected = "unknown field")]
    fn test_unknown_field_panics() {
        let layout = StructLayout::builder().field("a", FieldKind::I32).build();
        layout.offset_of("b");
    }

    #[test]
    #[should_panic(expected = "duplicate field")]
    fn test_duplicate_field_panics() {
        StructLayout::builder()
            .field("a", FieldKind::I32)
            .field("a", FieldKind::F32)
            .build();
    }

    #[test]
    #[should_panic(expected = "accessed as")]
    fn test_kind_mismatch_panics() {
        let layout = StructLayout::builder().field("a", FieldKind::I32).build();
        layout.read_f32(&[0u8; 4], "a");
    }

    #[test]
    #[should_panic(expected = "buffer too short")]
    fn test_short_buffer_panics() {
        let layout = StructLayout::builder().field("a", FieldKind::U64).build();
        layout.read_u64(&[0u8; 4], "a");
    }
}
