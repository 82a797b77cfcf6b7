// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Target layout - byte size and alignment of static types.
//!
//! Struct layout follows the C rules: each field at the next offset aligned
//! to the field's alignment, total size rounded up to the struct alignment.

use crate::{BasicKind, StaticType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetLayout {
    pub pointer_bytes: u32,
}

/// Byte offset of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffset {
    pub offset: u32,
    pub size: u32,
}

impl Default for TargetLayout {
    fn default() -> Self {
        Self::host()
    }
}

impl TargetLayout {
    pub fn new(pointer_bytes: u32) -> Self {
        assert!(
            pointer_bytes == 4 || pointer_bytes == 8,
            "unsupported pointer width: {}",
            pointer_bytes
        );
        Self { pointer_bytes }
    }

    /// Layout of the machine this compiler runs on.
    pub fn host() -> Self {
        Self { pointer_bytes: std::mem::size_of::<usize>() as u32 }
    }

    /// Allocation size in bytes, or `None` if it does not fit in 32 bits.
    pub fn size_of(&self, ty: &StaticType) -> Option<u32> {
        let word = self.pointer_bytes;
        match ty {
            StaticType::Basic(kind) => Some(self.basic_size(*kind)),
            StaticType::Pointer(_)
            | StaticType::Map(_)
            | StaticType::Chan(_)
            | StaticType::Func { .. } => Some(word),
            StaticType::Interface { .. } => Some(2 * word), // type word + data word
            StaticType::Slice(_) => Some(3 * word),         // ptr + len + cap
            StaticType::Array { elem, len } => self.size_of(elem)?.checked_mul(*len),
            StaticType::Named { underlying, .. } => self.size_of(underlying),
            StaticType::Struct(fields) => {
                let mut offset = 0u32;
                for field in fields {
                    offset = align_to(offset, self.align_of(&field.ty))?;
                    offset = offset.checked_add(self.size_of(&field.ty)?)?;
                }
                align_to(offset, self.align_of(ty))
            }
        }
    }

    pub fn align_of(&self, ty: &StaticType) -> u32 {
        let word = self.pointer_bytes;
        match ty {
            StaticType::Basic(kind) => match kind {
                BasicKind::String | BasicKind::UnsafePointer => word,
                BasicKind::Complex64 => 4,
                BasicKind::Complex128 => 8,
                other => self.basic_size(*other),
            },
            StaticType::Array { elem, .. } => self.align_of(elem),
            StaticType::Named { underlying, .. } => self.align_of(underlying),
            StaticType::Struct(fields) => fields
                .iter()
                .map(|f| self.align_of(&f.ty))
                .max()
                .unwrap_or(1),
            _ => word,
        }
    }

    /// Offsets of every field of a struct type (after unwrapping names).
    /// `None` when the struct does not fit in 32 bits.
    pub fn field_offsets(&self, ty: &StaticType) -> Option<Vec<FieldOffset>> {
        let StaticType::Struct(fields) = ty.underlying() else {
            return Some(Vec::new());
        };
        let mut offset = 0u32;
        let mut placed = Vec::with_capacity(fields.len());
        for field in fields {
            offset = align_to(offset, self.align_of(&field.ty))?;
            let size = self.size_of(&field.ty)?;
            placed.push(FieldOffset { offset, size });
            offset = offset.checked_add(size)?;
        }
        Some(placed)
    }

    /// Byte ranges of `ty` that hold data, in ascending order with adjacent
    /// ranges merged. Padding between and after struct fields is left out.
    pub fn data_ranges(&self, ty: &StaticType) -> Option<Vec<FieldOffset>> {
        let mut out = Vec::new();
        self.push_data_ranges(ty, 0, &mut out)?;
        Some(out)
    }

    fn push_data_ranges(&self, ty: &StaticType, base: u32, out: &mut Vec<FieldOffset>) -> Option<()> {
        match ty.underlying() {
            StaticType::Struct(fields) => {
                let offsets = self.field_offsets(ty)?;
                for (field, placed) in fields.iter().zip(offsets) {
                    self.push_data_ranges(&field.ty, base.checked_add(placed.offset)?, out)?;
                }
            }
            StaticType::Array { elem, len } => {
                let size = self.size_of(elem)?;
                let elem_ranges = self.data_ranges(elem)?;
                if let [only] = elem_ranges.as_slice() {
                    if only.offset == 0 && only.size == size {
                        push_range(out, base, size.checked_mul(*len)?);
                        return Some(());
                    }
                }
                for i in 0..*len {
                    let start = base.checked_add(i.checked_mul(size)?)?;
                    for range in &elem_ranges {
                        push_range(out, start.checked_add(range.offset)?, range.size);
                    }
                }
            }
            other => push_range(out, base, self.size_of(other)?),
        }
        Some(())
    }

    fn basic_size(&self, kind: BasicKind) -> u32 {
        match kind {
            BasicKind::Bool | BasicKind::Int8 | BasicKind::Uint8 => 1,
            BasicKind::Int16 | BasicKind::Uint16 => 2,
            BasicKind::Int32 | BasicKind::Uint32 | BasicKind::Float32 => 4,
            BasicKind::Int64 | BasicKind::Uint64 | BasicKind::Float64 | BasicKind::Complex64 => 8,
            BasicKind::Complex128 => 16,
            BasicKind::Int | BasicKind::Uint | BasicKind::Uintptr | BasicKind::UnsafePointer => {
                self.pointer_bytes
            }
            BasicKind::String => 2 * self.pointer_bytes, // ptr + len
        }
    }
}

fn align_to(offset: u32, align: u32) -> Option<u32> {
    Some(offset.checked_add(align - 1)? & !(align - 1))
}

fn push_range(out: &mut Vec<FieldOffset>, offset: u32, size: u32) {
    if size == 0 {
        return;
    }
    match out.last_mut() {
        Some(last) if last.offset + last.size == offset => last.size += size,
        _ => out.push(FieldOffset { offset, size }),
    }
}
