// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! StaticType → lowered value representation.
//!
//! Scalars live in SSA values, strings in a (ptr, len) pair, and everything
//! else in memory addressed by a pointer. Aggregates become pointers in
//! function signatures; inside bodies each one owns a stack slot.

use cranelift::prelude::*;
use mapc_types::{BasicKind, StaticType, TargetLayout};

use crate::{CodegenError, CodegenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRepr {
    Scalar(Type),
    /// Data pointer + byte length, one word each.
    StringPair,
    Memory { size: u32, align: u32 },
}

/// A lowered value as handed to the map lowerer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapValue {
    Scalar(Value),
    Str { ptr: Value, len: Value },
    /// Address of an in-memory aggregate.
    Addr(Value),
}

impl MapValue {
    fn kind(&self) -> &'static str {
        match self {
            MapValue::Scalar(_) => "scalar",
            MapValue::Str { .. } => "string pair",
            MapValue::Addr(_) => "aggregate address",
        }
    }
}

pub fn pointer_type(layout: &TargetLayout) -> Type {
    match layout.pointer_bytes {
        4 => types::I32,
        _ => types::I64,
    }
}

pub fn value_repr(ty: &StaticType, layout: &TargetLayout) -> CodegenResult<ValueRepr> {
    let ptr = pointer_type(layout);
    let memory = || match layout.size_of(ty) {
        Some(size) => Ok(ValueRepr::Memory { size, align: layout.align_of(ty) }),
        None => Err(CodegenError::LayoutOverflow(ty.to_string())),
    };
    let scalar = |t: Type| -> CodegenResult<ValueRepr> { Ok(ValueRepr::Scalar(t)) };
    match ty {
        StaticType::Basic(kind) => match kind {
            BasicKind::Bool | BasicKind::Int8 | BasicKind::Uint8 => scalar(types::I8),
            BasicKind::Int16 | BasicKind::Uint16 => scalar(types::I16),
            BasicKind::Int32 | BasicKind::Uint32 => scalar(types::I32),
            BasicKind::Int64 | BasicKind::Uint64 => scalar(types::I64),
            BasicKind::Int | BasicKind::Uint | BasicKind::Uintptr | BasicKind::UnsafePointer => scalar(ptr),
            BasicKind::Float32 => scalar(types::F32),
            BasicKind::Float64 => scalar(types::F64),
            BasicKind::String => Ok(ValueRepr::StringPair),
            BasicKind::Complex64 | BasicKind::Complex128 => memory(),
        },
        StaticType::Pointer(_) | StaticType::Map(_) | StaticType::Chan(_) | StaticType::Func { .. } => scalar(ptr),
        StaticType::Struct(_)
        | StaticType::Array { .. }
        | StaticType::Interface { .. }
        | StaticType::Slice(_) => memory(),
        StaticType::Named { underlying, .. } => value_repr(underlying, layout),
    }
}

impl ValueRepr {
    /// Cranelift parameter types carrying a value of this repr.
    pub fn abi_types(&self, ptr: Type) -> Vec<Type> {
        match self {
            ValueRepr::Scalar(ty) => vec![*ty],
            ValueRepr::StringPair => vec![ptr, ptr],
            ValueRepr::Memory { .. } => vec![ptr],
        }
    }
}

/// Store `value` at `addr + offset` using the layout of `repr`.
pub fn store_value(
    builder: &mut FunctionBuilder,
    repr: ValueRepr,
    value: MapValue,
    addr: Value,
    offset: i32,
    ptr: Type,
) -> CodegenResult<()> {
    match (repr, value) {
        (ValueRepr::Scalar(_), MapValue::Scalar(v)) => {
            builder.ins().store(MemFlags::new(), v, addr, offset);
        }
        (ValueRepr::StringPair, MapValue::Str { ptr: data, len }) => {
            builder.ins().store(MemFlags::new(), data, addr, offset);
            builder.ins().store(MemFlags::new(), len, addr, offset + ptr.bytes() as i32);
        }
        (ValueRepr::Memory { size, .. }, MapValue::Addr(src)) => {
            let dst = offset_addr(builder, addr, offset);
            copy_memory(builder, src, dst, size);
        }
        (repr, value) => {
            return Err(CodegenError::TypeConversionFailed(format!(
                "cannot store a {} as {:?}",
                value.kind(),
                repr
            )))
        }
    }
    Ok(())
}

/// Load a value of `repr` from `addr + offset`. Aggregates are copied into
/// a fresh slot so the result does not alias the source.
pub fn load_value(
    builder: &mut FunctionBuilder,
    repr: ValueRepr,
    addr: Value,
    offset: i32,
    ptr: Type,
) -> MapValue {
    match repr {
        ValueRepr::Scalar(ty) => MapValue::Scalar(builder.ins().load(ty, MemFlags::new(), addr, offset)),
        ValueRepr::StringPair => {
            let data = builder.ins().load(ptr, MemFlags::new(), addr, offset);
            let len = builder.ins().load(ptr, MemFlags::new(), addr, offset + ptr.bytes() as i32);
            MapValue::Str { ptr: data, len }
        }
        ValueRepr::Memory { size, align } => {
            let dst = alloc_slot(builder, size, align, ptr);
            let src = offset_addr(builder, addr, offset);
            copy_memory(builder, src, dst, size);
            MapValue::Addr(dst)
        }
    }
}

/// All-zero value of `repr`.
pub fn zero_value(builder: &mut FunctionBuilder, repr: ValueRepr, ptr: Type) -> MapValue {
    match repr {
        ValueRepr::Scalar(ty) => MapValue::Scalar(zero_scalar(builder, ty)),
        ValueRepr::StringPair => {
            let data = builder.ins().iconst(ptr, 0);
            let len = builder.ins().iconst(ptr, 0);
            MapValue::Str { ptr: data, len }
        }
        ValueRepr::Memory { size, align } => {
            let addr = alloc_slot(builder, size, align, ptr);
            zero_fill(builder, addr, size);
            MapValue::Addr(addr)
        }
    }
}

pub fn zero_scalar(builder: &mut FunctionBuilder, ty: Type) -> Value {
    if ty == types::F32 {
        builder.ins().f32const(0.0)
    } else if ty == types::F64 {
        builder.ins().f64const(0.0)
    } else {
        builder.ins().iconst(ty, 0)
    }
}

/// Explicit stack slot of exactly `size` bytes; returns its address.
pub fn alloc_slot(builder: &mut FunctionBuilder, size: u32, align: u32, ptr: Type) -> Value {
    let slot = builder.create_sized_stack_slot(StackSlotData::new(
        StackSlotKind::ExplicitSlot,
        size,
        align_shift(align),
    ));
    builder.ins().stack_addr(ptr, slot, 0)
}

pub(crate) fn align_shift(align: u32) -> u8 {
    align.max(1).trailing_zeros() as u8
}

pub(crate) fn offset_addr(builder: &mut FunctionBuilder, addr: Value, offset: i32) -> Value {
    if offset == 0 {
        addr
    } else {
        builder.ins().iadd_imm(addr, offset as i64)
    }
}

/// Byte copy in 8/4/2/1-byte chunks.
pub fn copy_memory(builder: &mut FunctionBuilder, src: Value, dst: Value, size: u32) {
    for (ty, offset) in chunks(size) {
        let val = builder.ins().load(ty, MemFlags::new(), src, offset);
        builder.ins().store(MemFlags::new(), val, dst, offset);
    }
}

/// Zero `size` bytes at `addr` in 8/4/2/1-byte chunks.
pub fn zero_fill(builder: &mut FunctionBuilder, addr: Value, size: u32) {
    for (ty, offset) in chunks(size) {
        let zero = builder.ins().iconst(ty, 0);
        builder.ins().store(MemFlags::new(), zero, addr, offset);
    }
}

fn chunks(size: u32) -> Vec<(Type, i32)> {
    let mut out = Vec::new();
    let mut offset = 0u32;
    for (ty, width) in [(types::I64, 8), (types::I32, 4), (types::I16, 2), (types::I8, 1)] {
        while size - offset >= width {
            out.push((ty, offset as i32));
            offset += width;
        }
    }
    out
}

/// Convert an integer to the native word type: sign-extend signed sources,
/// zero-extend unsigned ones, truncate wider ones.
pub fn convert_to_word(
    builder: &mut FunctionBuilder,
    value: Value,
    from: &StaticType,
    word: Type,
) -> CodegenResult<Value> {
    if !from.is_integer() {
        return Err(CodegenError::TypeConversionFailed(format!(
            "size hint of type `{}` is not an integer",
            from
        )));
    }
    let bits = builder.func.dfg.value_type(value).bits();
    Ok(match bits.cmp(&word.bits()) {
        std::cmp::Ordering::Less if from.is_signed() => builder.ins().sextend(word, value),
        std::cmp::Ordering::Less => builder.ins().uextend(word, value),
        std::cmp::Ordering::Greater => builder.ins().ireduce(word, value),
        std::cmp::Ordering::Equal => value,
    })
}
