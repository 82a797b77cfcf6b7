// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Map operation lowering - create, lookup, update and delete as runtime
//! calls.
//!
//! Every operation is one linear transaction: stage operands, call, load the
//! result, release. Nothing is cached across operations; the key is
//! classified again at every call site.
//!
//! An unsupported key type is a user error, not a codegen failure: it is
//! reported to the diagnostic sink and lowering continues. Lookup then yields
//! a zero value (and a false flag); update and delete emit nothing.

use cranelift::prelude::*;
use cranelift_codegen::ir::Inst;
use mapc_diagnostics::{DiagnosticSink, ToDiagnostic};
use mapc_types::{MapType, Span, StaticType, TargetLayout};

use crate::classify::{require_comparable, KeyPath, UnsupportedKeyType};
use crate::runtime::{RuntimeEntry, RuntimeFuncs};
use crate::staging::{ScratchRegion, StagedOperand};
use crate::types::{
    convert_to_word, load_value, pointer_type, store_value, value_repr, zero_fill, zero_value, MapValue,
};
use crate::{BuildMode, CodegenError, CodegenOptions, CodegenResult};

/// Capacity hint passed to the runtime when `make` has none.
pub const DEFAULT_SIZE_HINT: i64 = 8;

/// Whether an update or delete reached the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    Called(RuntimeEntry),
    Omitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupResult {
    Value(MapValue),
    /// Comma-ok form; `found` is an `I8` holding 0 or 1.
    CommaOk { value: MapValue, found: Value },
}

impl LookupResult {
    pub fn value(&self) -> MapValue {
        match self {
            LookupResult::Value(v) | LookupResult::CommaOk { value: v, .. } => *v,
        }
    }

    pub fn found(&self) -> Option<Value> {
        match self {
            LookupResult::Value(_) => None,
            LookupResult::CommaOk { found, .. } => Some(*found),
        }
    }
}

pub struct MapLowerer<'a> {
    layout: TargetLayout,
    ptr: Type,
    mode: BuildMode,
    runtime: &'a RuntimeFuncs,
    diagnostics: &'a mut DiagnosticSink,
}

impl<'a> MapLowerer<'a> {
    pub fn new(options: &CodegenOptions, runtime: &'a RuntimeFuncs, diagnostics: &'a mut DiagnosticSink) -> Self {
        Self {
            layout: options.layout,
            ptr: pointer_type(&options.layout),
            mode: options.mode,
            runtime,
            diagnostics,
        }
    }

    pub fn pointer_type(&self) -> Type {
        self.ptr
    }

    /// `make(map[K]V, hint)`. Never classifies the key.
    pub fn make_map(
        &mut self,
        builder: &mut FunctionBuilder,
        map_ty: &MapType,
        reserve: Option<(Value, &StaticType)>,
    ) -> CodegenResult<Value> {
        let key_size = abi_byte("key type", self.size_of(&map_ty.key)?)?;
        let value_size = abi_byte("value type", self.size_of(&map_ty.value)?)?;
        tracing::debug!(
            op = "make",
            key_type = %map_ty.key,
            value_type = %map_ty.value,
            key_size,
            value_size,
            hinted = reserve.is_some(),
            "lowering map operation"
        );

        let key_size = builder.ins().iconst(types::I8, key_size as i64);
        let value_size = builder.ins().iconst(types::I8, value_size as i64);
        let hint = match reserve {
            Some((value, ty)) => convert_to_word(builder, value, ty, self.ptr)?,
            None => builder.ins().iconst(self.ptr, DEFAULT_SIZE_HINT),
        };
        let call = self.call(builder, RuntimeEntry::Make, &[key_size, value_size, hint])?;
        Ok(builder.inst_results(call)[0])
    }

    /// `map[key]`, or `value, ok := map[key]` when `comma_ok` is set.
    #[allow(clippy::too_many_arguments)]
    pub fn lookup(
        &mut self,
        builder: &mut FunctionBuilder,
        region: &ScratchRegion,
        map_ty: &MapType,
        map: Value,
        key: MapValue,
        comma_ok: bool,
        span: Span,
    ) -> CodegenResult<LookupResult> {
        let repr = value_repr(&map_ty.value, &self.layout)?;
        let result = self.stage_output(builder, region, &map_ty.value, "hashmap.result")?;

        let found = match require_comparable(&map_ty.key, span) {
            Ok(path) => {
                let entry = RuntimeEntry::get(path);
                self.log_decision("lookup", map_ty, path, entry);
                let call = match path {
                    KeyPath::String => {
                        let (ptr, len) = string_words(key)?;
                        self.call(builder, entry, &[map, ptr, len, result.addr()])?
                    }
                    KeyPath::Binary => {
                        let staged = self.stage_input(builder, region, &map_ty.key, key, "hashmap.key")?;
                        let call = self.call(builder, entry, &[map, staged.addr(), result.addr()])?;
                        staged.release();
                        call
                    }
                };
                Some(builder.inst_results(call)[0])
            }
            Err(err) => {
                self.report("lookup", err);
                None
            }
        };

        let (value, found) = match found {
            Some(flag) => (load_value(builder, repr, result.addr(), 0, self.ptr), flag),
            None => (
                zero_value(builder, repr, self.ptr),
                builder.ins().iconst(types::I8, 0),
            ),
        };
        result.release();

        Ok(if comma_ok {
            LookupResult::CommaOk { value, found }
        } else {
            LookupResult::Value(value)
        })
    }

    /// `map[key] = value`.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        builder: &mut FunctionBuilder,
        region: &ScratchRegion,
        map_ty: &MapType,
        map: Value,
        key: MapValue,
        value: MapValue,
        span: Span,
    ) -> CodegenResult<Emission> {
        let staged_value = self.stage_input(builder, region, &map_ty.value, value, "hashmap.value")?;

        let emission = match require_comparable(&map_ty.key, span) {
            Ok(path) => {
                let entry = RuntimeEntry::set(path);
                self.log_decision("update", map_ty, path, entry);
                match path {
                    KeyPath::String => {
                        let (ptr, len) = string_words(key)?;
                        self.call(builder, entry, &[map, ptr, len, staged_value.addr()])?;
                    }
                    KeyPath::Binary => {
                        let staged_key = self.stage_input(builder, region, &map_ty.key, key, "hashmap.key")?;
                        self.call(builder, entry, &[map, staged_key.addr(), staged_value.addr()])?;
                        staged_key.release();
                    }
                }
                Emission::Called(entry)
            }
            Err(err) => {
                self.report("update", err);
                Emission::Omitted
            }
        };

        staged_value.release();
        Ok(emission)
    }

    /// `delete(map, key)`.
    pub fn delete(
        &mut self,
        builder: &mut FunctionBuilder,
        region: &ScratchRegion,
        map_ty: &MapType,
        map: Value,
        key: MapValue,
        span: Span,
    ) -> CodegenResult<Emission> {
        let path = match require_comparable(&map_ty.key, span) {
            Ok(path) => path,
            Err(err) => {
                self.report("delete", err);
                return Ok(Emission::Omitted);
            }
        };
        let entry = RuntimeEntry::delete(path);
        self.log_decision("delete", map_ty, path, entry);
        match path {
            KeyPath::String => {
                let (ptr, len) = string_words(key)?;
                self.call(builder, entry, &[map, ptr, len])?;
            }
            KeyPath::Binary => {
                let staged = self.stage_input(builder, region, &map_ty.key, key, "hashmap.key")?;
                self.call(builder, entry, &[map, staged.addr()])?;
                staged.release();
            }
        }
        Ok(Emission::Called(entry))
    }

    /// Stage `value` into a fresh buffer sized to `ty`.
    fn stage_input<'r>(
        &self,
        builder: &mut FunctionBuilder,
        region: &'r ScratchRegion,
        ty: &StaticType,
        value: MapValue,
        label: &'static str,
    ) -> CodegenResult<StagedOperand<'r>> {
        let repr = value_repr(ty, &self.layout)?;
        let staged = region.stage(builder, self.ptr, self.size_of(ty)?, self.layout.align_of(ty), label);
        store_value(builder, repr, value, staged.addr(), 0, self.ptr)?;
        Ok(staged)
    }

    /// Buffer the runtime writes a result into. Zeroed in debug builds only.
    fn stage_output<'r>(
        &self,
        builder: &mut FunctionBuilder,
        region: &'r ScratchRegion,
        ty: &StaticType,
        label: &'static str,
    ) -> CodegenResult<StagedOperand<'r>> {
        let size = self.size_of(ty)?;
        let staged = region.stage(builder, self.ptr, size, self.layout.align_of(ty), label);
        if self.mode == BuildMode::Debug {
            zero_fill(builder, staged.addr(), size);
        }
        Ok(staged)
    }

    fn size_of(&self, ty: &StaticType) -> CodegenResult<u32> {
        self.layout
            .size_of(ty)
            .ok_or_else(|| CodegenError::LayoutOverflow(ty.to_string()))
    }

    fn call(&self, builder: &mut FunctionBuilder, entry: RuntimeEntry, args: &[Value]) -> CodegenResult<Inst> {
        let func_ref = self.runtime.get(entry)?;
        Ok(builder.ins().call(func_ref, args))
    }

    fn report(&mut self, op: &'static str, err: UnsupportedKeyType) {
        tracing::warn!(op, key_type = %err.key_type, "unsupported map key type; operation not emitted");
        self.diagnostics.report(err.to_diagnostic());
    }

    fn log_decision(&self, op: &'static str, map_ty: &MapType, path: KeyPath, entry: RuntimeEntry) {
        tracing::debug!(
            op,
            key_type = %map_ty.key,
            class = ?path,
            entry = entry.symbol(),
            "lowering map operation"
        );
    }
}

fn string_words(key: MapValue) -> CodegenResult<(Value, Value)> {
    match key {
        MapValue::Str { ptr, len } => Ok((ptr, len)),
        other => Err(CodegenError::TypeConversionFailed(format!(
            "string key lowered as {:?}",
            other
        ))),
    }
}

/// Sizes cross the runtime ABI as one byte.
fn abi_byte(what: &'static str, size: u32) -> CodegenResult<u8> {
    u8::try_from(size).map_err(|_| CodegenError::AbiSizeOverflow { what, size })
}
