// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Function builder - lowers MIR to Cranelift IR.
//!
//! Every local gets Cranelift variables up front: one for a scalar, two for
//! a string (data pointer, length), and one holding the address of the
//! local's own frame slot for an aggregate. Map statements go through the
//! `MapLowerer`; everything else is plain loads, stores and copies.

use std::collections::HashMap;

use cranelift::prelude::*;
use cranelift_codegen::ir::{Function, GlobalValue};
use cranelift_frontend::FunctionBuilder as ClifFunctionBuilder;
use mapc_diagnostics::DiagnosticSink;
use mapc_mir::{BlockId, LocalId, MirConst, MirFunction, MirOperand, MirStmt, MirTerminator};
use mapc_types::{MapType, StaticType, TargetLayout};

use crate::lower::MapLowerer;
use crate::runtime::RuntimeFuncs;
use crate::staging::{ScratchRegion, StagingEvent};
use crate::types::{
    alloc_slot, copy_memory, load_value, offset_addr, pointer_type, store_value, value_repr, zero_fill, zero_scalar,
    zero_value, MapValue, ValueRepr,
};
use crate::{CodegenError, CodegenOptions, CodegenResult};

/// Fill `sig` with the lowered parameter and return types of `mir_fn`.
/// Aggregate parameters travel by address.
pub(crate) fn function_signature(
    mir_fn: &MirFunction,
    layout: &TargetLayout,
    sig: &mut Signature,
) -> CodegenResult<()> {
    let ptr = pointer_type(layout);
    for param in &mir_fn.params {
        let repr = value_repr(&param.ty, layout)?;
        sig.params.extend(repr.abi_types(ptr).into_iter().map(AbiParam::new));
    }
    if let Some(ret_ty) = &mir_fn.ret_ty {
        match value_repr(ret_ty, layout)? {
            ValueRepr::Memory { .. } => {
                return Err(CodegenError::UnsupportedFeature(format!(
                    "`{}` returns aggregate `{}` by value",
                    mir_fn.name, ret_ty
                )))
            }
            repr => sig.returns.extend(repr.abi_types(ptr).into_iter().map(AbiParam::new)),
        }
    }
    Ok(())
}

/// Untyped integer constants used as capacity hints are `int`.
static HINT_TYPE: StaticType = StaticType::INT;

#[derive(Debug, Clone, Copy)]
enum LocalSlot {
    Scalar(Variable),
    Str { ptr: Variable, len: Variable },
    Memory { addr: Variable, size: u32 },
}

pub struct FunctionBuilder<'a> {
    func: &'a mut Function,
    mir_fn: &'a MirFunction,
    options: &'a CodegenOptions,
    runtime: &'a RuntimeFuncs,
    string_globals: &'a HashMap<String, GlobalValue>,
    diagnostics: &'a mut DiagnosticSink,
}

impl<'a> FunctionBuilder<'a> {
    pub fn new(
        func: &'a mut Function,
        mir_fn: &'a MirFunction,
        options: &'a CodegenOptions,
        runtime: &'a RuntimeFuncs,
        string_globals: &'a HashMap<String, GlobalValue>,
        diagnostics: &'a mut DiagnosticSink,
    ) -> Self {
        FunctionBuilder {
            func,
            mir_fn,
            options,
            runtime,
            string_globals,
            diagnostics,
        }
    }

    /// Build the Cranelift IR from MIR. Returns the staging log.
    pub fn build(self) -> CodegenResult<Vec<StagingEvent>> {
        let mut builder_ctx = FunctionBuilderContext::new();
        let mut builder = ClifFunctionBuilder::new(self.func, &mut builder_ctx);
        let region = ScratchRegion::new();

        let mut body = BodyLowering {
            mir_fn: self.mir_fn,
            layout: self.options.layout,
            ptr: pointer_type(&self.options.layout),
            string_globals: self.string_globals,
            maps: MapLowerer::new(self.options, self.runtime, self.diagnostics),
            region: &region,
            locals: HashMap::new(),
            blocks: HashMap::new(),
            next_var: 0,
        };
        body.lower(&mut builder)?;

        builder.seal_all_blocks();
        builder.finalize();

        if self.options.is_debug() {
            region.finish(&self.mir_fn.name)?;
        }
        Ok(region.events())
    }
}

struct BodyLowering<'a, 'r> {
    mir_fn: &'a MirFunction,
    layout: TargetLayout,
    ptr: Type,
    string_globals: &'a HashMap<String, GlobalValue>,
    maps: MapLowerer<'a>,
    region: &'r ScratchRegion,
    locals: HashMap<LocalId, LocalSlot>,
    blocks: HashMap<BlockId, Block>,
    next_var: usize,
}

impl<'a> BodyLowering<'a, '_> {
    fn lower(&mut self, builder: &mut ClifFunctionBuilder) -> CodegenResult<()> {
        let mir_fn = self.mir_fn;
        for mir_block in &mir_fn.blocks {
            let block = builder.create_block();
            self.blocks.insert(mir_block.id, block);
        }
        let entry = self.block(mir_fn.entry_block)?;
        builder.append_block_params_for_function_params(entry);
        builder.switch_to_block(entry);

        self.declare_locals(builder)?;
        self.bind_params(builder, entry)?;

        for mir_block in &mir_fn.blocks {
            let block = self.block(mir_block.id)?;
            if block != entry {
                builder.switch_to_block(block);
            }
            for stmt in &mir_block.statements {
                self.lower_stmt(builder, stmt)?;
            }
            self.lower_terminator(builder, &mir_block.terminator)?;
        }
        Ok(())
    }

    fn new_var(&mut self, builder: &mut ClifFunctionBuilder, ty: Type) -> Variable {
        let var = Variable::new(self.next_var);
        self.next_var += 1;
        builder.declare_var(var, ty);
        var
    }

    /// Declare every local and zero the ones that are not parameters.
    fn declare_locals(&mut self, builder: &mut ClifFunctionBuilder) -> CodegenResult<()> {
        let mir_fn = self.mir_fn;
        for local in &mir_fn.locals {
            let slot = match value_repr(&local.ty, &self.layout)? {
                ValueRepr::Scalar(ty) => {
                    let var = self.new_var(builder, ty);
                    if !local.is_param {
                        let zero = zero_scalar(builder, ty);
                        builder.def_var(var, zero);
                    }
                    LocalSlot::Scalar(var)
                }
                ValueRepr::StringPair => {
                    let ptr = self.new_var(builder, self.ptr);
                    let len = self.new_var(builder, self.ptr);
                    if !local.is_param {
                        let zero = builder.ins().iconst(self.ptr, 0);
                        builder.def_var(ptr, zero);
                        builder.def_var(len, zero);
                    }
                    LocalSlot::Str { ptr, len }
                }
                ValueRepr::Memory { size, align } => {
                    let addr_var = self.new_var(builder, self.ptr);
                    let addr = alloc_slot(builder, size, align, self.ptr);
                    if !local.is_param {
                        zero_fill(builder, addr, size);
                    }
                    builder.def_var(addr_var, addr);
                    LocalSlot::Memory { addr: addr_var, size }
                }
            };
            self.locals.insert(local.id, slot);
        }
        Ok(())
    }

    /// Bind entry block params; aggregates are copied into the callee's slot.
    fn bind_params(&self, builder: &mut ClifFunctionBuilder, entry: Block) -> CodegenResult<()> {
        let values = builder.block_params(entry).to_vec();
        let mut values = values.into_iter();
        let mut next = || {
            values
                .next()
                .ok_or_else(|| CodegenError::UnsupportedFeature("parameter count mismatch".to_string()))
        };
        for param in &self.mir_fn.params {
            match self.slot(param.id)? {
                LocalSlot::Scalar(var) => builder.def_var(var, next()?),
                LocalSlot::Str { ptr, len } => {
                    builder.def_var(ptr, next()?);
                    builder.def_var(len, next()?);
                }
                LocalSlot::Memory { addr, size } => {
                    let src = next()?;
                    let dst = builder.use_var(addr);
                    self.copy_data(builder, &param.ty, src, dst, size)?;
                }
            }
        }
        Ok(())
    }

    /// Copy the data bytes of an aggregate and zero its padding, so keys
    /// built from caller memory hash by value.
    fn copy_data(
        &self,
        builder: &mut ClifFunctionBuilder,
        ty: &StaticType,
        src: Value,
        dst: Value,
        size: u32,
    ) -> CodegenResult<()> {
        let ranges = self
            .layout
            .data_ranges(ty)
            .ok_or_else(|| CodegenError::LayoutOverflow(ty.to_string()))?;
        if let [only] = ranges.as_slice() {
            if only.offset == 0 && only.size == size {
                copy_memory(builder, src, dst, size);
                return Ok(());
            }
        }
        zero_fill(builder, dst, size);
        for range in ranges {
            let from = offset_addr(builder, src, range.offset as i32);
            let to = offset_addr(builder, dst, range.offset as i32);
            copy_memory(builder, from, to, range.size);
        }
        Ok(())
    }

    fn lower_stmt(&mut self, builder: &mut ClifFunctionBuilder, stmt: &MirStmt) -> CodegenResult<()> {
        match stmt {
            MirStmt::Assign { dst, value } => {
                let ty = self.local_ty(*dst)?;
                let value = self.operand(builder, value, ty)?;
                self.write_local(builder, *dst, value)
            }
            MirStmt::StoreField { base, offset, ty, value } => {
                let addr = self.aggregate_addr(builder, *base)?;
                let value = self.operand(builder, value, ty)?;
                store_value(builder, value_repr(ty, &self.layout)?, value, addr, *offset as i32, self.ptr)
            }
            MirStmt::LoadField { dst, base, offset } => {
                let addr = self.aggregate_addr(builder, *base)?;
                let repr = value_repr(self.local_ty(*dst)?, &self.layout)?;
                let value = load_value(builder, repr, addr, *offset as i32, self.ptr);
                self.write_local(builder, *dst, value)
            }
            MirStmt::MakeMap { dst, map_ty, reserve, .. } => {
                let reserve = match reserve {
                    Some(op) => {
                        let ty = match op {
                            MirOperand::Local(id) => self.local_ty(*id)?,
                            MirOperand::Constant(_) => &HINT_TYPE,
                        };
                        let value = self.scalar_operand(builder, op, ty)?;
                        Some((value, ty))
                    }
                    None => None,
                };
                let handle = self.maps.make_map(builder, map_ty, reserve)?;
                self.write_local(builder, *dst, MapValue::Scalar(handle))
            }
            MirStmt::MapLookup { dst, found, map, key, span } => {
                let map_ty = self.map_type(*map)?;
                let handle = self.scalar_operand(builder, &MirOperand::Local(*map), &StaticType::INT)?;
                let key = self.operand(builder, key, &map_ty.key)?;
                let result =
                    self.maps
                        .lookup(builder, self.region, map_ty, handle, key, found.is_some(), *span)?;
                self.write_local(builder, *dst, result.value())?;
                if let (Some(found), Some(flag)) = (found, result.found()) {
                    self.write_local(builder, *found, MapValue::Scalar(flag))?;
                }
                Ok(())
            }
            MirStmt::MapUpdate { map, key, value, span } => {
                let map_ty = self.map_type(*map)?;
                let handle = self.scalar_operand(builder, &MirOperand::Local(*map), &StaticType::INT)?;
                let key = self.operand(builder, key, &map_ty.key)?;
                let value = self.operand(builder, value, &map_ty.value)?;
                self.maps
                    .update(builder, self.region, map_ty, handle, key, value, *span)?;
                Ok(())
            }
            MirStmt::MapDelete { map, key, span } => {
                let map_ty = self.map_type(*map)?;
                let handle = self.scalar_operand(builder, &MirOperand::Local(*map), &StaticType::INT)?;
                let key = self.operand(builder, key, &map_ty.key)?;
                self.maps.delete(builder, self.region, map_ty, handle, key, *span)?;
                Ok(())
            }
        }
    }

    fn lower_terminator(&mut self, builder: &mut ClifFunctionBuilder, term: &MirTerminator) -> CodegenResult<()> {
        match term {
            MirTerminator::Return { value: None } => {
                builder.ins().return_(&[]);
            }
            MirTerminator::Return { value: Some(op) } => {
                let ret_ty = self.mir_fn.ret_ty.as_ref().ok_or_else(|| {
                    CodegenError::TypeConversionFailed(format!("`{}` returns a value but has no return type", self.mir_fn.name))
                })?;
                match self.operand(builder, op, ret_ty)? {
                    MapValue::Scalar(v) => builder.ins().return_(&[v]),
                    MapValue::Str { ptr, len } => builder.ins().return_(&[ptr, len]),
                    MapValue::Addr(_) => {
                        return Err(CodegenError::UnsupportedFeature(format!(
                            "returning aggregate `{}` by value",
                            ret_ty
                        )))
                    }
                };
            }
            MirTerminator::Goto { target } => {
                let target = self.block(*target)?;
                builder.ins().jump(target, &[]);
            }
            MirTerminator::Branch { cond, then_block, else_block } => {
                let cond = self.scalar_operand(builder, cond, &StaticType::BOOL)?;
                let then_block = self.block(*then_block)?;
                let else_block = self.block(*else_block)?;
                builder.ins().brif(cond, then_block, &[], else_block, &[]);
            }
            MirTerminator::Unreachable => {
                let code = TrapCode::user(1)
                    .ok_or_else(|| CodegenError::Cranelift("invalid user trap code".to_string()))?;
                builder.ins().trap(code);
            }
        }
        Ok(())
    }

    // ── Locals and operands ────────────────────────────────────────

    fn block(&self, id: BlockId) -> CodegenResult<Block> {
        self.blocks
            .get(&id)
            .copied()
            .ok_or_else(|| CodegenError::UnsupportedFeature(format!("unknown block bb{}", id.0)))
    }

    fn slot(&self, id: LocalId) -> CodegenResult<LocalSlot> {
        self.locals
            .get(&id)
            .copied()
            .ok_or_else(|| CodegenError::UnsupportedFeature(format!("unknown local _{}", id.0)))
    }

    fn local_ty(&self, id: LocalId) -> CodegenResult<&'a StaticType> {
        let mir_fn: &'a MirFunction = self.mir_fn;
        mir_fn
            .local(id)
            .map(|l| &l.ty)
            .ok_or_else(|| CodegenError::UnsupportedFeature(format!("unknown local _{}", id.0)))
    }

    fn map_type(&self, id: LocalId) -> CodegenResult<&'a MapType> {
        let ty = self.local_ty(id)?;
        ty.as_map()
            .ok_or_else(|| CodegenError::TypeConversionFailed(format!("local _{} of type `{}` is not a map", id.0, ty)))
    }

    fn aggregate_addr(&self, builder: &mut ClifFunctionBuilder, id: LocalId) -> CodegenResult<Value> {
        match self.slot(id)? {
            LocalSlot::Memory { addr, .. } => Ok(builder.use_var(addr)),
            _ => Err(CodegenError::TypeConversionFailed(format!(
                "field access on non-aggregate local _{}",
                id.0
            ))),
        }
    }

    fn read_local(&self, builder: &mut ClifFunctionBuilder, id: LocalId) -> CodegenResult<MapValue> {
        Ok(match self.slot(id)? {
            LocalSlot::Scalar(var) => MapValue::Scalar(builder.use_var(var)),
            LocalSlot::Str { ptr, len } => MapValue::Str {
                ptr: builder.use_var(ptr),
                len: builder.use_var(len),
            },
            LocalSlot::Memory { addr, .. } => MapValue::Addr(builder.use_var(addr)),
        })
    }

    fn write_local(&self, builder: &mut ClifFunctionBuilder, id: LocalId, value: MapValue) -> CodegenResult<()> {
        match (self.slot(id)?, value) {
            (LocalSlot::Scalar(var), MapValue::Scalar(v)) => builder.def_var(var, v),
            (LocalSlot::Str { ptr, len }, MapValue::Str { ptr: p, len: l }) => {
                builder.def_var(ptr, p);
                builder.def_var(len, l);
            }
            (LocalSlot::Memory { addr, size }, MapValue::Addr(src)) => {
                let dst = builder.use_var(addr);
                copy_memory(builder, src, dst, size);
            }
            (slot, value) => {
                return Err(CodegenError::TypeConversionFailed(format!(
                    "cannot write {:?} into local _{} ({:?})",
                    value, id.0, slot
                )))
            }
        }
        Ok(())
    }

    fn operand(&self, builder: &mut ClifFunctionBuilder, op: &MirOperand, ty: &StaticType) -> CodegenResult<MapValue> {
        match op {
            MirOperand::Local(id) => self.read_local(builder, *id),
            MirOperand::Constant(c) => self.constant(builder, c, ty),
        }
    }

    fn scalar_operand(
        &self,
        builder: &mut ClifFunctionBuilder,
        op: &MirOperand,
        ty: &StaticType,
    ) -> CodegenResult<Value> {
        match self.operand(builder, op, ty)? {
            MapValue::Scalar(v) => Ok(v),
            other => Err(CodegenError::TypeConversionFailed(format!(
                "expected a scalar of type `{}`, found {:?}",
                ty, other
            ))),
        }
    }

    fn constant(&self, builder: &mut ClifFunctionBuilder, c: &MirConst, ty: &StaticType) -> CodegenResult<MapValue> {
        let repr = value_repr(ty, &self.layout)?;
        let value = match (c, repr) {
            (MirConst::Zero, repr) => return Ok(zero_value(builder, repr, self.ptr)),
            (MirConst::Int(v), ValueRepr::Scalar(t)) if t.is_int() => int_const(builder, t, *v),
            (MirConst::Bool(v), ValueRepr::Scalar(t)) if t.is_int() => int_const(builder, t, *v as i64),
            (MirConst::Float(v), ValueRepr::Scalar(t)) if t == types::F64 => builder.ins().f64const(*v),
            (MirConst::Float(v), ValueRepr::Scalar(t)) if t == types::F32 => builder.ins().f32const(*v as f32),
            (MirConst::String(s), ValueRepr::StringPair) => {
                let gv = self.string_globals.get(s).ok_or_else(|| {
                    CodegenError::UnsupportedFeature(format!("string constant {:?} was never registered", s))
                })?;
                let ptr = builder.ins().global_value(self.ptr, *gv);
                let len = builder.ins().iconst(self.ptr, s.len() as i64);
                return Ok(MapValue::Str { ptr, len });
            }
            (c, _) => {
                return Err(CodegenError::TypeConversionFailed(format!(
                    "constant {:?} does not fit type `{}`",
                    c, ty
                )))
            }
        };
        Ok(MapValue::Scalar(value))
    }
}

/// `iconst` with the immediate masked to the type's width.
fn int_const(builder: &mut ClifFunctionBuilder, ty: Type, value: i64) -> Value {
    let bits = ty.bits();
    let imm = if bits >= 64 { value } else { value & ((1i64 << bits) - 1) };
    builder.ins().iconst(ty, imm)
}
