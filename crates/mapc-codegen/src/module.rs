// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Cranelift module setup and code generation orchestration.

use std::collections::HashMap;
use std::path::Path;

use cranelift::prelude::*;
use cranelift_codegen::ir::{Function, GlobalValue};
use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_module::{DataDescription, DataId, FuncId, Linkage, Module};
use cranelift_object::{ObjectBuilder, ObjectModule};
use mapc_diagnostics::{Diagnostic, DiagnosticSink};
use mapc_mir::{MirConst, MirFunction, MirOperand, MirStmt, MirTerminator};
use mapc_types::TargetLayout;
use target_lexicon::Triple;

use crate::builder::{function_signature, FunctionBuilder};
use crate::runtime::{declare_map_runtime, RuntimeEntry, RuntimeFuncs};
use crate::staging::StagingEvent;
use crate::{BuildMode, CodegenError, CodegenOptions, CodegenResult};

pub struct CodeGenerator<M: Module = ObjectModule> {
    module: M,
    ctx: codegen::Context,
    options: CodegenOptions,
    runtime_ids: HashMap<RuntimeEntry, FuncId>,
    func_ids: HashMap<String, FuncId>,
    /// String constant contents → data object
    string_data: HashMap<String, DataId>,
    diagnostics: DiagnosticSink,
    staging_log: HashMap<String, Vec<StagingEvent>>,
}

impl CodeGenerator<ObjectModule> {
    /// Object module for the host machine.
    pub fn new(mode: BuildMode) -> CodegenResult<Self> {
        let isa_builder = cranelift_native::builder().map_err(CodegenError::cranelift)?;
        let isa = isa_builder
            .finish(isa_flags(mode)?)
            .map_err(CodegenError::cranelift)?;
        Self::from_isa(isa, mode)
    }

    /// Object module for a cross-compilation target.
    pub fn for_target(triple: Triple, mode: BuildMode) -> CodegenResult<Self> {
        let isa = cranelift_codegen::isa::lookup(triple)
            .map_err(CodegenError::cranelift)?
            .finish(isa_flags(mode)?)
            .map_err(CodegenError::cranelift)?;
        Self::from_isa(isa, mode)
    }

    fn from_isa(isa: OwnedTargetIsa, mode: BuildMode) -> CodegenResult<Self> {
        let builder = ObjectBuilder::new(isa, "mapc_module", cranelift_module::default_libcall_names())
            .map_err(CodegenError::cranelift)?;
        Self::with_module(ObjectModule::new(builder), mode)
    }

    /// Emit the final object file. Consumes self because finish() takes ownership.
    pub fn emit_object(self, path: impl AsRef<Path>) -> CodegenResult<()> {
        let product = self.module.finish();
        let bytes = product.emit().map_err(CodegenError::cranelift)?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| CodegenError::ObjectWrite(e.to_string()))
    }
}

fn isa_flags(mode: BuildMode) -> CodegenResult<settings::Flags> {
    let mut flags = settings::builder();
    let (opt_level, verifier) = match mode {
        BuildMode::Debug => ("none", "true"),
        BuildMode::Release => ("speed", "false"),
    };
    flags.set("opt_level", opt_level).map_err(CodegenError::cranelift)?;
    flags.set("enable_verifier", verifier).map_err(CodegenError::cranelift)?;
    Ok(settings::Flags::new(flags))
}

impl<M: Module> CodeGenerator<M> {
    /// Wrap any module, e.g. a JIT module. The layout follows the module's
    /// pointer width.
    pub fn with_module(module: M, mode: BuildMode) -> CodegenResult<Self> {
        let pointer_bytes = module.target_config().pointer_bytes() as u32;
        if pointer_bytes != 4 && pointer_bytes != 8 {
            return Err(CodegenError::UnsupportedFeature(format!(
                "{}-byte pointers",
                pointer_bytes
            )));
        }
        Ok(CodeGenerator {
            module,
            ctx: codegen::Context::new(),
            options: CodegenOptions { mode, layout: TargetLayout::new(pointer_bytes) },
            runtime_ids: HashMap::new(),
            func_ids: HashMap::new(),
            string_data: HashMap::new(),
            diagnostics: DiagnosticSink::new(),
            staging_log: HashMap::new(),
        })
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    /// Declare the hash-map runtime entries as imports.
    pub fn declare_map_runtime(&mut self) -> CodegenResult<()> {
        if self.runtime_ids.is_empty() {
            self.runtime_ids = declare_map_runtime(&mut self.module)?;
        }
        Ok(())
    }

    /// Declare all functions up front so calls and address-taking work in any order.
    pub fn declare_functions(&mut self, mir_functions: &[MirFunction]) -> CodegenResult<()> {
        for mir_fn in mir_functions {
            let mut sig = self.module.make_signature();
            function_signature(mir_fn, &self.options.layout, &mut sig)?;
            let func_id = self
                .module
                .declare_function(&mir_fn.name, Linkage::Export, &sig)
                .map_err(CodegenError::cranelift)?;
            self.func_ids.insert(mir_fn.name.clone(), func_id);
        }
        Ok(())
    }

    /// Create a data object for each unique string constant.
    /// Must be called before gen_function.
    pub fn register_strings(&mut self, mir_functions: &[MirFunction]) -> CodegenResult<()> {
        let mut strings = Vec::new();
        for mir_fn in mir_functions {
            for block in &mir_fn.blocks {
                for stmt in &block.statements {
                    collect_strings(stmt, &mut strings);
                }
                if let MirTerminator::Return { value: Some(op) } = &block.terminator {
                    strings.extend(string_constant(op));
                }
            }
        }
        for s in strings {
            self.register_string(s)?;
        }
        Ok(())
    }

    fn register_string(&mut self, s: &str) -> CodegenResult<()> {
        if self.string_data.contains_key(s) {
            return Ok(());
        }
        let name = format!(".str.{}", self.string_data.len());
        let data_id = self
            .module
            .declare_data(&name, Linkage::Local, false, false)
            .map_err(CodegenError::cranelift)?;

        // Length travels separately; the NUL only keeps empty strings non-empty.
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        let mut desc = DataDescription::new();
        desc.define(bytes.into_boxed_slice());
        self.module.define_data(data_id, &desc).map_err(CodegenError::cranelift)?;

        self.string_data.insert(s.to_string(), data_id);
        Ok(())
    }

    /// Lower one function into the working context without defining it.
    /// In debug builds the result has passed the Cranelift verifier.
    pub fn lower_function(&mut self, mir_fn: &MirFunction) -> CodegenResult<&Function> {
        self.ctx.clear();

        let mut sig = self.module.make_signature();
        function_signature(mir_fn, &self.options.layout, &mut sig)?;
        self.ctx.func.signature = sig;

        // Imports must happen before FunctionBuilder borrows ctx.func.
        let runtime = RuntimeFuncs::import(&mut self.module, &self.runtime_ids, &mut self.ctx.func);
        let mut string_globals: HashMap<String, GlobalValue> = HashMap::new();
        for (content, data_id) in &self.string_data {
            let gv = self.module.declare_data_in_func(*data_id, &mut self.ctx.func);
            string_globals.insert(content.clone(), gv);
        }

        let errors_before = self.diagnostics.error_count();
        let events = FunctionBuilder::new(
            &mut self.ctx.func,
            mir_fn,
            &self.options,
            &runtime,
            &string_globals,
            &mut self.diagnostics,
        )
        .build()?;
        tracing::debug!(
            function = %mir_fn.name,
            buffers = events.len() / 2,
            diagnostics = self.diagnostics.error_count() - errors_before,
            "lowered function"
        );
        self.staging_log.insert(mir_fn.name.clone(), events);

        if self.options.is_debug() {
            self.ctx
                .verify(self.module.isa())
                .map_err(|errs| CodegenError::Cranelift(format!("verifier rejected `{}`: {}", mir_fn.name, errs)))?;
        }
        Ok(&self.ctx.func)
    }

    /// Generate code for a single MIR function.
    pub fn gen_function(&mut self, mir_fn: &MirFunction) -> CodegenResult<()> {
        let func_id = *self
            .func_ids
            .get(&mir_fn.name)
            .ok_or_else(|| CodegenError::FunctionNotFound(mir_fn.name.clone()))?;
        self.lower_function(mir_fn)?;
        self.module
            .define_function(func_id, &mut self.ctx)
            .map_err(CodegenError::cranelift)?;
        Ok(())
    }

    /// Declare, register and generate every function.
    pub fn compile(&mut self, mir_functions: &[MirFunction]) -> CodegenResult<()> {
        self.declare_map_runtime()?;
        self.declare_functions(mir_functions)?;
        self.register_strings(mir_functions)?;
        for mir_fn in mir_functions {
            self.gen_function(mir_fn)?;
        }
        Ok(())
    }

    pub fn func_id(&self, name: &str) -> Option<FuncId> {
        self.func_ids.get(name).copied()
    }

    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// Hand the collected diagnostics to the caller for rendering.
    pub fn finish_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Staging log of the last lowering of `name`.
    pub fn staging_events(&self, name: &str) -> &[StagingEvent] {
        self.staging_log.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn module(&self) -> &M {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    pub fn into_module(self) -> M {
        self.module
    }
}

fn collect_strings<'m>(stmt: &'m MirStmt, out: &mut Vec<&'m str>) {
    let operands: Vec<&MirOperand> = match stmt {
        MirStmt::Assign { value, .. } | MirStmt::StoreField { value, .. } => vec![value],
        MirStmt::LoadField { .. } => vec![],
        MirStmt::MakeMap { reserve, .. } => reserve.iter().collect(),
        MirStmt::MapLookup { key, .. } | MirStmt::MapDelete { key, .. } => vec![key],
        MirStmt::MapUpdate { key, value, .. } => vec![key, value],
    };
    out.extend(operands.into_iter().filter_map(string_constant));
}

fn string_constant(op: &MirOperand) -> Option<&str> {
    match op {
        MirOperand::Constant(MirConst::String(s)) => Some(s),
        _ => None,
    }
}
