// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Codegen tests - verify map statements lower to the expected runtime calls
//! and buffer traffic, and produce object files.

#[cfg(test)]
mod tests {
    use cranelift_codegen::ir::{
        ExternalName, Function, InstructionData, Opcode, Value, ValueDef,
    };
    use cranelift_module::{FuncId, Module};
    use cranelift_object::ObjectModule;
    use mapc_diagnostics::ToDiagnostic;
    use mapc_mir::{BlockBuilder, LocalId, MirFunction, MirOperand, MirStmt, MirTerminator};
    use mapc_types::{BasicKind, Field, MapType, Span, StaticType};

    use crate::staging::StagingEvent;
    use crate::{BuildMode, CodeGenerator, CodegenError, RuntimeEntry};

    // ── MIR construction helpers ────────────────────────────────

    fn key_span() -> Span {
        Span::new(10, 16)
    }

    fn strukt(fields: &[(&str, StaticType)]) -> StaticType {
        StaticType::Struct(fields.iter().map(|(n, t)| Field::new(*n, t.clone())).collect())
    }

    /// `fn name(m: map[K]V) { <body(m)> }`
    fn with_map_param(
        name: &str,
        map_ty: &MapType,
        body: impl FnOnce(&mut BlockBuilder, LocalId),
    ) -> MirFunction {
        let mut b = BlockBuilder::new(name, None);
        let m = b.add_param("m", StaticType::Map(map_ty.clone()));
        body(&mut b, m);
        b.terminate(MirTerminator::Return { value: None });
        b.finish()
    }

    fn generator(mode: BuildMode, functions: &[MirFunction]) -> CodeGenerator<ObjectModule> {
        let mut gen = CodeGenerator::new(mode).unwrap();
        gen.declare_map_runtime().unwrap();
        gen.declare_functions(functions).unwrap();
        gen.register_strings(functions).unwrap();
        gen
    }

    // ── IR inspection helpers ───────────────────────────────────

    /// Runtime calls in program order with their argument values.
    fn runtime_calls(gen: &CodeGenerator<ObjectModule>, func: &Function) -> Vec<(RuntimeEntry, Vec<Value>)> {
        let mut calls = Vec::new();
        for block in func.layout.blocks() {
            for inst in func.layout.block_insts(block) {
                let InstructionData::Call { func_ref, .. } = func.dfg.insts[inst] else {
                    continue;
                };
                let ExternalName::User(name_ref) = func.dfg.ext_funcs[func_ref].name else {
                    continue;
                };
                let index = func.params.user_named_funcs()[name_ref].index;
                let decl = gen.module().declarations().get_function_decl(FuncId::from_u32(index));
                let symbol = decl.name.clone().unwrap_or_default();
                let entry = RuntimeEntry::ALL
                    .into_iter()
                    .find(|e| e.symbol() == symbol)
                    .expect("call to a non-runtime function");
                calls.push((entry, func.dfg.inst_args(inst).to_vec()));
            }
        }
        calls
    }

    fn iconst_value(func: &Function, v: Value) -> Option<i64> {
        let ValueDef::Result(inst, _) = func.dfg.value_def(v) else {
            return None;
        };
        match func.dfg.insts[inst] {
            InstructionData::UnaryImm { opcode: Opcode::Iconst, imm } => Some(imm.bits()),
            _ => None,
        }
    }

    fn defining_opcode(func: &Function, v: Value) -> Option<Opcode> {
        match func.dfg.value_def(v) {
            ValueDef::Result(inst, _) => Some(func.dfg.insts[inst].opcode()),
            _ => None,
        }
    }

    fn count_opcode(func: &Function, opcode: Opcode) -> usize {
        func.layout
            .blocks()
            .flat_map(|b| func.layout.block_insts(b))
            .filter(|inst| func.dfg.insts[*inst].opcode() == opcode)
            .count()
    }

    fn staged_labels(events: &[StagingEvent]) -> Vec<String> {
        events
            .iter()
            .map(|e| match e {
                StagingEvent::Staged { label, .. } => format!("+{}", label),
                StagingEvent::Released { label, .. } => format!("-{}", label),
            })
            .collect()
    }

    // ═══════════════════════════════════════════════════════════
    // make
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn codegen_make_map_default_hint() {
        // m := make(map[u8]bool)
        let map_ty = MapType::new(StaticType::U8, StaticType::BOOL);
        let mut b = BlockBuilder::new("mk", None);
        let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
        b.push_stmt(MirStmt::MakeMap { dst: m, map_ty, reserve: None, span: key_span() });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let calls = runtime_calls(&gen, &func);
        assert_eq!(calls.len(), 1);
        let (entry, args) = &calls[0];
        assert_eq!(*entry, RuntimeEntry::Make);
        let consts: Vec<_> = args.iter().map(|v| iconst_value(&func, *v)).collect();
        assert_eq!(consts, vec![Some(1), Some(1), Some(8)]);
        assert!(gen.staging_events("mk").is_empty());
    }

    #[test]
    fn codegen_make_map_sizes_from_layout() {
        // make(map[struct{a: i32, b: bool}]string, 100)
        let key = strukt(&[("a", StaticType::I32), ("b", StaticType::BOOL)]);
        let map_ty = MapType::new(key, StaticType::STRING);
        let mut b = BlockBuilder::new("mk", None);
        let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
        b.push_stmt(MirStmt::MakeMap {
            dst: m,
            map_ty,
            reserve: Some(MirOperand::int(100)),
            span: key_span(),
        });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let (_, args) = &runtime_calls(&gen, &func)[0];
        let ptr_bytes = gen.options().layout.pointer_bytes as i64;
        assert_eq!(iconst_value(&func, args[0]), Some(8));
        assert_eq!(iconst_value(&func, args[1]), Some(2 * ptr_bytes));
        assert_eq!(iconst_value(&func, args[2]), Some(100));
    }

    #[test]
    fn codegen_make_map_never_classifies() {
        // make(map[f64]int) is legal; only later operations are rejected
        let map_ty = MapType::new(StaticType::F64, StaticType::INT);
        let mut b = BlockBuilder::new("mk", None);
        let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
        b.push_stmt(MirStmt::MakeMap { dst: m, map_ty, reserve: None, span: key_span() });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        gen.gen_function(&mir).unwrap();
        assert!(!gen.has_errors());
    }

    #[test]
    fn codegen_make_map_hint_widening() {
        // make(map[int]int, n) for n: i32 sign-extends, n: u16 zero-extends
        for (hint_ty, expected) in [
            (StaticType::I32, Opcode::Sextend),
            (StaticType::Basic(BasicKind::Uint16), Opcode::Uextend),
        ] {
            let map_ty = MapType::new(StaticType::INT, StaticType::INT);
            let mut b = BlockBuilder::new("mk", None);
            let n = b.add_param("n", hint_ty);
            let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
            b.push_stmt(MirStmt::MakeMap {
                dst: m,
                map_ty,
                reserve: Some(MirOperand::local(n)),
                span: key_span(),
            });
            b.terminate(MirTerminator::Return { value: None });
            let mir = b.finish();

            let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
            let func = gen.lower_function(&mir).unwrap().clone();
            let (_, args) = &runtime_calls(&gen, &func)[0];
            assert_eq!(defining_opcode(&func, args[2]), Some(expected));
        }
    }

    #[test]
    fn codegen_make_map_rejects_oversized_values() {
        let map_ty = MapType::new(StaticType::INT, StaticType::array(StaticType::U8, 300));
        let mut b = BlockBuilder::new("mk", None);
        let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
        b.push_stmt(MirStmt::MakeMap { dst: m, map_ty, reserve: None, span: key_span() });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let err = gen.gen_function(&mir).unwrap_err();
        assert_eq!(err, CodegenError::AbiSizeOverflow { what: "value type", size: 300 });

        let diag = err.to_diagnostic();
        assert!(diag.notes.iter().any(|n| n.contains("255 bytes")), "{:?}", diag.notes);
        assert!(!diag.notes.iter().any(|n| n.contains("compiler bug")));
        assert!(diag.help.is_some());
    }

    #[test]
    fn codegen_make_map_rejects_unrepresentable_sizes() {
        // make(map[int][1 << 29]int64): 4 GiB of value does not fit in u32
        let huge = StaticType::array(StaticType::I64, 1 << 29);
        let map_ty = MapType::new(StaticType::INT, huge);
        let mut b = BlockBuilder::new("mk", None);
        let m = b.alloc_local("m", StaticType::Map(map_ty.clone()));
        b.push_stmt(MirStmt::MakeMap { dst: m, map_ty: map_ty.clone(), reserve: None, span: key_span() });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        for mode in [BuildMode::Debug, BuildMode::Release] {
            let mut gen = generator(mode, &[mir.clone()]);
            let err = gen.gen_function(&mir).unwrap_err();
            assert_eq!(err, CodegenError::LayoutOverflow("[i64; 536870912]".to_string()));
        }

        // a lookup result of that type fails while declaring the local
        let get = with_map_param("get", &map_ty, |b, m| {
            let v = b.alloc_temp((*map_ty.value).clone());
            b.push_stmt(MirStmt::MapLookup {
                dst: v,
                found: None,
                map: m,
                key: MirOperand::int(1),
                span: key_span(),
            });
        });
        let mut gen = generator(BuildMode::Debug, &[get.clone()]);
        let err = gen.gen_function(&get).unwrap_err();
        assert!(matches!(err, CodegenError::LayoutOverflow(_)));
        assert!(err.to_diagnostic().notes.iter().any(|n| n.contains("4 GiB")));
    }

    // ═══════════════════════════════════════════════════════════
    // lookup
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn codegen_string_key_lookup_without_flag() {
        // fn get(m: map[string]int) -> int { return m["hello"] }
        let map_ty = MapType::new(StaticType::STRING, StaticType::INT);
        let mut b = BlockBuilder::new("get", Some(StaticType::INT));
        let m = b.add_param("m", StaticType::Map(map_ty.clone()));
        let v = b.alloc_temp(StaticType::INT);
        b.push_stmt(MirStmt::MapLookup {
            dst: v,
            found: None,
            map: m,
            key: MirOperand::string("hello"),
            span: key_span(),
        });
        b.terminate(MirTerminator::Return { value: Some(MirOperand::local(v)) });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let calls = runtime_calls(&gen, &func);
        assert_eq!(calls.len(), 1);
        let (entry, args) = &calls[0];
        assert_eq!(*entry, RuntimeEntry::StringGet);
        assert_eq!(args.len(), 4);
        assert_eq!(iconst_value(&func, args[2]), Some(5));
        assert_eq!(defining_opcode(&func, args[3]), Some(Opcode::StackAddr));
        assert_eq!(
            staged_labels(gen.staging_events("get")),
            ["+hashmap.result", "-hashmap.result"]
        );
        gen.gen_function(&mir).unwrap();
    }

    #[test]
    fn codegen_debug_zero_fills_result_buffer() {
        let map_ty = MapType::new(StaticType::STRING, StaticType::INT);
        let mir = with_map_param("get", &map_ty, |b, m| {
            let v = b.alloc_temp(StaticType::INT);
            b.push_stmt(MirStmt::MapLookup {
                dst: v,
                found: None,
                map: m,
                key: MirOperand::string("k"),
                span: key_span(),
            });
        });

        let mut debug = generator(BuildMode::Debug, &[mir.clone()]);
        let debug_stores = count_opcode(debug.lower_function(&mir).unwrap(), Opcode::Store);
        let mut release = generator(BuildMode::Release, &[mir.clone()]);
        let release_stores = count_opcode(release.lower_function(&mir).unwrap(), Opcode::Store);
        assert_eq!(release_stores, 0);
        assert!(debug_stores > release_stores);
    }

    #[test]
    fn codegen_binary_key_comma_ok_lookup() {
        // v, ok := m[k] with k: i64
        let map_ty = MapType::new(StaticType::I64, StaticType::STRING);
        let mut b = BlockBuilder::new("get", Some(StaticType::BOOL));
        let m = b.add_param("m", StaticType::Map(map_ty.clone()));
        let k = b.add_param("k", StaticType::I64);
        let v = b.alloc_local("v", StaticType::STRING);
        let ok = b.alloc_local("ok", StaticType::BOOL);
        b.push_stmt(MirStmt::MapLookup {
            dst: v,
            found: Some(ok),
            map: m,
            key: MirOperand::local(k),
            span: key_span(),
        });
        b.terminate(MirTerminator::Return { value: Some(MirOperand::local(ok)) });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let calls = runtime_calls(&gen, &func);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, RuntimeEntry::BinaryGet);
        assert_eq!(calls[0].1.len(), 3);
        assert_eq!(
            staged_labels(gen.staging_events("get")),
            ["+hashmap.result", "+hashmap.key", "-hashmap.key", "-hashmap.result"]
        );
    }

    #[test]
    fn codegen_unsupported_key_lookup_yields_placeholder() {
        // m[k] with k: struct { a: i32, b: string }
        let key = strukt(&[("a", StaticType::I32), ("b", StaticType::STRING)]);
        let map_ty = MapType::new(key.clone(), StaticType::INT);
        let mut b = BlockBuilder::new("get", Some(StaticType::BOOL));
        let m = b.add_param("m", StaticType::Map(map_ty.clone()));
        let k = b.add_param("k", key);
        let v = b.alloc_local("v", StaticType::INT);
        let ok = b.alloc_local("ok", StaticType::BOOL);
        b.push_stmt(MirStmt::MapLookup {
            dst: v,
            found: Some(ok),
            map: m,
            key: MirOperand::local(k),
            span: key_span(),
        });
        b.terminate(MirTerminator::Return { value: Some(MirOperand::local(ok)) });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        assert!(runtime_calls(&gen, &func).is_empty());
        assert!(gen.has_errors());

        let diags = gen.finish_diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_ref().unwrap().0, "E0700");
        assert!(diags[0].message.contains("`struct { a: i32, b: string }`"));
        assert_eq!(diags[0].primary_span(), Some(key_span()));
        // the result buffer is still staged and released
        assert_eq!(
            staged_labels(gen.staging_events("get")),
            ["+hashmap.result", "-hashmap.result"]
        );
    }

    // ═══════════════════════════════════════════════════════════
    // update / delete
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn codegen_update_then_delete_stages_fresh_buffers() {
        // m[k] = 7; delete(m, k) with k: struct { a: i32, b: bool }
        let key = strukt(&[("a", StaticType::I32), ("b", StaticType::BOOL)]);
        let map_ty = MapType::new(key.clone(), StaticType::I64);
        let mut b = BlockBuilder::new("upd", None);
        let m = b.add_param("m", StaticType::Map(map_ty.clone()));
        let k = b.alloc_local("k", key);
        b.push_stmt(MirStmt::StoreField { base: k, offset: 0, ty: StaticType::I32, value: MirOperand::int(3) });
        b.push_stmt(MirStmt::StoreField { base: k, offset: 4, ty: StaticType::BOOL, value: MirOperand::bool(true) });
        b.push_stmt(MirStmt::MapUpdate {
            map: m,
            key: MirOperand::local(k),
            value: MirOperand::int(7),
            span: key_span(),
        });
        b.push_stmt(MirStmt::MapDelete { map: m, key: MirOperand::local(k), span: key_span() });
        b.terminate(MirTerminator::Return { value: None });
        let mir = b.finish();

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let entries: Vec<_> = runtime_calls(&gen, &func).into_iter().map(|(e, _)| e).collect();
        assert_eq!(entries, vec![RuntimeEntry::BinarySet, RuntimeEntry::BinaryDelete]);

        let events = gen.staging_events("upd");
        assert_eq!(
            staged_labels(events),
            [
                "+hashmap.value",
                "+hashmap.key",
                "-hashmap.key",
                "-hashmap.value",
                "+hashmap.key",
                "-hashmap.key",
            ]
        );
        let staged_ids: std::collections::BTreeSet<_> = events
            .iter()
            .filter(|e| matches!(e, StagingEvent::Staged { .. }))
            .map(|e| e.id())
            .collect();
        assert_eq!(staged_ids.len(), 3);
        let key_sizes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StagingEvent::Staged { label: "hashmap.key", size, .. } => Some(*size),
                _ => None,
            })
            .collect();
        assert_eq!(key_sizes, vec![8, 8]);
        // two distinct key slots, one value slot, plus the local's own slot
        assert_eq!(func.sized_stack_slots.len(), 4);
    }

    #[test]
    fn codegen_string_key_update_and_delete() {
        let map_ty = MapType::new(StaticType::named("Name", StaticType::STRING), StaticType::BOOL);
        let mir = with_map_param("upd", &map_ty, |b, m| {
            b.push_stmt(MirStmt::MapUpdate {
                map: m,
                key: MirOperand::string("alice"),
                value: MirOperand::bool(true),
                span: key_span(),
            });
            b.push_stmt(MirStmt::MapDelete { map: m, key: MirOperand::string("alice"), span: key_span() });
        });

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        let calls = runtime_calls(&gen, &func);
        assert_eq!(calls[0].0, RuntimeEntry::StringSet);
        assert_eq!(calls[0].1.len(), 4);
        assert_eq!(calls[1].0, RuntimeEntry::StringDelete);
        assert_eq!(calls[1].1.len(), 3);
        assert_eq!(
            staged_labels(gen.staging_events("upd")),
            ["+hashmap.value", "-hashmap.value"]
        );
    }

    #[test]
    fn codegen_unsupported_key_update_releases_value() {
        // m[1.5] = 2 for map[f64]int
        let map_ty = MapType::new(StaticType::F64, StaticType::INT);
        let mir = with_map_param("upd", &map_ty, |b, m| {
            b.push_stmt(MirStmt::MapUpdate {
                map: m,
                key: MirOperand::Constant(mapc_mir::MirConst::Float(1.5)),
                value: MirOperand::int(2),
                span: key_span(),
            });
        });

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        assert!(runtime_calls(&gen, &func).is_empty());
        assert_eq!(
            staged_labels(gen.staging_events("upd")),
            ["+hashmap.value", "-hashmap.value"]
        );
        assert_eq!(gen.diagnostics().error_count(), 1);
        assert!(gen.diagnostics().diagnostics()[0].notes[0].contains("floating-point"));
    }

    #[test]
    fn codegen_unsupported_key_delete_is_omitted() {
        let map_ty = MapType::new(StaticType::slice(StaticType::U8), StaticType::INT);
        let mir = with_map_param("del", &map_ty, |b, m| {
            b.push_stmt(MirStmt::MapDelete {
                map: m,
                key: MirOperand::Constant(mapc_mir::MirConst::Zero),
                span: key_span(),
            });
        });

        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        let func = gen.lower_function(&mir).unwrap().clone();
        assert!(runtime_calls(&gen, &func).is_empty());
        assert!(gen.staging_events("del").is_empty());
        assert_eq!(gen.diagnostics().error_count(), 1);
    }

    #[test]
    fn codegen_each_call_site_reports_separately() {
        let map_ty = MapType::new(StaticType::F64, StaticType::INT);
        let mir = with_map_param("twice", &map_ty, |b, m| {
            for _ in 0..2 {
                b.push_stmt(MirStmt::MapDelete {
                    map: m,
                    key: MirOperand::Constant(mapc_mir::MirConst::Float(0.0)),
                    span: key_span(),
                });
            }
        });
        let mut gen = generator(BuildMode::Debug, &[mir.clone()]);
        gen.gen_function(&mir).unwrap();
        assert_eq!(gen.diagnostics().error_count(), 2);
    }

    // ═══════════════════════════════════════════════════════════
    // Module driver
    // ═══════════════════════════════════════════════════════════

    #[test]
    fn codegen_missing_runtime_declaration_errors() {
        let map_ty = MapType::new(StaticType::INT, StaticType::INT);
        let mir = with_map_param("del", &map_ty, |b, m| {
            b.push_stmt(MirStmt::MapDelete { map: m, key: MirOperand::int(1), span: key_span() });
        });
        let mut gen = CodeGenerator::new(BuildMode::Debug).unwrap();
        gen.declare_functions(&[mir.clone()]).unwrap();
        let err = gen.gen_function(&mir).unwrap_err();
        assert_eq!(err, CodegenError::RuntimeEntryMissing("mapc_hashmap_binary_delete"));
    }

    #[test]
    fn codegen_unknown_function_errors() {
        let mir = BlockBuilder::new("ghost", None).finish();
        let mut gen = CodeGenerator::new(BuildMode::Debug).unwrap();
        let err = gen.gen_function(&mir).unwrap_err();
        assert_eq!(err, CodegenError::FunctionNotFound("ghost".to_string()));
    }

    #[test]
    fn codegen_aggregate_return_is_unsupported() {
        let mut b = BlockBuilder::new("pair", Some(strukt(&[("a", StaticType::I32)])));
        b.terminate(MirTerminator::Return { value: Some(MirOperand::Constant(mapc_mir::MirConst::Zero)) });
        let mir = b.finish();
        let mut gen = CodeGenerator::new(BuildMode::Debug).unwrap();
        assert!(matches!(
            gen.declare_functions(&[mir]),
            Err(CodegenError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn codegen_emit_object_imports_runtime() {
        use object::{Object, ObjectSymbol};

        let map_ty = MapType::new(StaticType::STRING, StaticType::INT);
        let mir = with_map_param("touch", &map_ty, |b, m| {
            b.push_stmt(MirStmt::MapUpdate {
                map: m,
                key: MirOperand::string("x"),
                value: MirOperand::int(1),
                span: key_span(),
            });
        });

        let mut gen = CodeGenerator::new(BuildMode::Release).unwrap();
        gen.compile(&[mir]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps.o");
        gen.emit_object(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let file = object::File::parse(&*bytes).unwrap();
        let names: Vec<String> = file
            .symbols()
            .filter_map(|s| s.name().ok().map(str::to_string))
            .collect();
        let has = |name: &str| names.iter().any(|n| n.trim_start_matches('_') == name);
        assert!(has("touch"));
        assert!(has("mapc_hashmap_string_set"));
    }

    #[test]
    fn codegen_for_target_uses_target_pointer_width() {
        let gen = CodeGenerator::for_target("aarch64-unknown-linux-gnu".parse().unwrap(), BuildMode::Debug).unwrap();
        assert_eq!(gen.options().layout.pointer_bytes, 8);
        assert_eq!(gen.module().target_config().pointer_bytes(), 8);

        let unsupported = CodeGenerator::for_target("i686-unknown-linux-gnu".parse().unwrap(), BuildMode::Debug);
        assert!(matches!(unsupported, Err(CodegenError::Cranelift(_))));
    }
}
