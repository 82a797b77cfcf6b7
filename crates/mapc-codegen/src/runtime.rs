// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Hash-map runtime entry points.
//!
//! ## Calling convention
//!
//! - Handles, key/value buffer addresses and string words are native words.
//! - Key and value sizes travel as single bytes; the found flag comes back
//!   as a byte. Both are zero-extended at the ABI boundary.
//! - Results are written through a caller-provided buffer; the runtime never
//!   returns a pointer into its own storage.

use std::collections::HashMap;

use cranelift::prelude::*;
use cranelift_codegen::ir::{FuncRef, Function};
use cranelift_module::{FuncId, Linkage, Module};

use crate::classify::KeyPath;
use crate::{CodegenError, CodegenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeEntry {
    Make,
    StringGet,
    BinaryGet,
    StringSet,
    BinarySet,
    StringDelete,
    BinaryDelete,
}

/// Parameter/return slot kinds, resolved to Cranelift types per target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiSlot {
    Word,
    Byte,
}

impl AbiSlot {
    fn param(self, ptr: Type) -> AbiParam {
        match self {
            AbiSlot::Word => AbiParam::new(ptr),
            AbiSlot::Byte => AbiParam::new(types::I8).uext(),
        }
    }
}

pub struct EntrySpec {
    pub symbol: &'static str,
    pub params: &'static [AbiSlot],
    pub ret: Option<AbiSlot>,
}

use AbiSlot::{Byte, Word};

impl RuntimeEntry {
    pub const ALL: [RuntimeEntry; 7] = [
        RuntimeEntry::Make,
        RuntimeEntry::StringGet,
        RuntimeEntry::BinaryGet,
        RuntimeEntry::StringSet,
        RuntimeEntry::BinarySet,
        RuntimeEntry::StringDelete,
        RuntimeEntry::BinaryDelete,
    ];

    pub fn spec(self) -> EntrySpec {
        match self {
            // mapc_hashmap_make(key_size: u8, value_size: u8, hint: word) -> handle
            RuntimeEntry::Make => EntrySpec {
                symbol: "mapc_hashmap_make",
                params: &[Byte, Byte, Word],
                ret: Some(Word),
            },
            // mapc_hashmap_string_get(m, key_ptr, key_len, out) -> found
            RuntimeEntry::StringGet => EntrySpec {
                symbol: "mapc_hashmap_string_get",
                params: &[Word, Word, Word, Word],
                ret: Some(Byte),
            },
            // mapc_hashmap_binary_get(m, key, out) -> found
            RuntimeEntry::BinaryGet => EntrySpec {
                symbol: "mapc_hashmap_binary_get",
                params: &[Word, Word, Word],
                ret: Some(Byte),
            },
            // mapc_hashmap_string_set(m, key_ptr, key_len, value)
            RuntimeEntry::StringSet => EntrySpec {
                symbol: "mapc_hashmap_string_set",
                params: &[Word, Word, Word, Word],
                ret: None,
            },
            // mapc_hashmap_binary_set(m, key, value)
            RuntimeEntry::BinarySet => EntrySpec {
                symbol: "mapc_hashmap_binary_set",
                params: &[Word, Word, Word],
                ret: None,
            },
            // mapc_hashmap_string_delete(m, key_ptr, key_len)
            RuntimeEntry::StringDelete => EntrySpec {
                symbol: "mapc_hashmap_string_delete",
                params: &[Word, Word, Word],
                ret: None,
            },
            // mapc_hashmap_binary_delete(m, key)
            RuntimeEntry::BinaryDelete => EntrySpec {
                symbol: "mapc_hashmap_binary_delete",
                params: &[Word, Word],
                ret: None,
            },
        }
    }

    pub fn symbol(self) -> &'static str {
        self.spec().symbol
    }

    pub fn get(path: KeyPath) -> Self {
        match path {
            KeyPath::String => RuntimeEntry::StringGet,
            KeyPath::Binary => RuntimeEntry::BinaryGet,
        }
    }

    pub fn set(path: KeyPath) -> Self {
        match path {
            KeyPath::String => RuntimeEntry::StringSet,
            KeyPath::Binary => RuntimeEntry::BinarySet,
        }
    }

    pub fn delete(path: KeyPath) -> Self {
        match path {
            KeyPath::String => RuntimeEntry::StringDelete,
            KeyPath::Binary => RuntimeEntry::BinaryDelete,
        }
    }

    /// Fill `sig` (already carrying the module's calling convention).
    pub fn fill_signature(self, sig: &mut Signature, ptr: Type) {
        let spec = self.spec();
        sig.params.extend(spec.params.iter().map(|slot| slot.param(ptr)));
        sig.returns.extend(spec.ret.map(|slot| slot.param(ptr)));
    }
}

/// Declare every runtime entry as an import of `module`.
pub fn declare_map_runtime<M: Module>(module: &mut M) -> CodegenResult<HashMap<RuntimeEntry, FuncId>> {
    let ptr = module.target_config().pointer_type();
    let mut ids = HashMap::new();
    for entry in RuntimeEntry::ALL {
        let mut sig = module.make_signature();
        entry.fill_signature(&mut sig, ptr);
        let id = module
            .declare_function(entry.symbol(), Linkage::Import, &sig)
            .map_err(CodegenError::cranelift)?;
        ids.insert(entry, id);
    }
    Ok(ids)
}

/// Runtime entries imported into one function.
#[derive(Debug, Default, Clone)]
pub struct RuntimeFuncs {
    refs: HashMap<RuntimeEntry, FuncRef>,
}

impl RuntimeFuncs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import every declared entry into `func`.
    pub fn import<M: Module>(module: &mut M, ids: &HashMap<RuntimeEntry, FuncId>, func: &mut Function) -> Self {
        let refs = RuntimeEntry::ALL
            .iter()
            .filter_map(|entry| ids.get(entry).map(|id| (*entry, module.declare_func_in_func(*id, func))))
            .collect();
        Self { refs }
    }

    pub fn insert(&mut self, entry: RuntimeEntry, func_ref: FuncRef) {
        self.refs.insert(entry, func_ref);
    }

    pub fn get(&self, entry: RuntimeEntry) -> CodegenResult<FuncRef> {
        self.refs
            .get(&entry)
            .copied()
            .ok_or(CodegenError::RuntimeEntryMissing(entry.symbol()))
    }

    /// Reverse lookup, for inspecting emitted calls.
    pub fn entry_for(&self, func_ref: FuncRef) -> Option<RuntimeEntry> {
        self.refs
            .iter()
            .find(|(_, r)| **r == func_ref)
            .map(|(entry, _)| *entry)
    }
}
