// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! MIR statements and terminators.

use mapc_types::{MapType, Span, StaticType};

use crate::{BlockId, LocalId, MirOperand};

/// MIR statement - no control flow
#[derive(Debug, Clone)]
pub enum MirStmt {
    Assign {
        dst: LocalId,
        value: MirOperand,
    },
    /// Store into an aggregate local at a byte offset. `ty` is the stored
    /// field's type, needed for constants.
    StoreField {
        base: LocalId,
        offset: u32,
        ty: StaticType,
        value: MirOperand,
    },
    /// Load out of an aggregate local at a byte offset, typed by `dst`.
    LoadField {
        dst: LocalId,
        base: LocalId,
        offset: u32,
    },
    MakeMap {
        dst: LocalId,
        map_ty: MapType,
        /// Capacity hint; any integer type.
        reserve: Option<MirOperand>,
        span: Span,
    },
    /// `dst = map[key]`, with the found flag written to `found` when the
    /// comma-ok form is used.
    MapLookup {
        dst: LocalId,
        found: Option<LocalId>,
        map: LocalId,
        key: MirOperand,
        span: Span,
    },
    MapUpdate {
        map: LocalId,
        key: MirOperand,
        value: MirOperand,
        span: Span,
    },
    MapDelete {
        map: LocalId,
        key: MirOperand,
        span: Span,
    },
}

/// MIR terminator - ends a basic block
#[derive(Debug, Clone)]
pub enum MirTerminator {
    Return {
        value: Option<MirOperand>,
    },
    Goto {
        target: BlockId,
    },
    Branch {
        cond: MirOperand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Unreachable,
}
