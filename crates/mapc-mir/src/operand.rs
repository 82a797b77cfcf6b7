// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! MIR operands.

use crate::LocalId;

#[derive(Debug, Clone, PartialEq)]
pub enum MirOperand {
    Local(LocalId),
    Constant(MirConst),
}

impl MirOperand {
    pub fn local(id: LocalId) -> Self {
        MirOperand::Local(id)
    }

    pub fn int(v: i64) -> Self {
        MirOperand::Constant(MirConst::Int(v))
    }

    pub fn bool(v: bool) -> Self {
        MirOperand::Constant(MirConst::Bool(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        MirOperand::Constant(MirConst::String(s.into()))
    }
}

/// Constants take their type from the local or slot they flow into.
#[derive(Debug, Clone, PartialEq)]
pub enum MirConst {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    /// All-zero value of any type.
    Zero,
}
