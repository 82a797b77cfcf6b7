// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Display implementations for MIR.

use std::fmt;

use crate::{MirConst, MirFunction, MirOperand, MirStmt, MirTerminator};

impl fmt::Display for MirOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirOperand::Local(id) => write!(f, "_{}", id.0),
            MirOperand::Constant(c) => write!(f, "{}", c),
        }
    }
}

impl fmt::Display for MirConst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirConst::Int(v) => write!(f, "{}", v),
            MirConst::Float(v) => write!(f, "{}", v),
            MirConst::Bool(v) => write!(f, "{}", v),
            MirConst::String(s) => write!(f, "{:?}", s),
            MirConst::Zero => write!(f, "zeroed"),
        }
    }
}

impl fmt::Display for MirStmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirStmt::Assign { dst, value } => write!(f, "_{} = {}", dst.0, value),
            MirStmt::StoreField { base, offset, ty, value } => {
                write!(f, "(_{} + {}): {} = {}", base.0, offset, ty, value)
            }
            MirStmt::LoadField { dst, base, offset } => {
                write!(f, "_{} = (_{} + {})", dst.0, base.0, offset)
            }
            MirStmt::MakeMap { dst, map_ty, reserve, .. } => {
                write!(f, "_{} = make_map[{}]{}", dst.0, map_ty.key, map_ty.value)?;
                match reserve {
                    Some(hint) => write!(f, "({})", hint),
                    None => Ok(()),
                }
            }
            MirStmt::MapLookup { dst, found, map, key, .. } => match found {
                Some(ok) => write!(f, "_{}, _{} = _{}[{}]", dst.0, ok.0, map.0, key),
                None => write!(f, "_{} = _{}[{}]", dst.0, map.0, key),
            },
            MirStmt::MapUpdate { map, key, value, .. } => {
                write!(f, "_{}[{}] = {}", map.0, key, value)
            }
            MirStmt::MapDelete { map, key, .. } => write!(f, "map_delete(_{}, {})", map.0, key),
        }
    }
}

impl fmt::Display for MirTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MirTerminator::Return { value: Some(v) } => write!(f, "return {}", v),
            MirTerminator::Return { value: None } => write!(f, "return"),
            MirTerminator::Goto { target } => write!(f, "goto bb{}", target.0),
            MirTerminator::Branch { cond, then_block, else_block } => {
                write!(f, "if {} then bb{} else bb{}", cond, then_block.0, else_block.0)
            }
            MirTerminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Display for MirFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "_{}: {}", p.id.0, p.ty)?;
        }
        write!(f, ")")?;
        if let Some(ret) = &self.ret_ty {
            write!(f, " -> {}", ret)?;
        }
        writeln!(f, " {{")?;
        for local in self.locals.iter().filter(|l| !l.is_param) {
            match &local.name {
                Some(name) => writeln!(f, "    let _{}: {} // {}", local.id.0, local.ty, name)?,
                None => writeln!(f, "    let _{}: {}", local.id.0, local.ty)?,
            }
        }
        for block in &self.blocks {
            writeln!(f, "  bb{}:", block.id.0)?;
            for stmt in &block.statements {
                writeln!(f, "    {}", stmt)?;
            }
            writeln!(f, "    {}", block.terminator)?;
        }
        write!(f, "}}")
    }
}
