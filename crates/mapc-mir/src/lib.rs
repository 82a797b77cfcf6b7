// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! MIR for map-using functions - a non-SSA control-flow graph.
//!
//! Locals carry their static types; map statements carry the span of the
//! source expression so the backend can point diagnostics at it.

mod builder;
mod display;
mod function;
mod operand;
mod stmt;

pub use builder::BlockBuilder;
pub use function::{BlockId, LocalId, MirBlock, MirFunction, MirLocal};
pub use operand::{MirConst, MirOperand};
pub use stmt::{MirStmt, MirTerminator};
