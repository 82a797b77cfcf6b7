// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Static type descriptors for map lowering.
//!
//! Everything the backend knows about a map's key and value comes from here:
//! the closed set of type shapes, their byte layout on the target, and the
//! source spans diagnostics point at.

mod layout;
mod span;
mod ty;

pub use layout::{FieldOffset, TargetLayout};
pub use span::Span;
pub use ty::{BasicKind, Field, MapType, StaticType};
