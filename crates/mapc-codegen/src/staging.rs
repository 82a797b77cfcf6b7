// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Scoped marshalling buffers.
//!
//! A key or value crossing the runtime boundary is staged into its own
//! explicit stack slot right before the call. The `StagedOperand` guard
//! releases the buffer when it goes out of scope, so every exit path of an
//! operation (including `?` on an error) releases exactly once, in LIFO order.
//!
//! Cranelift places every explicit slot in the fixed frame, which keeps
//! staging inside conditional blocks out of dynamic stack growth. Release has
//! no IR counterpart; it is recorded in the region's event log so the
//! function builder can check for leaks.

use std::cell::RefCell;

use cranelift::prelude::*;
use cranelift_codegen::ir::StackSlot;

use crate::types::align_shift;
use crate::{CodegenError, CodegenResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagingEvent {
    Staged { id: BufferId, label: &'static str, size: u32 },
    Released { id: BufferId, label: &'static str, size: u32 },
}

impl StagingEvent {
    pub fn id(&self) -> BufferId {
        match self {
            StagingEvent::Staged { id, .. } | StagingEvent::Released { id, .. } => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StagingEvent::Staged { label, .. } | StagingEvent::Released { label, .. } => label,
        }
    }
}

#[derive(Debug, Default)]
struct RegionState {
    next_id: u32,
    live: Vec<(BufferId, &'static str, u32)>,
    events: Vec<StagingEvent>,
}

/// Owner of the staging buffers of one function.
#[derive(Debug, Default)]
pub struct ScratchRegion {
    state: RefCell<RegionState>,
}

impl ScratchRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a buffer of exactly `size` bytes aligned to `align`.
    pub fn stage<'r>(
        &'r self,
        builder: &mut FunctionBuilder,
        ptr: Type,
        size: u32,
        align: u32,
        label: &'static str,
    ) -> StagedOperand<'r> {
        let slot = builder.create_sized_stack_slot(StackSlotData::new(
            StackSlotKind::ExplicitSlot,
            size,
            align_shift(align),
        ));
        let addr = builder.ins().stack_addr(ptr, slot, 0);

        let mut state = self.state.borrow_mut();
        let id = BufferId(state.next_id);
        state.next_id += 1;
        state.live.push((id, label, size));
        state.events.push(StagingEvent::Staged { id, label, size });
        tracing::trace!(buffer = id.0, label, size, ?slot, "staged");

        StagedOperand { region: self, id, slot, addr, size }
    }

    fn release(&self, id: BufferId) {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.live.iter().position(|(live, _, _)| *live == id) else {
            return;
        };
        let (id, label, size) = state.live.remove(pos);
        state.events.push(StagingEvent::Released { id, label, size });
        tracing::trace!(buffer = id.0, label, size, "released");
    }

    pub fn events(&self) -> Vec<StagingEvent> {
        self.state.borrow().events.clone()
    }

    pub fn live_count(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Fails if any buffer outlived its operation.
    pub fn finish(&self, function: &str) -> CodegenResult<()> {
        let state = self.state.borrow();
        if state.live.is_empty() {
            return Ok(());
        }
        Err(CodegenError::LeakedBuffers {
            function: function.to_string(),
            labels: state.live.iter().map(|(_, label, _)| *label).collect(),
        })
    }
}

/// A staged key or value; released on drop.
#[derive(Debug)]
pub struct StagedOperand<'r> {
    region: &'r ScratchRegion,
    id: BufferId,
    slot: StackSlot,
    addr: Value,
    size: u32,
}

impl StagedOperand<'_> {
    pub fn id(&self) -> BufferId {
        self.id
    }

    pub fn addr(&self) -> Value {
        self.addr
    }

    pub fn slot(&self) -> StackSlot {
        self.slot
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// End the buffer's lifetime now rather than at scope exit.
    pub fn release(self) {}
}

impl Drop for StagedOperand<'_> {
    fn drop(&mut self) {
        self.region.release(self.id);
    }
}
