// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! BlockBuilder - helper for CFG construction.

use mapc_types::StaticType;

use crate::{BlockId, LocalId, MirBlock, MirFunction, MirLocal, MirStmt, MirTerminator};

pub struct BlockBuilder {
    function: MirFunction,
    current_block: BlockId,
    next_local_id: u32,
    next_block_id: u32,
}

impl BlockBuilder {
    pub fn new(name: impl Into<String>, ret_ty: Option<StaticType>) -> Self {
        let entry_block = BlockId(0);
        let function = MirFunction {
            name: name.into(),
            params: Vec::new(),
            ret_ty,
            locals: Vec::new(),
            blocks: vec![MirBlock {
                id: entry_block,
                statements: Vec::new(),
                terminator: MirTerminator::Unreachable,
            }],
            entry_block,
        };

        Self {
            function,
            current_block: entry_block,
            next_local_id: 0,
            next_block_id: 1,
        }
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.function.blocks.push(MirBlock {
            id,
            statements: Vec::new(),
            terminator: MirTerminator::Unreachable,
        });
        id
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current_block = block;
    }

    pub fn current_block(&self) -> BlockId {
        self.current_block
    }

    pub fn alloc_temp(&mut self, ty: StaticType) -> LocalId {
        self.push_local(None, ty, false)
    }

    pub fn alloc_local(&mut self, name: impl Into<String>, ty: StaticType) -> LocalId {
        self.push_local(Some(name.into()), ty, false)
    }

    pub fn add_param(&mut self, name: impl Into<String>, ty: StaticType) -> LocalId {
        let id = self.push_local(Some(name.into()), ty, true);
        let local = self.function.locals[id.0 as usize].clone();
        self.function.params.push(local);
        id
    }

    fn push_local(&mut self, name: Option<String>, ty: StaticType, is_param: bool) -> LocalId {
        let id = LocalId(self.next_local_id);
        self.next_local_id += 1;
        self.function.locals.push(MirLocal { id, name, ty, is_param });
        id
    }

    pub fn push_stmt(&mut self, stmt: MirStmt) {
        let block = &mut self.function.blocks[self.current_block.0 as usize];
        block.statements.push(stmt);
    }

    pub fn terminate(&mut self, term: MirTerminator) {
        let block = &mut self.function.blocks[self.current_block.0 as usize];
        block.terminator = term;
    }

    pub fn finish(self) -> MirFunction {
        self.function
    }
}
