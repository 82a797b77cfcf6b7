// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Map-operation lowering - MIR map statements to Cranelift IR and calls
//! into the hash-map runtime.

mod builder;
pub mod classify;
pub mod hash;
pub mod lower;
mod module;
pub mod runtime;
pub mod staging;
pub mod types;
mod tests;

pub use classify::{classify, require_comparable, KeyClass, KeyPath, UnsupportedKeyType};
pub use lower::{Emission, LookupResult, MapLowerer, DEFAULT_SIZE_HINT};
pub use module::CodeGenerator;
pub use runtime::{RuntimeEntry, RuntimeFuncs};
pub use staging::{BufferId, ScratchRegion, StagedOperand, StagingEvent};
pub use types::{MapValue, ValueRepr};

use mapc_diagnostics::{codes, Diagnostic, ToDiagnostic};
use mapc_types::TargetLayout;

/// Controls safety checks in generated code.
/// Debug: zero-filled output buffers, IR verifier, leaked-buffer check.
/// Release: none of those.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CodegenOptions {
    pub mode: BuildMode,
    pub layout: TargetLayout,
}

impl CodegenOptions {
    pub fn release() -> Self {
        Self { mode: BuildMode::Release, ..Self::default() }
    }

    pub fn is_debug(&self) -> bool {
        self.mode == BuildMode::Debug
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error("unsupported feature: {0}")]
    UnsupportedFeature(String),
    #[error("type conversion failed: {0}")]
    TypeConversionFailed(String),
    #[error("function not found: {0}")]
    FunctionNotFound(String),
    #[error("runtime entry `{0}` was not imported into this function")]
    RuntimeEntryMissing(&'static str),
    #[error("cranelift error: {0}")]
    Cranelift(String),
    #[error("failed to write object file: {0}")]
    ObjectWrite(String),
    #[error("staging buffers still live at end of `{function}`: {labels:?}")]
    LeakedBuffers {
        function: String,
        labels: Vec<&'static str>,
    },
    #[error("{what} of {size} bytes does not fit the byte-wide runtime ABI field")]
    AbiSizeOverflow { what: &'static str, size: u32 },
    #[error("size of `{0}` does not fit in 32 bits")]
    LayoutOverflow(String),
}

impl CodegenError {
    pub(crate) fn cranelift(err: impl std::fmt::Display) -> Self {
        CodegenError::Cranelift(err.to_string())
    }
}

impl ToDiagnostic for CodegenError {
    fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string()).with_code(codes::BACKEND_FAILURE);
        match self {
            CodegenError::AbiSizeOverflow { .. } => diag
                .with_note("the map runtime takes key and value sizes as a single byte, so at most 255 bytes each")
                .with_help("store a pointer to the data in the map instead"),
            CodegenError::LayoutOverflow(_) => {
                diag.with_note("types larger than 4 GiB cannot be laid out by this backend")
            }
            _ => diag.with_note("this is a compiler bug, not an error in the program"),
        }
    }
}

pub type CodegenResult<T> = Result<T, CodegenError>;
