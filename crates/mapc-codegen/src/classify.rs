// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Map key classification.
//!
//! A `BinaryKey` verdict promises that comparing two keys' byte images is the
//! same as comparing the keys. That is false for floats (NaN, -0.0), for
//! interfaces (dynamic type plus value), and for anything holding a string,
//! whose equality is over the pointed-to bytes rather than the pointer and
//! length words. Such types must never be classified as binary.

use mapc_diagnostics::{codes, Diagnostic, ToDiagnostic};
use mapc_types::{BasicKind, Span, StaticType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyClass {
    Unsupported,
    /// Pointer + length string, hashed and compared over its contents.
    StringKey,
    /// Contiguous byte image, compared with memcmp.
    BinaryKey,
}

/// Runtime entry family a comparable key dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPath {
    String,
    Binary,
}

pub fn classify(ty: &StaticType) -> KeyClass {
    match ty {
        StaticType::Basic(BasicKind::String) => KeyClass::StringKey,
        StaticType::Basic(kind) if *kind == BasicKind::Bool || kind.is_integer() => {
            KeyClass::BinaryKey
        }
        StaticType::Pointer(_) => KeyClass::BinaryKey,
        StaticType::Struct(fields) => {
            if fields.iter().all(|f| classify(&f.ty) == KeyClass::BinaryKey) {
                KeyClass::BinaryKey
            } else {
                KeyClass::Unsupported
            }
        }
        // An array of strings is not itself a pointer+length string.
        StaticType::Array { elem, .. } => match classify(elem) {
            KeyClass::BinaryKey => KeyClass::BinaryKey,
            KeyClass::StringKey | KeyClass::Unsupported => KeyClass::Unsupported,
        },
        StaticType::Named { underlying, .. } => classify(underlying),
        _ => KeyClass::Unsupported,
    }
}

/// Classify a key at a call site that needs comparison. Named types are
/// unwrapped first; the error still names the declared type.
pub fn require_comparable(ty: &StaticType, span: Span) -> Result<KeyPath, UnsupportedKeyType> {
    match classify(ty.underlying()) {
        KeyClass::StringKey => Ok(KeyPath::String),
        KeyClass::BinaryKey => Ok(KeyPath::Binary),
        KeyClass::Unsupported => Err(UnsupportedKeyType::new(ty, span)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "invalid map key type `{key_type}`: only strings, booleans, integers, pointers, \
     or structs/arrays composed solely of those are valid map keys"
)]
pub struct UnsupportedKeyType {
    pub key_type: String,
    pub span: Span,
    /// Why the offending component is not comparable.
    pub reason: Option<String>,
}

impl UnsupportedKeyType {
    pub fn new(ty: &StaticType, span: Span) -> Self {
        Self {
            key_type: ty.to_string(),
            span,
            reason: rejection_reason(ty),
        }
    }
}

impl ToDiagnostic for UnsupportedKeyType {
    fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.to_string())
            .with_code(codes::UNSUPPORTED_MAP_KEY)
            .with_primary(self.span, "key type is not comparable by the map runtime");
        if let Some(reason) = &self.reason {
            diag = diag.with_note(reason.as_str());
        }
        diag
    }
}

/// Describe the first component that makes `ty` unsupported.
fn rejection_reason(ty: &StaticType) -> Option<String> {
    match ty {
        StaticType::Basic(kind) if kind.is_float() => {
            Some("floating-point keys are not supported (NaN and -0.0 break byte equality)".into())
        }
        StaticType::Basic(BasicKind::Complex64 | BasicKind::Complex128) => {
            Some("complex keys are not supported".into())
        }
        StaticType::Basic(BasicKind::UnsafePointer) => {
            Some("raw pointers must be converted to a typed pointer or uintptr".into())
        }
        StaticType::Interface { .. } => {
            Some("interface values compare by dynamic type and value, not by bytes".into())
        }
        StaticType::Slice(_) | StaticType::Map(_) | StaticType::Func { .. } => {
            Some("slices, maps and functions are not comparable".into())
        }
        StaticType::Chan(_) => Some("channel keys are not supported".into()),
        StaticType::Struct(fields) => fields
            .iter()
            .find(|f| classify(&f.ty) != KeyClass::BinaryKey)
            .map(|f| match classify(&f.ty) {
                KeyClass::StringKey => format!(
                    "field `{}` has type `{}`; string fields are not allowed inside struct or array keys",
                    f.name, f.ty
                ),
                _ => format!(
                    "field `{}` has type `{}`, which is not a valid key component",
                    f.name, f.ty
                ),
            }),
        StaticType::Array { elem, .. } if classify(elem) == KeyClass::StringKey => {
            Some("string elements are not allowed inside struct or array keys".into())
        }
        StaticType::Array { elem, .. } => rejection_reason(elem),
        StaticType::Named { underlying, .. } => rejection_reason(underlying),
        _ => None,
    }
}
