// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Static type descriptors - the closed set of shapes the backend sees.

use std::fmt;

/// Predeclared scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Pointer-width signed integer.
    Int,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    /// Pointer-width unsigned integer.
    Uint,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
}

impl BasicKind {
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Int
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uint
                | BasicKind::Uintptr
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            BasicKind::Int8 | BasicKind::Int16 | BasicKind::Int32 | BasicKind::Int64 | BasicKind::Int
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, BasicKind::Float32 | BasicKind::Float64)
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int8 => "i8",
            BasicKind::Int16 => "i16",
            BasicKind::Int32 => "i32",
            BasicKind::Int64 => "i64",
            BasicKind::Int => "int",
            BasicKind::Uint8 => "u8",
            BasicKind::Uint16 => "u16",
            BasicKind::Uint32 => "u32",
            BasicKind::Uint64 => "u64",
            BasicKind::Uint => "uint",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "f32",
            BasicKind::Float64 => "f64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "rawptr",
        }
    }
}

/// A named struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: StaticType,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: StaticType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Key and value types of a map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapType {
    pub key: Box<StaticType>,
    pub value: Box<StaticType>,
}

impl MapType {
    pub fn new(key: StaticType, value: StaticType) -> Self {
        Self { key: Box::new(key), value: Box::new(value) }
    }
}

/// Static type descriptor. Aggregates are fully expanded; there are no
/// generic parameters left at this stage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StaticType {
    Basic(BasicKind),
    Pointer(Box<StaticType>),
    Struct(Vec<Field>),
    Array {
        elem: Box<StaticType>,
        len: u32,
    },
    /// A declared type name over an underlying type.
    Named {
        name: String,
        underlying: Box<StaticType>,
    },
    Interface {
        methods: Vec<String>,
    },
    Slice(Box<StaticType>),
    Map(MapType),
    Func {
        params: Vec<StaticType>,
        results: Vec<StaticType>,
    },
    Chan(Box<StaticType>),
}

impl StaticType {
    pub const BOOL: StaticType = StaticType::Basic(BasicKind::Bool);
    pub const STRING: StaticType = StaticType::Basic(BasicKind::String);
    pub const INT: StaticType = StaticType::Basic(BasicKind::Int);
    pub const I32: StaticType = StaticType::Basic(BasicKind::Int32);
    pub const I64: StaticType = StaticType::Basic(BasicKind::Int64);
    pub const U8: StaticType = StaticType::Basic(BasicKind::Uint8);
    pub const F64: StaticType = StaticType::Basic(BasicKind::Float64);

    pub fn pointer(elem: StaticType) -> Self {
        StaticType::Pointer(Box::new(elem))
    }

    pub fn array(elem: StaticType, len: u32) -> Self {
        StaticType::Array { elem: Box::new(elem), len }
    }

    pub fn named(name: impl Into<String>, underlying: StaticType) -> Self {
        StaticType::Named { name: name.into(), underlying: Box::new(underlying) }
    }

    pub fn slice(elem: StaticType) -> Self {
        StaticType::Slice(Box::new(elem))
    }

    pub fn map(key: StaticType, value: StaticType) -> Self {
        StaticType::Map(MapType::new(key, value))
    }

    /// Strip every `Named` layer.
    pub fn underlying(&self) -> &StaticType {
        let mut ty = self;
        while let StaticType::Named { underlying, .. } = ty {
            ty = underlying;
        }
        ty
    }

    pub fn basic_kind(&self) -> Option<BasicKind> {
        match self.underlying() {
            StaticType::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.basic_kind().is_some_and(BasicKind::is_integer)
    }

    pub fn is_signed(&self) -> bool {
        self.basic_kind().is_some_and(BasicKind::is_signed)
    }

    pub fn is_string(&self) -> bool {
        self.basic_kind() == Some(BasicKind::String)
    }

    pub fn as_map(&self) -> Option<&MapType> {
        match self.underlying() {
            StaticType::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::Basic(kind) => write!(f, "{}", kind.name()),
            StaticType::Pointer(elem) => write!(f, "*{}", elem),
            StaticType::Struct(fields) if fields.is_empty() => write!(f, "struct {{}}"),
            StaticType::Struct(fields) => {
                write!(f, "struct {{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                write!(f, " }}")
            }
            StaticType::Array { elem, len } => write!(f, "[{}; {}]", elem, len),
            StaticType::Named { name, .. } => write!(f, "{}", name),
            StaticType::Interface { methods } if methods.is_empty() => write!(f, "any"),
            StaticType::Interface { methods } => write!(f, "interface {{ {} }}", methods.join(", ")),
            StaticType::Slice(elem) => write!(f, "[]{}", elem),
            StaticType::Map(m) => write!(f, "map[{}]{}", m.key, m.value),
            StaticType::Func { params, results } => {
                write!(f, "func(")?;
                write_list(f, params)?;
                write!(f, ")")?;
                match results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " -> {}", single),
                    many => {
                        write!(f, " -> (")?;
                        write_list(f, many)?;
                        write!(f, ")")
                    }
                }
            }
            StaticType::Chan(elem) => write!(f, "chan {}", elem),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[StaticType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}
