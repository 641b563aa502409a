// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Values stored in object slots.

use crate::error::{Result, SerializationError};
use crate::runtime_type::RuntimeType;
use crate::schema::{PrimitiveKind, TypeKind};
use std::fmt;
use std::sync::Arc;

/// Handle of an object in an [`ObjectGraph`](crate::graph::ObjectGraph).
///
/// Object identity is the handle: two slots holding the same `ObjectRef`
/// share one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub(crate) u32);

impl ObjectRef {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// An enum constant: runtime type plus ordinal.
#[derive(Clone)]
pub struct EnumValue {
    ty: Arc<RuntimeType>,
    ordinal: u32,
}

impl EnumValue {
    /// Constant at `ordinal`.
    pub fn new(ty: &Arc<RuntimeType>, ordinal: u32) -> Result<Self> {
        if ty.kind() != TypeKind::Enum {
            return Err(SerializationError::SchemaMismatch {
                expected: "enum type".into(),
                found: ty.name().to_string(),
            });
        }
        if ty.variant(ordinal).is_none() {
            return Err(SerializationError::SchemaMismatch {
                expected: format!("ordinal < {} for {}", ty.variants().len(), ty.name()),
                found: ordinal.to_string(),
            });
        }
        Ok(Self {
            ty: ty.clone(),
            ordinal,
        })
    }

    /// Constant called `name`.
    pub fn named(ty: &Arc<RuntimeType>, name: &str) -> Result<Self> {
        let ordinal = ty
            .ordinal_of(name)
            .ok_or_else(|| SerializationError::SchemaMismatch {
                expected: format!("constant of {}", ty.name()),
                found: name.to_string(),
            })?;
        Self::new(ty, ordinal)
    }

    pub fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        self.ty.variant(self.ordinal).unwrap_or("?")
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.ty.fingerprint() == other.ty.fingerprint()
    }
}

impl fmt::Debug for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}({})", self.ty.name(), self.name(), self.ordinal)
    }
}

/// A value that can sit in a slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,

    // Primitives
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    U64(u64),
    I64(i64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Bytes(Vec<u8>),

    // Composites
    List(Vec<Value>),
    Enum(EnumValue),
    Object(ObjectRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Primitive kind of this value, if it is one.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        let kind = match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::U8(_) => PrimitiveKind::U8,
            Self::I8(_) => PrimitiveKind::I8,
            Self::U16(_) => PrimitiveKind::U16,
            Self::I16(_) => PrimitiveKind::I16,
            Self::U32(_) => PrimitiveKind::U32,
            Self::I32(_) => PrimitiveKind::I32,
            Self::U64(_) => PrimitiveKind::U64,
            Self::I64(_) => PrimitiveKind::I64,
            Self::F32(_) => PrimitiveKind::F32,
            Self::F64(_) => PrimitiveKind::F64,
            Self::Char(_) => PrimitiveKind::Char,
            Self::String(_) => PrimitiveKind::String,
            Self::Bytes(_) => PrimitiveKind::Bytes,
            Self::Null | Self::List(_) | Self::Enum(_) | Self::Object(_) => return None,
        };
        Some(kind)
    }

    pub fn as_object(&self) -> Option<ObjectRef> {
        match self {
            Self::Object(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Self::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Bool,
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Vec<u8> => Bytes,
    EnumValue => Enum,
    ObjectRef => Object,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
