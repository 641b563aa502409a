// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors: structural type information independent of any local type.

use crate::error::{Result, SerializationError};
use crate::schema::Fingerprint;
use std::fmt;
use std::sync::Arc;

/// Primitive value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Char,
    String,
    Bytes,
}

impl PrimitiveKind {
    /// Reference primitives can represent absence-of-value; the rest cannot.
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }

    /// Canonical name used in signatures.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }

    /// Wire code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Bool => 0,
            Self::U8 => 1,
            Self::I8 => 2,
            Self::U16 => 3,
            Self::I16 => 4,
            Self::U32 => 5,
            Self::I32 => 6,
            Self::U64 => 7,
            Self::I64 => 8,
            Self::F32 => 9,
            Self::F64 => 10,
            Self::Char => 11,
            Self::String => 12,
            Self::Bytes => 13,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let kind = match code {
            0 => Self::Bool,
            1 => Self::U8,
            2 => Self::I8,
            3 => Self::U16,
            4 => Self::I16,
            5 => Self::U32,
            6 => Self::I32,
            7 => Self::U64,
            8 => Self::I64,
            9 => Self::F32,
            10 => Self::F64,
            11 => Self::Char,
            12 => Self::String,
            13 => Self::Bytes,
            _ => return None,
        };
        Some(kind)
    }
}

/// Declared type of a field slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Primitive value.
    Primitive(PrimitiveKind),
    /// Object or enum constant of the named type (or a subtype).
    Reference(String),
    /// Ordered collection.
    List(Box<ValueType>),
    /// Anything; the runtime type always travels with the value.
    Any,
}

impl ValueType {
    /// Reference to a named type.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// List of `element`.
    pub fn list(element: ValueType) -> Self {
        Self::List(Box::new(element))
    }

    /// Whether a slot of this type can hold absence-of-value at all.
    pub fn can_be_null(&self) -> bool {
        match self {
            Self::Primitive(p) => p.is_reference(),
            Self::Reference(_) | Self::List(_) | Self::Any => true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{}", p.name()),
            Self::Reference(name) => write!(f, "ref<{}>", name),
            Self::List(element) => write!(f, "list<{}>", element),
            Self::Any => write!(f, "any"),
        }
    }
}

/// Kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Concrete type with storage slots.
    Composite,
    /// Abstract type; never instantiated. Implementors name it, sub-interfaces extend it.
    Interface,
    /// Enumerated type; each field is a constant, ordinal = position.
    Enum,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Composite => "composite",
            Self::Interface => "interface",
            Self::Enum => "enum",
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Composite => 0,
            Self::Interface => 1,
            Self::Enum => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Composite),
            1 => Some(Self::Interface),
            2 => Some(Self::Enum),
            _ => None,
        }
    }
}

/// Field descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    name: String,
    value_type: ValueType,
    nullable: bool,
}

impl FieldDescriptor {
    /// Create a field descriptor.
    ///
    /// Fails with `NullabilityViolation` when a non-reference primitive is
    /// declared nullable.
    pub fn new(name: impl Into<String>, value_type: ValueType, nullable: bool) -> Result<Self> {
        let name = name.into();
        if nullable && !value_type.can_be_null() {
            return Err(SerializationError::NullabilityViolation {
                type_name: format!("primitive {}", value_type),
                field: name,
            });
        }
        Ok(Self {
            name,
            value_type,
            nullable,
        })
    }

    /// Mandatory (non-nullable) field. Always valid.
    pub fn mandatory(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            nullable: false,
        }
    }

    /// Nullable field.
    pub fn nullable(name: impl Into<String>, value_type: ValueType) -> Result<Self> {
        Self::new(name, value_type, true)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Readable `name:type[?]` form, for messages.
    pub fn signature(&self) -> String {
        if self.nullable {
            format!("{}:{}?", self.name, self.value_type)
        } else {
            format!("{}:{}", self.name, self.value_type)
        }
    }
}

/// A complete type descriptor.
///
/// Equality is structural: name, kind, ordered fields, interface set and
/// the supertype's fingerprint.
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    fields: Vec<FieldDescriptor>,
    super_type: Option<Arc<TypeDescriptor>>,
    interfaces: Vec<String>,
    fingerprint: Fingerprint,
}

impl TypeDescriptor {
    /// Create a type descriptor.
    ///
    /// Field order is preserved. Duplicate field names fail with
    /// `DuplicateFieldName`; repeated interface names are collapsed.
    pub fn new(
        name: impl Into<String>,
        kind: TypeKind,
        fields: Vec<FieldDescriptor>,
        super_type: Option<Arc<TypeDescriptor>>,
        interfaces: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        check_unique_fields(&name, &fields)?;

        let mut unique_interfaces: Vec<String> = Vec::with_capacity(interfaces.len());
        for iface in interfaces {
            if !unique_interfaces.contains(&iface) {
                unique_interfaces.push(iface);
            }
        }

        let mut desc = Self {
            name,
            kind,
            fields,
            super_type,
            interfaces: unique_interfaces,
            fingerprint: Fingerprint::compute(&[]),
        };
        desc.fingerprint = Fingerprint::compute(&desc.signature());
        Ok(desc)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_enum(&self) -> bool {
        self.kind == TypeKind::Enum
    }

    /// Own fields, in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn super_type(&self) -> Option<&Arc<TypeDescriptor>> {
        self.super_type.as_ref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Get own field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Supertype fields first, then own fields.
    ///
    /// An own field named like an inherited one takes over the inherited
    /// position instead of being appended.
    pub fn fields_including_supertypes(&self) -> Vec<&FieldDescriptor> {
        let mut all: Vec<&FieldDescriptor> = match &self.super_type {
            Some(parent) => parent.fields_including_supertypes(),
            None => Vec::new(),
        };
        for field in &self.fields {
            match all.iter_mut().find(|f| f.name == field.name) {
                Some(slot) => *slot = field,
                None => all.push(field),
            }
        }
        all
    }

    /// Supertype chain, nearest first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            next: self.super_type.as_deref(),
        }
    }

    /// Structural fingerprint, fixed at construction.
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Canonical structural form, hashed into the fingerprint.
    ///
    /// Every name is length-prefixed. The supertype contributes only its
    /// fingerprint, so the cost does not grow with the depth of the chain.
    /// Interfaces are sorted.
    pub fn signature(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        put_str(&mut out, &self.name);
        out.push(self.kind.code());
        match &self.super_type {
            Some(parent) => {
                out.push(1);
                out.extend_from_slice(parent.fingerprint.to_string().as_bytes());
            }
            None => out.push(0),
        }

        let mut interfaces: Vec<&str> = self.interfaces.iter().map(String::as_str).collect();
        interfaces.sort_unstable();
        put_len(&mut out, interfaces.len());
        for iface in interfaces {
            put_str(&mut out, iface);
        }

        put_len(&mut out, self.fields.len());
        for field in &self.fields {
            put_str(&mut out, &field.name);
            put_value_type(&mut out, &field.value_type);
            out.push(u8::from(field.nullable));
        }
        out
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.fields == other.fields
            && self.super_type.as_ref().map(|s| s.fingerprint)
                == other.super_type.as_ref().map(|s| s.fingerprint)
            && self.interfaces.len() == other.interfaces.len()
            && self.interfaces.iter().all(|i| other.interfaces.contains(i))
    }
}

impl Eq for TypeDescriptor {}

fn put_len(out: &mut Vec<u8>, len: usize) {
    out.extend_from_slice(&(len as u64).to_le_bytes());
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    put_len(out, s.len());
    out.extend_from_slice(s.as_bytes());
}

fn put_value_type(out: &mut Vec<u8>, vt: &ValueType) {
    match vt {
        ValueType::Primitive(kind) => {
            out.push(0);
            out.push(kind.code());
        }
        ValueType::Reference(name) => {
            out.push(1);
            put_str(out, name);
        }
        ValueType::List(element) => {
            out.push(2);
            put_value_type(out, element);
        }
        ValueType::Any => out.push(3),
    }
}

/// Iterator over a descriptor's supertype chain.
pub struct Ancestors<'a> {
    next: Option<&'a TypeDescriptor>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a TypeDescriptor;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.super_type.as_deref();
        Some(current)
    }
}

pub(crate) fn check_unique_fields(type_name: &str, fields: &[FieldDescriptor]) -> Result<()> {
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(SerializationError::DuplicateFieldName {
                type_name: type_name.to_string(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}
