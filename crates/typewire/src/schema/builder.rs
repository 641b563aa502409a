// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use crate::error::{Result, SerializationError};
use crate::schema::{FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind, ValueType};
use std::sync::Arc;

/// Builder for creating TypeDescriptor instances.
///
/// Field-level errors (a nullable primitive) are recorded when the field is
/// added and reported by [`build`](Self::build); the first one wins.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    kind: TypeKind,
    fields: Vec<FieldDescriptor>,
    super_type: Option<Arc<TypeDescriptor>>,
    interfaces: Vec<String>,
    error: Option<SerializationError>,
}

impl TypeDescriptorBuilder {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            super_type: None,
            interfaces: Vec::new(),
            error: None,
        }
    }

    /// Start a concrete type.
    pub fn composite(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Composite)
    }

    /// Start an interface type.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Interface)
    }

    /// Start an enum type; add constants with [`constant`](Self::constant).
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Enum)
    }

    /// Add a mandatory primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.push(FieldDescriptor::new(name, ValueType::Primitive(kind), false))
    }

    /// Add a nullable primitive field (only `String`/`Bytes` accept this).
    pub fn nullable_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.push(FieldDescriptor::new(name, ValueType::Primitive(kind), true))
    }

    /// Add a reference to another described type.
    pub fn reference(self, name: impl Into<String>, type_name: impl Into<String>, nullable: bool) -> Self {
        self.push(FieldDescriptor::new(
            name,
            ValueType::reference(type_name),
            nullable,
        ))
    }

    /// Add a list field.
    pub fn list(self, name: impl Into<String>, element: ValueType, nullable: bool) -> Self {
        self.push(FieldDescriptor::new(name, ValueType::list(element), nullable))
    }

    /// Add a field accepting any value.
    pub fn any(self, name: impl Into<String>, nullable: bool) -> Self {
        self.push(FieldDescriptor::new(name, ValueType::Any, nullable))
    }

    /// Add an enum constant. Ordinals follow insertion order.
    pub fn constant(self, name: impl Into<String>) -> Self {
        let value_type = ValueType::reference(self.name.clone());
        self.push(FieldDescriptor::new(name, value_type, false))
    }

    /// Set the supertype.
    pub fn super_type(mut self, parent: Arc<TypeDescriptor>) -> Self {
        self.super_type = Some(parent);
        self
    }

    /// Declare an implemented interface by name.
    pub fn interface_name(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> Result<TypeDescriptor> {
        if let Some(err) = self.error {
            return Err(err);
        }
        TypeDescriptor::new(
            self.name,
            self.kind,
            self.fields,
            self.super_type,
            self.interfaces,
        )
    }

    fn push(mut self, field: Result<FieldDescriptor>) -> Self {
        match field {
            Ok(field) => self.fields.push(field),
            Err(err) => {
                if self.error.is_none() {
                    self.error = Some(err);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_builder() {
        let desc = TypeDescriptorBuilder::composite("demo.Point3D")
            .field("x", PrimitiveKind::F64)
            .field("y", PrimitiveKind::F64)
            .field("z", PrimitiveKind::F64)
            .build()
            .expect("build");

        assert_eq!(desc.name(), "demo.Point3D");
        assert_eq!(desc.kind(), TypeKind::Composite);
        assert_eq!(desc.fields().len(), 3);
    }

    #[test]
    fn test_nullable_primitive_surfaces_at_build() {
        let err = TypeDescriptorBuilder::composite("demo.Bad")
            .field("ok", PrimitiveKind::U8)
            .nullable_field("count", PrimitiveKind::U32)
            .build()
            .expect_err("nullable u32");
        assert!(matches!(err, SerializationError::NullabilityViolation { .. }));
    }

    #[test]
    fn test_enum_builder_constants_in_order() {
        let desc = TypeDescriptorBuilder::enumeration("demo.Side")
            .constant("left")
            .constant("right")
            .build()
            .expect("build");

        assert!(desc.is_enum());
        let names: Vec<&str> = desc.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["left", "right"]);
    }

    #[test]
    fn test_duplicate_constant_rejected() {
        let err = TypeDescriptorBuilder::enumeration("demo.Side")
            .constant("left")
            .constant("left")
            .build()
            .expect_err("duplicate");
        assert!(matches!(err, SerializationError::DuplicateFieldName { .. }));
    }

    #[test]
    fn test_nested_and_inherited() {
        let party = Arc::new(
            TypeDescriptorBuilder::composite("demo.Party")
                .nullable_field("name", PrimitiveKind::String)
                .build()
                .unwrap(),
        );

        let trade = TypeDescriptorBuilder::composite("demo.Trade")
            .super_type(party)
            .reference("buyer", "demo.Party", false)
            .list("legs", ValueType::Primitive(PrimitiveKind::I64), true)
            .interface_name("demo.Auditable")
            .build()
            .unwrap();

        assert_eq!(trade.fields_including_supertypes().len(), 3);
        assert_eq!(trade.interfaces(), &["demo.Auditable".to_string()]);
    }
}
