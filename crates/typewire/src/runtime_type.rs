// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime types: the usable form of a descriptor.
//!
//! A [`RuntimeType`] is what object instances point at. It is produced either
//! by registering a locally known descriptor with the
//! [`SerializerRegistry`](crate::registry::SerializerRegistry) or by the
//! [`Carpenter`](crate::carpenter::Carpenter) from a descriptor received over
//! the wire. Both paths share the layout rules below.

use crate::config::MAX_SLOTS;
use crate::error::{Result, SerializationError};
use crate::schema::{check_unique_fields, FieldDescriptor, Fingerprint, TypeDescriptor, TypeKind, ValueType};
use std::sync::Arc;

/// Where a runtime type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeOrigin {
    /// Registered by the local application.
    Local,
    /// Manufactured by the carpenter from an incoming descriptor.
    Synthesized,
}

/// Source of locally known types, consulted before synthesizing.
pub trait TypeLookup {
    /// Local type with the same name and fingerprint as `descriptor`.
    fn find_local(&self, descriptor: &TypeDescriptor) -> Option<Arc<RuntimeType>>;
}

/// Lookup that knows no local types.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocalTypes;

impl TypeLookup for NoLocalTypes {
    fn find_local(&self, _descriptor: &TypeDescriptor) -> Option<Arc<RuntimeType>> {
        None
    }
}

/// A type with a concrete slot layout.
#[derive(Debug)]
pub struct RuntimeType {
    descriptor: Arc<TypeDescriptor>,
    fingerprint: Fingerprint,
    origin: TypeOrigin,
    /// Storage slots: inherited first, then own, in schema order.
    slots: Vec<FieldDescriptor>,
    /// Every name this type can be assigned to, starting with its own.
    assignable: Vec<String>,
    /// Enum constants; index = ordinal.
    variants: Vec<String>,
}

impl RuntimeType {
    /// Lay out `descriptor`.
    ///
    /// Fails with `DuplicateFieldName` or `SynthesisFailure` when the
    /// descriptor cannot be represented.
    pub(crate) fn layout(
        descriptor: Arc<TypeDescriptor>,
        fingerprint: Fingerprint,
        origin: TypeOrigin,
    ) -> Result<Self> {
        let name = descriptor.name().to_string();
        check_unique_fields(&name, descriptor.fields())?;

        let mut assignable = vec![name.clone()];
        for ancestor in descriptor.ancestors() {
            if assignable.iter().any(|n| n == ancestor.name()) {
                return Err(SerializationError::SynthesisFailure(format!(
                    "cyclic supertype chain through {} in {}",
                    ancestor.name(),
                    name
                )));
            }
            assignable.push(ancestor.name().to_string());
        }

        match descriptor.kind() {
            TypeKind::Enum => {
                if descriptor.super_type().is_some() || !descriptor.interfaces().is_empty() {
                    return Err(SerializationError::SynthesisFailure(format!(
                        "enum {} cannot declare a supertype or interfaces",
                        name
                    )));
                }
                if descriptor.fields().len() > MAX_SLOTS {
                    return Err(SerializationError::SynthesisFailure(format!(
                        "enum {} has {} constants (max {})",
                        name,
                        descriptor.fields().len(),
                        MAX_SLOTS
                    )));
                }
                let variants = descriptor
                    .fields()
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect();
                return Ok(Self {
                    descriptor,
                    fingerprint,
                    origin,
                    slots: Vec::new(),
                    assignable,
                    variants,
                });
            }
            kind => {
                if let Some(parent) = descriptor.super_type() {
                    if parent.kind() != kind {
                        return Err(SerializationError::SynthesisFailure(format!(
                            "{} {} cannot extend {} {}",
                            kind.name(),
                            name,
                            parent.kind().name(),
                            parent.name()
                        )));
                    }
                }
            }
        }

        if let Some(parent) = descriptor.super_type() {
            let inherited = parent.fields_including_supertypes();
            for own in descriptor.fields() {
                if let Some(base) = inherited.iter().find(|f| f.name() == own.name()) {
                    if base.value_type() != own.value_type() || base.is_nullable() != own.is_nullable() {
                        return Err(SerializationError::SynthesisFailure(format!(
                            "field {}.{} ({}) conflicts with inherited layout ({})",
                            name,
                            own.name(),
                            own.signature(),
                            base.signature()
                        )));
                    }
                }
            }
        }

        let slots: Vec<FieldDescriptor> = descriptor
            .fields_including_supertypes()
            .into_iter()
            .cloned()
            .collect();
        if slots.len() > MAX_SLOTS {
            return Err(SerializationError::SynthesisFailure(format!(
                "{} needs {} slots (max {})",
                name,
                slots.len(),
                MAX_SLOTS
            )));
        }

        let mut push_interfaces = |desc: &TypeDescriptor| {
            for iface in desc.interfaces() {
                if !assignable.contains(iface) {
                    assignable.push(iface.clone());
                }
            }
        };
        push_interfaces(&descriptor);
        for ancestor in descriptor.ancestors() {
            push_interfaces(ancestor);
        }

        Ok(Self {
            descriptor,
            fingerprint,
            origin,
            slots,
            assignable,
            variants: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn kind(&self) -> TypeKind {
        self.descriptor.kind()
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn origin(&self) -> TypeOrigin {
        self.origin
    }

    /// Storage slots, inherited first.
    pub fn slots(&self) -> &[FieldDescriptor] {
        &self.slots
    }

    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name() == name)
    }

    /// Only composite types have instances.
    pub fn is_instantiable(&self) -> bool {
        self.kind() == TypeKind::Composite
    }

    /// Whether a value of this type may be stored where `type_name` is declared.
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.assignable.iter().any(|n| n == type_name)
    }

    /// Whether a value of this type may be stored in a slot of `declared` type.
    pub fn accepts(&self, declared: &ValueType) -> bool {
        match declared {
            ValueType::Any => true,
            ValueType::Reference(name) => self.is_assignable_to(name),
            ValueType::Primitive(_) | ValueType::List(_) => false,
        }
    }

    /// Enum constants in ordinal order.
    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Constant name for `ordinal`.
    pub fn variant(&self, ordinal: u32) -> Option<&str> {
        self.variants.get(ordinal as usize).map(String::as_str)
    }

    /// Ordinal of the constant called `name`.
    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.variants.iter().position(|v| v == name).map(|i| i as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveKind, TypeDescriptorBuilder};

    fn lay_out(desc: TypeDescriptor) -> Result<RuntimeType> {
        let desc = Arc::new(desc);
        let fp = desc.fingerprint();
        RuntimeType::layout(desc, fp, TypeOrigin::Synthesized)
    }

    #[test]
    fn test_slots_inherited_first() {
        let base = Arc::new(
            TypeDescriptorBuilder::composite("demo.Base")
                .field("id", PrimitiveKind::U64)
                .build()
                .unwrap(),
        );
        let ty = lay_out(
            TypeDescriptorBuilder::composite("demo.Child")
                .super_type(base)
                .field("value", PrimitiveKind::F64)
                .interface_name("demo.Marker")
                .build()
                .unwrap(),
        )
        .unwrap();

        let names: Vec<&str> = ty.slots().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["id", "value"]);
        assert!(ty.is_assignable_to("demo.Child"));
        assert!(ty.is_assignable_to("demo.Base"));
        assert!(ty.is_assignable_to("demo.Marker"));
        assert!(!ty.is_assignable_to("demo.Other"));
    }

    #[test]
    fn test_enum_with_supertype_rejected() {
        let base = Arc::new(TypeDescriptorBuilder::composite("demo.Base").build().unwrap());
        let err = lay_out(
            TypeDescriptorBuilder::enumeration("demo.E")
                .super_type(base)
                .constant("A")
                .build()
                .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, SerializationError::SynthesisFailure(_)));
    }

    #[test]
    fn test_conflicting_shadow_rejected() {
        let base = Arc::new(
            TypeDescriptorBuilder::composite("demo.Base")
                .field("id", PrimitiveKind::U64)
                .build()
                .unwrap(),
        );
        let err = lay_out(
            TypeDescriptorBuilder::composite("demo.Child")
                .super_type(base)
                .nullable_field("id", PrimitiveKind::String)
                .build()
                .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, SerializationError::SynthesisFailure(_)));
    }

    #[test]
    fn test_composite_cannot_extend_interface() {
        let iface = Arc::new(TypeDescriptorBuilder::interface("demo.I").build().unwrap());
        let err = lay_out(
            TypeDescriptorBuilder::composite("demo.C")
                .super_type(iface)
                .build()
                .unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, SerializationError::SynthesisFailure(_)));
    }

    #[test]
    fn test_enum_ordinals() {
        let ty = lay_out(
            TypeDescriptorBuilder::enumeration("demo.Side")
                .constant("left")
                .constant("right")
                .build()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(ty.ordinal_of("left"), Some(0));
        assert_eq!(ty.ordinal_of("right"), Some(1));
        assert_eq!(ty.variant(1), Some("right"));
        assert_eq!(ty.variant(2), None);
        assert!(!ty.is_instantiable());
    }
}
