// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer registry.
//!
//! Holds the locally known types and hands out one serializer per
//! (runtime type, declared type) pair. Serializers are created on first use
//! and cached; concurrent callers asking for the same pair observe the same
//! instance.
//!
//! # Example
//!
//! ```
//! use typewire::registry::SerializerRegistry;
//! use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder, ValueType};
//!
//! let registry = SerializerRegistry::new();
//! let point = registry
//!     .register(
//!         TypeDescriptorBuilder::composite("demo.Point")
//!             .field("x", PrimitiveKind::I32)
//!             .field("y", PrimitiveKind::I32)
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let a = registry.get(&point, &ValueType::Any).unwrap();
//! let b = registry.get(&point, &ValueType::Any).unwrap();
//! assert!(std::sync::Arc::ptr_eq(&a, &b));
//! ```

use crate::error::{Result, SerializationError};
use crate::graph::{EnumValue, Value};
use crate::input::DeserializationInput;
use crate::output::SerializationOutput;
use crate::runtime_type::{RuntimeType, TypeLookup, TypeOrigin};
use crate::schema::{Fingerprint, TypeDescriptor, TypeKind, ValueType};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Encodes and decodes the body of one runtime type.
///
/// The tag byte and the object-history decision belong to
/// [`SerializationOutput`]; on decode the tag and type index have already
/// been consumed by [`DeserializationInput`] when `read_object` runs.
pub trait Serializer: Send + Sync + fmt::Debug {
    fn runtime_type(&self) -> &Arc<RuntimeType>;

    /// Descriptors to add to the envelope schema: the type itself, then its
    /// supertype chain.
    fn type_notations(&self) -> Vec<Arc<TypeDescriptor>> {
        let own = self.runtime_type().descriptor().clone();
        let mut out = vec![own.clone()];
        let mut next = own.super_type().cloned();
        while let Some(parent) = next {
            next = parent.super_type().cloned();
            out.push(parent);
        }
        out
    }

    /// Write `value` after its tag: type index, then the body.
    fn write_object(
        &self,
        value: &Value,
        output: &mut SerializationOutput<'_>,
        depth: usize,
    ) -> Result<()>;

    /// Read the body that follows the type index.
    fn read_object(&self, input: &mut DeserializationInput<'_>, depth: usize) -> Result<Value>;
}

/// Field-by-field serializer for composite types.
#[derive(Debug)]
pub struct CompositeSerializer {
    ty: Arc<RuntimeType>,
}

impl CompositeSerializer {
    pub fn new(ty: Arc<RuntimeType>) -> Self {
        Self { ty }
    }
}

impl Serializer for CompositeSerializer {
    fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    fn write_object(
        &self,
        value: &Value,
        output: &mut SerializationOutput<'_>,
        depth: usize,
    ) -> Result<()> {
        let Value::Object(r) = value else {
            return Err(SerializationError::NotSerializable(format!(
                "{} serializer given a non-object value",
                self.ty.name()
            )));
        };
        let graph = output.graph();
        let instance = graph.get(*r).ok_or_else(|| {
            SerializationError::NotSerializable(format!("dangling object {:?}", r))
        })?;

        let index = output.type_index(&self.ty)?;
        output.writer().write_u32_le(index);
        output.writer().write_len(self.ty.slots().len())?;
        for (slot, field) in self.ty.slots().iter().zip(instance.fields()) {
            output.write_value(field, slot.value_type(), depth + 1)?;
        }
        Ok(())
    }

    fn read_object(&self, input: &mut DeserializationInput<'_>, depth: usize) -> Result<Value> {
        let count = input.reader().read_u32_le()? as usize;
        if count != self.ty.slots().len() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "{} has {} slots, payload carries {}",
                self.ty.name(),
                self.ty.slots().len(),
                count
            )));
        }
        let mut values = Vec::with_capacity(count);
        for slot in self.ty.slots() {
            values.push(input.read_value(slot.value_type(), depth + 1)?);
        }
        let r = input.graph_mut().instantiate(&self.ty, values)?;
        Ok(Value::Object(r))
    }
}

/// Ordinal serializer for enum types.
#[derive(Debug)]
pub struct EnumSerializer {
    ty: Arc<RuntimeType>,
}

impl EnumSerializer {
    pub fn new(ty: Arc<RuntimeType>) -> Self {
        Self { ty }
    }
}

impl Serializer for EnumSerializer {
    fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    fn write_object(
        &self,
        value: &Value,
        output: &mut SerializationOutput<'_>,
        _depth: usize,
    ) -> Result<()> {
        let Value::Enum(constant) = value else {
            return Err(SerializationError::NotSerializable(format!(
                "{} serializer given a non-enum value",
                self.ty.name()
            )));
        };
        let index = output.type_index(&self.ty)?;
        output.writer().write_u32_le(index);
        output.writer().write_u32_le(constant.ordinal());
        Ok(())
    }

    fn read_object(&self, input: &mut DeserializationInput<'_>, _depth: usize) -> Result<Value> {
        let ordinal = input.reader().read_u32_le()?;
        let constant = EnumValue::new(&self.ty, ordinal).map_err(|_| {
            SerializationError::InvalidEnvelope(format!(
                "ordinal {} out of range for {} ({} constants)",
                ordinal,
                self.ty.name(),
                self.ty.variants().len()
            ))
        })?;
        Ok(Value::Enum(constant))
    }
}

/// A local type and a synthesized one can share a fingerprint; the origin
/// keeps their serializers apart.
type SerializerKey = (TypeOrigin, Fingerprint, ValueType);

/// Registry of local types and cached serializers.
#[derive(Debug, Default)]
pub struct SerializerRegistry {
    local_types: DashMap<String, Arc<RuntimeType>>,
    serializers: DashMap<SerializerKey, Arc<dyn Serializer>>,
}

static GLOBAL_REGISTRY: OnceLock<Arc<SerializerRegistry>> = OnceLock::new();

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry.
    pub fn global() -> Arc<SerializerRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(SerializerRegistry::new()))
            .clone()
    }

    /// Register a locally known type (and its supertypes).
    ///
    /// Registering the same descriptor again returns the existing runtime
    /// type. A different descriptor under an already registered name fails
    /// with `NotSerializable`.
    pub fn register(&self, descriptor: TypeDescriptor) -> Result<Arc<RuntimeType>> {
        self.register_arc(Arc::new(descriptor))
    }

    /// [`register`](Self::register) for a shared descriptor.
    pub fn register_arc(&self, descriptor: Arc<TypeDescriptor>) -> Result<Arc<RuntimeType>> {
        if let Some(parent) = descriptor.super_type() {
            self.register_arc(parent.clone())?;
        }

        let fingerprint = descriptor.fingerprint();
        match self.local_types.entry(descriptor.name().to_string()) {
            Entry::Occupied(existing) => {
                if existing.get().fingerprint() == fingerprint {
                    Ok(existing.get().clone())
                } else {
                    log::warn!(
                        "[registry] conflicting registration for {} rejected",
                        descriptor.name()
                    );
                    Err(SerializationError::NotSerializable(format!(
                        "type {} already registered with fingerprint {} (new: {})",
                        descriptor.name(),
                        existing.get().fingerprint(),
                        fingerprint
                    )))
                }
            }
            Entry::Vacant(slot) => {
                let ty = Arc::new(RuntimeType::layout(
                    descriptor,
                    fingerprint,
                    TypeOrigin::Local,
                )?);
                log::debug!(
                    "[registry] registered {} {} ({})",
                    ty.kind().name(),
                    ty.name(),
                    fingerprint
                );
                slot.insert(ty.clone());
                Ok(ty)
            }
        }
    }

    /// Local type registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<RuntimeType>> {
        self.local_types.get(name).map(|t| t.clone())
    }

    /// Local type with the same name and fingerprint as `descriptor`.
    pub fn find_local(&self, descriptor: &TypeDescriptor) -> Option<Arc<RuntimeType>> {
        self.lookup(descriptor.name())
            .filter(|t| t.fingerprint() == descriptor.fingerprint())
    }

    pub fn local_type_count(&self) -> usize {
        self.local_types.len()
    }

    pub fn serializer_count(&self) -> usize {
        self.serializers.len()
    }

    /// Serializer for values of `runtime` stored where `declared` is expected.
    ///
    /// The returned serializer is always bound to `runtime` itself. Fails
    /// with `NotSerializable` when the runtime type has no instances
    /// (interfaces) or does not fit the declared type.
    pub fn get(&self, runtime: &Arc<RuntimeType>, declared: &ValueType) -> Result<Arc<dyn Serializer>> {
        let key = (runtime.origin(), runtime.fingerprint(), declared.clone());
        if let Some(found) = self.serializers.get(&key) {
            if Arc::ptr_eq(found.runtime_type(), runtime) {
                return Ok(found.clone());
            }
        }

        if !runtime.accepts(declared) {
            return Err(SerializationError::NotSerializable(format!(
                "{} cannot be written where {} is declared",
                runtime.name(),
                declared
            )));
        }
        let serializer: Arc<dyn Serializer> = match runtime.kind() {
            TypeKind::Composite => Arc::new(CompositeSerializer::new(runtime.clone())),
            TypeKind::Enum => Arc::new(EnumSerializer::new(runtime.clone())),
            TypeKind::Interface => {
                return Err(SerializationError::NotSerializable(format!(
                    "interface {} has no instances",
                    runtime.name()
                )))
            }
        };
        log::trace!("[registry] new serializer for {} as {}", runtime.name(), declared);
        match self.serializers.entry(key) {
            Entry::Occupied(mut slot) => {
                if !Arc::ptr_eq(slot.get().runtime_type(), runtime) {
                    slot.insert(serializer);
                }
                Ok(slot.get().clone())
            }
            Entry::Vacant(slot) => Ok(slot.insert(serializer).clone()),
        }
    }
}

impl TypeLookup for SerializerRegistry {
    fn find_local(&self, descriptor: &TypeDescriptor) -> Option<Arc<RuntimeType>> {
        SerializerRegistry::find_local(self, descriptor)
    }
}
