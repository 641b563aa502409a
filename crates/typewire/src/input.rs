// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Decoding context for one deserialize call.
//!
//! First every schema entry is resolved to a runtime type: a local type
//! when one with the same name and fingerprint is registered, a synthesized
//! one otherwise. Then the payload is read into a fresh [`ObjectGraph`],
//! assigning ids in the same order the encoder did.

use crate::carpenter::Carpenter;
use crate::config::SerializationConfig;
use crate::error::{Result, SerializationError};
use crate::graph::{ObjectGraph, ObjectRef, Value};
use crate::registry::SerializerRegistry;
use crate::runtime_type::RuntimeType;
use crate::schema::{TypeDescriptor, TypeKind, ValueType};
use crate::wire::{
    Envelope, TypeNotation, WireReader, TAG_BACKREF, TAG_BOOL, TAG_BYTES, TAG_CHAR, TAG_ENUM,
    TAG_F32, TAG_F64, TAG_I16, TAG_I32, TAG_I64, TAG_I8, TAG_INLINE_OBJECT, TAG_LIST, TAG_NULL,
    TAG_OBJECT, TAG_STRING, TAG_U16, TAG_U32, TAG_U64, TAG_U8,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a decode: the rebuilt graph and its root value.
#[derive(Debug, Clone)]
pub struct DeserializedGraph {
    pub graph: ObjectGraph,
    pub root: Value,
}

/// Per-call decoder state. Consumed by
/// [`deserialize`](Self::deserialize).
pub struct DeserializationInput<'a> {
    registry: &'a SerializerRegistry,
    carpenter: &'a Carpenter,
    config: &'a SerializationConfig,
    envelope: &'a Envelope,
    reader: WireReader<'a>,
    /// Schema index -> resolved type.
    types: Vec<Arc<RuntimeType>>,
    graph: ObjectGraph,
    /// Object id -> handle in `graph`.
    references: Vec<ObjectRef>,
}

impl<'a> DeserializationInput<'a> {
    pub fn new(
        registry: &'a SerializerRegistry,
        carpenter: &'a Carpenter,
        config: &'a SerializationConfig,
        envelope: &'a Envelope,
    ) -> Self {
        Self {
            registry,
            carpenter,
            config,
            envelope,
            reader: WireReader::new(envelope.payload()),
            types: Vec::new(),
            graph: ObjectGraph::new(),
            references: Vec::new(),
        }
    }

    /// Decode the envelope and check the root against `expected`.
    pub fn deserialize(mut self, expected: &ValueType) -> Result<DeserializedGraph> {
        let mut resolver = SchemaResolver::new(
            self.envelope.schema(),
            self.registry,
            self.carpenter,
            self.config.max_depth(),
        );
        self.types = resolver.resolve_all()?;

        let root = self.read_value(&ValueType::Any, 0)?;
        if !self.reader.is_exhausted() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "{} trailing payload bytes",
                self.reader.remaining()
            )));
        }
        self.check_root(&root, expected)?;

        log::debug!(
            "[input] {} objects, {} types, root {}",
            self.graph.len(),
            self.types.len(),
            self.graph.describe(&root)
        );
        Ok(DeserializedGraph {
            graph: self.graph,
            root,
        })
    }

    pub(crate) fn reader(&mut self) -> &mut WireReader<'a> {
        &mut self.reader
    }

    pub(crate) fn graph_mut(&mut self) -> &mut ObjectGraph {
        &mut self.graph
    }

    /// Read one tagged value where `declared` is expected.
    pub(crate) fn read_value(&mut self, declared: &ValueType, depth: usize) -> Result<Value> {
        if depth > self.config.max_depth() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "payload nests deeper than {}",
                self.config.max_depth()
            )));
        }

        let tag = self.reader.read_u8()?;
        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_BOOL => match self.reader.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(SerializationError::InvalidEnvelope(format!(
                        "invalid bool byte {:#04x}",
                        other
                    )))
                }
            },
            TAG_U8 => Value::U8(self.reader.read_u8()?),
            TAG_I8 => Value::I8(self.reader.read_i8()?),
            TAG_U16 => Value::U16(self.reader.read_u16_le()?),
            TAG_I16 => Value::I16(self.reader.read_i16_le()?),
            TAG_U32 => Value::U32(self.reader.read_u32_le()?),
            TAG_I32 => Value::I32(self.reader.read_i32_le()?),
            TAG_U64 => Value::U64(self.reader.read_u64_le()?),
            TAG_I64 => Value::I64(self.reader.read_i64_le()?),
            TAG_F32 => Value::F32(self.reader.read_f32_le()?),
            TAG_F64 => Value::F64(self.reader.read_f64_le()?),
            TAG_CHAR => {
                let scalar = self.reader.read_u32_le()?;
                let c = char::from_u32(scalar).ok_or_else(|| {
                    SerializationError::InvalidEnvelope(format!("invalid char {:#x}", scalar))
                })?;
                Value::Char(c)
            }
            TAG_STRING => Value::String(self.reader.read_string()?),
            TAG_BYTES => Value::Bytes(self.reader.read_blob()?.to_vec()),
            TAG_LIST => self.read_list(declared, depth)?,
            TAG_ENUM => {
                let ty = self.read_type(declared)?;
                if ty.kind() != TypeKind::Enum {
                    return Err(SerializationError::InvalidEnvelope(format!(
                        "enum constant tagged with {} type {}",
                        ty.kind().name(),
                        ty.name()
                    )));
                }
                let serializer = self.registry.get(&ty, &ValueType::Any)?;
                serializer.read_object(self, depth)?
            }
            TAG_OBJECT | TAG_INLINE_OBJECT => {
                let ty = self.read_type(declared)?;
                if !ty.is_instantiable() {
                    return Err(SerializationError::InvalidEnvelope(format!(
                        "object tagged with {} type {}",
                        ty.kind().name(),
                        ty.name()
                    )));
                }
                let serializer = self.registry.get(&ty, &ValueType::Any)?;
                let value = serializer.read_object(self, depth)?;
                if tag == TAG_OBJECT {
                    if let Value::Object(r) = value {
                        self.references.push(r);
                    }
                }
                value
            }
            TAG_BACKREF => {
                let id = self.reader.read_u32_le()?;
                let r = *self.references.get(id as usize).ok_or(
                    SerializationError::ReferenceIntegrityViolation {
                        id,
                        known: self.references.len(),
                    },
                )?;
                Value::Object(r)
            }
            other => {
                return Err(SerializationError::InvalidEnvelope(format!(
                    "unknown tag {:#04x} at payload offset {}",
                    other,
                    self.reader.offset() - 1
                )))
            }
        };
        Ok(value)
    }

    fn read_list(&mut self, declared: &ValueType, depth: usize) -> Result<Value> {
        let element = match declared {
            ValueType::List(element) => element.as_ref().clone(),
            ValueType::Any => ValueType::Any,
            other => {
                return Err(SerializationError::SchemaMismatch {
                    expected: other.to_string(),
                    found: "list".into(),
                })
            }
        };
        let count = self.reader.read_len(1)?;
        if count > self.config.max_collection_len() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "list of {} elements exceeds limit {}",
                count,
                self.config.max_collection_len()
            )));
        }
        let mut items = Vec::with_capacity(count);
        for _ in 0..count {
            items.push(self.read_value(&element, depth + 1)?);
        }
        Ok(Value::List(items))
    }

    /// Read a schema index and check the type fits `declared`.
    fn read_type(&mut self, declared: &ValueType) -> Result<Arc<RuntimeType>> {
        let index = self.reader.read_u32_le()?;
        let ty = self.types.get(index as usize).cloned().ok_or_else(|| {
            SerializationError::InvalidEnvelope(format!(
                "type index {} outside schema of {} entries",
                index,
                self.types.len()
            ))
        })?;
        if !ty.accepts(declared) {
            return Err(SerializationError::SchemaMismatch {
                expected: declared.to_string(),
                found: ty.name().to_string(),
            });
        }
        Ok(ty)
    }

    fn check_root(&self, root: &Value, expected: &ValueType) -> Result<()> {
        if let ValueType::Reference(name) = expected {
            let found = match root {
                Value::Object(r) => self.graph.get(*r).map(|i| i.runtime_type().clone()),
                Value::Enum(e) => Some(e.runtime_type().clone()),
                _ => None,
            };
            if let (Some(found), Some(local)) = (found, self.registry.lookup(name)) {
                if found.name() == name.as_str() && found.fingerprint() != local.fingerprint() {
                    return Err(SerializationError::SchemaMismatch {
                        expected: format!("{} ({})", name, local.fingerprint()),
                        found: format!("{} ({})", found.name(), found.fingerprint()),
                    });
                }
            }
        }
        if root.is_null() {
            return Err(SerializationError::SchemaMismatch {
                expected: expected.to_string(),
                found: "null".into(),
            });
        }
        self.graph.check_value(expected, root)
    }
}

/// Resolves schema entries in dependency order (supertypes first).
///
/// Works off an explicit stack; a dependency chain longer than `max_chain`
/// fails with `SynthesisFailure`.
struct SchemaResolver<'s> {
    schema: &'s [TypeNotation],
    registry: &'s SerializerRegistry,
    carpenter: &'s Carpenter,
    max_chain: usize,
    by_name: HashMap<&'s str, usize>,
    resolved: Vec<Option<Arc<RuntimeType>>>,
    on_stack: Vec<bool>,
}

impl<'s> SchemaResolver<'s> {
    fn new(
        schema: &'s [TypeNotation],
        registry: &'s SerializerRegistry,
        carpenter: &'s Carpenter,
        max_chain: usize,
    ) -> Self {
        Self {
            schema,
            registry,
            carpenter,
            max_chain,
            by_name: schema
                .iter()
                .enumerate()
                .map(|(i, n)| (n.name.as_str(), i))
                .collect(),
            resolved: vec![None; schema.len()],
            on_stack: vec![false; schema.len()],
        }
    }

    fn resolve_all(&mut self) -> Result<Vec<Arc<RuntimeType>>> {
        (0..self.schema.len()).map(|i| self.resolve(i)).collect()
    }

    fn resolve(&mut self, index: usize) -> Result<Arc<RuntimeType>> {
        if let Some(done) = &self.resolved[index] {
            return Ok(done.clone());
        }
        let mut stack = vec![index];
        self.on_stack[index] = true;
        while let Some(&current) = stack.last() {
            if let Some(dep) = self.pending_dependency(current) {
                if self.on_stack[dep] {
                    return Err(SerializationError::SynthesisFailure(format!(
                        "cyclic type dependency through {}",
                        self.schema[dep].name
                    )));
                }
                if stack.len() >= self.max_chain {
                    return Err(SerializationError::SynthesisFailure(format!(
                        "type dependencies of {} nest deeper than {}",
                        self.schema[index].name, self.max_chain
                    )));
                }
                self.on_stack[dep] = true;
                stack.push(dep);
                continue;
            }
            let ty = self.build(current)?;
            self.on_stack[current] = false;
            self.resolved[current] = Some(ty);
            stack.pop();
        }
        self.resolved[index].clone().ok_or_else(|| {
            SerializationError::SynthesisFailure(format!("{} left unresolved", self.schema[index].name))
        })
    }

    /// First supertype or interface of `index` in this schema that is not
    /// resolved yet.
    fn pending_dependency(&self, index: usize) -> Option<usize> {
        let notation = &self.schema[index];
        notation
            .super_type
            .iter()
            .chain(&notation.interfaces)
            .filter_map(|name| self.by_name.get(name.as_str()).copied())
            .find(|&i| self.resolved[i].is_none())
    }

    /// Lay out `index` once every dependency is resolved.
    fn build(&self, index: usize) -> Result<Arc<RuntimeType>> {
        let notation = &self.schema[index];
        let super_type = match &notation.super_type {
            None => None,
            Some(parent) => Some(self.super_descriptor(parent, &notation.name)?),
        };
        let descriptor = Arc::new(TypeDescriptor::new(
            notation.name.clone(),
            notation.kind,
            notation.fields.clone(),
            super_type,
            notation.interfaces.clone(),
        )?);
        match self.registry.find_local(&descriptor) {
            Some(local) => {
                log::trace!("[input] {} resolved to local type", descriptor.name());
                Ok(local)
            }
            None => self.carpenter.synthesize_with(&descriptor, self.registry),
        }
    }

    /// Descriptor of a supertype, from this schema or the local registry.
    fn super_descriptor(&self, name: &str, child: &str) -> Result<Arc<TypeDescriptor>> {
        let from_schema = self
            .by_name
            .get(name)
            .and_then(|&i| self.resolved[i].as_ref())
            .map(|t| t.descriptor().clone());
        from_schema
            .or_else(|| self.registry.lookup(name).map(|t| t.descriptor().clone()))
            .ok_or_else(|| {
                SerializationError::SynthesisFailure(format!(
                    "supertype {} of {} is neither in the schema nor registered",
                    name, child
                ))
            })
    }
}
