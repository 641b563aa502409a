// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding context for one serialize call.
//!
//! Walks the object graph from the root, writes every value with its tag,
//! and collects the schema of every type it touched. Each non-inline object
//! gets the next id *after* its content is written; a second visit writes a
//! back-reference to that id instead.

use crate::config::SerializationConfig;
use crate::error::{Result, SerializationError};
use crate::graph::{ObjectGraph, ObjectRef, Value};
use crate::registry::{Serializer, SerializerRegistry};
use crate::runtime_type::RuntimeType;
use crate::schema::{Fingerprint, TypeDescriptor, ValueType};
use crate::wire::{
    Envelope, TypeNotation, WireWriter, TAG_BACKREF, TAG_BOOL, TAG_BYTES, TAG_CHAR, TAG_ENUM,
    TAG_F32, TAG_F64, TAG_I16, TAG_I32, TAG_I64, TAG_I8, TAG_INLINE_OBJECT, TAG_LIST, TAG_NULL,
    TAG_OBJECT, TAG_STRING, TAG_U16, TAG_U32, TAG_U64, TAG_U8,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Per-call encoder state. Consumed by [`serialize`](Self::serialize), so
/// nothing carries over into the next call.
pub struct SerializationOutput<'a> {
    registry: &'a SerializerRegistry,
    config: &'a SerializationConfig,
    graph: &'a ObjectGraph,
    writer: WireWriter,
    /// Object -> assigned id.
    object_history: HashMap<ObjectRef, u32>,
    /// Objects whose content is being written right now.
    in_progress: HashSet<ObjectRef>,
    /// Runtime types whose schema has been emitted.
    serializer_history: HashSet<Fingerprint>,
    schema: Vec<Arc<TypeDescriptor>>,
    schema_index: HashMap<String, u32>,
}

impl<'a> SerializationOutput<'a> {
    pub fn new(
        registry: &'a SerializerRegistry,
        config: &'a SerializationConfig,
        graph: &'a ObjectGraph,
    ) -> Self {
        Self {
            registry,
            config,
            graph,
            writer: WireWriter::new(),
            object_history: HashMap::new(),
            in_progress: HashSet::new(),
            serializer_history: HashSet::new(),
            schema: Vec::new(),
            schema_index: HashMap::new(),
        }
    }

    /// Encode the graph reachable from `root`.
    pub fn serialize(mut self, root: &Value) -> Result<Envelope> {
        if root.is_null() {
            return Err(SerializationError::NotSerializable(
                "root value is null".into(),
            ));
        }
        self.write_value(root, &ValueType::Any, 0)?;

        let schema: Vec<TypeNotation> = self
            .schema
            .iter()
            .map(|d| TypeNotation::from(d.as_ref()))
            .collect();
        let payload = self.writer.into_bytes();
        log::debug!(
            "[output] {} objects, {} types, {} payload bytes",
            self.object_history.len(),
            schema.len(),
            payload.len()
        );
        Ok(Envelope::new(payload, schema))
    }

    pub(crate) fn graph(&self) -> &'a ObjectGraph {
        self.graph
    }

    pub(crate) fn writer(&mut self) -> &mut WireWriter {
        &mut self.writer
    }

    /// Schema index of `ty`; its class info must already be written.
    pub(crate) fn type_index(&self, ty: &RuntimeType) -> Result<u32> {
        self.schema_index.get(ty.name()).copied().ok_or_else(|| {
            SerializationError::NotSerializable(format!("{} missing from schema", ty.name()))
        })
    }

    /// Write one value where `declared` is expected.
    pub(crate) fn write_value(&mut self, value: &Value, declared: &ValueType, depth: usize) -> Result<()> {
        if depth > self.config.max_depth() {
            return Err(SerializationError::NotSerializable(format!(
                "graph nests deeper than {}",
                self.config.max_depth()
            )));
        }

        match value {
            Value::Null => {
                if !declared.can_be_null() {
                    return Err(SerializationError::NullabilityViolation {
                        type_name: declared.to_string(),
                        field: "<element>".into(),
                    });
                }
                self.writer.write_u8(TAG_NULL);
                Ok(())
            }
            Value::List(items) => {
                let element = match declared {
                    ValueType::List(element) => element.as_ref().clone(),
                    ValueType::Any => ValueType::Any,
                    other => return Err(self.mismatch(other, value)),
                };
                self.writer.write_u8(TAG_LIST);
                self.writer.write_len(items.len())?;
                for item in items {
                    self.write_value(item, &element, depth + 1)?;
                }
                Ok(())
            }
            Value::Enum(constant) => {
                let serializer = self.registry.get(constant.runtime_type(), declared)?;
                self.write_class_info(&serializer)?;
                self.writer.write_u8(TAG_ENUM);
                serializer.write_object(value, self, depth)
            }
            Value::Object(r) => self.write_object(*r, value, declared, depth),
            primitive => {
                let fits = match declared {
                    ValueType::Any => true,
                    ValueType::Primitive(kind) => primitive.primitive_kind() == Some(*kind),
                    _ => false,
                };
                if !fits {
                    return Err(self.mismatch(declared, value));
                }
                self.write_primitive(primitive)
            }
        }
    }

    fn write_object(&mut self, r: ObjectRef, value: &Value, declared: &ValueType, depth: usize) -> Result<()> {
        let ty = self
            .graph
            .get(r)
            .ok_or_else(|| SerializationError::NotSerializable(format!("dangling object {:?}", r)))?
            .runtime_type()
            .clone();
        let serializer = self.registry.get(&ty, declared)?;
        self.write_class_info(&serializer)?;

        if let Some(&id) = self.object_history.get(&r) {
            self.writer.write_u8(TAG_BACKREF);
            self.writer.write_u32_le(id);
            return Ok(());
        }
        if !self.in_progress.insert(r) {
            return Err(SerializationError::NotSerializable(format!(
                "cycle through {} object {:?}",
                ty.name(),
                r
            )));
        }

        let inline = self.config.is_inline(ty.name());
        self.writer
            .write_u8(if inline { TAG_INLINE_OBJECT } else { TAG_OBJECT });
        serializer.write_object(value, self, depth)?;
        self.in_progress.remove(&r);

        if !inline {
            let id = u32::try_from(self.object_history.len())
                .map_err(|_| SerializationError::NotSerializable("too many objects".into()))?;
            self.object_history.insert(r, id);
        }
        Ok(())
    }

    /// Emit the schema of `serializer`'s type the first time it is used.
    fn write_class_info(&mut self, serializer: &Arc<dyn Serializer>) -> Result<()> {
        if !self
            .serializer_history
            .insert(serializer.runtime_type().fingerprint())
        {
            return Ok(());
        }
        for descriptor in serializer.type_notations() {
            self.add_notation(&descriptor)?;
            for iface in descriptor.interfaces() {
                if let Some(known) = self.registry.lookup(iface) {
                    let mut next = Some(known.descriptor().clone());
                    while let Some(d) = next {
                        next = d.super_type().cloned();
                        self.add_notation(&d)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn add_notation(&mut self, descriptor: &Arc<TypeDescriptor>) -> Result<()> {
        if let Some(&index) = self.schema_index.get(descriptor.name()) {
            let existing = &self.schema[index as usize];
            if Arc::ptr_eq(existing, descriptor) || existing.fingerprint() == descriptor.fingerprint() {
                return Ok(());
            }
            return Err(SerializationError::NotSerializable(format!(
                "two different types named {} in one graph",
                descriptor.name()
            )));
        }
        let index = u32::try_from(self.schema.len())
            .map_err(|_| SerializationError::NotSerializable("too many types".into()))?;
        self.schema_index.insert(descriptor.name().to_string(), index);
        self.schema.push(descriptor.clone());
        Ok(())
    }

    fn write_primitive(&mut self, value: &Value) -> Result<()> {
        let w = &mut self.writer;
        match value {
            Value::Bool(v) => {
                w.write_u8(TAG_BOOL);
                w.write_u8(u8::from(*v));
            }
            Value::U8(v) => {
                w.write_u8(TAG_U8);
                w.write_u8(*v);
            }
            Value::I8(v) => {
                w.write_u8(TAG_I8);
                w.write_i8(*v);
            }
            Value::U16(v) => {
                w.write_u8(TAG_U16);
                w.write_u16_le(*v);
            }
            Value::I16(v) => {
                w.write_u8(TAG_I16);
                w.write_i16_le(*v);
            }
            Value::U32(v) => {
                w.write_u8(TAG_U32);
                w.write_u32_le(*v);
            }
            Value::I32(v) => {
                w.write_u8(TAG_I32);
                w.write_i32_le(*v);
            }
            Value::U64(v) => {
                w.write_u8(TAG_U64);
                w.write_u64_le(*v);
            }
            Value::I64(v) => {
                w.write_u8(TAG_I64);
                w.write_i64_le(*v);
            }
            Value::F32(v) => {
                w.write_u8(TAG_F32);
                w.write_f32_le(*v);
            }
            Value::F64(v) => {
                w.write_u8(TAG_F64);
                w.write_f64_le(*v);
            }
            Value::Char(v) => {
                w.write_u8(TAG_CHAR);
                w.write_u32_le(u32::from(*v));
            }
            Value::String(v) => {
                w.write_u8(TAG_STRING);
                w.write_str(v)?;
            }
            Value::Bytes(v) => {
                w.write_u8(TAG_BYTES);
                w.write_blob(v)?;
            }
            other => {
                return Err(SerializationError::NotSerializable(format!(
                    "{} is not a primitive",
                    self.graph.describe(other)
                )))
            }
        }
        Ok(())
    }

    fn mismatch(&self, declared: &ValueType, value: &Value) -> SerializationError {
        SerializationError::NotSerializable(format!(
            "{} cannot be written where {} is declared",
            self.graph.describe(value),
            declared
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveKind, TypeDescriptorBuilder};

    fn setup() -> (SerializerRegistry, Arc<RuntimeType>) {
        let registry = SerializerRegistry::new();
        let node = registry
            .register(
                TypeDescriptorBuilder::composite("demo.Node")
                    .field("value", PrimitiveKind::I32)
                    .reference("next", "demo.Node", true)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        (registry, node)
    }

    #[test]
    fn test_shared_object_written_once() {
        let (registry, node) = setup();
        let config = SerializationConfig::default();
        let mut graph = ObjectGraph::new();
        let shared = graph.instantiate(&node, vec![Value::I32(7), Value::Null]).unwrap();
        let root = Value::List(vec![shared.into(), shared.into()]);

        let envelope = SerializationOutput::new(&registry, &config, &graph)
            .serialize(&root)
            .unwrap();
        let payload = envelope.payload();
        assert_eq!(payload.iter().filter(|&&b| b == TAG_OBJECT).count(), 1);
        assert_eq!(payload[payload.len() - 5], TAG_BACKREF);
        assert_eq!(&payload[payload.len() - 4..], &0u32.to_le_bytes());
        assert_eq!(envelope.schema().len(), 1);
    }

    #[test]
    fn test_inline_object_never_back_referenced() {
        let (registry, node) = setup();
        let config = SerializationConfig::default().with_inline_type("demo.Node");
        let mut graph = ObjectGraph::new();
        let shared = graph.instantiate(&node, vec![Value::I32(7), Value::Null]).unwrap();
        let root = Value::List(vec![shared.into(), shared.into()]);

        let envelope = SerializationOutput::new(&registry, &config, &graph)
            .serialize(&root)
            .unwrap();
        let payload = envelope.payload();
        assert!(!payload.contains(&TAG_BACKREF));
        assert_eq!(payload.iter().filter(|&&b| b == TAG_INLINE_OBJECT).count(), 2);
    }

    #[test]
    fn test_cycle_rejected() {
        let (registry, node) = setup();
        let config = SerializationConfig::default();
        let mut graph = ObjectGraph::new();
        let a = graph.instantiate(&node, vec![Value::I32(1), Value::Null]).unwrap();
        graph.set_field(a, "next", a.into()).unwrap();

        let err = SerializationOutput::new(&registry, &config, &graph)
            .serialize(&a.into())
            .unwrap_err();
        assert!(matches!(err, SerializationError::NotSerializable(_)));
    }

    #[test]
    fn test_null_root_rejected() {
        let registry = SerializerRegistry::new();
        let config = SerializationConfig::default();
        let graph = ObjectGraph::new();
        assert!(matches!(
            SerializationOutput::new(&registry, &config, &graph).serialize(&Value::Null),
            Err(SerializationError::NotSerializable(_))
        ));
    }

    #[test]
    fn test_depth_limit() {
        let (registry, node) = setup();
        let config = SerializationConfig::default().with_max_depth(3);
        let mut graph = ObjectGraph::new();
        let mut head = graph.instantiate(&node, vec![Value::I32(0), Value::Null]).unwrap();
        for i in 1..10 {
            head = graph
                .instantiate(&node, vec![Value::I32(i), head.into()])
                .unwrap();
        }
        assert!(SerializationOutput::new(&registry, &config, &graph)
            .serialize(&head.into())
            .is_err());
    }

    #[test]
    fn test_schema_lists_supertypes_and_known_interfaces() {
        let registry = SerializerRegistry::new();
        registry
            .register(TypeDescriptorBuilder::interface("demo.Shape").build().unwrap())
            .unwrap();
        let base = Arc::new(
            TypeDescriptorBuilder::composite("demo.Base")
                .field("id", PrimitiveKind::U32)
                .build()
                .unwrap(),
        );
        let circle = registry
            .register(
                TypeDescriptorBuilder::composite("demo.Circle")
                    .super_type(base)
                    .interface_name("demo.Shape")
                    .interface_name("demo.Unknown")
                    .field("r", PrimitiveKind::F64)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let config = SerializationConfig::default();
        let mut graph = ObjectGraph::new();
        let c = graph
            .instantiate(&circle, vec![Value::U32(1), Value::F64(2.0)])
            .unwrap();

        let envelope = SerializationOutput::new(&registry, &config, &graph)
            .serialize(&c.into())
            .unwrap();
        let names: Vec<&str> = envelope.schema().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["demo.Circle", "demo.Shape", "demo.Base"]);
    }
}
