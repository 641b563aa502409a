// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Arena-backed object graph.

use crate::error::{Result, SerializationError};
use crate::graph::{ObjectRef, Value};
use crate::runtime_type::RuntimeType;
use crate::schema::{FieldDescriptor, ValueType};
use std::collections::HashMap;
use std::sync::Arc;

/// One object: its runtime type and one value per slot.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: Arc<RuntimeType>,
    fields: Vec<Value>,
}

impl Instance {
    pub fn runtime_type(&self) -> &Arc<RuntimeType> {
        &self.ty
    }

    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Slot values in layout order.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Slot value by field name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.ty.slot_index(name).map(|i| &self.fields[i])
    }
}

/// Append-only arena of objects.
///
/// Objects reference each other through [`ObjectRef`] handles, so shared
/// sub-objects are stored once and identity is explicit.
#[derive(Debug, Clone, Default)]
pub struct ObjectGraph {
    objects: Vec<Instance>,
}

impl ObjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, r: ObjectRef) -> Option<&Instance> {
        self.objects.get(r.index())
    }

    /// Construct an instance of `ty` from slot values in layout order.
    ///
    /// Mandatory slots must not be null (`NullabilityViolation`), every value
    /// must fit its slot (`SchemaMismatch`), and only composite types can be
    /// instantiated (`NotSerializable`).
    pub fn instantiate(&mut self, ty: &Arc<RuntimeType>, values: Vec<Value>) -> Result<ObjectRef> {
        if !ty.is_instantiable() {
            return Err(SerializationError::NotSerializable(format!(
                "{} type {} cannot be instantiated",
                ty.kind().name(),
                ty.name()
            )));
        }
        if values.len() != ty.slots().len() {
            return Err(SerializationError::SchemaMismatch {
                expected: format!("{} values for {}", ty.slots().len(), ty.name()),
                found: format!("{} values", values.len()),
            });
        }
        for (slot, value) in ty.slots().iter().zip(&values) {
            self.check_slot(ty, slot, value)?;
        }

        let index = u32::try_from(self.objects.len())
            .map_err(|_| SerializationError::NotSerializable("object graph is full".into()))?;
        self.objects.push(Instance {
            ty: ty.clone(),
            fields: values,
        });
        Ok(ObjectRef(index))
    }

    /// Construct an instance from `(field, value)` pairs; absent fields are null.
    pub fn instantiate_with(
        &mut self,
        ty: &Arc<RuntimeType>,
        named: Vec<(&str, Value)>,
    ) -> Result<ObjectRef> {
        let mut values = vec![Value::Null; ty.slots().len()];
        for (name, value) in named {
            let index = ty
                .slot_index(name)
                .ok_or_else(|| SerializationError::SchemaMismatch {
                    expected: format!("field of {}", ty.name()),
                    found: name.to_string(),
                })?;
            values[index] = value;
        }
        self.instantiate(ty, values)
    }

    /// Replace one slot value, with the same checks as construction.
    pub fn set_field(&mut self, r: ObjectRef, name: &str, value: Value) -> Result<()> {
        let instance = self
            .get(r)
            .ok_or_else(|| SerializationError::NotSerializable(format!("dangling object {:?}", r)))?;
        let ty = instance.ty.clone();
        let index = ty
            .slot_index(name)
            .ok_or_else(|| SerializationError::SchemaMismatch {
                expected: format!("field of {}", ty.name()),
                found: name.to_string(),
            })?;
        self.check_slot(&ty, &ty.slots()[index], &value)?;
        self.objects[r.index()].fields[index] = value;
        Ok(())
    }

    /// Read a slot value by field name.
    pub fn field(&self, r: ObjectRef, name: &str) -> Option<&Value> {
        self.get(r)?.field(name)
    }

    fn check_slot(&self, owner: &RuntimeType, slot: &FieldDescriptor, value: &Value) -> Result<()> {
        if value.is_null() {
            if slot.is_nullable() {
                return Ok(());
            }
            return Err(SerializationError::NullabilityViolation {
                type_name: owner.name().to_string(),
                field: slot.name().to_string(),
            });
        }
        self.check_value(slot.value_type(), value)
    }

    /// Check that a non-slot `value` fits `declared`.
    pub(crate) fn check_value(&self, declared: &ValueType, value: &Value) -> Result<()> {
        let fits = match (declared, value) {
            (_, Value::Null) => declared.can_be_null(),
            (ValueType::Primitive(kind), v) => v.primitive_kind() == Some(*kind),
            (ValueType::List(element), Value::List(items)) => {
                for item in items {
                    self.check_value(element, item)?;
                }
                true
            }
            (ValueType::Reference(name), Value::Enum(e)) => e.runtime_type().is_assignable_to(name),
            (ValueType::Reference(_) | ValueType::Any, Value::Object(r)) => {
                let instance = self.get(*r).ok_or_else(|| {
                    SerializationError::NotSerializable(format!("dangling object {:?}", r))
                })?;
                instance.ty.accepts(declared)
            }
            (ValueType::Any, _) => true,
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(SerializationError::SchemaMismatch {
                expected: declared.to_string(),
                found: self.describe(value),
            })
        }
    }

    /// Short human-readable label of a value's type.
    pub(crate) fn describe(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".into(),
            Value::List(_) => "list".into(),
            Value::Enum(e) => format!("enum {}", e.runtime_type().name()),
            Value::Object(r) => match self.get(*r) {
                Some(instance) => instance.type_name().to_string(),
                None => format!("dangling {:?}", r),
            },
            other => other
                .primitive_kind()
                .map(|k| k.name().to_string())
                .unwrap_or_default(),
        }
    }

    /// Compare the graph reachable from `a` here with the one reachable from
    /// `b` in `other`.
    ///
    /// Objects must match pairwise by type fingerprint and slot values, and
    /// sharing must be mirrored: an object reached twice on one side must be
    /// the same object on the other side.
    pub fn structurally_equal(&self, a: &Value, other: &ObjectGraph, b: &Value) -> bool {
        let mut forward = HashMap::new();
        let mut backward = HashMap::new();
        self.equal_values(a, other, b, &mut forward, &mut backward)
    }

    fn equal_values(
        &self,
        a: &Value,
        other: &ObjectGraph,
        b: &Value,
        forward: &mut HashMap<ObjectRef, ObjectRef>,
        backward: &mut HashMap<ObjectRef, ObjectRef>,
    ) -> bool {
        match (a, b) {
            (Value::Object(x), Value::Object(y)) => {
                match (forward.get(x), backward.get(y)) {
                    (Some(mx), Some(my)) => return mx == y && my == x,
                    (None, None) => {}
                    _ => return false,
                }
                forward.insert(*x, *y);
                backward.insert(*y, *x);

                let (Some(left), Some(right)) = (self.get(*x), other.get(*y)) else {
                    return false;
                };
                left.ty.fingerprint() == right.ty.fingerprint()
                    && left.fields.len() == right.fields.len()
                    && left
                        .fields
                        .iter()
                        .zip(&right.fields)
                        .all(|(l, r)| self.equal_values(l, other, r, forward, backward))
            }
            (Value::List(xs), Value::List(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|(l, r)| self.equal_values(l, other, r, forward, backward))
            }
            (x, y) => x == y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EnumValue;
    use crate::runtime_type::TypeOrigin;
    use crate::schema::{PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder};

    fn runtime(desc: TypeDescriptor) -> Arc<RuntimeType> {
        let desc = Arc::new(desc);
        let fp = desc.fingerprint();
        Arc::new(RuntimeType::layout(desc, fp, TypeOrigin::Local).unwrap())
    }

    fn node_type() -> Arc<RuntimeType> {
        runtime(
            TypeDescriptorBuilder::composite("demo.Node")
                .field("value", PrimitiveKind::I32)
                .reference("next", "demo.Node", true)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_instantiate_and_read() {
        let node = node_type();
        let mut graph = ObjectGraph::new();
        let tail = graph
            .instantiate(&node, vec![Value::I32(2), Value::Null])
            .unwrap();
        let head = graph
            .instantiate_with(&node, vec![("value", 1i32.into()), ("next", tail.into())])
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.field(head, "next"), Some(&Value::Object(tail)));
        assert_eq!(graph.field(tail, "value"), Some(&Value::I32(2)));
    }

    #[test]
    fn test_mandatory_slot_rejects_null() {
        let node = node_type();
        let mut graph = ObjectGraph::new();
        let err = graph
            .instantiate(&node, vec![Value::Null, Value::Null])
            .unwrap_err();
        assert_eq!(
            err,
            SerializationError::NullabilityViolation {
                type_name: "demo.Node".into(),
                field: "value".into(),
            }
        );
        assert!(graph.is_empty());
    }

    #[test]
    fn test_slot_type_checked() {
        let node = node_type();
        let mut graph = ObjectGraph::new();
        let err = graph
            .instantiate(&node, vec![Value::from("one"), Value::Null])
            .unwrap_err();
        assert!(matches!(err, SerializationError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_reference_slot_checks_assignability() {
        let node = node_type();
        let other = runtime(
            TypeDescriptorBuilder::composite("demo.Other")
                .build()
                .unwrap(),
        );
        let mut graph = ObjectGraph::new();
        let stranger = graph.instantiate(&other, vec![]).unwrap();
        let err = graph
            .instantiate(&node, vec![Value::I32(0), Value::Object(stranger)])
            .unwrap_err();
        assert!(matches!(err, SerializationError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_enum_not_instantiable() {
        let side = runtime(
            TypeDescriptorBuilder::enumeration("demo.Side")
                .constant("left")
                .build()
                .unwrap(),
        );
        let mut graph = ObjectGraph::new();
        assert!(matches!(
            graph.instantiate(&side, vec![]),
            Err(SerializationError::NotSerializable(_))
        ));
        let left = EnumValue::named(&side, "left").unwrap();
        assert_eq!(left.ordinal(), 0);
    }

    #[test]
    fn test_set_field_builds_sharing() {
        let node = node_type();
        let mut graph = ObjectGraph::new();
        let shared = graph.instantiate(&node, vec![Value::I32(9), Value::Null]).unwrap();
        let a = graph.instantiate(&node, vec![Value::I32(1), Value::Null]).unwrap();
        graph.set_field(a, "next", Value::Object(shared)).unwrap();
        assert_eq!(graph.field(a, "next"), Some(&Value::Object(shared)));

        assert!(graph.set_field(a, "value", Value::Null).is_err());
        assert!(graph.set_field(a, "missing", Value::I32(0)).is_err());
    }

    #[test]
    fn test_structural_equality_tracks_sharing() {
        let node = node_type();
        let list_holder = runtime(
            TypeDescriptorBuilder::composite("demo.Holder")
                .list("items", ValueType::reference("demo.Node"), false)
                .build()
                .unwrap(),
        );

        let mut shared_graph = ObjectGraph::new();
        let n = shared_graph.instantiate(&node, vec![Value::I32(1), Value::Null]).unwrap();
        let h1 = shared_graph
            .instantiate(&list_holder, vec![Value::List(vec![n.into(), n.into()])])
            .unwrap();

        let mut copied_graph = ObjectGraph::new();
        let c1 = copied_graph.instantiate(&node, vec![Value::I32(1), Value::Null]).unwrap();
        let c2 = copied_graph.instantiate(&node, vec![Value::I32(1), Value::Null]).unwrap();
        let h2 = copied_graph
            .instantiate(&list_holder, vec![Value::List(vec![c1.into(), c2.into()])])
            .unwrap();

        assert!(shared_graph.structurally_equal(&h1.into(), &shared_graph, &h1.into()));
        assert!(!shared_graph.structurally_equal(&h1.into(), &copied_graph, &h2.into()));
    }
}
