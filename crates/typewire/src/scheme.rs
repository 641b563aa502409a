// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entry point tying registry, carpenter and configuration together.

use crate::carpenter::Carpenter;
use crate::config::SerializationConfig;
use crate::error::Result;
use crate::graph::{ObjectGraph, Value};
use crate::input::{DeserializationInput, DeserializedGraph};
use crate::output::SerializationOutput;
use crate::registry::SerializerRegistry;
use crate::schema::ValueType;
use crate::wire::Envelope;
use std::sync::Arc;

/// Serialization front end.
///
/// Cheap to clone; every call builds its own encode or decode context, so a
/// scheme can be shared freely across threads.
///
/// # Example
///
/// ```
/// use typewire::{ObjectGraph, SerializationScheme, Value, ValueType};
/// use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder};
///
/// let scheme = SerializationScheme::default();
/// let point = scheme
///     .registry()
///     .register(
///         TypeDescriptorBuilder::composite("demo.Point")
///             .field("x", PrimitiveKind::I32)
///             .field("y", PrimitiveKind::I32)
///             .build()
///             .unwrap(),
///     )
///     .unwrap();
///
/// let mut graph = ObjectGraph::new();
/// let p = graph.instantiate(&point, vec![Value::I32(3), Value::I32(4)]).unwrap();
///
/// let bytes = scheme.serialize_to_bytes(&graph, &p.into()).unwrap();
/// let decoded = scheme
///     .deserialize(&bytes, &ValueType::reference("demo.Point"))
///     .unwrap();
/// assert!(graph.structurally_equal(&p.into(), &decoded.graph, &decoded.root));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SerializationScheme {
    registry: Arc<SerializerRegistry>,
    carpenter: Arc<Carpenter>,
    config: SerializationConfig,
}

impl SerializationScheme {
    pub fn new(registry: Arc<SerializerRegistry>, carpenter: Arc<Carpenter>) -> Self {
        Self {
            registry,
            carpenter,
            config: SerializationConfig::default(),
        }
    }

    /// Scheme backed by the process-wide registry and carpenter.
    pub fn global() -> Self {
        Self::new(SerializerRegistry::global(), Carpenter::global())
    }

    pub fn with_config(mut self, config: SerializationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &Arc<SerializerRegistry> {
        &self.registry
    }

    pub fn carpenter(&self) -> &Arc<Carpenter> {
        &self.carpenter
    }

    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    /// Encode the graph reachable from `root` into an envelope.
    pub fn serialize(&self, graph: &ObjectGraph, root: &Value) -> Result<Envelope> {
        SerializationOutput::new(&self.registry, &self.config, graph).serialize(root)
    }

    /// [`serialize`](Self::serialize) followed by framing.
    pub fn serialize_to_bytes(&self, graph: &ObjectGraph, root: &Value) -> Result<Vec<u8>> {
        self.serialize(graph, root)?.to_bytes()
    }

    /// Parse and decode framed bytes, checking the root against `expected`.
    pub fn deserialize(&self, bytes: &[u8], expected: &ValueType) -> Result<DeserializedGraph> {
        let envelope = Envelope::from_bytes(bytes)?;
        self.deserialize_envelope(&envelope, expected)
    }

    pub fn deserialize_envelope(
        &self,
        envelope: &Envelope,
        expected: &ValueType,
    ) -> Result<DeserializedGraph> {
        DeserializationInput::new(&self.registry, &self.carpenter, &self.config, envelope)
            .deserialize(expected)
    }
}
