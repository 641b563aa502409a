// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # typewire - schema-carrying binary object serialization
//!
//! Encodes object graphs into self-describing envelopes: every envelope
//! carries the structural description of each type it uses, so a receiver
//! without the sender's types can still rebuild the graph.
//!
//! ## Quick Start
//!
//! ```rust
//! use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder};
//! use typewire::{ObjectGraph, SerializationScheme, Value, ValueType};
//!
//! # fn main() -> typewire::Result<()> {
//! let sender = SerializationScheme::default();
//! let cash = sender.registry().register(
//!     TypeDescriptorBuilder::composite("demo.Cash")
//!         .field("quantity", PrimitiveKind::I64)
//!         .nullable_field("currency", PrimitiveKind::String)
//!         .build()?,
//! )?;
//!
//! let mut graph = ObjectGraph::new();
//! let amount = graph.instantiate(&cash, vec![Value::I64(100), "EUR".into()])?;
//! let bytes = sender.serialize_to_bytes(&graph, &amount.into())?;
//!
//! // A receiver that never registered demo.Cash synthesizes it.
//! let receiver = SerializationScheme::default();
//! let decoded = receiver.deserialize(&bytes, &ValueType::Any)?;
//! assert!(graph.structurally_equal(&amount.into(), &decoded.graph, &decoded.root));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +----------------------------------------------------------------+
//! |                   SerializationScheme                          |
//! |        serialize / deserialize, per-call contexts              |
//! +-------------------------------+--------------------------------+
//! |     SerializationOutput       |     DeserializationInput       |
//! |  object ids, schema history   |  schema resolution, back-refs  |
//! +-------------------------------+--------------------------------+
//! |     SerializerRegistry        |          Carpenter             |
//! |  local types, serializers     |  synthesized types by FP       |
//! +-------------------------------+--------------------------------+
//! |   schema (descriptors, fingerprints)  |  wire (tags, envelope) |
//! +----------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`schema`] - type descriptors and fingerprints
//! - [`graph`] - object graphs and values
//! - [`registry`] - local types and serializers
//! - [`carpenter`] - runtime types for unknown descriptors
//! - [`wire`] - envelope framing and value tags
//! - [`config`] - constants and per-scheme limits

pub mod carpenter;
pub mod config;
pub mod error;
pub mod graph;
pub mod input;
pub mod output;
pub mod registry;
pub mod runtime_type;
pub mod scheme;
pub mod schema;
pub mod wire;

pub use carpenter::Carpenter;
pub use config::SerializationConfig;
pub use error::{Result, SerializationError};
pub use graph::{EnumValue, Instance, ObjectGraph, ObjectRef, Value};
pub use input::{DeserializationInput, DeserializedGraph};
pub use output::SerializationOutput;
pub use registry::{Serializer, SerializerRegistry};
pub use runtime_type::{RuntimeType, TypeLookup, TypeOrigin};
pub use scheme::SerializationScheme;
pub use schema::{FieldDescriptor, Fingerprint, TypeDescriptor, TypeKind, ValueType};
pub use wire::Envelope;
