// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object graphs handed to the encoder and produced by the decoder.
//!
//! Objects live in an [`ObjectGraph`] arena and point at each other with
//! [`ObjectRef`] handles. Every instance is built through its
//! [`RuntimeType`](crate::runtime_type::RuntimeType), so slot kinds and
//! nullability are enforced at construction.

mod object_graph;
mod value;

pub use object_graph::{Instance, ObjectGraph};
pub use value::{EnumValue, ObjectRef, Value};
