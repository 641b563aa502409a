// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type Descriptor Model
//!
//! Structural description of types, independent of any locally known
//! representation. Descriptors travel inside every envelope and drive both
//! the registry (encode) and the carpenter (decode).
//!
//! # Example
//!
//! ```rust
//! use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder};
//!
//! let desc = TypeDescriptorBuilder::composite("demo.Cash")
//!     .field("quantity", PrimitiveKind::I64)
//!     .nullable_field("currency", PrimitiveKind::String)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(desc.fields().len(), 2);
//! let fp = desc.fingerprint();
//! assert_eq!(fp, desc.clone().fingerprint());
//! ```

mod builder;
mod fingerprint;
mod type_descriptor;

pub use builder::TypeDescriptorBuilder;
pub use fingerprint::Fingerprint;
pub use type_descriptor::{
    Ancestors, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind, ValueType,
};

pub(crate) use type_descriptor::check_unique_fields;
