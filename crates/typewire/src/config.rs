// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! typewire configuration - single source of truth for wire constants.
//!
//! - **Level 1 (Static)**: envelope header, section tags, hard limits
//! - **Level 2 (Dynamic)**: [`SerializationConfig`] per scheme (inline types, depth)
//!
//! # Example
//!
//! ```rust
//! use typewire::config::{SerializationConfig, ENVELOPE_MAGIC};
//!
//! let config = SerializationConfig::default()
//!     .with_inline_type("demo.Amount")
//!     .with_max_depth(64);
//!
//! assert!(config.is_inline("demo.Amount"));
//! assert_eq!(&ENVELOPE_MAGIC, b"tywr");
//! ```

use std::collections::HashSet;

// =======================================================================
// Envelope header
// =======================================================================

/// Magic prefix identifying a typewire envelope.
pub const ENVELOPE_MAGIC: [u8; 4] = *b"tywr";

/// Major encoding version. Decoders reject any other major.
pub const VERSION_MAJOR: u16 = 1;

/// Minor encoding version. Informational only.
pub const VERSION_MINOR: u16 = 0;

/// Header length: magic + major + minor.
pub const HEADER_LEN: usize = 8;

// =======================================================================
// Body sections
// =======================================================================

/// Section tag for the encoded root object.
pub const SECTION_PAYLOAD: u8 = 0xA0;

/// Section tag for the schema (ordered type notations).
pub const SECTION_SCHEMA: u8 = 0xA1;

// =======================================================================
// Limits
// =======================================================================

/// Maximum number of storage slots a synthesized type may carry.
///
/// Mirrors the per-class field limit of common VM class formats so that
/// synthesized layouts stay representable by every peer.
pub const MAX_SLOTS: usize = 65_535;

/// Default maximum nesting depth while walking a graph.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Default maximum element count accepted for one list on decode.
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 1 << 24;

/// Per-scheme serialization settings.
///
/// Objects whose runtime type is listed in `inline_types` are written by
/// value at every occurrence and never receive a back-reference id. This is
/// the "too small to benefit from referencing" cutoff; primitives, lists and
/// enum constants are always inline regardless of this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializationConfig {
    inline_types: HashSet<String>,
    max_depth: usize,
    max_collection_len: usize,
}

impl Default for SerializationConfig {
    fn default() -> Self {
        Self {
            inline_types: HashSet::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
        }
    }
}

impl SerializationConfig {
    /// Mark a type as inline (never back-referenced).
    #[must_use]
    pub fn with_inline_type(mut self, type_name: impl Into<String>) -> Self {
        self.inline_types.insert(type_name.into());
        self
    }

    /// Set the maximum nesting depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum list length accepted on decode.
    #[must_use]
    pub fn with_max_collection_len(mut self, max: usize) -> Self {
        self.max_collection_len = max;
        self
    }

    /// Whether objects of `type_name` are always written by value.
    pub fn is_inline(&self, type_name: &str) -> bool {
        self.inline_types.contains(type_name)
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn max_collection_len(&self) -> usize {
        self.max_collection_len
    }
}
