// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural fingerprint of a type descriptor.

use md5::{Digest, Md5};
use std::fmt;

/// 16-byte MD5 digest of a descriptor's canonical form.
///
/// Keys the carpenter cache and the registry's serializer cache, and decides
/// whether a received descriptor matches a local type. Computed once, when
/// the descriptor is built.
///
/// ```rust
/// use typewire::schema::{PrimitiveKind, TypeDescriptorBuilder};
///
/// let a = TypeDescriptorBuilder::composite("demo.Point")
///     .field("x", PrimitiveKind::I32)
///     .build()
///     .unwrap();
/// let b = a.clone();
/// assert_eq!(a.fingerprint(), b.fingerprint());
/// println!("{}", a.fingerprint());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 16]);

impl Fingerprint {
    /// Digest of an already canonical byte string.
    pub fn compute(canonical: &[u8]) -> Self {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&Md5::digest(canonical));
        Self(bytes)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}
