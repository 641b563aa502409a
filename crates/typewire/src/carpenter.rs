// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type carpenter: manufactures runtime types for descriptors that have no
//! local counterpart.
//!
//! Synthesized types are cached by fingerprint for the lifetime of the
//! carpenter. Two threads asking for the same fingerprint at the same time
//! get the same [`RuntimeType`]; the per-fingerprint gate makes sure only one
//! of them runs the layout.

use crate::error::{Result, SerializationError};
use crate::runtime_type::{NoLocalTypes, RuntimeType, TypeLookup, TypeOrigin};
use crate::schema::{Fingerprint, TypeDescriptor};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

/// Function used to key the synthesis cache.
pub type FingerprintFn = fn(&TypeDescriptor) -> Fingerprint;

fn descriptor_fingerprint(descriptor: &TypeDescriptor) -> Fingerprint {
    descriptor.fingerprint()
}

/// Cache of synthesized runtime types.
#[derive(Debug)]
pub struct Carpenter {
    cache: DashMap<Fingerprint, Arc<RuntimeType>>,
    gates: DashMap<Fingerprint, Arc<Mutex<()>>>,
    fingerprint: FingerprintFn,
}

static GLOBAL_CARPENTER: OnceLock<Arc<Carpenter>> = OnceLock::new();

impl Default for Carpenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Carpenter {
    pub fn new() -> Self {
        Self::with_fingerprint_fn(descriptor_fingerprint)
    }

    /// Carpenter keyed by a custom fingerprint function.
    pub fn with_fingerprint_fn(fingerprint: FingerprintFn) -> Self {
        Self {
            cache: DashMap::new(),
            gates: DashMap::new(),
            fingerprint,
        }
    }

    /// Process-wide carpenter.
    pub fn global() -> Arc<Carpenter> {
        GLOBAL_CARPENTER
            .get_or_init(|| Arc::new(Carpenter::new()))
            .clone()
    }

    /// Number of synthesized types.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Previously synthesized type for `fingerprint`.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<RuntimeType>> {
        self.cache.get(fingerprint).map(|t| t.clone())
    }

    /// Synthesize `descriptor` and every supertype in its chain.
    pub fn synthesize(&self, descriptor: &Arc<TypeDescriptor>) -> Result<Arc<RuntimeType>> {
        self.synthesize_with(descriptor, &NoLocalTypes)
    }

    /// Synthesize `descriptor`, skipping supertypes that `locals` already knows.
    ///
    /// Supertypes are handled before the type itself; the climb stops at the
    /// first ancestor that is local or already synthesized. Fails with
    /// `SynthesisFailure` when a descriptor cannot be laid out or its
    /// fingerprint is already taken by a different descriptor.
    pub fn synthesize_with(
        &self,
        descriptor: &Arc<TypeDescriptor>,
        locals: &dyn TypeLookup,
    ) -> Result<Arc<RuntimeType>> {
        let mut missing: Vec<&Arc<TypeDescriptor>> = Vec::new();
        let mut next = descriptor.super_type();
        while let Some(parent) = next {
            if locals.find_local(parent).is_some()
                || self.cached((self.fingerprint)(parent.as_ref()), parent)?.is_some()
            {
                break;
            }
            missing.push(parent);
            next = parent.super_type();
        }
        for parent in missing.into_iter().rev() {
            self.synthesize_one(parent)?;
        }
        self.synthesize_one(descriptor)
    }

    fn synthesize_one(&self, descriptor: &Arc<TypeDescriptor>) -> Result<Arc<RuntimeType>> {
        let fingerprint = (self.fingerprint)(descriptor.as_ref());
        if let Some(hit) = self.cached(fingerprint, descriptor)? {
            return Ok(hit);
        }

        let gate = self
            .gates
            .entry(fingerprint)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = gate.lock();
        if let Some(hit) = self.cached(fingerprint, descriptor)? {
            return Ok(hit);
        }

        let built = RuntimeType::layout(descriptor.clone(), fingerprint, TypeOrigin::Synthesized);
        let result = match built {
            Ok(ty) => {
                let ty = Arc::new(ty);
                log::debug!(
                    "[carpenter] synthesized {} {} ({} slots, {})",
                    ty.kind().name(),
                    ty.name(),
                    ty.slots().len(),
                    fingerprint
                );
                self.cache.insert(fingerprint, ty.clone());
                Ok(ty)
            }
            Err(e) => {
                log::debug!("[carpenter] cannot synthesize {}: {}", descriptor.name(), e);
                Err(match e {
                    SerializationError::SynthesisFailure(_)
                    | SerializationError::DuplicateFieldName { .. } => e,
                    other => SerializationError::SynthesisFailure(other.to_string()),
                })
            }
        };
        self.gates.remove(&fingerprint);
        result
    }

    fn cached(
        &self,
        fingerprint: Fingerprint,
        descriptor: &TypeDescriptor,
    ) -> Result<Option<Arc<RuntimeType>>> {
        let Some(existing) = self.get(&fingerprint) else {
            return Ok(None);
        };
        if existing.descriptor().as_ref() == descriptor {
            Ok(Some(existing))
        } else {
            Err(SerializationError::SynthesisFailure(format!(
                "fingerprint {} of {} already belongs to {}",
                fingerprint,
                descriptor.name(),
                existing.name()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PrimitiveKind, TypeDescriptorBuilder, TypeKind};

    fn enum_with(count: usize) -> Arc<TypeDescriptor> {
        let mut builder = TypeDescriptorBuilder::enumeration(format!("demo.Enum{}", count));
        for i in 0..count {
            builder = builder.constant(format!("C{}", i));
        }
        Arc::new(builder.build().unwrap())
    }

    #[test]
    fn test_enum_ordinals_follow_declaration_order() {
        let carpenter = Carpenter::new();
        for count in [1usize, 2, 10] {
            let ty = carpenter.synthesize(&enum_with(count)).unwrap();
            assert_eq!(ty.kind(), TypeKind::Enum);
            assert_eq!(ty.variants().len(), count);
            for i in 0..count {
                assert_eq!(ty.ordinal_of(&format!("C{}", i)), Some(i as u32));
            }
        }
    }

    #[test]
    fn test_synthesis_is_cached() {
        let carpenter = Carpenter::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::composite("demo.Remote")
                .field("a", PrimitiveKind::I32)
                .build()
                .unwrap(),
        );
        let first = carpenter.synthesize(&desc).unwrap();
        let second = carpenter.synthesize(&Arc::new((*desc).clone())).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.origin(), TypeOrigin::Synthesized);
        assert_eq!(carpenter.len(), 1);
    }

    #[test]
    fn test_concurrent_synthesis_yields_one_type() {
        let carpenter = Carpenter::new();
        let desc = Arc::new(
            TypeDescriptorBuilder::composite("demo.Contended")
                .field("n", PrimitiveKind::U64)
                .nullable_field("label", PrimitiveKind::String)
                .build()
                .unwrap(),
        );
        let types: Vec<Arc<RuntimeType>> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| carpenter.synthesize(&desc).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for ty in &types[1..] {
            assert!(Arc::ptr_eq(&types[0], ty));
        }
        assert_eq!(carpenter.len(), 1);
    }

    #[test]
    fn test_supertype_synthesized_first() {
        let carpenter = Carpenter::new();
        let base = Arc::new(
            TypeDescriptorBuilder::composite("demo.Base")
                .field("id", PrimitiveKind::U64)
                .build()
                .unwrap(),
        );
        let child = Arc::new(
            TypeDescriptorBuilder::composite("demo.Child")
                .super_type(base.clone())
                .field("name", PrimitiveKind::String)
                .build()
                .unwrap(),
        );
        let ty = carpenter.synthesize(&child).unwrap();
        assert_eq!(ty.slots().len(), 2);
        assert!(carpenter.get(&base.fingerprint()).is_some());
        assert_eq!(carpenter.len(), 2);
    }

    #[test]
    fn test_fingerprint_collision_fails() {
        let carpenter = Carpenter::with_fingerprint_fn(|_| Fingerprint::compute(b"same"));
        let a = Arc::new(
            TypeDescriptorBuilder::composite("demo.A")
                .field("x", PrimitiveKind::I32)
                .build()
                .unwrap(),
        );
        let b = Arc::new(
            TypeDescriptorBuilder::composite("demo.B")
                .field("y", PrimitiveKind::F64)
                .build()
                .unwrap(),
        );
        carpenter.synthesize(&a).unwrap();
        let err = carpenter.synthesize(&b).unwrap_err();
        assert!(matches!(err, SerializationError::SynthesisFailure(_)));
        assert!(carpenter.synthesize(&a).is_ok());
    }

    #[test]
    fn test_delimiter_names_get_their_own_layout() {
        let carpenter = Carpenter::new();
        let packed = Arc::new(
            TypeDescriptorBuilder::composite("demo.T")
                .field("a:i32;b", PrimitiveKind::I32)
                .build()
                .unwrap(),
        );
        let split = Arc::new(
            TypeDescriptorBuilder::composite("demo.T")
                .field("a", PrimitiveKind::I32)
                .field("b", PrimitiveKind::I32)
                .build()
                .unwrap(),
        );
        let first = carpenter.synthesize(&packed).unwrap();
        let second = carpenter.synthesize(&split).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.slots().len(), 1);
        assert_eq!(second.slots().len(), 2);
        assert_eq!(carpenter.len(), 2);

        let colliding = Carpenter::with_fingerprint_fn(|_| Fingerprint::compute(b"same"));
        colliding.synthesize(&packed).unwrap();
        assert!(matches!(
            colliding.synthesize(&split),
            Err(SerializationError::SynthesisFailure(_))
        ));
    }

    #[test]
    fn test_long_chain_stops_at_synthesized_ancestor() {
        let carpenter = Carpenter::new();
        let mut chain = Vec::new();
        let mut parent: Option<Arc<TypeDescriptor>> = None;
        for i in 0..300 {
            let mut builder = TypeDescriptorBuilder::composite(format!("demo.L{}", i));
            if let Some(p) = parent.take() {
                builder = builder.super_type(p);
            }
            let desc = Arc::new(builder.build().unwrap());
            chain.push(desc.clone());
            parent = Some(desc);
        }
        carpenter.synthesize(&chain[149]).unwrap();
        assert_eq!(carpenter.len(), 150);
        let leaf = carpenter.synthesize(&chain[299]).unwrap();
        assert_eq!(carpenter.len(), 300);
        assert!(leaf.is_assignable_to("demo.L0"));
    }

    #[test]
    fn test_unrepresentable_descriptor_fails() {
        let carpenter = Carpenter::new();
        let iface = Arc::new(TypeDescriptorBuilder::interface("demo.I").build().unwrap());
        let bad = Arc::new(
            TypeDescriptorBuilder::composite("demo.C")
                .super_type(iface)
                .build()
                .unwrap(),
        );
        assert!(matches!(
            carpenter.synthesize(&bad),
            Err(SerializationError::SynthesisFailure(_))
        ));
        assert!(carpenter.get(&bad.fingerprint()).is_none());
    }
}
