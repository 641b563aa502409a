// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use typewire::{SerializationConfig, SerializationScheme, ValueType};

fuzz_target!(|data: &[u8]| {
    // Small limits keep pathological inputs fast; errors are expected, panics are not.
    let scheme = SerializationScheme::default().with_config(
        SerializationConfig::default()
            .with_max_depth(64)
            .with_max_collection_len(4096),
    );
    let _ = scheme.deserialize(data, &ValueType::Any);
});
