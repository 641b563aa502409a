// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use typewire::Envelope;

fuzz_target!(|data: &[u8]| {
    // Anything that parses must frame back to the same bytes.
    if let Ok(envelope) = Envelope::from_bytes(data) {
        if let Ok(bytes) = envelope.to_bytes() {
            assert_eq!(Envelope::from_bytes(&bytes).ok(), Some(envelope));
        }
    }
});
