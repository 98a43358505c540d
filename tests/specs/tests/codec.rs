// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-crate event codec properties: whatever the relay encodes, the
//! client decodes back, regardless of how the transport chunks the bytes.

use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use ssoclient::sse::SseDecoder;
use ssorelay::sse::encode_event;

proptest! {
    #[test]
    fn encode_then_decode_reproduces_sequence(
        events in proptest::collection::vec(
            ("[a-z][a-z-]{0,15}", "[ -~]{0,60}"),
            1..8,
        ),
        chunk_size in 1usize..17,
    ) {
        let mut encoded = String::new();
        for (name, data) in &events {
            let frame = encode_event(name, data)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            encoded.push_str(&frame);
        }

        let mut decoder = SseDecoder::new();
        let mut decoded = Vec::new();
        for part in encoded.as_bytes().chunks(chunk_size) {
            let events = decoder.push(part)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            decoded.extend(events);
        }
        let leftover = decoder.finish()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        prop_assert!(leftover.is_none());
        prop_assert_eq!(decoded, events);
    }

    #[test]
    fn newline_payloads_are_rejected_by_the_encoder(
        data in "[ -~]{0,20}\n[ -~]{0,20}",
    ) {
        prop_assert!(encode_event("error", &data).is_err());
    }
}
