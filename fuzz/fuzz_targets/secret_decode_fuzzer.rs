//! Fuzz target for shared secret decoding and passcode validation
//!
//! # Invariants
//!
//! - Decoding arbitrary text never panics
//! - A decoded secret is never empty
//! - Validation of arbitrary input never panics, and a code the validator
//!   generated for `t` is always accepted at `t`

#![no_main]

use arbitrary::Arbitrary;
use holdgate_core::{SharedSecret, totp};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    encoded: String,
    submitted: String,
    window: u8,
    unix_time: u64,
}

fuzz_target!(|input: Input| {
    let Ok(secret) = SharedSecret::from_base32(&input.encoded) else {
        return;
    };
    assert!(!secret.as_bytes().is_empty());

    let window = u32::from(input.window);
    let _ = totp::validate(&secret, window, &input.submitted, input.unix_time);

    let code = totp::expected_code(&secret, input.unix_time);
    assert!(totp::validate(&secret, window, &code, input.unix_time));
});
