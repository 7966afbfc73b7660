//! Fuzz target for token verification.
//!
//! Verification must never panic and must never accept a token that was not
//! signed with the key.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use signet_csrf::{Digest, TokenCodec, TokenOptions};

#[derive(Debug, Arbitrary)]
struct FuzzToken {
    digest: u8,
    common_len: u8,
    token_len: u8,
    key: Vec<u8>,
    token: String,
}

fuzz_target!(|data: FuzzToken| {
    let digest = match data.digest % 3 {
        0 => Digest::Sha256,
        1 => Digest::Sha384,
        _ => Digest::Sha512,
    };

    // Invalid length combinations are rejected at construction
    let Ok(codec) = TokenCodec::new(&TokenOptions {
        digest,
        common_len: data.common_len as usize,
        token_len: data.token_len as usize,
    }) else {
        return;
    };

    let _ = codec.verify(&data.key, &data.token);

    // A freshly signed token always verifies
    let token = codec.sign(&data.key);
    assert_eq!(token.len(), codec.token_len());
    assert!(codec.verify(&data.key, &token));
});
