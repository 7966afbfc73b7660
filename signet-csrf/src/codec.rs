//! Signed-token codec.
//!
//! A signed token is a fixed-length string made of a random nonce segment
//! followed by a signature segment, where the signature is the HMAC of the
//! nonce under some key, base64url-encoded and truncated to fill the
//! remaining length:
//!
//! ```text
//! |<------ common_len ------>|<--- token_len - common_len --->|
//! |          nonce           |     base64url(HMAC(key, nonce))  |
//! ```
//!
//! The same codec is used at two levels: the master secret signs session
//! secrets, and a session secret signs request tokens.

use crate::compare::timing_safe_eq;
use crate::config::TokenOptions;
use crate::error::{ConfigError, ConfigResult};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Shortest accepted nonce or signature segment, in characters.
pub const MIN_SEGMENT_LEN: usize = 16;

/// HMAC digest used to sign tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Digest {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl Digest {
    pub fn as_str(&self) -> &'static str {
        match self {
            Digest::Sha256 => "sha256",
            Digest::Sha384 => "sha384",
            Digest::Sha512 => "sha512",
        }
    }

    /// Raw HMAC output size in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Digest::Sha256 => 32,
            Digest::Sha384 => 48,
            Digest::Sha512 => 64,
        }
    }

    /// Longest signature segment this digest can fill (unpadded base64 length
    /// of the HMAC output).
    pub fn max_signature_len(&self) -> usize {
        (self.output_len() * 4).div_ceil(3)
    }

    fn mac(&self, key: &[u8], data: &[u8]) -> Vec<u8> {
        macro_rules! hmac {
            ($hash:ty) => {{
                let mut mac = Hmac::<$hash>::new_from_slice(key)
                    .expect("HMAC can take key of any size");
                mac.update(data);
                mac.finalize().into_bytes().to_vec()
            }};
        }

        match self {
            Digest::Sha256 => hmac!(Sha256),
            Digest::Sha384 => hmac!(Sha384),
            Digest::Sha512 => hmac!(Sha512),
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Digest {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "").as_str() {
            "sha256" => Ok(Digest::Sha256),
            "sha384" => Ok(Digest::Sha384),
            "sha512" => Ok(Digest::Sha512),
            other => Err(ConfigError::Invalid(format!(
                "unsupported digest '{}'",
                other
            ))),
        }
    }
}

/// Signs and verifies fixed-length HMAC tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCodec {
    digest: Digest,
    common_len: usize,
    token_len: usize,
}

impl TokenCodec {
    /// Build a codec from token options, rejecting unusable lengths.
    pub fn new(options: &TokenOptions) -> ConfigResult<Self> {
        let TokenOptions {
            digest,
            common_len,
            token_len,
        } = *options;

        if common_len < MIN_SEGMENT_LEN {
            return Err(ConfigError::Invalid(format!(
                "token.common_len must be at least {} (got {})",
                MIN_SEGMENT_LEN, common_len
            )));
        }

        let signature_len = token_len.saturating_sub(common_len);
        if signature_len < MIN_SEGMENT_LEN {
            return Err(ConfigError::Invalid(format!(
                "token.token_len must exceed token.common_len by at least {} (got {} and {})",
                MIN_SEGMENT_LEN, token_len, common_len
            )));
        }

        if signature_len > digest.max_signature_len() {
            return Err(ConfigError::Invalid(format!(
                "{} signatures fill at most {} characters, token_len - common_len is {}",
                digest,
                digest.max_signature_len(),
                signature_len
            )));
        }

        Ok(Self {
            digest,
            common_len,
            token_len,
        })
    }

    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Length of the nonce segment.
    pub fn common_len(&self) -> usize {
        self.common_len
    }

    /// Total token length.
    pub fn token_len(&self) -> usize {
        self.token_len
    }

    pub fn signature_len(&self) -> usize {
        self.token_len - self.common_len
    }

    /// Create a fresh token signed with `key`.
    ///
    /// Every call draws a new nonce, so two tokens for the same key are
    /// independent values.
    pub fn sign(&self, key: &[u8]) -> String {
        let nonce = self.nonce();
        let signature = self.signature(key, &nonce);

        let mut token = nonce;
        token.push_str(&signature);
        token
    }

    /// Check that `token` was produced by [`sign`](Self::sign) with `key`.
    ///
    /// Malformed input (wrong length, characters outside the base64url
    /// alphabet) is rejected without panicking.
    pub fn verify(&self, key: &[u8], token: &str) -> bool {
        if token.len() != self.token_len || !token.bytes().all(is_token_byte) {
            return false;
        }

        let (nonce, signature) = token.split_at(self.common_len);
        let expected = self.signature(key, nonce);

        timing_safe_eq(signature.as_bytes(), expected.as_bytes())
    }

    fn nonce(&self) -> String {
        let mut bytes = vec![0u8; (self.common_len * 3).div_ceil(4)];
        OsRng.fill_bytes(&mut bytes);

        let mut nonce = URL_SAFE_NO_PAD.encode(&bytes);
        nonce.truncate(self.common_len);
        nonce
    }

    fn signature(&self, key: &[u8], nonce: &str) -> String {
        let mut signature = URL_SAFE_NO_PAD.encode(self.digest.mac(key, nonce.as_bytes()));
        signature.truncate(self.signature_len());
        signature
    }
}

impl Default for TokenCodec {
    fn default() -> Self {
        let options = TokenOptions::default();
        Self {
            digest: options.digest,
            common_len: options.common_len,
            token_len: options.token_len,
        }
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
