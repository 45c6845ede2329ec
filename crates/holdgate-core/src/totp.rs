//! Time-based one-time passcode validation (RFC 6238 over RFC 4226).
//!
//! Codes are six decimal digits derived from HMAC-SHA1 over a 30-second time
//! step counter. A submitted code is accepted when it matches the code of the
//! current step or of any step within the tolerance window on either side,
//! which absorbs clock skew between the proxy and the user's authenticator.
//!
//! Everything here is a pure function of its inputs. The caller supplies the
//! wall-clock time, so validation is deterministic under test.

use std::fmt;

use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::error::ConfigError;

type HmacSha1 = Hmac<Sha1>;

/// Length of a time step in seconds.
pub const TIME_STEP_SECS: u64 = 30;

/// Number of decimal digits in a passcode.
pub const CODE_DIGITS: usize = 6;

const CODE_MODULUS: u32 = 1_000_000;

/// Secret shared with the user's authenticator.
///
/// Bytes are wiped from memory when the last copy is dropped. `Debug` never
/// prints them.
#[derive(Clone)]
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    /// Wrap raw secret bytes.
    ///
    /// # Errors
    ///
    /// - `ConfigError::EmptySecret` if `bytes` is empty
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        Ok(Self(Zeroizing::new(bytes)))
    }

    /// Decode the RFC 4648 base32 form authenticator apps display.
    ///
    /// Case-insensitive. Whitespace and `=` padding are ignored; trailing
    /// bits that do not fill a byte are dropped.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidBase32` on a character outside `A-Z2-7`
    /// - `ConfigError::EmptySecret` if nothing decodes
    pub fn from_base32(encoded: &str) -> Result<Self, ConfigError> {
        let mut out = Zeroizing::new(Vec::with_capacity(encoded.len() * 5 / 8));
        let mut acc: u32 = 0;
        let mut bits: u32 = 0;

        for (position, found) in encoded.char_indices() {
            if found.is_whitespace() || found == '=' {
                continue;
            }
            let value = match found.to_ascii_uppercase() {
                c @ 'A'..='Z' => c as u32 - 'A' as u32,
                c @ '2'..='7' => c as u32 - '2' as u32 + 26,
                _ => return Err(ConfigError::InvalidBase32 { found, position }),
            };

            acc = (acc << 5) | value;
            bits += 5;
            if bits >= 8 {
                bits -= 8;
                out.push((acc >> bits) as u8);
                acc &= (1 << bits) - 1;
            }
        }

        Self::from_bytes(std::mem::take(&mut *out))
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<{} bytes redacted>)", self.0.len())
    }
}

/// HOTP value for `counter`, reduced to [`CODE_DIGITS`] digits.
pub fn hotp(secret: &SharedSecret, counter: u64) -> u32 {
    // HMAC accepts keys of any length
    let Ok(mut mac) = HmacSha1::new_from_slice(secret.as_bytes()) else {
        return u32::MAX;
    };
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = usize::from(digest[19] & 0x0f);
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    binary % CODE_MODULUS
}

/// Passcode expected at `unix_time`, zero-padded to six digits.
pub fn expected_code(secret: &SharedSecret, unix_time: u64) -> String {
    format!("{:0width$}", hotp(secret, unix_time / TIME_STEP_SECS), width = CODE_DIGITS)
}

/// Step offset of the window entry that `submitted` matches.
///
/// Returns `Some(0)` for the current step, negative offsets for earlier
/// steps and positive ones for later steps. `None` if no candidate in
/// `[-window, +window]` matches or `submitted` is not six ASCII digits.
pub fn matching_step(
    secret: &SharedSecret,
    window: u32,
    submitted: &str,
    unix_time: u64,
) -> Option<i64> {
    let submitted = submitted.as_bytes();
    if submitted.len() != CODE_DIGITS || !submitted.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let current = unix_time / TIME_STEP_SECS;
    let first = current.saturating_sub(u64::from(window));
    let last = current.saturating_add(u64::from(window));

    let mut matched = None;
    for counter in first..=last {
        let candidate = format!("{:0width$}", hotp(secret, counter), width = CODE_DIGITS);
        // No early exit: every candidate is compared
        if constant_time_eq(candidate.as_bytes(), submitted) && matched.is_none() {
            matched = Some(counter as i64 - current as i64);
        }
    }
    matched
}

/// Whether `submitted` is a valid passcode at `unix_time`.
///
/// Accepts codes of the `2 * window + 1` steps centered on the current step.
pub fn validate(secret: &SharedSecret, window: u32, submitted: &str, unix_time: u64) -> bool {
    matching_step(secret, window, submitted, unix_time).is_some()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
