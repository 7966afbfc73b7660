//! Constant-time comparison for secret-derived material.

use subtle::{Choice, ConstantTimeEq};

/// Compare two byte strings in constant time.
///
/// Runs over the length of the longer input and never exits early, so the
/// timing does not reveal the position of the first mismatching byte or
/// which of the inputs is shorter.
///
/// # Examples
///
/// ```
/// use signet_csrf::compare::timing_safe_eq;
///
/// assert!(timing_safe_eq(b"abc", b"abc"));
/// assert!(!timing_safe_eq(b"abc", b"abd"));
/// assert!(!timing_safe_eq(b"abc", b"abcd"));
/// ```
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut equal: Choice = (a.len() as u64).ct_eq(&(b.len() as u64));

    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        equal &= x.ct_eq(&y);
    }

    equal.into()
}
