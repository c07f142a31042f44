//! Jenkins one-at-a-time hash.

/// Hash a record name.
///
/// Bit-exact with the classic one-at-a-time mix over the name's bytes,
/// using wrapping 32-bit arithmetic.
///
/// # Example
/// ```
/// use turnkv::store::one_at_a_time;
///
/// assert_eq!(one_at_a_time("a"), 0xca2e_9442);
/// ```
pub fn one_at_a_time(name: &str) -> u32 {
    let mut hash: u32 = 0;

    for &byte in name.as_bytes() {
        hash = hash.wrapping_add(u32::from(byte));
        hash = hash.wrapping_add(hash << 10);
        hash ^= hash >> 6;
    }

    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}
