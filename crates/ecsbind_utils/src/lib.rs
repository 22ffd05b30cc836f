//! Various utilities shared by the ecsbind crates

pub mod fnv1a;
pub use fnv1a::fnv1a_hash;
pub use fnv1a::Fnv1a;

mod result_ext;
pub use result_ext::AnyhowResultExt;

mod elapsed;
pub use elapsed::ElapsedDisplay;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;

/// Shorthand for `Ok(())`, cause it looks ugly
pub const fn ok<E>() -> Result<(), E> {
    Ok(())
}

/// Number of `u64` words needed to hold `bits` bits.
///
/// ```
/// use ecsbind_utils::words_for_bits;
/// assert_eq!(words_for_bits(0), 0);
/// assert_eq!(words_for_bits(1), 1);
/// assert_eq!(words_for_bits(64), 1);
/// assert_eq!(words_for_bits(65), 2);
/// ```
pub const fn words_for_bits(bits: usize) -> usize {
    (bits + 63) / 64
}
