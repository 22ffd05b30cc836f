pub const FNV_PRIME: u32 = 16777619;
pub const OFFSET_BASIS: u32 = 2166136261;

/// Performs a 32-bit FNV-1a hash over the whole buffer.
///
/// ## Example
/// ```
/// use ecsbind_utils::fnv1a_hash;
///
/// assert_eq!(fnv1a_hash(b""), 0x811c9dc5);
/// assert_eq!(fnv1a_hash(b"a"), 0xe40c292c);
/// ```
pub fn fnv1a_hash(buffer: &[u8]) -> u32 {
    let mut hasher = Fnv1a::new();
    hasher.write(buffer);
    hasher.finish()
}

/// Incremental FNV-1a hasher, for hashing several pieces of data as one stream.
///
/// ## Example
/// ```
/// use ecsbind_utils::{fnv1a_hash, Fnv1a};
///
/// let mut hasher = Fnv1a::new();
/// hasher.write(b"Posi");
/// hasher.write(b"tion");
/// assert_eq!(hasher.finish(), fnv1a_hash(b"Position"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fnv1a(u32);

impl Fnv1a {
    pub const fn new() -> Self {
        Self(OFFSET_BASIS)
    }

    pub fn write(&mut self, buffer: &[u8]) {
        for &byte in buffer {
            self.0 ^= byte as u32;
            self.0 = self.0.wrapping_mul(FNV_PRIME);
        }
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write(&value.to_le_bytes());
    }

    pub const fn finish(&self) -> u32 {
        self.0
    }
}

impl Default for Fnv1a {
    fn default() -> Self {
        Self::new()
    }
}
