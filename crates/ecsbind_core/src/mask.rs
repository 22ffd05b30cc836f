//! Multi-word component membership masks

use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::{
    fmt::{self, Write},
    ops::{BitOr, BitOrAssign},
};

pub const WORD_BITS: u32 = u64::BITS;

/// A bit-set over component ordinals, stored as little-endian `u64` words (word 0 holds ordinals
/// 0-63).
///
/// Masks of a single generation run all share one width, but operations accept masks of
/// differing widths and treat missing words as zero.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Mask {
    words: SmallVec<[u64; 2]>,
}

impl Mask {
    /// An all-zero mask `width` words wide.
    pub fn empty(width: usize) -> Self {
        Self {
            words: SmallVec::from_elem(0, width),
        }
    }

    /// A mask with only the ordinal's bit set, at least `width` words wide.
    ///
    /// ```
    /// use ecsbind_core::Mask;
    ///
    /// let mask = Mask::single(65, 2);
    /// assert_eq!(mask.words(), &[0, 0b10]);
    /// assert_eq!(mask.count_ones(), 1);
    /// ```
    pub fn single(ordinal: u32, width: usize) -> Self {
        let mut mask = Self::empty(width);
        mask.set(ordinal);
        mask
    }

    pub fn from_ordinals<I: IntoIterator<Item = u32>>(ordinals: I, width: usize) -> Self {
        let mut mask = Self::empty(width);
        for ordinal in ordinals {
            mask.set(ordinal);
        }
        mask
    }

    pub fn from_words(words: &[u64]) -> Self {
        Self {
            words: SmallVec::from_slice(words),
        }
    }

    /// Width in words.
    pub fn width(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Sets the ordinal's bit, growing the mask if it's too narrow.
    pub fn set(&mut self, ordinal: u32) {
        let (word, bit) = split(ordinal);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << bit;
    }

    pub fn has(&self, ordinal: u32) -> bool {
        let (word, bit) = split(ordinal);
        self.words
            .get(word)
            .map(|&w| (w >> bit) & 1 == 1)
            .unwrap_or(false)
    }

    /// Checks whether every bit of `other` is also set in this mask. This is the runtime's
    /// "entity has everything the system needs" test.
    ///
    /// ```
    /// use ecsbind_core::Mask;
    ///
    /// let entity = Mask::from_ordinals([0, 1, 2], 1);
    /// let system = Mask::from_ordinals([0, 2], 1);
    /// assert!(entity.contains_all(&system));
    /// assert!(!system.contains_all(&entity));
    /// ```
    pub fn contains_all(&self, other: &Mask) -> bool {
        other.words.iter().enumerate().all(|(i, &theirs)| {
            let ours = self.words.get(i).copied().unwrap_or(0);
            ours & theirs == theirs
        })
    }

    /// Whether no bit is set. A zero-width mask is empty too.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Iterates over the set ordinals, in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = u32> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_index, &word)| {
                let base = word_index as u32 * WORD_BITS;
                let mut bits = word;
                std::iter::from_fn(move || {
                    if bits == 0 {
                        return None;
                    }
                    let tz = bits.trailing_zeros();
                    bits &= bits - 1;
                    Some(base + tz)
                })
            })
    }

    /// Widens (or narrows) the mask to exactly `width` words.
    pub fn resize(&mut self, width: usize) {
        self.words.resize(width, 0);
    }

    /// Hex rendering, most significant word first, e.g. `0x5` or `0x1_0000000000000000`.
    pub fn to_hex(&self) -> String {
        let mut text = String::from("0x");
        let mut words = self.words.iter().rev().skip_while(|&&w| w == 0);

        match words.next() {
            Some(top) => write!(text, "{top:x}").unwrap(),
            None => text.push('0'),
        }
        for word in words {
            write!(text, "_{word:016x}").unwrap();
        }
        text
    }
}

const fn split(ordinal: u32) -> (usize, u32) {
    ((ordinal / WORD_BITS) as usize, ordinal % WORD_BITS)
}

impl BitOrAssign<&Mask> for Mask {
    fn bitor_assign(&mut self, rhs: &Mask) {
        if rhs.words.len() > self.words.len() {
            self.words.resize(rhs.words.len(), 0);
        }
        for (ours, &theirs) in self.words.iter_mut().zip(rhs.words.iter()) {
            *ours |= theirs;
        }
    }
}

impl BitOr for &Mask {
    type Output = Mask;

    fn bitor(self, rhs: &Mask) -> Mask {
        let mut result = self.clone();
        result |= rhs;
        result
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask({})", self.to_hex())
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_hex())
    }
}

/// `{:b}` prints the whole mask as one binary number, `{:#b}` adds the `0b` prefix.
impl fmt::Binary for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut digits = String::new();
        let mut words = self.words.iter().rev().skip_while(|&&w| w == 0);

        match words.next() {
            Some(top) => write!(digits, "{top:b}")?,
            None => digits.push('0'),
        }
        for word in words {
            write!(digits, "{word:064b}")?;
        }
        f.pad_integral(true, "0b", &digits)
    }
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
