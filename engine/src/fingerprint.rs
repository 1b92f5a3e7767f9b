use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

/// Lossless identity of a grid's live cells.
///
/// Bit `i` is set iff interior cell `i` (raster order, `i = y * width + x`)
/// is alive. The value is stored as little-endian 64-bit words, so any grid
/// size is covered without hashing and equality is exact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    words: Vec<u64>,
}

impl Fingerprint {
    /// The all-dead fingerprint.
    pub fn zero() -> Self {
        Self::default()
    }

    /// Builds a fingerprint from little-endian words (word 0 holds bits 0..64).
    ///
    /// Trailing zero words are dropped so that values compare equal regardless
    /// of how many words the caller supplied.
    pub fn from_words(words: &[u64]) -> Self {
        let mut words = words.to_vec();
        while words.last() == Some(&0) {
            words.pop();
        }
        Self { words }
    }

    pub fn from_u128(value: u128) -> Self {
        Self::from_words(&[value as u64, (value >> 64) as u64])
    }

    pub(crate) fn set(&mut self, index: usize) {
        let word = index / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (index % WORD_BITS);
    }

    pub fn bit(&self, index: usize) -> bool {
        self.words
            .get(index / WORD_BITS)
            .is_some_and(|word| *word & (1u64 << (index % WORD_BITS)) != 0)
    }

    /// True for the all-dead universe. Such a fingerprint carries no period
    /// information and callers skip period computation for it.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|word| word.count_ones()).sum()
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }
}

impl fmt::LowerHex for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut iter = self.words.iter().rev().skip_while(|&&word| word == 0);
        match iter.next() {
            None => f.write_str("0"),
            Some(top) => {
                write!(f, "{top:x}")?;
                for word in iter {
                    write!(f, "{word:016x}")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{self:x}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_zero_words_do_not_affect_equality() {
        assert_eq!(Fingerprint::zero(), Fingerprint::from_words(&[0, 0, 0, 0]));
        assert_eq!(Fingerprint::from_u128(7), Fingerprint::from_words(&[7, 0]));
        assert!(Fingerprint::zero().is_zero());
    }

    #[test]
    fn test_set_and_read_bits_across_words() {
        let mut fp = Fingerprint::zero();
        fp.set(0);
        fp.set(63);
        fp.set(64);
        fp.set(255);
        assert!(fp.bit(0) && fp.bit(63) && fp.bit(64) && fp.bit(255));
        assert!(!fp.bit(1) && !fp.bit(300));
        assert_eq!(fp.count_ones(), 4);
    }

    #[test]
    fn test_hex_formatting() {
        assert_eq!(Fingerprint::from_words(&[]).to_string(), "0x0");
        assert_eq!(Fingerprint::from_u128(0xff).to_string(), "0xff");
        assert_eq!(
            format!("{:x}", Fingerprint::from_words(&[1, 2])),
            "20000000000000001"
        );
    }
}
