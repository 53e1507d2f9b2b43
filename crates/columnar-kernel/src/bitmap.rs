#![forbid(unsafe_code)]

/// A compact bit vector used for row validity.
///
/// Bits are stored little-endian within each `u64` word:
/// - bit 0 is the LSB of word 0
/// - bit 63 is the MSB of word 0
///
/// Bits past `len` are always zero, so word-level popcounts stay exact after
/// truncation and removal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitVec {
    words: Vec<u64>,
    len: usize,
    ones: usize,
}

impl BitVec {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_capacity_bits(bits: usize) -> Self {
        Self {
            words: Vec::with_capacity(bits.div_ceil(64)),
            len: 0,
            ones: 0,
        }
    }

    pub fn with_len_all_true(bits: usize) -> Self {
        if bits == 0 {
            return Self::new();
        }

        let mut words = vec![u64::MAX; bits.div_ceil(64)];
        let rem = bits % 64;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last = (1u64 << rem) - 1;
            }
        }

        Self {
            words,
            len: bits,
            ones: bits,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, value: bool) {
        let bit = self.len % 64;
        if bit == 0 {
            self.words.push(0);
        }

        if value {
            self.words[self.len / 64] |= 1u64 << bit;
            self.ones += 1;
        }

        self.len += 1;
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word = self.words[index / 64];
        ((word >> (index % 64)) & 1) == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len, "BitVec index out of bounds");
        let word_idx = index / 64;
        let mask = 1u64 << (index % 64);
        let was_set = (self.words[word_idx] & mask) != 0;

        match (was_set, value) {
            (true, false) => {
                self.words[word_idx] &= !mask;
                self.ones -= 1;
            }
            (false, true) => {
                self.words[word_idx] |= mask;
                self.ones += 1;
            }
            _ => {}
        }
    }

    /// Inserts `value` at `index`, shifting every later bit one place up.
    pub fn insert(&mut self, index: usize, value: bool) {
        assert!(index <= self.len, "BitVec insert index out of bounds");
        self.push(false);
        let mut i = self.len - 1;
        while i > index {
            let prev = self.get(i - 1);
            self.set(i, prev);
            i -= 1;
        }
        self.set(index, value);
    }

    /// Removes the bit at `index`, shifting every later bit one place down.
    pub fn remove(&mut self, index: usize) -> bool {
        assert!(index < self.len, "BitVec remove index out of bounds");
        let removed = self.get(index);
        for i in index..self.len - 1 {
            let next = self.get(i + 1);
            self.set(i, next);
        }
        self.truncate(self.len - 1);
        removed
    }

    /// Removes the bits in `[from, to)`.
    pub fn remove_range(&mut self, from: usize, to: usize) {
        debug_assert!(from <= to && to <= self.len, "BitVec range out of bounds");
        let count = to - from;
        if count == 0 {
            return;
        }
        for i in from..self.len - count {
            let moved = self.get(i + count);
            self.set(i, moved);
        }
        self.truncate(self.len - count);
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }

        self.words.truncate(len.div_ceil(64));
        let rem = len % 64;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
        self.len = len;
        self.ones = self.words.iter().map(|w| w.count_ones() as usize).sum();
    }

    /// Appends `count` bits copied from `other`, starting at `start`.
    pub fn extend_from(&mut self, other: &BitVec, start: usize, count: usize) {
        debug_assert!(start + count <= other.len, "BitVec source range out of bounds");
        for i in start..start + count {
            self.push(other.get(i));
        }
    }

    pub fn extend_constant(&mut self, value: bool, count: usize) {
        for _ in 0..count {
            self.push(value);
        }
    }

    pub fn count_ones(&self) -> usize {
        self.ones
    }

    pub fn count_zeros(&self) -> usize {
        self.len - self.ones
    }

    pub fn all_true(&self) -> bool {
        self.ones == self.len
    }

    /// Iterates the indices of set bits in increasing order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| {
                let mut rest = word;
                std::iter::from_fn(move || {
                    if rest == 0 {
                        return None;
                    }
                    let bit = rest.trailing_zeros() as usize;
                    rest &= rest - 1;
                    Some(word_idx * 64 + bit)
                })
            })
    }

    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Reconstruct a [`BitVec`] from a raw word buffer and a bit length.
    ///
    /// Used by the column codec, which stores the `u64` words directly instead of
    /// rebuilding the map bit by bit. Stray bits past `len` are cleared.
    pub fn from_words(mut words: Vec<u64>, len: usize) -> Self {
        words.resize(len.div_ceil(64), 0);
        let rem = len % 64;
        if rem != 0 {
            if let Some(last) = words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
        let ones = words.iter().map(|w| w.count_ones() as usize).sum();
        Self { words, len, ones }
    }
}

impl Default for BitVec {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut bits = BitVec::with_capacity_bits(iter.size_hint().0);
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(v: &BitVec) -> Vec<bool> {
        (0..v.len()).map(|i| v.get(i)).collect()
    }

    #[test]
    fn insert_and_remove_shift_across_word_boundaries() {
        let mut v: BitVec = (0..70).map(|i| i % 3 == 0).collect();
        let before = bits(&v);

        v.insert(1, true);
        assert_eq!(v.len(), 71);
        assert!(v.get(1));
        assert_eq!(bits(&v)[2..], before[1..]);

        assert!(v.remove(1));
        assert_eq!(bits(&v), before);
        assert_eq!(v.count_ones(), before.iter().filter(|b| **b).count());
    }

    #[test]
    fn truncate_clears_trailing_bits() {
        let mut v = BitVec::with_len_all_true(130);
        v.truncate(65);
        assert_eq!(v.len(), 65);
        assert_eq!(v.count_ones(), 65);
        v.push(false);
        assert!(!v.get(65));
        assert_eq!(v.as_words().len(), 2);
    }

    #[test]
    fn remove_range_and_iter_ones() {
        let mut v: BitVec = [true, false, true, true, false, true].into_iter().collect();
        v.remove_range(1, 3);
        assert_eq!(bits(&v), vec![true, true, false, true]);
        assert_eq!(v.iter_ones().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert_eq!(v.count_zeros(), 1);
    }

    #[test]
    fn from_words_masks_stray_bits() {
        let v = BitVec::from_words(vec![u64::MAX], 3);
        assert_eq!(v.count_ones(), 3);
        assert_eq!(v.as_words(), &[0b111]);
    }
}
