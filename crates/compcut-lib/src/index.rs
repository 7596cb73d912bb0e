//! Vertex index: k-mer code -> signed 16-bit counter
//!
//! The counter doubles as a visited flag while a splitter runs:
//! a positive value is an unvisited vertex with that frequency, a negative
//! value is a visited vertex whose original frequency is the magnitude, and
//! zero (or an absent key) is not part of the working graph. Keys are never
//! removed by the splitters.
//!
//! Callers outside this module go through [`VertexState`] and the
//! `mark_visited` / `release` pair instead of touching the sign directly.

use ahash::AHashMap;

/// Typed view of a vertex counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexState {
    /// Not present (or zero counter)
    Absent,
    /// Present and not yet visited, with its frequency
    Unvisited(u16),
    /// Visited, with its original frequency
    Visited(u16),
}

impl VertexState {
    /// Decode a raw counter
    #[inline]
    pub fn from_counter(counter: i16) -> Self {
        match counter {
            0 => VertexState::Absent,
            c if c > 0 => VertexState::Unvisited(c as u16),
            c => VertexState::Visited(c.unsigned_abs()),
        }
    }

    /// Original frequency, 0 for absent vertices
    #[inline]
    pub fn frequency(self) -> u16 {
        match self {
            VertexState::Absent => 0,
            VertexState::Unvisited(f) | VertexState::Visited(f) => f,
        }
    }

    /// Whether the vertex can still be claimed
    #[inline]
    pub fn is_unvisited(self) -> bool {
        matches!(self, VertexState::Unvisited(_))
    }
}

/// Clamp a frequency into the positive range of the counter
#[inline]
fn clamp_frequency(freq: u64) -> i16 {
    freq.min(i16::MAX as u64) as i16
}

/// Key -> signed counter store over 64-bit k-mer codes
#[derive(Debug, Clone, Default)]
pub struct VertexIndex {
    map: AHashMap<u64, i16>,
}

impl VertexIndex {
    /// Create a fresh, empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with room for `capacity` vertices
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: AHashMap::with_capacity(capacity),
        }
    }

    /// Raw counter of a code, 0 if absent
    #[inline]
    pub fn get(&self, code: u64) -> i16 {
        self.map.get(&code).copied().unwrap_or(0)
    }

    /// Store a raw counter
    #[inline]
    pub fn put(&mut self, code: u64, counter: i16) {
        self.map.insert(code, counter);
    }

    /// Insert an unvisited vertex with the given frequency
    ///
    /// Frequencies above `i16::MAX` are clamped. A zero frequency stores a
    /// zero counter, i.e. the vertex stays out of the working graph.
    #[inline]
    pub fn insert(&mut self, code: u64, frequency: u64) {
        self.map.insert(code, clamp_frequency(frequency));
    }

    /// Add one occurrence of a code (saturating)
    #[inline]
    pub fn increment(&mut self, code: u64) {
        let counter = self.map.entry(code).or_insert(0);
        *counter = counter.saturating_add(1);
    }

    /// Merge another index by summing frequencies (saturating)
    pub fn merge(&mut self, other: VertexIndex) {
        if self.map.is_empty() {
            *self = other;
            return;
        }
        for (code, counter) in other.map {
            let slot = self.map.entry(code).or_insert(0);
            *slot = slot.saturating_add(counter.max(0));
        }
    }

    /// Typed state of a code
    #[inline]
    pub fn state(&self, code: u64) -> VertexState {
        VertexState::from_counter(self.get(code))
    }

    /// Original frequency of a code regardless of visitation, 0 if absent
    #[inline]
    pub fn frequency(&self, code: u64) -> u16 {
        self.state(code).frequency()
    }

    /// Whether the code is present (visited or not)
    #[inline]
    pub fn contains(&self, code: u64) -> bool {
        self.get(code) != 0
    }

    /// Whether the code is present and unvisited
    #[inline]
    pub fn is_unvisited(&self, code: u64) -> bool {
        self.state(code).is_unvisited()
    }

    /// Mark an unvisited vertex as visited
    ///
    /// Returns its frequency, or `None` if the vertex was absent or already
    /// visited (nothing is changed in that case).
    #[inline]
    pub fn mark_visited(&mut self, code: u64) -> Option<u16> {
        match self.map.get_mut(&code) {
            Some(counter) if *counter > 0 => {
                *counter = -*counter;
                Some(counter.unsigned_abs())
            }
            _ => None,
        }
    }

    /// Return a visited vertex to the unvisited pool
    ///
    /// Returns `true` if the vertex was visited before the call.
    #[inline]
    pub fn release(&mut self, code: u64) -> bool {
        match self.map.get_mut(&code) {
            Some(counter) if *counter < 0 => {
                *counter = -*counter;
                true
            }
            _ => false,
        }
    }

    /// Number of stored keys
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether no keys are stored
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterate over `(code, counter)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (u64, i16)> + '_ {
        self.map.iter().map(|(&code, &counter)| (code, counter))
    }

    /// Snapshot of all stored codes
    ///
    /// Allocates 8 bytes per stored key.
    pub fn codes(&self) -> Vec<u64> {
        self.map.keys().copied().collect()
    }

    /// Number of unvisited vertices
    pub fn count_unvisited(&self) -> usize {
        self.map.values().filter(|&&c| c > 0).count()
    }

    /// Sum of the original frequencies of all present vertices
    pub fn total_frequency(&self) -> u64 {
        self.map.values().map(|&c| c.unsigned_abs() as u64).sum()
    }
}

impl FromIterator<(u64, u64)> for VertexIndex {
    fn from_iter<I: IntoIterator<Item = (u64, u64)>>(iter: I) -> Self {
        let mut index = VertexIndex::new();
        for (code, frequency) in iter {
            index.insert(code, frequency);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_decoding() {
        assert_eq!(VertexState::from_counter(0), VertexState::Absent);
        assert_eq!(VertexState::from_counter(5), VertexState::Unvisited(5));
        assert_eq!(VertexState::from_counter(-5), VertexState::Visited(5));
        assert_eq!(VertexState::from_counter(i16::MIN).frequency(), 32768);
    }

    #[test]
    fn test_mark_and_release() {
        let mut index = VertexIndex::new();
        index.insert(7, 3);

        assert!(index.is_unvisited(7));
        assert_eq!(index.mark_visited(7), Some(3));
        assert_eq!(index.state(7), VertexState::Visited(3));
        assert_eq!(index.get(7), -3);
        assert_eq!(index.mark_visited(7), None);
        assert_eq!(index.frequency(7), 3);

        assert!(index.release(7));
        assert_eq!(index.state(7), VertexState::Unvisited(3));
        assert!(!index.release(7));
    }

    #[test]
    fn test_absent_vertices() {
        let mut index = VertexIndex::new();
        assert_eq!(index.get(42), 0);
        assert_eq!(index.state(42), VertexState::Absent);
        assert_eq!(index.mark_visited(42), None);
        assert!(!index.release(42));
        assert!(!index.contains(42));
    }

    #[test]
    fn test_increment_and_clamp() {
        let mut index = VertexIndex::new();
        index.increment(1);
        index.increment(1);
        assert_eq!(index.frequency(1), 2);

        index.insert(2, 1_000_000);
        assert_eq!(index.get(2), i16::MAX);
        index.increment(2);
        assert_eq!(index.get(2), i16::MAX);
    }

    #[test]
    fn test_merge_and_totals() {
        let mut a: VertexIndex = [(1, 2), (2, 3)].into_iter().collect();
        let b: VertexIndex = [(2, 4), (3, 1)].into_iter().collect();
        a.merge(b);

        assert_eq!(a.len(), 3);
        assert_eq!(a.frequency(2), 7);
        assert_eq!(a.total_frequency(), 2 + 7 + 1);

        a.mark_visited(1);
        assert_eq!(a.count_unvisited(), 2);
        assert_eq!(a.total_frequency(), 10);
    }
}
