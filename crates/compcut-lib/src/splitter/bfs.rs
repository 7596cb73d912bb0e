//! Breadth-first partition of a whole vertex index
//!
//! Visits every unvisited vertex of the index, marking vertices visited in
//! place. Assumes exclusive access to the index for the whole pass.
//!
//! The counters are rewritten while the keys are walked, so the pass starts
//! from a snapshot of the keys: 8 bytes per vertex on top of the index for
//! the duration of the pass.

use crate::component::ConnectedComponent;
use crate::index::VertexIndex;
use crate::neighbors::{possible_neighbours, Adjacency};
use std::collections::VecDeque;

/// Whether a vertex of frequency `frequency` takes part in the round after
/// one run at `threshold`
#[inline]
fn survives(frequency: u16, threshold: u32) -> bool {
    frequency as u32 > threshold
}

/// Build the derived index of an overflowing component from its members
fn derive_index(index: &VertexIndex, members: &[u64], threshold: u32) -> VertexIndex {
    let mut derived = VertexIndex::with_capacity(members.len());
    for &kmer in members {
        let frequency = index.frequency(kmer);
        if survives(frequency, threshold) {
            derived.insert(kmer, frequency as u64);
        }
    }
    derived
}

/// Split the whole index into connected components
///
/// Every vertex with a positive counter ends up in exactly one returned
/// component. Components larger than `max_size` come back overflowed, with
/// a derived index of their vertices whose frequency exceeds `threshold`.
pub fn find_all_components(
    index: &mut VertexIndex,
    k: usize,
    adjacency: Adjacency,
    max_size: u64,
    threshold: u32,
) -> Vec<ConnectedComponent> {
    let mut components = Vec::new();
    let mut queue = VecDeque::with_capacity((index.len() / 2).min(1 << 16));

    for start in index.codes() {
        if index.is_unvisited(start) {
            components.push(bfs(index, start, &mut queue, k, adjacency, max_size, threshold));
        }
    }
    components
}

/// Traverse the component containing `start`
///
/// Members are stored while the component has at most `max_size` vertices;
/// past that the traversal only counts and fills the derived index.
pub fn bfs(
    index: &mut VertexIndex,
    start: u64,
    queue: &mut VecDeque<u64>,
    k: usize,
    adjacency: Adjacency,
    max_size: u64,
    threshold: u32,
) -> ConnectedComponent {
    let mut component = ConnectedComponent::new(threshold);
    queue.clear();

    let Some(frequency) = index.mark_visited(start) else {
        return component;
    };
    queue.push_back(start);
    component.add(start, frequency as u64);

    while let Some(kmer) = queue.pop_front() {
        for neighbour in possible_neighbours(kmer, k, adjacency) {
            let Some(frequency) = index.mark_visited(neighbour) else {
                continue;
            };
            queue.push_back(neighbour);
            component.add(neighbour, frequency as u64);

            if let Some(derived) = component.derived_index_mut() {
                if survives(frequency, threshold) {
                    derived.insert(neighbour, frequency as u64);
                }
            } else if component.size > max_size {
                let derived =
                    derive_index(index, component.members().unwrap_or_default(), threshold);
                component.overflow(derived);
            }
        }
    }
    component
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::kmers_of;

    fn chain_index(seq: &[u8], k: usize, frequency: u64) -> VertexIndex {
        kmers_of(seq, k).map(|c| (c, frequency)).collect()
    }

    #[test]
    fn test_single_chain() {
        let k = 5;
        let seq = b"ACGTTGCAAT"; // 6 distinct 5-mers
        let mut index = chain_index(seq, k, 2);

        let comps = find_all_components(&mut index, k, Adjacency::Directed, 100, 1);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].size, 6);
        assert_eq!(comps[0].weight, 12);
        assert_eq!(comps[0].used_freq_threshold, 1);
        assert!(!comps[0].is_overflowed());
        assert_eq!(index.count_unvisited(), 0);
    }

    #[test]
    fn test_disjoint_chains_cover_index() {
        let k = 5;
        let mut index = chain_index(b"ACGTTGCAAT", k, 1);
        for code in kmers_of(b"GGATCCTAGAG", k) {
            index.insert(code, 3);
        }
        let all: std::collections::BTreeSet<u64> = index.codes().into_iter().collect();

        let comps = find_all_components(&mut index, k, Adjacency::Directed, 100, 1);
        let mut sizes: Vec<u64> = comps.iter().map(|c| c.size).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![6, 7]);

        let covered: std::collections::BTreeSet<u64> = comps
            .iter()
            .flat_map(|c| c.members().unwrap().iter().copied())
            .collect();
        assert_eq!(covered, all);
        assert_eq!(comps.iter().map(|c| c.weight).sum::<u64>(), 6 + 7 * 3);
    }

    #[test]
    fn test_overflow_builds_derived_index() {
        let k = 5;
        let seq = b"ACGTTGCAAT";
        let mut index = chain_index(seq, k, 1);
        // Two vertices survive the next round
        let kmers: Vec<u64> = kmers_of(seq, k).collect();
        index.insert(kmers[0], 3);
        index.insert(kmers[5], 2);

        let comps = find_all_components(&mut index, k, Adjacency::Directed, 3, 1);
        assert_eq!(comps.len(), 1);
        let comp = &comps[0];
        assert_eq!(comp.size, 6);
        assert_eq!(comp.weight, 3 + 2 + 4);
        assert!(comp.members().is_none());

        let derived = comp.derived_index().unwrap();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived.frequency(kmers[0]), 3);
        assert_eq!(derived.frequency(kmers[5]), 2);
        assert!(derived.is_unvisited(kmers[0]));
    }

    #[test]
    fn test_visited_vertices_are_not_restarted() {
        let k = 5;
        let mut index = chain_index(b"ACGTTGCAAT", k, 1);
        let first = index.codes()[0];
        index.mark_visited(first);

        let mut queue = VecDeque::new();
        let comp = bfs(&mut index, first, &mut queue, k, Adjacency::Directed, 10, 1);
        assert_eq!(comp.size, 0);
    }
}
