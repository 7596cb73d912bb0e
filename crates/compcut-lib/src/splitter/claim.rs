//! Speculative vertex claims for the randomized strategies
//!
//! A randomized strategy grows a candidate component by claiming vertices
//! one by one, then either keeps it or gives every vertex back. Claims live
//! either in the index itself (sign flip) or in a separate flag map that
//! leaves the index untouched. [`grow_bfs`] and [`release_all`] are the only
//! places where a candidate is built or abandoned.

use crate::component::ConnectedComponent;
use crate::index::VertexIndex;
use crate::neighbors::{degree, possible_neighbours, Adjacency};
use ahash::AHashMap;
use std::collections::VecDeque;

/// Claim bookkeeping over a vertex index
pub(crate) trait ClaimTracker {
    /// The underlying index (for frequencies and degrees)
    fn index(&self) -> &VertexIndex;

    /// Whether `code` is present and not claimed
    fn is_free(&self, code: u64) -> bool;

    /// Claim a free vertex, returning its frequency
    fn claim(&mut self, code: u64) -> Option<u16>;

    /// Give a claimed vertex back
    fn release(&mut self, code: u64);

    /// Number of free vertices
    fn free_count(&self) -> usize;

    /// Codes that can seed a component
    fn free_codes(&self) -> Vec<u64> {
        self.index()
            .codes()
            .into_iter()
            .filter(|&code| self.is_free(code))
            .collect()
    }
}

/// Claims recorded by flipping the counter sign in the index
pub(crate) struct SignFlipClaims<'a> {
    index: &'a mut VertexIndex,
}

impl<'a> SignFlipClaims<'a> {
    pub(crate) fn new(index: &'a mut VertexIndex) -> Self {
        Self { index }
    }
}

impl ClaimTracker for SignFlipClaims<'_> {
    fn index(&self) -> &VertexIndex {
        self.index
    }

    #[inline]
    fn is_free(&self, code: u64) -> bool {
        self.index.is_unvisited(code)
    }

    #[inline]
    fn claim(&mut self, code: u64) -> Option<u16> {
        self.index.mark_visited(code)
    }

    #[inline]
    fn release(&mut self, code: u64) {
        self.index.release(code);
    }

    fn free_count(&self) -> usize {
        self.index.count_unvisited()
    }
}

/// Claims recorded in a flag map next to a read-only index
pub(crate) struct FlagMapClaims<'a> {
    index: &'a VertexIndex,
    used: AHashMap<u64, bool>,
    free: usize,
}

impl<'a> FlagMapClaims<'a> {
    pub(crate) fn new(index: &'a VertexIndex) -> Self {
        let used: AHashMap<u64, bool> = index
            .iter()
            .filter(|&(_, counter)| counter > 0)
            .map(|(code, _)| (code, false))
            .collect();
        let free = used.len();
        Self { index, used, free }
    }
}

impl ClaimTracker for FlagMapClaims<'_> {
    fn index(&self) -> &VertexIndex {
        self.index
    }

    #[inline]
    fn is_free(&self, code: u64) -> bool {
        self.used.get(&code) == Some(&false)
    }

    #[inline]
    fn claim(&mut self, code: u64) -> Option<u16> {
        match self.used.get_mut(&code) {
            Some(flag) if !*flag => {
                *flag = true;
                self.free -= 1;
                Some(self.index.frequency(code))
            }
            _ => None,
        }
    }

    #[inline]
    fn release(&mut self, code: u64) {
        if let Some(flag) = self.used.get_mut(&code) {
            if *flag {
                *flag = false;
                self.free += 1;
            }
        }
    }

    fn free_count(&self) -> usize {
        self.free
    }

    fn free_codes(&self) -> Vec<u64> {
        self.used
            .iter()
            .filter(|&(_, &used)| !used)
            .map(|(&code, _)| code)
            .collect()
    }
}

/// How far a BFS may grow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Growth {
    /// Stop once the component holds this many vertices
    Capped(u64),
    /// Run to the natural closure of the component
    Closure,
    /// Run to closure, but once the component holds at least this many
    /// vertices stop expanding through branching vertices (degree >= 3)
    BranchStop(u64),
}

/// Grow a component from `seed` by BFS over free vertices
///
/// Every returned member stays claimed. Vertices claimed for the frontier
/// but not added are released before returning. Returns an empty component
/// if the seed is not free.
pub(crate) fn grow_bfs<C: ClaimTracker>(
    claims: &mut C,
    seed: u64,
    k: usize,
    adjacency: Adjacency,
    growth: Growth,
) -> ConnectedComponent {
    let mut component = ConnectedComponent::new(0);
    let Some(frequency) = claims.claim(seed) else {
        return component;
    };
    let mut queue = VecDeque::new();
    queue.push_back((seed, frequency));

    while let Some((kmer, frequency)) = queue.pop_front() {
        if let Growth::Capped(max_size) = growth {
            if component.size >= max_size {
                claims.release(kmer);
                break;
            }
        }
        component.add(kmer, frequency as u64);

        if let Growth::BranchStop(max_size) = growth {
            if component.size >= max_size && degree(claims.index(), kmer, k, adjacency) >= 3 {
                continue;
            }
        }
        for neighbour in possible_neighbours(kmer, k, adjacency) {
            if let Some(frequency) = claims.claim(neighbour) {
                queue.push_back((neighbour, frequency));
            }
        }
    }

    for (kmer, _) in queue {
        claims.release(kmer);
    }
    component
}

/// Give every member of an abandoned component back
pub(crate) fn release_all<C: ClaimTracker>(claims: &mut C, component: &ConnectedComponent) {
    for &kmer in component.members().unwrap_or_default() {
        claims.release(kmer);
    }
}
