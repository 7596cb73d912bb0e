//! Neighbour generation in the implicit de Bruijn graph
//!
//! Two k-mers are adjacent when the (k-1)-suffix of one equals the
//! (k-1)-prefix of the other. Nothing is materialized: candidates are
//! derived from the code and then looked up in the [`VertexIndex`].

use crate::constants::{kmer_mask, MAX_NEIGHBOURS};
use crate::index::VertexIndex;
use crate::kmer::{canonical, reverse_complement};
use rayon::prelude::*;
use tracing::info;

/// Orientation convention of the codes stored in the index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Adjacency {
    /// Codes are stored as read; neighbours are the 4 right and 4 left
    /// extensions of the code itself
    #[default]
    Directed,
    /// Codes are stored canonicalized; neighbours are the right extensions
    /// of the code and of its reverse complement, canonicalized
    Canonical,
}

/// All candidate neighbours of a code, present in the graph or not
///
/// The result may contain duplicates (and the code itself for
/// homopolymer-like k-mers); callers visiting vertices handle both through
/// the visited state.
#[inline]
pub fn possible_neighbours(code: u64, k: usize, adjacency: Adjacency) -> [u64; MAX_NEIGHBOURS] {
    let mask = kmer_mask(k);
    let shift = 2 * (k - 1);
    let mut out = [0u64; MAX_NEIGHBOURS];
    match adjacency {
        Adjacency::Directed => {
            for nuc in 0..4u64 {
                out[nuc as usize] = ((code << 2) & mask) | nuc;
                out[4 + nuc as usize] = (code >> 2) | (nuc << shift);
            }
        }
        Adjacency::Canonical => {
            let rc = reverse_complement(code, k);
            for nuc in 0..4u64 {
                out[nuc as usize] = canonical(((code << 2) & mask) | nuc, k);
                out[4 + nuc as usize] = canonical(((rc << 2) & mask) | nuc, k);
            }
        }
    }
    out
}

/// Distinct neighbours of a code whose counter is positive
///
/// Only reads the index. Self-loops are not reported.
pub fn neighbours_in_graph(
    index: &VertexIndex,
    code: u64,
    k: usize,
    adjacency: Adjacency,
) -> Vec<u64> {
    let mut out = Vec::with_capacity(MAX_NEIGHBOURS);
    for candidate in possible_neighbours(code, k, adjacency) {
        if candidate != code && !out.contains(&candidate) && index.is_unvisited(candidate) {
            out.push(candidate);
        }
    }
    out
}

/// Distinct present neighbours of a code, visited or not
pub fn degree(index: &VertexIndex, code: u64, k: usize, adjacency: Adjacency) -> usize {
    let mut seen = [0u64; MAX_NEIGHBOURS];
    let mut n = 0;
    for candidate in possible_neighbours(code, k, adjacency) {
        if candidate != code && !seen[..n].contains(&candidate) && index.contains(candidate) {
            seen[n] = candidate;
            n += 1;
        }
    }
    n
}

/// Vertex counts by number of graph neighbours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DegreeCensus {
    /// Vertices without neighbours
    pub solo: u64,
    /// Vertices with exactly one neighbour (path ends)
    pub roots: u64,
    /// Vertices with exactly two neighbours (path interiors)
    pub links: u64,
    /// Vertices with three or more neighbours (branching points)
    pub multi: u64,
}

impl DegreeCensus {
    /// Count vertices of the index by their degree, in parallel
    ///
    /// Walks the index entries directly, without a snapshot of the keys.
    pub fn compute(index: &VertexIndex, k: usize, adjacency: Adjacency) -> Self {
        index
            .iter()
            .par_bridge()
            .filter(|&(_, counter)| counter > 0)
            .map(|(code, _)| {
                let mut census = DegreeCensus::default();
                census.record(neighbours_in_graph(index, code, k, adjacency).len());
                census
            })
            .reduce(DegreeCensus::default, DegreeCensus::combine)
    }

    fn record(&mut self, degree: usize) {
        match degree {
            0 => self.solo += 1,
            1 => self.roots += 1,
            2 => self.links += 1,
            _ => self.multi += 1,
        }
    }

    fn combine(self, other: Self) -> Self {
        Self {
            solo: self.solo + other.solo,
            roots: self.roots + other.roots,
            links: self.links + other.links,
            multi: self.multi + other.multi,
        }
    }

    /// Total number of counted vertices
    pub fn total(&self) -> u64 {
        self.solo + self.roots + self.links + self.multi
    }

    /// Log the census via tracing
    pub fn print_summary(&self) {
        info!(
            "Found {} solo kmers, {} roots, {} links, {} multi kmers",
            self.solo, self.roots, self.links, self.multi
        );
    }
}
