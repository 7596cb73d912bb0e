//! Sequence-seeded splitting
//!
//! Each precomputed sequence (typically an assembled contig) first claims
//! its own k-mers as one component. The vertices no sequence claimed are
//! then split by random BFS that stops expanding branching vertices once the
//! component reached the maximum size.

use super::claim::{release_all, ClaimTracker, FlagMapClaims, Growth};
use super::random::split_random_bfs;
use super::SplitConfiguration;
use crate::component::ConnectedComponent;
use crate::index::VertexIndex;
use crate::kmer::KmerIter;
use crate::neighbors::Adjacency;
use rand::Rng;
use tracing::{debug, info, warn};

/// Per-run counters of the sequence phase
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeedingStatistics {
    /// Components formed from sequences
    pub kept: u64,
    /// Sequences whose component was below the minimum size
    pub dropped: u64,
    /// K-mers already claimed by an earlier sequence (or earlier in the same one)
    pub collisions: u64,
    /// K-mers not present in the index
    pub missing: u64,
}

/// Form one component per sequence from its unclaimed k-mers
fn components_from_sequences<C: ClaimTracker>(
    claims: &mut C,
    sequences: &[Vec<u8>],
    config: &SplitConfiguration,
) -> (Vec<ConnectedComponent>, SeedingStatistics) {
    let canonical = config.adjacency == Adjacency::Canonical;
    let mut components = Vec::new();
    let mut stats = SeedingStatistics::default();

    for (i, sequence) in sequences.iter().enumerate() {
        let mut component = ConnectedComponent::new(0);
        for kmer in KmerIter::new(sequence, config.k, canonical) {
            match claims.claim(kmer) {
                Some(frequency) => component.add(kmer, frequency as u64),
                None if claims.index().contains(kmer) => stats.collisions += 1,
                None => stats.missing += 1,
            }
        }
        debug!(
            "Sequence {}: length {}, {} new kmers",
            i + 1,
            sequence.len(),
            component.size
        );

        if component.size >= config.min_size {
            stats.kept += 1;
            components.push(component);
        } else {
            stats.dropped += 1;
            release_all(claims, &component);
        }
    }
    (components, stats)
}

/// Partition `index` starting from `sequences`
///
/// The index itself is left untouched; claims are kept in a flag map.
pub(crate) fn split_seeded<R: Rng>(
    index: &VertexIndex,
    sequences: &[Vec<u8>],
    config: &SplitConfiguration,
    rng: &mut R,
) -> Vec<ConnectedComponent> {
    let mut claims = FlagMapClaims::new(index);

    info!("Forming components from {} sequences", sequences.len());
    let (mut components, stats) = components_from_sequences(&mut claims, sequences, config);
    info!(
        "Kept {} sequence components, dropped {} below the minimum size",
        stats.kept, stats.dropped
    );
    if stats.collisions > 0 {
        warn!(
            "Found {} kmers that were already claimed by an earlier sequence",
            stats.collisions
        );
    }
    if stats.missing > 0 {
        debug!("{} sequence kmers are not in the index", stats.missing);
    }

    info!("Splitting {} residual kmers", claims.free_count());
    let residual = split_random_bfs(
        &mut claims,
        config,
        Growth::BranchStop(config.max_size),
        rng,
    );
    components.extend(residual);
    components
}
