//! Component splitting
//!
//! Partitions the vertex index into connected components whose sizes fall
//! within configured bounds. The default strategy refines oversized
//! components by raising a frequency threshold; the randomized strategies
//! grow components from random seeds; the sequence-seeded strategy starts
//! from precomputed sequences.

mod bfs;
mod claim;
mod config;
mod random;
mod recursive;
mod seeded;

pub use bfs::{bfs, find_all_components};
pub use config::{SplitConfiguration, SplitStrategy};

use crate::component::{assign_ids, sort_by_significance, ConnectedComponent};
use crate::index::VertexIndex;
use claim::{FlagMapClaims, Growth, SignFlipClaims};
use std::io;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors that stop a split before or while it runs
#[derive(Debug, Error)]
pub enum SplitError {
    /// The index holds no vertex to split
    #[error("vertex index is empty; nothing to split")]
    EmptyIndex,

    /// The sequence-seeded strategy was selected without sequences
    #[error("the sequence-seeded strategy needs a set of sequences")]
    MissingSequences,

    /// Configuration rejected by validation
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The refinement worker pool could not be built
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Size class of a component against the configured bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    /// Below the minimum size: discarded
    TooSmall,
    /// Within bounds: kept
    Good,
    /// Above the maximum size: refined further
    TooBig,
}

impl SizeClass {
    /// Classify a component size
    pub fn of(size: u64, config: &SplitConfiguration) -> Self {
        if size < config.min_size {
            SizeClass::TooSmall
        } else if size > config.max_size {
            SizeClass::TooBig
        } else {
            SizeClass::Good
        }
    }
}

/// Split `index` into components using the configured strategy
///
/// The index is consumed: the splitter marks vertices visited in place.
/// `sequences` are only used by [`SplitStrategy::SequenceSeeded`]. The
/// default strategy returns components sorted by significance; the others
/// return them in the order they were formed. Ids are 1-based in the
/// returned order.
pub fn split(
    mut index: VertexIndex,
    sequences: Option<&[Vec<u8>]>,
    config: &SplitConfiguration,
) -> Result<Vec<ConnectedComponent>, SplitError> {
    config.validate().map_err(SplitError::InvalidConfiguration)?;
    if config.strategy.needs_sequences() && sequences.is_none() {
        return Err(SplitError::MissingSequences);
    }
    if index.count_unvisited() == 0 {
        return Err(SplitError::EmptyIndex);
    }
    config.print();
    info!(
        "Splitting {} kmers of total weight {}",
        index.len(),
        index.total_frequency()
    );

    let start = Instant::now();
    let mut rng = random::make_rng(config.seed);
    let mut components = match config.strategy {
        SplitStrategy::RecursiveThreshold => return recursive::split_recursive(index, config),
        SplitStrategy::RandomGroup => {
            random::split_random_groups(&mut SignFlipClaims::new(&mut index), config, &mut rng)
        }
        SplitStrategy::RandomBfsGroup => random::split_random_bfs(
            &mut FlagMapClaims::new(&index),
            config,
            Growth::Capped(config.max_size),
            &mut rng,
        ),
        SplitStrategy::RandomBfsClosure => random::split_random_bfs(
            &mut FlagMapClaims::new(&index),
            config,
            Growth::Closure,
            &mut rng,
        ),
        SplitStrategy::RandomBfs => random::split_random_bfs(
            &mut SignFlipClaims::new(&mut index),
            config,
            Growth::Capped(config.max_size),
            &mut rng,
        ),
        SplitStrategy::SequenceSeeded => {
            let sequences = sequences.ok_or(SplitError::MissingSequences)?;
            seeded::split_seeded(&index, sequences, config, &mut rng)
        }
    };

    assign_ids(&mut components);
    info!(
        "Formed {} components in {:.2?}",
        components.len(),
        start.elapsed()
    );
    Ok(components)
}

/// Sort components by significance and renumber them
pub fn sort_and_number(components: &mut [ConnectedComponent]) {
    sort_by_significance(components);
    assign_ids(components);
}
