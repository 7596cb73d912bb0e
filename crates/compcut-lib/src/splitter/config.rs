//! Split configuration
//!
//! Parameters shared by every splitting strategy: k, the component size
//! bounds, worker count and the strategy selection itself.

use crate::constants::{
    is_valid_k, DEFAULT_MAX_COMPONENT_SIZE, DEFAULT_MIN_COMPONENT_SIZE, MAX_K, MIN_K,
};
use crate::neighbors::Adjacency;
use std::path::PathBuf;

/// Component splitting algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Full BFS partition, oversized components refined recursively at
    /// increasing frequency thresholds on a worker pool
    #[default]
    RecursiveThreshold,
    /// Random free vertices grouped into components of a random target size
    /// (no connectivity), visited state kept in the index
    RandomGroup,
    /// BFS from random seeds stopped at the maximum size, visited state kept
    /// in a separate flag map
    RandomBfsGroup,
    /// BFS from random seeds run to closure, components outside the bounds
    /// released; separate flag map
    RandomBfsClosure,
    /// BFS from random seeds stopped at the maximum size, visited state kept
    /// in the index
    RandomBfs,
    /// Components formed from precomputed sequences first, the rest by
    /// random BFS that stops expanding branching vertices once large
    SequenceSeeded,
}

impl SplitStrategy {
    /// Strategy for a numeric algorithm id (0 = default)
    pub fn from_alg(alg: u8) -> Option<Self> {
        match alg {
            0 => Some(SplitStrategy::RecursiveThreshold),
            1 => Some(SplitStrategy::RandomGroup),
            2 => Some(SplitStrategy::RandomBfsGroup),
            3 => Some(SplitStrategy::RandomBfsClosure),
            4 => Some(SplitStrategy::RandomBfs),
            5 => Some(SplitStrategy::SequenceSeeded),
            _ => None,
        }
    }

    /// Numeric algorithm id
    pub fn alg(self) -> u8 {
        match self {
            SplitStrategy::RecursiveThreshold => 0,
            SplitStrategy::RandomGroup => 1,
            SplitStrategy::RandomBfsGroup => 2,
            SplitStrategy::RandomBfsClosure => 3,
            SplitStrategy::RandomBfs => 4,
            SplitStrategy::SequenceSeeded => 5,
        }
    }

    /// Whether the strategy needs precomputed sequences
    pub fn needs_sequences(self) -> bool {
        matches!(self, SplitStrategy::SequenceSeeded)
    }

    /// Whether the strategy draws random seeds
    pub fn is_randomized(self) -> bool {
        !matches!(self, SplitStrategy::RecursiveThreshold)
    }
}

/// Configuration parameters for splitting a vertex index into components
#[derive(Debug, Clone)]
pub struct SplitConfiguration {
    /// K-mer length (1..=31)
    pub k: usize,

    /// Minimum component size (in k-mers)
    pub min_size: u64,

    /// Maximum component size (in k-mers)
    pub max_size: u64,

    /// Number of refinement workers (0 = all available cores)
    pub num_threads: usize,

    /// Splitting algorithm
    pub strategy: SplitStrategy,

    /// Orientation convention of the codes in the index
    pub adjacency: Adjacency,

    /// RNG seed for the randomized strategies (`None` = entropy)
    pub seed: Option<u64>,

    /// Where the default strategy writes its statistics table
    pub stats_path: Option<PathBuf>,
}

impl Default for SplitConfiguration {
    fn default() -> Self {
        Self {
            k: 31,
            min_size: DEFAULT_MIN_COMPONENT_SIZE,
            max_size: DEFAULT_MAX_COMPONENT_SIZE,
            num_threads: 0,
            strategy: SplitStrategy::default(),
            adjacency: Adjacency::default(),
            seed: None,
            stats_path: None,
        }
    }
}

impl SplitConfiguration {
    /// Create a configuration with the given k and size bounds
    pub fn new(k: usize, min_size: u64, max_size: u64) -> Result<Self, String> {
        let config = Self {
            k,
            min_size,
            max_size,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Select the strategy
    pub fn with_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the number of refinement workers
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the adjacency convention
    pub fn with_adjacency(mut self, adjacency: Adjacency) -> Self {
        self.adjacency = adjacency;
        self
    }

    /// Write the statistics table to `path`
    pub fn with_stats_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stats_path = Some(path.into());
        self
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_k(self.k) {
            return Err(format!(
                "k must be in range [{}, {}], got k={}",
                MIN_K, MAX_K, self.k
            ));
        }
        if self.min_size == 0 {
            return Err("minimum component size must be positive".to_string());
        }
        if self.min_size > self.max_size {
            return Err(format!(
                "minimum component size {} exceeds maximum {}",
                self.min_size, self.max_size
            ));
        }
        Ok(())
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Split Configuration:");
        tracing::info!("  k = {}", self.k);
        tracing::info!("  component size bounds = [{}, {}]", self.min_size, self.max_size);
        tracing::info!("  strategy = {:?} (alg {})", self.strategy, self.strategy.alg());
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::debug!("  adjacency = {:?}", self.adjacency);
        tracing::debug!("  seed = {:?}", self.seed);
        tracing::debug!("  stats_path = {:?}", self.stats_path);
    }
}
