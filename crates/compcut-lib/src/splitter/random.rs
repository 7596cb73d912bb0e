//! Randomized splitting strategies
//!
//! All of them draw seeds from a pool of candidate codes. A seed that turns
//! out to be claimed already is dropped from the pool. A rejected BFS
//! component never hit its cap, so it is a whole connected region of free
//! vertices: its members are released but retired from the pool together,
//! and each region is grown at most once. Every run ends once the pool is
//! exhausted.

use super::claim::{grow_bfs, release_all, ClaimTracker, Growth};
use super::SplitConfiguration;
use crate::component::ConnectedComponent;
use ahash::AHashSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Build the RNG for a run: seeded when reproducibility is requested
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Candidate seed codes, drawn uniformly and removed by swap-removal
///
/// Codes retired in bulk stay in the vector until they are drawn, and are
/// then dropped without being returned.
pub(crate) struct SeedPool {
    codes: Vec<u64>,
    retired: AHashSet<u64>,
}

impl SeedPool {
    /// Codes are sorted so that a seeded RNG gives the same draws whatever
    /// the hash map iteration order was
    pub(crate) fn new(mut codes: Vec<u64>) -> Self {
        codes.sort_unstable();
        Self {
            codes,
            retired: AHashSet::new(),
        }
    }

    /// Draw and remove a random code, `None` once the pool is empty
    pub(crate) fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<u64> {
        while !self.codes.is_empty() {
            let slot = rng.random_range(0..self.codes.len());
            let code = self.codes.swap_remove(slot);
            if !self.retired.remove(&code) {
                return Some(code);
            }
        }
        None
    }

    /// Make sure none of `codes` is drawn again
    pub(crate) fn retire_all(&mut self, codes: &[u64]) {
        self.retired.extend(codes.iter().copied());
    }

    /// Codes left to draw, retired ones included
    pub(crate) fn len(&self) -> usize {
        self.codes.len()
    }
}

/// Whether a grown component is kept
///
/// Branch-stopped growth has no hard cap, so only the minimum applies.
fn accepts(growth: Growth, size: u64, config: &SplitConfiguration) -> bool {
    match growth {
        Growth::BranchStop(_) => size >= config.min_size,
        Growth::Capped(_) | Growth::Closure => {
            size >= config.min_size && size <= config.max_size
        }
    }
}

/// Target size for the next flat group
fn draw_target<R: Rng>(rng: &mut R, config: &SplitConfiguration, remaining: u64) -> u64 {
    let upper = config.max_size.min(remaining);
    rng.random_range(config.min_size..=upper)
}

/// Group random free vertices into components of random target sizes
///
/// Connectivity is ignored. A trailing group smaller than the minimum size
/// is released.
pub(crate) fn split_random_groups<C, R>(
    claims: &mut C,
    config: &SplitConfiguration,
    rng: &mut R,
) -> Vec<ConnectedComponent>
where
    C: ClaimTracker,
    R: Rng,
{
    let mut components = Vec::new();
    let mut remaining = claims.free_count() as u64;
    if remaining < config.min_size {
        info!(
            "Only {} free kmers, fewer than the minimum component size {}",
            remaining, config.min_size
        );
        return components;
    }

    let mut pool = SeedPool::new(claims.free_codes());
    let mut target = draw_target(rng, config, remaining);
    let mut current = ConnectedComponent::new(0);

    while let Some(code) = pool.draw(rng) {
        let Some(frequency) = claims.claim(code) else {
            continue;
        };
        current.add(code, frequency as u64);
        remaining -= 1;

        if current.size == target {
            debug!("Group {} of {} kmers", components.len() + 1, current.size);
            components.push(std::mem::take(&mut current));
            if remaining < config.min_size {
                break;
            }
            target = draw_target(rng, config, remaining);
        }
    }

    if current.size >= config.min_size {
        components.push(current);
    } else {
        release_all(claims, &current);
    }
    components
}

/// Grow components by BFS from random seeds
///
/// Components outside `[min_size, max_size]` are released (only those below
/// `min_size` for [`Growth::BranchStop`]).
pub(crate) fn split_random_bfs<C, R>(
    claims: &mut C,
    config: &SplitConfiguration,
    growth: Growth,
    rng: &mut R,
) -> Vec<ConnectedComponent>
where
    C: ClaimTracker,
    R: Rng,
{
    let mut components = Vec::new();
    let mut pool = SeedPool::new(claims.free_codes());
    let mut rejected = 0u64;
    info!("Drawing seeds from {} free kmers", pool.len());

    while let Some(seed) = pool.draw(rng) {
        if !claims.is_free(seed) {
            continue;
        }
        let component = grow_bfs(claims, seed, config.k, config.adjacency, growth);
        if accepts(growth, component.size, config) {
            debug!(
                "Component {}: {} kmers, weight {}",
                components.len() + 1,
                component.size,
                component.weight
            );
            components.push(component);
        } else {
            rejected += 1;
            release_all(claims, &component);
            pool.retire_all(component.members().unwrap_or_default());
        }
    }

    info!(
        "Kept {} components, rejected {} candidates, {} kmers left unassigned",
        components.len(),
        rejected,
        claims.free_count()
    );
    components
}
