//! Recursive threshold splitting (the default strategy)
//!
//! The first pass partitions the whole index by plain connectivity. Every
//! component larger than the maximum size keeps a derived index of its
//! vertices whose frequency exceeds the threshold of its round; those
//! derived indexes are split again on a worker pool, largest first, one
//! threshold higher each time, until every piece is either small enough to
//! keep or too small to matter.

use super::bfs::find_all_components;
use super::{SizeClass, SplitConfiguration, SplitError};
use crate::component::{assign_ids, sort_by_significance, ConnectedComponent};
use crate::constants::INITIAL_FREQ_THRESHOLD;
use crate::index::VertexIndex;
use crate::scheduler::TaskQueue;
use crate::serialization::save_component_stats;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

/// Counts of one pass over a list of components
#[derive(Debug, Default, Clone, Copy)]
struct PassStatistics {
    small: u64,
    small_kmers: u64,
    good: u64,
    good_kmers: u64,
    big: u64,
    big_kmers: u64,
}

impl PassStatistics {
    fn record(&mut self, class: SizeClass, size: u64) {
        match class {
            SizeClass::TooSmall => {
                self.small += 1;
                self.small_kmers += size;
            }
            SizeClass::Good => {
                self.good += 1;
                self.good_kmers += size;
            }
            SizeClass::TooBig => {
                self.big += 1;
                self.big_kmers += size;
            }
        }
    }

    fn components(&self) -> u64 {
        self.small + self.good + self.big
    }

    fn print_summary(&self, total_kmers: u64) {
        let total = self.components();
        info!("Components found: {}", total);
        info!(
            "  small (< min): {} components, {} kmers",
            with_percent(self.small, total),
            with_percent(self.small_kmers, total_kmers)
        );
        info!(
            "  good: {} components, {} kmers",
            with_percent(self.good, total),
            with_percent(self.good_kmers, total_kmers)
        );
        info!(
            "  big (> max): {} components, {} kmers",
            with_percent(self.big, total),
            with_percent(self.big_kmers, total_kmers)
        );
    }
}

fn with_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return format!("{part}");
    }
    format!("{} ({:.1}%)", part, 100.0 * part as f64 / total as f64)
}

/// Partition `index` with the recursive threshold strategy
pub(crate) fn split_recursive(
    mut index: VertexIndex,
    config: &SplitConfiguration,
) -> Result<Vec<ConnectedComponent>, SplitError> {
    let start = Instant::now();
    let total_kmers = index.count_unvisited() as u64;

    info!("First pass at frequency threshold {}", INITIAL_FREQ_THRESHOLD);
    let components = find_all_components(
        &mut index,
        config.k,
        config.adjacency,
        config.max_size,
        INITIAL_FREQ_THRESHOLD,
    );
    drop(index);

    let mut stats = PassStatistics::default();
    let mut answer = Vec::new();
    let mut to_refine = Vec::new();
    for component in components {
        let class = SizeClass::of(component.size, config);
        stats.record(class, component.size);
        match class {
            SizeClass::TooSmall => {}
            SizeClass::Good => answer.push(component),
            SizeClass::TooBig => to_refine.push(component),
        }
    }
    stats.print_summary(total_kmers);
    info!("First pass took {:.2?}", start.elapsed());

    if !to_refine.is_empty() {
        let first_pass_good = answer.len();
        let refine_start = Instant::now();
        info!("Refining {} oversized components", to_refine.len());

        let queue = TaskQueue::new();
        for component in to_refine {
            queue.submit(component.size, component);
        }
        queue.peek_with(|size, component| {
            debug!(
                "Biggest component: {} kmers, {} kept for the next round",
                size,
                component.derived_index().map_or(0, VertexIndex::len)
            )
        });

        let answer_lock = Mutex::new(answer);
        queue
            .run_to_completion(config.num_threads, |component, queue| {
                refine(component, queue, &answer_lock, config)
            })
            .map_err(|e| SplitError::ThreadPool(e.to_string()))?;
        answer = answer_lock
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);

        info!(
            "Refinement added {} components in {:.2?} ({} tasks)",
            answer.len() - first_pass_good,
            refine_start.elapsed(),
            queue.submitted()
        );
    }

    sort_by_significance(&mut answer);
    assign_ids(&mut answer);

    let kept: u64 = answer.iter().map(|c| c.size).sum();
    info!(
        "Kept {} components covering {} kmers in {:.2?}",
        answer.len(),
        with_percent(kept, total_kmers),
        start.elapsed()
    );

    if let Some(path) = &config.stats_path {
        save_component_stats(&answer, path)?;
        info!("Component statistics written to {}", path.display());
    }
    Ok(answer)
}

/// Split one oversized component's derived index at the next threshold
///
/// Good pieces are appended to `answer`; pieces still too large go back to
/// the queue.
fn refine(
    mut component: ConnectedComponent,
    queue: &TaskQueue<ConnectedComponent>,
    answer: &Mutex<Vec<ConnectedComponent>>,
    config: &SplitConfiguration,
) {
    let threshold = component.used_freq_threshold + 1;
    let Some(mut derived) = component.take_derived_index() else {
        return;
    };
    debug!(
        "Refining component of {} kmers at threshold {} ({} vertices left)",
        component.size,
        threshold,
        derived.len()
    );
    drop(component);

    let pieces = find_all_components(
        &mut derived,
        config.k,
        config.adjacency,
        config.max_size,
        threshold,
    );
    drop(derived);

    let mut good = Vec::new();
    for piece in pieces {
        match SizeClass::of(piece.size, config) {
            SizeClass::TooSmall => {}
            SizeClass::Good => good.push(piece),
            SizeClass::TooBig => queue.submit(piece.size, piece),
        }
    }
    if !good.is_empty() {
        answer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(good);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmer::kmers_of;

    #[test]
    fn test_with_percent() {
        assert_eq!(with_percent(1, 4), "1 (25.0%)");
        assert_eq!(with_percent(3, 0), "3");
    }

    #[test]
    fn test_pass_statistics() {
        let mut stats = PassStatistics::default();
        stats.record(SizeClass::TooSmall, 2);
        stats.record(SizeClass::Good, 7);
        stats.record(SizeClass::TooBig, 40);
        stats.record(SizeClass::Good, 5);
        assert_eq!(stats.components(), 4);
        assert_eq!(stats.good, 2);
        assert_eq!(stats.good_kmers, 12);
        assert_eq!(stats.big_kmers, 40);
    }

    #[test]
    fn test_refine_submits_and_collects() {
        let k = 5;
        let seq = b"ACGTTGCAAT";
        let kmers: Vec<u64> = kmers_of(seq, k).collect();
        let mut derived = VertexIndex::new();
        for &kmer in &kmers {
            derived.insert(kmer, 2);
        }

        let mut component = ConnectedComponent::new(1);
        for &kmer in &kmers {
            component.add(kmer, 2);
        }
        component.overflow(derived);

        let config = SplitConfiguration::new(k, 2, 10).unwrap();
        let queue = TaskQueue::new();
        let answer = Mutex::new(Vec::new());
        refine(component, &queue, &answer, &config);

        let answer = answer.into_inner().unwrap();
        assert_eq!(answer.len(), 1);
        assert_eq!(answer[0].size, 6);
        assert_eq!(answer[0].used_freq_threshold, 2);
        assert_eq!(queue.pending(), 0);
    }
}
