//! Priority task queue with a bounded worker pool
//!
//! Tasks are kept in a max-heap keyed by a caller-supplied priority (the
//! component size for refinement tasks), so the largest pending task always
//! starts first. Handlers receive the queue itself and may submit new tasks
//! while other workers are running. A run is complete once the heap is empty
//! and no worker is active.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Heap entry: higher priority first, FIFO among equal priorities
struct QueueEntry<T> {
    priority: u64,
    seq: u64,
    task: T,
}

impl<T> PartialEq for QueueEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl<T> Eq for QueueEntry<T> {}

impl<T> PartialOrd for QueueEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for QueueEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState<T> {
    heap: BinaryHeap<QueueEntry<T>>,
    /// Workers currently running a handler
    active: usize,
    /// Monotonic submission counter
    submitted: u64,
    shutdown: bool,
}

/// Thread-safe priority queue of pending tasks
pub struct TaskQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the active-worker count when a handler returns or unwinds
struct ActiveGuard<'a, T> {
    queue: &'a TaskQueue<T>,
}

impl<T> Drop for ActiveGuard<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.queue.shutdown();
        }
        self.queue.task_done();
    }
}

impl<T> TaskQueue<T> {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                heap: BinaryHeap::new(),
                active: 0,
                submitted: 0,
                shutdown: false,
            }),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task; safe to call from worker threads
    ///
    /// Tasks submitted after [`shutdown`](Self::shutdown) are dropped.
    pub fn submit(&self, priority: u64, task: T) {
        let mut state = self.lock();
        if state.shutdown {
            return;
        }
        let seq = state.submitted;
        state.submitted += 1;
        state.heap.push(QueueEntry {
            priority,
            seq,
            task,
        });
        drop(state);
        self.available.notify_one();
    }

    /// Stop handing out tasks and drop everything still pending
    ///
    /// Handlers already running finish normally.
    pub fn shutdown(&self) {
        let mut state = self.lock();
        state.shutdown = true;
        state.heap.clear();
        drop(state);
        self.available.notify_all();
    }

    /// Number of tasks waiting in the heap
    pub fn pending(&self) -> usize {
        self.lock().heap.len()
    }

    /// Number of workers currently running a handler
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Total number of tasks accepted so far
    pub fn submitted(&self) -> u64 {
        self.lock().submitted
    }

    /// Inspect the highest-priority pending task
    pub fn peek_with<R>(&self, f: impl FnOnce(u64, &T) -> R) -> Option<R> {
        let state = self.lock();
        state.heap.peek().map(|entry| f(entry.priority, &entry.task))
    }

    /// Block until a task is available; `None` once the queue is quiescent
    /// (empty heap and no active worker) or shut down
    fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        loop {
            if state.shutdown {
                return None;
            }
            if let Some(entry) = state.heap.pop() {
                state.active += 1;
                return Some(entry.task);
            }
            if state.active == 0 {
                drop(state);
                self.available.notify_all();
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn task_done(&self) {
        let mut state = self.lock();
        state.active -= 1;
        let quiescent = state.active == 0 && state.heap.is_empty();
        drop(state);
        if quiescent {
            self.available.notify_all();
        }
    }

    fn worker_loop<F>(&self, handler: &F)
    where
        F: Fn(T, &TaskQueue<T>),
    {
        while let Some(task) = self.pop() {
            let _guard = ActiveGuard { queue: self };
            handler(task, self);
        }
    }
}

impl<T: Send> TaskQueue<T> {
    /// Run all pending tasks (and the ones they submit) on a pool of
    /// `num_workers` threads (0 = all available cores) and return when the
    /// queue is quiescent
    ///
    /// A panicking handler shuts the queue down; the panic is re-raised
    /// here after the other workers have stopped.
    pub fn run_to_completion<F>(
        &self,
        num_workers: usize,
        handler: F,
    ) -> Result<(), rayon::ThreadPoolBuildError>
    where
        F: Fn(T, &TaskQueue<T>) + Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("compcut-worker-{i}"))
            .build()?;
        let workers = pool.current_num_threads();
        let handler = &handler;
        pool.scope(|scope| {
            for _ in 0..workers {
                scope.spawn(move |_| self.worker_loop(handler));
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    #[test]
    fn test_largest_first_with_single_worker() {
        let queue = TaskQueue::new();
        for size in [5u64, 50, 1, 20, 20] {
            queue.submit(size, size);
        }
        assert_eq!(queue.pending(), 5);
        assert_eq!(queue.peek_with(|p, _| p), Some(50));

        let order = Mutex::new(Vec::new());
        queue
            .run_to_completion(1, |task, _| order.lock().unwrap().push(task))
            .unwrap();
        assert_eq!(order.into_inner().unwrap(), vec![50, 20, 20, 5, 1]);
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.active(), 0);
    }

    #[test]
    fn test_dynamic_submission_runs_everything() {
        // Task n submits two tasks of n - 1: 2^(depth+1) - 1 tasks in total
        let queue = TaskQueue::new();
        queue.submit(6, 6u32);
        let processed = AtomicUsize::new(0);

        queue
            .run_to_completion(4, |depth, queue| {
                processed.fetch_add(1, AtomicOrdering::SeqCst);
                if depth > 0 {
                    queue.submit((depth - 1) as u64, depth - 1);
                    queue.submit((depth - 1) as u64, depth - 1);
                }
            })
            .unwrap();

        assert_eq!(processed.load(AtomicOrdering::SeqCst), 127);
        assert_eq!(queue.submitted(), 127);
    }

    #[test]
    fn test_empty_queue_completes_immediately() {
        let queue: TaskQueue<u8> = TaskQueue::new();
        queue.run_to_completion(3, |_, _| unreachable!()).unwrap();
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_shutdown_drops_pending_tasks() {
        let queue = TaskQueue::new();
        for i in 0..10u64 {
            queue.submit(i, i);
        }
        let processed = AtomicUsize::new(0);
        queue
            .run_to_completion(1, |_, queue| {
                processed.fetch_add(1, AtomicOrdering::SeqCst);
                queue.shutdown();
                queue.submit(100, 100);
            })
            .unwrap();

        assert_eq!(processed.load(AtomicOrdering::SeqCst), 1);
        assert_eq!(queue.pending(), 0);
    }
}
