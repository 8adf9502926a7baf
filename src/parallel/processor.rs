use anyhow::{Result, anyhow};
use crossbeam::channel::{Receiver, Sender, bounded};

use super::ParallelConfig;

/// Execution strategy: run work items inline or on a bounded worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    Sequential,
    Parallel { workers: usize },
}

impl ExecutionStrategy {
    /// Parallel once the workload reaches `min_items_for_parallel` and more
    /// than one worker is available, sequential otherwise
    pub fn auto(
        work_items_count: usize,
        min_items_for_parallel: usize,
        optimal_workers: usize,
    ) -> Self {
        if work_items_count >= min_items_for_parallel && optimal_workers > 1 {
            ExecutionStrategy::Parallel {
                workers: optimal_workers,
            }
        } else {
            ExecutionStrategy::Sequential
        }
    }

    /// Workers allowed by the CPU count, `thread_percentage` and `max_threads_config` (0 = no limit)
    pub fn calculate_optimal_workers(max_threads_config: usize, thread_percentage: u8) -> usize {
        let available_cores = num_cpus::get();

        let workers_by_percentage =
            std::cmp::max(1, (available_cores * thread_percentage as usize) / 100);

        if max_threads_config > 0 {
            std::cmp::min(max_threads_config, workers_by_percentage)
        } else {
            workers_by_percentage
        }
    }

    /// Strategy for `work_items_count` items under `config`; never more workers than items
    pub fn for_config(config: &ParallelConfig, work_items_count: usize) -> Self {
        let workers =
            Self::calculate_optimal_workers(config.max_threads, config.thread_percentage)
                .min(work_items_count.max(1));
        Self::auto(work_items_count, 2, workers)
    }

    /// Apply `processor` to every item. Results come back in input order
    /// regardless of which worker finished first.
    pub fn execute<T, R, F>(&self, work_items: Vec<T>, processor: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        match self {
            ExecutionStrategy::Sequential => Ok(work_items.into_iter().map(processor).collect()),
            ExecutionStrategy::Parallel { workers } => {
                ParallelProcessor::new(*workers).process(work_items, processor)
            }
        }
    }
}

/// Producer/consumer pool over crossbeam channels, scoped so work items may borrow
pub struct ParallelProcessor {
    max_workers: usize,
}

impl ParallelProcessor {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    pub fn process<T, R, F>(&self, work_items: Vec<T>, processor: F) -> Result<Vec<R>>
    where
        T: Send,
        R: Send,
        F: Fn(T) -> R + Sync,
    {
        let total_items = work_items.len();
        if total_items == 0 {
            return Ok(Vec::new());
        }

        let workers = std::cmp::min(self.max_workers, total_items);
        let buffer_size = workers * 2;
        let (work_tx, work_rx): (Sender<(usize, T)>, Receiver<(usize, T)>) = bounded(buffer_size);
        let (result_tx, result_rx): (Sender<(usize, R)>, Receiver<(usize, R)>) =
            bounded(buffer_size);

        tracing::debug!("Processing {} item(s) on {} worker(s)", total_items, workers);

        let processor = &processor;
        let mut slots: Vec<Option<R>> = (0..total_items).map(|_| None).collect();

        crossbeam::thread::scope(|s| {
            for worker_id in 0..workers {
                let work_rx = work_rx.clone();
                let result_tx = result_tx.clone();

                s.spawn(move |_| {
                    while let Ok((index, work_item)) = work_rx.recv() {
                        tracing::trace!("worker-{} processing item {}", worker_id, index);
                        if result_tx.send((index, processor(work_item))).is_err() {
                            break; // Collector dropped
                        }
                    }
                });
            }

            // Producer thread: send work to workers
            s.spawn(move |_| {
                for indexed in work_items.into_iter().enumerate() {
                    if work_tx.send(indexed).is_err() {
                        break; // Workers dropped
                    }
                }
            });

            // Drop our handles so the result stream ends once the workers do
            drop(work_rx);
            drop(result_tx);

            for (index, result) in result_rx.iter() {
                slots[index] = Some(result);
            }
        })
        .map_err(|_| anyhow!("Thread panic occurred during parallel execution"))?;

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or_else(|| anyhow!("Work item {index} produced no result")))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_sequential_strategy() {
        let results = ExecutionStrategy::Sequential
            .execute(vec![1, 2, 3, 4, 5], |x| x * 2)
            .unwrap();
        assert_eq!(results, vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_parallel_results_keep_input_order() {
        // Earlier items sleep longer so they finish last
        let items: Vec<u64> = (0..8).collect();
        let results = ExecutionStrategy::Parallel { workers: 4 }
            .execute(items, |x| {
                thread::sleep(Duration::from_millis((8 - x) * 5));
                x * 10
            })
            .unwrap();
        assert_eq!(results, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_parallel_over_borrowed_items() {
        let mut counters = vec![0u32; 6];
        let refs: Vec<&mut u32> = counters.iter_mut().collect();

        ParallelProcessor::new(3)
            .process(refs, |counter| *counter += 1)
            .unwrap();

        assert!(counters.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_empty_input() {
        let results: Vec<i32> = ParallelProcessor::new(4).process(Vec::<i32>::new(), |x| x).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_panicking_worker_is_error() {
        let result = ParallelProcessor::new(2).process(vec![1, 2, 3], |x| {
            if x == 2 {
                panic!("boom");
            }
            x
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_auto_strategy() {
        assert_eq!(ExecutionStrategy::auto(5, 10, 8), ExecutionStrategy::Sequential);
        assert_eq!(
            ExecutionStrategy::auto(50, 10, 8),
            ExecutionStrategy::Parallel { workers: 8 }
        );
        assert_eq!(ExecutionStrategy::auto(50, 10, 1), ExecutionStrategy::Sequential);
    }

    #[test]
    fn test_for_config_respects_limits() {
        let config = ParallelConfig {
            max_threads: 1,
            thread_percentage: 100,
        };
        assert_eq!(ExecutionStrategy::for_config(&config, 10), ExecutionStrategy::Sequential);

        let workers = ExecutionStrategy::calculate_optimal_workers(0, 75);
        assert!(workers >= 1);
        assert!(ExecutionStrategy::calculate_optimal_workers(2, 100) <= 2);
    }
}
