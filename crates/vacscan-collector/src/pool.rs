//! Bounded, paced worker pool that keeps submission order.

use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs at most `workers` tasks at once over a queue of inputs.
///
/// Each task runs as its own tokio task. Results are stored by input index,
/// so the output order matches the input order whatever the completion order.
/// After every completion the dispatcher waits `pacing` before starting the
/// next queued input; tasks already running are not paused by that wait.
#[derive(Debug, Clone)]
pub struct OrderedPool {
    workers: usize,
    pacing: Duration,
}

impl OrderedPool {
    /// `workers` below 1 is treated as 1.
    #[must_use]
    pub fn new(workers: usize, pacing: Duration) -> Self {
        Self {
            workers: workers.max(1),
            pacing,
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `task` over `inputs`. Slot `i` of the output holds the result for
    /// `inputs[i]`, or `None` if that task panicked.
    pub async fn run<T, R, F, Fut>(&self, inputs: Vec<T>, task: F) -> Vec<Option<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = inputs.len();
        let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
        let mut queue = inputs.into_iter().enumerate().peekable();
        let mut in_flight = FuturesUnordered::new();

        while in_flight.len() < self.workers {
            match queue.next() {
                Some((index, input)) => in_flight.push(spawn_indexed(index, task(input))),
                None => break,
            }
        }

        let mut completed = 0;
        while let Some(joined) = in_flight.next().await {
            completed += 1;
            match joined {
                Ok((index, value)) => slots[index] = Some(value),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
            tracing::debug!("Completed {}/{} tasks", completed, total);

            if queue.peek().is_some() {
                if !self.pacing.is_zero() {
                    tokio::time::sleep(self.pacing).await;
                }
                if let Some((index, input)) = queue.next() {
                    in_flight.push(spawn_indexed(index, task(input)));
                }
            }
        }

        slots
    }
}

fn spawn_indexed<R, Fut>(index: usize, future: Fut) -> JoinHandle<(usize, R)>
where
    R: Send + 'static,
    Fut: Future<Output = R> + Send + 'static,
{
    tokio::spawn(async move { (index, future.await) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_output_follows_input_order() {
        let pool = OrderedPool::new(3, Duration::ZERO);
        let latencies = vec![("A", 20), ("B", 30), ("C", 10)];

        let output = pool
            .run(latencies, |(name, millis)| async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                name
            })
            .await;

        assert_eq!(output, vec![Some("A"), Some("B"), Some("C")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_is_bounded() {
        let pool = OrderedPool::new(2, Duration::ZERO);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let output = pool
            .run((0..6).collect(), |n: u32| {
                let running = running.clone();
                let peak = peak.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    n * 2
                }
            })
            .await;

        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(
            output,
            vec![Some(0), Some(2), Some(4), Some(6), Some(8), Some(10)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_applies_per_completion() {
        let pool = OrderedPool::new(4, Duration::from_millis(250));
        let start = Instant::now();

        // 4 start immediately; the 5th and 6th each wait for one completion
        // plus one pacing delay.
        let output = pool.run((0..6).collect(), |n: u32| async move { n }).await;

        assert_eq!(output.len(), 6);
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_zero_workers_means_one_and_empty_input() {
        let pool = OrderedPool::new(0, Duration::ZERO);
        assert_eq!(pool.workers(), 1);

        let output: Vec<Option<u32>> = pool.run(Vec::new(), |n: u32| async move { n }).await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_task_leaves_empty_slot() {
        let pool = OrderedPool::new(2, Duration::ZERO);

        let output = pool
            .run(vec![1, 2, 3], |n: u32| async move {
                assert!(n != 2, "boom");
                n
            })
            .await;

        assert_eq!(output, vec![Some(1), None, Some(3)]);
    }
}
