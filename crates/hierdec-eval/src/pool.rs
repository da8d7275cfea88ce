//! Bounded worker pool running one task per label.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::EvalError;

/// A rayon pool sized to `min(hardware threads, cap)`.
///
/// Tasks report through a channel, so collection does not depend on the
/// order in which they finish. Results come back indexed by label position.
pub(crate) struct LabelPool {
    pool: rayon::ThreadPool,
    grace_period: Duration,
}

impl LabelPool {
    /// Build the pool.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::InvalidWorkerCount`] | `max_workers` is zero |
    /// | [`EvalError::ThreadPool`] | rayon cannot start the threads |
    pub(crate) fn new(max_workers: usize, grace_period: Duration) -> Result<Self, EvalError> {
        if max_workers == 0 {
            return Err(EvalError::InvalidWorkerCount { max_workers });
        }
        let hardware = std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        let n_workers = hardware.min(max_workers);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .thread_name(|i| format!("hierdec-eval-{i}"))
            .build()
            .map_err(|source| EvalError::ThreadPool { source })?;
        debug!(n_workers, "label pool started");
        Ok(Self { pool, grace_period })
    }

    /// Number of worker threads.
    pub(crate) fn n_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `task(i)` for every label index and collect all results in label
    /// order.
    ///
    /// The first failure cancels every task that has not started yet; tasks
    /// already running get the grace period to finish before the call
    /// returns that failure.
    pub(crate) fn run<T, F>(&self, labels: &[String], task: F) -> Result<Vec<T>, EvalError>
    where
        T: Send + 'static,
        F: Fn(usize) -> Result<T, EvalError> + Send + Sync + 'static,
    {
        let n_tasks = labels.len();
        let task = Arc::new(task);
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel::<(usize, Result<T, EvalError>)>();

        for (index, label) in labels.iter().enumerate() {
            let task = Arc::clone(&task);
            let cancel = Arc::clone(&cancel);
            let tx = tx.clone();
            let label = label.clone();
            self.pool.spawn(move || {
                let outcome = if cancel.load(Ordering::Relaxed) {
                    Err(EvalError::Cancelled { label })
                } else {
                    match panic::catch_unwind(AssertUnwindSafe(|| task(index))) {
                        Ok(result) => result,
                        Err(payload) => Err(EvalError::TaskPanicked {
                            label,
                            message: panic_message(payload.as_ref()),
                        }),
                    }
                };
                // The receiver is gone once the run has already failed.
                let _ = tx.send((index, outcome));
            });
        }
        drop(tx);

        let mut slots: Vec<Option<T>> = (0..n_tasks).map(|_| None).collect();
        let mut received = 0;
        while received < n_tasks {
            match rx.recv() {
                Ok((index, Ok(value))) => {
                    slots[index] = Some(value);
                    received += 1;
                }
                Ok((_, Err(err))) => {
                    received += 1;
                    cancel.store(true, Ordering::Relaxed);
                    self.wind_down(&rx, n_tasks - received);
                    return Err(err);
                }
                Err(_) => {
                    return Err(EvalError::PoolDisconnected {
                        missing: n_tasks - received,
                    });
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    /// Wait up to the grace period for `outstanding` results, then give up on
    /// the rest.
    fn wind_down<T>(&self, rx: &mpsc::Receiver<(usize, Result<T, EvalError>)>, outstanding: usize) {
        let deadline = Instant::now() + self.grace_period;
        let mut finished = 0usize;
        let mut cancelled = 0usize;
        while finished + cancelled < outstanding {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match rx.recv_timeout(remaining) {
                Ok((_, Err(EvalError::Cancelled { .. }))) => cancelled += 1,
                Ok(_) => finished += 1,
                Err(_) => break,
            }
        }
        let unfinished = outstanding - finished - cancelled;
        warn!(
            finished,
            cancelled,
            unfinished,
            grace_ms = self.grace_period.as_millis() as u64,
            "evaluation failed; remaining label tasks cancelled"
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("L{i:03}")).collect()
    }

    #[test]
    fn results_follow_label_order() {
        let pool = LabelPool::new(4, Duration::from_secs(1)).unwrap();
        let out = pool
            .run(&labels(50), |i| {
                // Finish in reverse order.
                std::thread::sleep(Duration::from_micros((50 - i as u64) * 20));
                Ok(i * 2)
            })
            .unwrap();
        assert_eq!(out, (0..50).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn task_error_fails_the_whole_run() {
        let pool = LabelPool::new(2, Duration::from_millis(200)).unwrap();
        let err = pool
            .run(&labels(10), |i| {
                if i == 3 {
                    Err(EvalError::UnknownLabel {
                        label: "L003".into(),
                    })
                } else {
                    Ok(i)
                }
            })
            .unwrap_err();
        assert!(matches!(err, EvalError::UnknownLabel { .. }));
    }

    #[test]
    fn panic_is_reported_as_task_failure() {
        let pool = LabelPool::new(2, Duration::from_millis(200)).unwrap();
        let err = pool
            .run(&labels(4), |i| -> Result<usize, EvalError> {
                assert!(i != 2, "boom");
                Ok(i)
            })
            .unwrap_err();
        match err {
            EvalError::TaskPanicked { label, message } => {
                assert_eq!(label, "L002");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_workers_rejected() {
        assert!(matches!(
            LabelPool::new(0, Duration::from_secs(1)),
            Err(EvalError::InvalidWorkerCount { max_workers: 0 })
        ));
    }

    #[test]
    fn worker_count_is_capped() {
        let pool = LabelPool::new(1, Duration::from_secs(1)).unwrap();
        assert_eq!(pool.n_workers(), 1);
    }

    #[test]
    fn empty_label_list_returns_empty() {
        let pool = LabelPool::new(2, Duration::from_secs(1)).unwrap();
        let out: Vec<usize> = pool.run(&[], Ok).unwrap();
        assert!(out.is_empty());
    }
}
