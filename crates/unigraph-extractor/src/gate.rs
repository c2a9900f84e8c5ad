//! Job gate serializing induction and extraction jobs

use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes whole jobs that share it
///
/// Clones share one lock. A job holds the gate for its full duration; chunks
/// inside a job are not serialized by it. Hosts create one gate per scope
/// they want serialized and pass it to every job.
#[derive(Debug, Clone, Default)]
pub struct JobGate {
    inner: Arc<Mutex<()>>,
}

impl JobGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the gate; the job runs until the guard is dropped
    pub async fn enter(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.inner).lock_owned().await
    }

    /// True while some job holds the gate
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_clones_share_lock() {
        let gate = JobGate::new();
        let other = gate.clone();
        assert!(!other.is_busy());

        let guard = gate.enter().await;
        assert!(other.is_busy());
        drop(guard);
        assert!(!other.is_busy());
    }

    #[tokio::test]
    async fn test_jobs_do_not_overlap() {
        let gate = JobGate::new();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs = (0..4).map(|_| {
            let gate = gate.clone();
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            tokio::spawn(async move {
                let _guard = gate.enter().await;
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
        });
        for job in jobs.collect::<Vec<_>>() {
            job.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_separate_gates_are_independent() {
        let a = JobGate::new();
        let b = JobGate::new();
        let _guard = a.enter().await;
        assert!(!b.is_busy());
    }
}
