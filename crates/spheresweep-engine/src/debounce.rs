//! Client-side pacing of bursty submissions
//!
//! A [`Debouncer`] never drops a submission. It spaces the invocations of the
//! wrapped function at least one interval apart, across every argument that is
//! submitted through the same instance, so a burst of deletions turns into a
//! steady trickle the remote API tolerates.

use futures_util::future::BoxFuture;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

type Job<A> = Arc<dyn Fn(A) -> BoxFuture<'static, ()> + Send + Sync>;

/// Choose the execution slot of a new submission
///
/// The first submission runs immediately. Later ones run at `now` or one
/// `interval` after the previously assigned slot, whichever is later, so the
/// assigned slots are non-decreasing and at least `interval` apart.
pub fn schedule_slot(now: Instant, last_scheduled: Option<Instant>, interval: Duration) -> Instant {
    match last_scheduled {
        Some(last) => now.max(last + interval),
        None => now,
    }
}

/// Rate limiter that runs every submitted call exactly once
pub struct Debouncer<A> {
    job: Job<A>,
    interval: Duration,
    last_scheduled: Arc<Mutex<Option<Instant>>>,
}

impl<A: Send + 'static> Debouncer<A> {
    pub fn new<F, Fut>(interval: Duration, f: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job: Job<A> = Arc::new(move |arg: A| -> BoxFuture<'static, ()> { Box::pin(f(arg)) });
        Self {
            job,
            interval,
            last_scheduled: Arc::new(Mutex::new(None)),
        }
    }

    /// Schedule `f(arg)` and return without waiting for its slot
    pub fn submit(&self, arg: A) -> JoinHandle<()> {
        let slot = self.reserve_slot();
        let job = Arc::clone(&self.job);

        tokio::spawn(async move {
            sleep_until(slot).await;
            job(arg).await;
        })
    }

    fn reserve_slot(&self) -> Instant {
        let mut last = self
            .last_scheduled
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let slot = schedule_slot(Instant::now(), *last, self.interval);
        *last = Some(slot);
        slot
    }
}

impl<A> Clone for Debouncer<A> {
    fn clone(&self) -> Self {
        Self {
            job: Arc::clone(&self.job),
            interval: self.interval,
            last_scheduled: Arc::clone(&self.last_scheduled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex as AsyncMutex;

    const T: Duration = Duration::from_secs(1);

    #[test]
    fn test_first_slot_is_now() {
        let now = Instant::now();
        assert_eq!(schedule_slot(now, None, T), now);
    }

    #[test]
    fn test_slot_queues_behind_pending_slot() {
        let now = Instant::now();
        let last = now + Duration::from_millis(300);

        assert_eq!(schedule_slot(now, Some(last), T), last + T);
    }

    #[test]
    fn test_slot_after_idle_period_is_now() {
        let now = Instant::now() + Duration::from_secs(10);
        let last = now - Duration::from_secs(5);

        assert_eq!(schedule_slot(now, Some(last), T), now);
    }

    #[test]
    fn test_slot_respects_interval_after_recent_slot() {
        let now = Instant::now() + Duration::from_secs(10);
        let last = now - Duration::from_millis(400);

        assert_eq!(schedule_slot(now, Some(last), T), last + T);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_spaced_and_nothing_dropped() {
        let calls: Arc<AsyncMutex<Vec<(u32, Instant)>>> = Arc::default();
        let recorded = Arc::clone(&calls);

        let debouncer = Debouncer::new(T, move |v: u32| {
            let recorded = Arc::clone(&recorded);
            async move {
                recorded.lock().await.push((v, Instant::now()));
            }
        });

        let start = Instant::now();
        let mut handles = Vec::new();
        for v in 1..=4 {
            handles.push(debouncer.submit(v));
            tokio::time::sleep(Duration::from_micros(500)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let calls = calls.lock().await;
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls.iter().map(|(v, _)| *v).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(calls[0].1 - start < T);
        for pair in calls.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= T);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_the_schedule() {
        let debouncer = Debouncer::new(T, |_: ()| async {});
        let other = debouncer.clone();

        let start = Instant::now();
        debouncer.submit(()).await.unwrap();
        other.submit(()).await.unwrap();

        assert_eq!(start.elapsed(), T);
    }
}
