//! Top-level completion countdown

use tokio::sync::watch;

/// Counts resolved communities down to zero
///
/// Every community must be counted down exactly once, whichever path resolved
/// it (deleted, deletion failed, or skipped).
#[derive(Debug)]
pub struct Countdown {
    remaining: watch::Sender<usize>,
}

impl Countdown {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: watch::Sender::new(count),
        }
    }

    pub fn remaining(&self) -> usize {
        *self.remaining.borrow()
    }

    pub fn count_down(&self) {
        self.remaining.send_modify(|remaining| {
            if *remaining == 0 {
                tracing::warn!("Countdown decremented below zero, ignoring");
            } else {
                *remaining -= 1;
            }
        });
    }

    /// Wait until the count reaches zero
    pub async fn wait(&self) {
        let mut rx = self.remaining.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|remaining| *remaining == 0).await;
    }
}
