//! Silence-based turn detection.
//!
//! A turn closes once the driving party has been quiet for the silence
//! threshold. Every accepted fragment pushes the deadline out; the timer
//! task re-checks the latest activity when it wakes and sleeps again for
//! whatever is left instead of firing early.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What the timer should do when it wakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Newer activity arrived; sleep this much longer.
    Wait(Duration),
    /// The quiet period has elapsed.
    Fire,
    /// The session moved on (reset or state change); stop silently.
    Abandon,
}

/// Activity clock plus the handle of the armed timer.
#[derive(Debug)]
pub struct TurnDetector {
    threshold: Duration,
    last_activity: Option<Instant>,
    timer: Option<JoinHandle<()>>,
}

impl TurnDetector {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            last_activity: None,
            timer: None,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn record_activity(&mut self, now: Instant) {
        self.last_activity = Some(now);
    }

    /// Decide whether the quiet period has elapsed at `now`.
    pub fn probe(&self, now: Instant) -> Probe {
        let Some(last) = self.last_activity else {
            return Probe::Fire;
        };
        let quiet = now.saturating_duration_since(last);
        if quiet >= self.threshold {
            Probe::Fire
        } else {
            Probe::Wait(self.threshold - quiet)
        }
    }

    /// Install a freshly spawned timer, aborting the previous one.
    pub fn arm(&mut self, timer: JoinHandle<()>) {
        if let Some(old) = self.timer.replace(timer) {
            old.abort();
        }
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Cancel the timer and forget all activity.
    pub fn reset(&mut self) {
        self.cancel();
        self.last_activity = None;
    }
}

impl Drop for TurnDetector {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Spawn a debounce timer.
///
/// After `initial` it calls `probe`; on [`Probe::Wait`] it sleeps again,
/// on [`Probe::Fire`] it runs `fire` once. The two calls are separate, so
/// activity can slip in between them; `fire` has to check the deadline
/// again under whatever lock guards it.
pub fn spawn_silence_timer<P, F>(initial: Duration, mut probe: P, fire: F) -> JoinHandle<()>
where
    P: FnMut() -> Probe + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    tokio::spawn(async move {
        let mut wait = initial;
        loop {
            tokio::time::sleep(wait).await;
            match probe() {
                Probe::Wait(more) => {
                    tracing::trace!(?more, "speech continued, extending silence timer");
                    wait = more;
                }
                Probe::Fire => {
                    fire();
                    return;
                }
                Probe::Abandon => return,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const THRESHOLD: Duration = Duration::from_millis(1500);

    #[test]
    fn probe_without_activity_fires() {
        let detector = TurnDetector::new(THRESHOLD);
        assert_eq!(detector.probe(Instant::now()), Probe::Fire);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_reports_remaining_quiet_time() {
        let mut detector = TurnDetector::new(THRESHOLD);
        let start = Instant::now();
        detector.record_activity(start);
        assert_eq!(
            detector.probe(start + Duration::from_millis(500)),
            Probe::Wait(Duration::from_millis(1000))
        );
        assert_eq!(detector.probe(start + THRESHOLD), Probe::Fire);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_once_after_threshold() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let handle = spawn_silence_timer(THRESHOLD, || Probe::Fire, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(1499)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_probe_extends_the_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut probes = vec![Probe::Fire, Probe::Wait(Duration::from_millis(700))];
        spawn_silence_timer(
            THRESHOLD,
            move || probes.pop().unwrap_or(Probe::Abandon),
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_aborts_previous_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut detector = TurnDetector::new(THRESHOLD);

        for _ in 0..3 {
            let counter = Arc::clone(&fired);
            detector.arm(spawn_silence_timer(THRESHOLD, || Probe::Fire, move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }));
            tokio::time::sleep(Duration::from_millis(1000)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_pending_timer() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let mut detector = TurnDetector::new(THRESHOLD);
        detector.record_activity(Instant::now());
        detector.arm(spawn_silence_timer(THRESHOLD, || Probe::Fire, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        detector.reset();
        tokio::time::sleep(THRESHOLD * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(detector.probe(Instant::now()), Probe::Fire);
    }
}
