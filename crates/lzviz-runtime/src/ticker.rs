#![forbid(unsafe_code)]

//! Real-time tick thread for hosts with threads.
//!
//! A [`Ticker`] sleeps on a cancellation token and sends one message per
//! interval, stamped with the [`AnimationClock`] epoch it was started for.
//! The controller drops ticks whose epoch is no longer live, so a tick that
//! was already in the channel when playback paused never moves the cursor.
//!
//! [`TickerSync`] keeps exactly one ticker matching the clock's state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, mpsc};
use std::thread;

use tracing::{debug, trace};
use web_time::{Duration, Instant};

use crate::clock::AnimationClock;

struct CancelInner {
    cancelled: AtomicBool,
    notify: (Mutex<()>, Condvar),
}

/// Cloneable view of a cancellation request.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancelInner>,
}

/// Control side of a [`CancellationToken`]. Dropping it does not cancel.
pub struct CancellationSource {
    inner: Arc<CancelInner>,
}

impl CancellationSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                notify: (Mutex::new(()), Condvar::new()),
            }),
        }
    }

    #[must_use]
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Request cancellation and wake every waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        let (lock, cvar) = &self.inner.notify;
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        cvar.notify_all();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleep up to `duration`; returns `true` if cancelled meanwhile.
    pub fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &self.inner.notify;
        let mut guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let start = Instant::now();
        loop {
            if self.is_cancelled() {
                return true;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            let (next, _) = cvar
                .wait_timeout(guard, duration - elapsed)
                .unwrap_or_else(|e| e.into_inner());
            guard = next;
        }
    }
}

/// A running tick thread.
pub struct Ticker {
    epoch: u64,
    source: CancellationSource,
    thread: Option<thread::JoinHandle<()>>,
}

impl Ticker {
    /// Spawn a thread sending `make(epoch)` every `interval` until stopped
    /// or the receiver goes away.
    pub fn spawn<M: Send + 'static>(
        interval: Duration,
        epoch: u64,
        sender: mpsc::Sender<M>,
        make: impl Fn(u64) -> M + Send + 'static,
    ) -> Self {
        let source = CancellationSource::new();
        let token = source.token();
        let thread = thread::spawn(move || {
            loop {
                if token.wait_timeout(interval) {
                    break;
                }
                trace!(epoch, "tick");
                if sender.send(make(epoch)).is_err() {
                    break;
                }
            }
        });
        debug!(epoch, interval_ms = interval.as_millis() as u64, "ticker started");
        Self {
            epoch,
            source,
            thread: Some(thread),
        }
    }

    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Cancel and join the thread.
    pub fn stop(mut self) {
        self.source.cancel();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
        debug!(epoch = self.epoch, "ticker stopped");
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        // No join here: dropping must not block.
        self.source.cancel();
    }
}

/// Keeps one [`Ticker`] in step with an [`AnimationClock`].
pub struct TickerSync<M: Send + 'static> {
    sender: mpsc::Sender<M>,
    make: Arc<dyn Fn(u64) -> M + Send + Sync>,
    current: Option<Ticker>,
}

impl<M: Send + 'static> TickerSync<M> {
    pub fn new(sender: mpsc::Sender<M>, make: impl Fn(u64) -> M + Send + Sync + 'static) -> Self {
        Self {
            sender,
            make: Arc::new(make),
            current: None,
        }
    }

    /// Start, restart or stop the thread so it matches `clock`.
    pub fn sync(&mut self, clock: &AnimationClock) {
        let live = self
            .current
            .as_ref()
            .is_some_and(|ticker| clock.accepts(ticker.epoch()));
        if live {
            return;
        }
        if let Some(old) = self.current.take() {
            old.stop();
        }
        if clock.is_running() {
            let make = Arc::clone(&self.make);
            self.current = Some(Ticker::spawn(
                clock.interval(),
                clock.epoch(),
                self.sender.clone(),
                move |epoch| make(epoch),
            ));
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Stop any running thread.
    pub fn shutdown(&mut self) {
        if let Some(ticker) = self.current.take() {
            ticker.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_observes_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());
        assert!(token.wait_timeout(Duration::from_secs(10)));
    }

    #[test]
    fn wait_times_out_without_cancel() {
        let source = CancellationSource::new();
        assert!(!source.token().wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn dropping_source_does_not_cancel() {
        let source = CancellationSource::new();
        let token = source.token();
        drop(source);
        assert!(!token.is_cancelled());
    }

    #[test]
    fn ticker_sends_epoch_stamped_ticks() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::spawn(Duration::from_millis(5), 7, tx, |epoch| epoch);
        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.stop();
        assert_eq!(first, 7);
    }

    #[test]
    fn stopped_ticker_sends_nothing_more() {
        let (tx, rx) = mpsc::channel::<u64>();
        let ticker = Ticker::spawn(Duration::from_secs(60), 1, tx, |epoch| epoch);
        ticker.stop();
        // The sender was dropped with the thread.
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn sync_follows_clock_state() {
        let (tx, rx) = mpsc::channel::<u64>();
        let mut sync = TickerSync::new(tx, |epoch| epoch);
        let mut clock = AnimationClock::new(Duration::from_millis(5));

        sync.sync(&clock);
        assert!(!sync.is_running());

        clock.start();
        sync.sync(&clock);
        assert!(sync.is_running());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), clock.epoch());

        clock.stop();
        sync.sync(&clock);
        assert!(!sync.is_running());
        sync.shutdown();
    }
}
