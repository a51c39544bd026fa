use std::sync::{Arc, atomic::{AtomicU8, Ordering}};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::{task::JoinHandle, time::{interval_at, Instant}};

/// Percentage shown while a submission is outstanding.
pub trait ProgressIndicator: Send + Sync {
    /// Resets to 0 and begins a new episode.
    fn start(&self);
    /// Ends the episode at 100.
    fn finish(&self);
    fn percent(&self) -> u8;
}

pub const CEILING: u8 = 100;

/// Cosmetic progress: +1 every `tick` until the ceiling, whatever the server is doing.
/// It does not measure anything.
pub struct SyntheticProgress {
    tick: Duration,
    percent: Arc<AtomicU8>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SyntheticProgress {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            percent: Arc::new(AtomicU8::new(0)),
            ticker: Mutex::new(None),
        }
    }

    fn stop_ticker(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }
}

impl ProgressIndicator for SyntheticProgress {
    fn start(&self) {
        let mut ticker = self.ticker.lock();
        if let Some(stale) = ticker.take() {
            stale.abort();
        }
        self.percent.store(0, Ordering::SeqCst);

        let percent = Arc::clone(&self.percent);
        let tick = self.tick;
        *ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                let bumped = percent.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |p| (p < CEILING).then_some(p + 1));
                match bumped {
                    Ok(prev) if prev + 1 < CEILING => {}
                    _ => break,
                }
            }
        }));
    }

    fn finish(&self) {
        self.stop_ticker();
        self.percent.store(CEILING, Ordering::SeqCst);
    }

    fn percent(&self) -> u8 {
        self.percent.load(Ordering::SeqCst)
    }
}

impl Drop for SyntheticProgress {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
