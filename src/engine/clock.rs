//! Countdown and auto-advance timers for one session.
//!
//! Each timer is a tokio task that sends a generation-stamped [`Event`] to the
//! driver's channel. Re-arming always aborts the previous task first, and the
//! session drops events whose stamp no longer matches, so a timer that fires
//! after its question moved on has no effect.
//!
//! The clock only holds a weak sender, so a driver whose handles are all gone
//! sees its channel close even while a timer is armed.

use std::time::Duration;

use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

use super::driver::Event;

pub struct SessionClock {
    ticker: Option<JoinHandle<()>>,
    auto_advance: Option<JoinHandle<()>>,
    events: mpsc::WeakSender<Event>,
    tick: Duration,
}

impl SessionClock {
    pub fn new(events: mpsc::WeakSender<Event>, tick: Duration) -> Self {
        Self {
            ticker: None,
            auto_advance: None,
            events,
            tick,
        }
    }

    /// Starts ticking for the question stamped `generation`, replacing any
    /// countdown that was already running.
    pub fn start(&mut self, generation: u64) {
        self.stop();

        let events = self.events.clone();
        let period = self.tick;
        let first = Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(first, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                trace!(generation, "Clock tick");
                let Some(sender) = events.upgrade() else {
                    break;
                };
                if sender.send(Event::Tick { generation }).await.is_err() {
                    break;
                }
            }
        });

        self.ticker = Some(handle);
        debug!(generation, "Clock started");
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            debug!("Clock stopped");
        }
    }

    pub fn schedule_auto_advance(&mut self, generation: u64, delay: Duration) {
        self.cancel_auto_advance();

        let events = self.events.clone();
        let handle = tokio::spawn(async move {
            time::sleep(delay).await;
            trace!(generation, "Auto-advance fired");
            if let Some(sender) = events.upgrade() {
                let _ = sender.send(Event::AutoAdvance { generation }).await;
            }
        });

        self.auto_advance = Some(handle);
        debug!(generation, ?delay, "Auto-advance scheduled");
    }

    pub fn cancel_auto_advance(&mut self) {
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
            debug!("Auto-advance cancelled");
        }
    }

    pub fn cancel_all(&mut self) {
        self.stop();
        self.cancel_auto_advance();
    }
}

impl Drop for SessionClock {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
