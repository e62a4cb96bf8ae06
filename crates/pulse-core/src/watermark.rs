//! Incremental-notification tracking.
//!
//! The watermark is the newest item timestamp already dispatched. The
//! orchestrator owns it and asks `plan` what to do with each new batch;
//! `plan` itself never mutates anything.

use chrono::{DateTime, Utc};

use crate::market::MarketItem;

/// What to do with a freshly fetched batch
#[derive(Debug, Clone, PartialEq)]
pub enum NotifyPlan {
    /// First batch ever: send nothing, move the watermark to `to`
    /// (`None` leaves it at process start).
    Prime { to: Option<DateTime<Utc>> },

    /// Items strictly newer than the watermark, oldest first
    Send(Vec<MarketItem>),
}

/// Newest item timestamp already sent to the messaging channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationWatermark {
    last_notified: DateTime<Utc>,
    primed: bool,
}

impl NotificationWatermark {
    /// Start at `started_at` so history is never replayed
    pub const fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            last_notified: started_at,
            primed: false,
        }
    }

    pub const fn last_notified(&self) -> DateTime<Utc> {
        self.last_notified
    }

    pub const fn is_primed(&self) -> bool {
        self.primed
    }

    /// Decide which items of `batch` need a notification.
    pub fn plan(&self, batch: &[MarketItem]) -> NotifyPlan {
        if !self.primed {
            return NotifyPlan::Prime {
                to: batch.iter().map(|item| item.timestamp).max(),
            };
        }

        let mut fresh: Vec<MarketItem> = batch
            .iter()
            .filter(|item| item.timestamp > self.last_notified)
            .cloned()
            .collect();
        fresh.sort_by_key(|item| item.timestamp);
        NotifyPlan::Send(fresh)
    }

    /// Apply a `Prime` outcome
    pub fn prime(&mut self, to: Option<DateTime<Utc>>) {
        if let Some(ts) = to {
            self.last_notified = ts;
        }
        self.primed = true;
    }

    /// Record a dispatched item; the watermark never moves backwards
    pub fn advance(&mut self, ts: DateTime<Utc>) {
        self.last_notified = self.last_notified.max(ts);
    }
}
