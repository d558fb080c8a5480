//! Delayed session actions
//!
//! Level advance and game over fire a short while after their trigger. Each
//! pending action carries the epoch it was scheduled in; bumping the epoch
//! (start, restart, stop, end, level advance) orphans everything pending, and
//! orphaned actions are discarded instead of fired.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    AdvanceLevel,
    EndGame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending {
    due_ms: f64,
    epoch: u64,
    action: ScheduledAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    epoch: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Invalidate everything scheduled so far
    pub fn bump_epoch(&mut self) {
        self.epoch += 1;
    }

    /// Whether `action` is waiting to fire in the current epoch
    pub fn is_pending(&self, action: ScheduledAction) -> bool {
        self.pending
            .iter()
            .any(|p| p.action == action && p.epoch == self.epoch)
    }

    /// Queue `action` at `due_ms`; returns false if it is already pending
    pub fn schedule(&mut self, action: ScheduledAction, due_ms: f64) -> bool {
        if self.is_pending(action) {
            return false;
        }
        self.pending.push(Pending {
            due_ms,
            epoch: self.epoch,
            action,
        });
        true
    }

    pub fn cancel(&mut self, action: ScheduledAction) {
        self.pending.retain(|p| p.action != action);
    }

    /// Remove and return the earliest-scheduled action due at `now_ms`
    ///
    /// Call repeatedly: firing one action may bump the epoch and orphan the rest.
    pub fn pop_due(&mut self, now_ms: f64) -> Option<ScheduledAction> {
        while let Some(idx) = self.pending.iter().position(|p| p.due_ms <= now_ms) {
            let p = self.pending.remove(idx);
            if p.epoch == self.epoch {
                return Some(p.action);
            }
            log::debug!("Dropping stale {:?} from epoch {}", p.action, p.epoch);
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
