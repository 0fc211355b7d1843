use std::time::{Duration, Instant};

use crate::model::ScheduleConfig;

/// Work the scheduler wants done now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Run one aggregation pass
    Rescan,
    /// Persist the latest result to history (if it changed)
    CommitHistory,
}

/// Debounce and delayed-commit timers for board recalculation.
///
/// Single-threaded and poll-driven: the caller passes the current time in
/// and runs whatever `poll` returns. A change while a rescan is pending moves
/// the deadline instead of queueing a second pass, and any change cancels a
/// pending history commit.
#[derive(Debug, Clone)]
pub struct RecalcScheduler {
    debounce: Duration,
    commit_delay: Duration,
    rescan_at: Option<Instant>,
    commit_at: Option<Instant>,
}

impl RecalcScheduler {
    pub fn new(debounce: Duration, commit_delay: Duration) -> Self {
        RecalcScheduler {
            debounce,
            commit_delay,
            rescan_at: None,
            commit_at: None,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self::new(
            Duration::from_millis(config.debounce_ms),
            Duration::from_millis(config.commit_delay_ms),
        )
    }

    /// The board changed: (re)start the quiet period
    pub fn tree_changed(&mut self, now: Instant) {
        self.rescan_at = Some(now + self.debounce);
        self.commit_at = None;
    }

    /// Explicit recalculate: rescan on the next poll
    pub fn request_now(&mut self, now: Instant) {
        self.rescan_at = Some(now);
        self.commit_at = None;
    }

    /// At most one action per call. A rescan arms the history commit.
    pub fn poll(&mut self, now: Instant) -> Option<ScheduledAction> {
        if let Some(at) = self.rescan_at
            && now >= at
        {
            self.rescan_at = None;
            self.commit_at = Some(now + self.commit_delay);
            return Some(ScheduledAction::Rescan);
        }
        if let Some(at) = self.commit_at
            && now >= at
        {
            self.commit_at = None;
            return Some(ScheduledAction::CommitHistory);
        }
        None
    }

    /// Earliest pending deadline, for sizing the event-loop wait
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.rescan_at, self.commit_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn rescan_pending(&self) -> bool {
        self.rescan_at.is_some()
    }

    pub fn commit_pending(&self) -> bool {
        self.commit_at.is_some()
    }

    /// Drop all pending work
    pub fn cancel(&mut self) {
        self.rescan_at = None;
        self.commit_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn scheduler() -> RecalcScheduler {
        RecalcScheduler::new(ms(300), ms(3000))
    }

    #[test]
    fn burst_of_changes_coalesces_into_one_rescan() {
        let t0 = Instant::now();
        let mut s = scheduler();
        s.tree_changed(t0);
        s.tree_changed(t0 + ms(100));
        s.tree_changed(t0 + ms(250));
        assert_eq!(s.poll(t0 + ms(400)), None);
        assert_eq!(s.poll(t0 + ms(550)), Some(ScheduledAction::Rescan));
        assert_eq!(s.poll(t0 + ms(560)), None);
    }

    #[test]
    fn commit_follows_rescan_after_delay() {
        let t0 = Instant::now();
        let mut s = scheduler();
        s.tree_changed(t0);
        assert_eq!(s.poll(t0 + ms(300)), Some(ScheduledAction::Rescan));
        assert!(s.commit_pending());
        assert_eq!(s.poll(t0 + ms(3000)), None);
        assert_eq!(s.poll(t0 + ms(3300)), Some(ScheduledAction::CommitHistory));
        assert_eq!(s.poll(t0 + ms(9000)), None);
    }

    #[test]
    fn change_cancels_pending_commit() {
        let t0 = Instant::now();
        let mut s = scheduler();
        s.tree_changed(t0);
        s.poll(t0 + ms(300));
        s.tree_changed(t0 + ms(1000));
        assert!(!s.commit_pending());
        assert_eq!(s.poll(t0 + ms(3300)), Some(ScheduledAction::Rescan));
        assert_eq!(s.poll(t0 + ms(6200)), None);
        assert_eq!(s.poll(t0 + ms(6300)), Some(ScheduledAction::CommitHistory));
    }

    #[test]
    fn explicit_request_is_due_immediately() {
        let t0 = Instant::now();
        let mut s = scheduler();
        s.request_now(t0);
        assert_eq!(s.next_deadline(), Some(t0));
        assert_eq!(s.poll(t0), Some(ScheduledAction::Rescan));
    }

    #[test]
    fn next_deadline_is_earliest_timer() {
        let t0 = Instant::now();
        let mut s = scheduler();
        assert_eq!(s.next_deadline(), None);
        s.tree_changed(t0);
        assert_eq!(s.next_deadline(), Some(t0 + ms(300)));
        s.poll(t0 + ms(300));
        assert_eq!(s.next_deadline(), Some(t0 + ms(3300)));
        s.cancel();
        assert_eq!(s.next_deadline(), None);
    }

    #[test]
    fn from_config_uses_configured_delays() {
        let t0 = Instant::now();
        let mut s = RecalcScheduler::from_config(&ScheduleConfig {
            debounce_ms: 10,
            commit_delay_ms: 20,
        });
        s.tree_changed(t0);
        assert_eq!(s.poll(t0 + ms(10)), Some(ScheduledAction::Rescan));
        assert_eq!(s.poll(t0 + ms(30)), Some(ScheduledAction::CommitHistory));
    }
}
