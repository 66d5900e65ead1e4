//! Debounced persistence scheduling.
//!
//! Continuous gestures (corner drags) would otherwise produce one write per
//! pointer-move. Each edited template gets a single pending deadline that
//! every new edit pushes back; discrete actions bypass the debounce
//! entirely via [`SyncScheduler::flush_now`].
//!
//! The scheduler holds no timer: deadlines are plain data and the host loop
//! drives them by calling [`SyncScheduler::flush_due`] with the current
//! time. That keeps the whole thing synchronous and testable.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Delay between the last continuous edit and its persistence write.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Per-session map from template id to pending write deadline.
#[derive(Debug)]
pub struct SyncScheduler {
    delay: Duration,
    pending: HashMap<String, Instant>,
}

impl Default for SyncScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncScheduler {
    pub fn new() -> Self {
        Self::with_delay(DEBOUNCE_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    /// Record an edit: arm the template's deadline, or push it back if one
    /// is already pending.
    pub fn mark_dirty(&mut self, template_id: &str, now: Instant) {
        self.pending
            .insert(template_id.to_string(), now + self.delay);
    }

    /// Take every template whose deadline has passed. Sorted for
    /// deterministic write order.
    pub fn flush_due(&mut self, now: Instant) -> Vec<String> {
        let mut due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        due.sort();
        for id in &due {
            self.pending.remove(id);
        }
        due
    }

    /// Discrete action: drop any pending deadline so the immediate write is
    /// not followed by a stale debounced one. Returns true if a pending
    /// write was superseded.
    pub fn flush_now(&mut self, template_id: &str) -> bool {
        self.pending.remove(template_id).is_some()
    }

    pub fn is_pending(&self, template_id: &str) -> bool {
        self.pending.contains_key(template_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn test_not_due_before_delay() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("tpl", t0);
        assert!(s.flush_due(t0).is_empty());
        assert!(s.flush_due(t0 + Duration::from_millis(299)).is_empty());
        assert!(s.is_pending("tpl"));
    }

    #[test]
    fn test_due_after_delay() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("tpl", t0);
        assert_eq!(s.flush_due(t0 + DELAY), vec!["tpl".to_string()]);
        assert!(!s.is_pending("tpl"));
    }

    #[test]
    fn test_repeated_edits_extend_deadline() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("tpl", t0);
        // A later edit pushes the deadline back
        s.mark_dirty("tpl", t0 + Duration::from_millis(200));
        assert!(s.flush_due(t0 + DELAY).is_empty());
        assert_eq!(
            s.flush_due(t0 + Duration::from_millis(500)),
            vec!["tpl".to_string()]
        );
    }

    #[test]
    fn test_one_deadline_per_template() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("a", t0);
        s.mark_dirty("a", t0);
        s.mark_dirty("b", t0);
        assert_eq!(s.pending_count(), 2);
        assert_eq!(
            s.flush_due(t0 + DELAY),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn test_flush_now_supersedes_pending() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("tpl", t0);
        assert!(s.flush_now("tpl"));
        assert!(s.flush_due(t0 + DELAY).is_empty());
        // Nothing pending: flush_now reports so
        assert!(!s.flush_now("tpl"));
    }

    #[test]
    fn test_flush_due_only_takes_due_entries() {
        let mut s = SyncScheduler::new();
        let t0 = Instant::now();
        s.mark_dirty("early", t0);
        s.mark_dirty("late", t0 + Duration::from_millis(200));
        assert_eq!(s.flush_due(t0 + DELAY), vec!["early".to_string()]);
        assert!(s.is_pending("late"));
    }
}
