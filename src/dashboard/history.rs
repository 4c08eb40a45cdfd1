use std::collections::VecDeque;

/// Retention cap for each history log.
pub const HISTORY_CAP: usize = 50;

/// Append-at-front log with a fixed retention cap: the newest entry is
/// always first, and pushing past the cap silently evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct BoundedLog<T> {
    entries: VecDeque<T>,
    cap: usize,
}

impl<T: Clone> BoundedLog<T> {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Prepend an entry, evicting the oldest when over the cap.
    pub fn push_front(&mut self, entry: T) {
        self.entries.push_front(entry);
        if self.entries.len() > self.cap {
            self.entries.pop_back();
        }
    }

    /// Replace the first entry matching the predicate in place, or prepend
    /// when there is no match. Used for call status updates, where later
    /// webhooks supersede earlier ones for the same call.
    pub fn upsert_front<F>(&mut self, matches: F, entry: T)
    where
        F: Fn(&T) -> bool,
    {
        match self.entries.iter_mut().find(|existing| matches(existing)) {
            Some(existing) => *existing = entry,
            None => self.push_front(entry),
        }
    }

    /// Newest-first copy of the log.
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for BoundedLog<T> {
    fn default() -> Self {
        Self::new(HISTORY_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = BoundedLog::new(3);
        log.push_front(1);
        log.push_front(2);
        log.push_front(3);
        assert_eq!(log.snapshot(), vec![3, 2, 1]);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let mut log = BoundedLog::new(3);
        for i in 0..5 {
            log.push_front(i);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.snapshot(), vec![4, 3, 2]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut log = BoundedLog::new(3);
        log.push_front(("CA1", "ringing"));
        log.push_front(("CA2", "ringing"));
        log.upsert_front(|(sid, _)| *sid == "CA1", ("CA1", "completed"));

        assert_eq!(log.len(), 2);
        assert_eq!(log.snapshot(), vec![("CA2", "ringing"), ("CA1", "completed")]);
    }

    #[test]
    fn test_upsert_without_match_prepends() {
        let mut log = BoundedLog::new(3);
        log.upsert_front(|(sid, _): &(&str, &str)| *sid == "CA9", ("CA9", "ringing"));
        assert_eq!(log.len(), 1);
    }
}
