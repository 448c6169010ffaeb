use mercury_types::{EventKind, StoredEvent, User};

/// Selects a subset of stored events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// If set, only events where this user is sender or recipient match.
    pub involving: Option<User>,
    /// If set, only events of these kinds match.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events committed strictly after this time (ms) match.
    pub since: Option<u64>,
}

impl EventFilter {
    /// A filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Events where `user` is sender or recipient.
    pub fn involving(user: impl Into<User>) -> Self {
        Self {
            involving: Some(user.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_kinds(mut self, kinds: Vec<EventKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    #[must_use]
    pub fn since(mut self, commit_time: u64) -> Self {
        self.since = Some(commit_time);
        self
    }

    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &StoredEvent) -> bool {
        if let Some(ref user) = self.involving {
            if !event.involves(user) {
                return false;
            }
        }
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.commit_time <= since {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use mercury_types::{Currency, EventBody, Mint, RecordId, Transfer};

    use super::*;

    fn transfer(from: &str, to: &str, time: u64) -> StoredEvent {
        StoredEvent::new(
            RecordId::generate(),
            time,
            EventBody::Transfer(Transfer {
                from: from.into(),
                to: to.into(),
                amount: Currency::UNIT,
                note: String::new(),
                returns: Default::default(),
            }),
        )
    }

    fn mint(to: &str, time: u64) -> StoredEvent {
        StoredEvent::new(
            RecordId::generate(),
            time,
            EventBody::Mint(Mint {
                to: to.into(),
                amount: Currency::UNIT,
                note: String::new(),
            }),
        )
    }

    #[test]
    fn default_matches_everything() {
        assert!(EventFilter::all().matches(&transfer("a", "b", 1)));
        assert!(EventFilter::all().matches(&mint("a", 1)));
    }

    #[test]
    fn involving_checks_both_sides() {
        let filter = EventFilter::involving("b");
        assert!(filter.matches(&transfer("a", "b", 1)));
        assert!(filter.matches(&transfer("b", "c", 1)));
        assert!(!filter.matches(&transfer("a", "c", 1)));
    }

    #[test]
    fn kinds_and_since_combine() {
        let filter = EventFilter::all()
            .with_kinds(vec![EventKind::Mint])
            .since(10);
        assert!(!filter.matches(&transfer("a", "b", 20)));
        assert!(!filter.matches(&mint("a", 10)));
        assert!(filter.matches(&mint("a", 11)));
    }
}
