//! Event-name to listener-set storage.
//!
//! # Design
//! - Event names keep their first-registration order, so bulk removal notifies
//!   deterministically.
//! - An empty set never stays in the map; removing the last entry deletes the
//!   key and with it the leak detector's `warned` flag.
//! - The registry never invokes listeners; the emitter snapshots and calls.

use indexmap::IndexMap;

use crate::listener::Listener;

/// Ordered listeners for one event name.
#[derive(Default)]
pub(crate) struct ListenerSet {
    entries: Vec<Listener>,
    warned: bool,
}

impl ListenerSet {
    pub(crate) const fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) const fn warned(&self) -> bool {
        self.warned
    }

    pub(crate) const fn mark_warned(&mut self) {
        self.warned = true;
    }
}

/// Where a new entry goes within its set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Placement {
    Append,
    Prepend,
}

#[derive(Default)]
pub(crate) struct Registry {
    sets: IndexMap<String, ListenerSet>,
}

impl Registry {
    pub(crate) fn contains(&self, event: &str) -> bool {
        self.sets.contains_key(event)
    }

    pub(crate) fn len(&self, event: &str) -> usize {
        self.sets.get(event).map_or(0, ListenerSet::len)
    }

    /// Insert `listener`, creating the set if needed, and return the set.
    pub(crate) fn insert(
        &mut self,
        event: &str,
        listener: Listener,
        placement: Placement,
    ) -> &mut ListenerSet {
        let set = self.sets.entry(event.to_owned()).or_default();
        match placement {
            Placement::Append => set.entries.push(listener),
            Placement::Prepend => set.entries.insert(0, listener),
        }
        set
    }

    /// Remove the last entry matching `target` and return it.
    pub(crate) fn remove(&mut self, event: &str, target: &Listener) -> Option<Listener> {
        let set = self.sets.get_mut(event)?;
        let position = set.entries.iter().rposition(|entry| entry.matches(target))?;
        let removed = set.entries.remove(position);
        if set.entries.is_empty() {
            let _ = self.sets.shift_remove(event);
        }
        Some(removed)
    }

    /// Point-in-time copy of the set for `event`, `None` if absent.
    pub(crate) fn snapshot(&self, event: &str) -> Option<Vec<Listener>> {
        self.sets.get(event).map(|set| set.entries.clone())
    }

    pub(crate) fn event_names(&self) -> Vec<String> {
        self.sets.keys().cloned().collect()
    }

    pub(crate) fn clear_event(&mut self, event: &str) {
        let _ = self.sets.shift_remove(event);
    }

    pub(crate) fn clear(&mut self) {
        self.sets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Listener::new(|_, _| Ok(()))
    }

    #[test]
    fn insert_respects_placement() {
        let mut registry = Registry::default();
        let first = noop();
        let second = noop();
        let front = noop();

        let _ = registry.insert("tick", first.clone(), Placement::Append);
        let _ = registry.insert("tick", second.clone(), Placement::Append);
        let set = registry.insert("tick", front.clone(), Placement::Prepend);
        assert_eq!(set.len(), 3);

        assert_eq!(registry.snapshot("tick"), Some(vec![front, first, second]));
        assert_eq!(registry.snapshot("tock"), None);
    }

    #[test]
    fn remove_takes_last_match_and_drops_empty_sets() {
        let mut registry = Registry::default();
        let dup = noop();
        let other = noop();
        let _ = registry.insert("tick", dup.clone(), Placement::Append);
        let _ = registry.insert("tick", other.clone(), Placement::Append);
        let _ = registry.insert("tick", dup.clone(), Placement::Append);

        assert_eq!(registry.remove("tick", &dup), Some(dup.clone()));
        assert_eq!(registry.snapshot("tick"), Some(vec![dup.clone(), other.clone()]));

        assert!(registry.remove("tick", &noop()).is_none());
        assert!(registry.remove("missing", &dup).is_none());

        let _ = registry.remove("tick", &dup);
        let _ = registry.remove("tick", &other);
        assert!(!registry.contains("tick"));
        assert_eq!(registry.len("tick"), 0);
    }

    #[test]
    fn remove_matches_once_wrapper_by_origin() {
        let mut registry = Registry::default();
        let original = noop();
        let wrapper = Listener::once("tick", original.clone());
        let _ = registry.insert("tick", wrapper.clone(), Placement::Append);

        assert_eq!(registry.remove("tick", &original), Some(wrapper));
        assert!(!registry.contains("tick"));
    }

    #[test]
    fn warned_flag_resets_when_set_is_recreated() {
        let mut registry = Registry::default();
        let listener = noop();
        registry
            .insert("tick", listener.clone(), Placement::Append)
            .mark_warned();
        assert!(registry.insert("tick", noop(), Placement::Append).warned());

        registry.clear_event("tick");
        assert!(!registry.insert("tick", listener, Placement::Append).warned());
    }

    #[test]
    fn event_names_follow_first_registration() {
        let mut registry = Registry::default();
        let _ = registry.insert("b", noop(), Placement::Append);
        let _ = registry.insert("a", noop(), Placement::Append);
        let _ = registry.insert("b", noop(), Placement::Append);
        assert_eq!(registry.event_names(), vec!["b".to_string(), "a".to_string()]);

        registry.clear();
        assert!(registry.event_names().is_empty());
    }
}
