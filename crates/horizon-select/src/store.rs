//! Item store: the item universe and the current selection.
//!
//! The universe is an immutable `Arc<[Entry]>` snapshot. Local data replaces
//! it through [`ItemStore::set_data`]; remote results refresh it through
//! [`ItemStore::replace_universe`] so that selection lookups can find items
//! that only exist server-side. Readers hold on to the snapshot they were
//! given; nothing mutates it in place.

use std::sync::Arc;

use horizon_select_core::logging::targets;

use crate::events::{EventSink, SelectEvent};
use crate::host::HostControl;
use crate::item::{self, Entry, Item, ItemId};
use crate::language::{Language, TranslationArgs, keys};

/// Selection cardinality rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// At most one item; selecting replaces.
    #[default]
    Single,
    /// Any number of items up to `maximum` (`0` = unlimited).
    Multiple {
        /// Selection cap, `0` for none.
        maximum: usize,
    },
}

/// Outcome of a select attempt that did not change the selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectRejection {
    /// The item is already selected (multi-select only).
    Duplicate,
    /// The selection is full.
    LimitReached,
}

/// Single source of truth for item data and selection.
pub struct ItemStore {
    mode: SelectionMode,
    universe: Arc<[Entry]>,
    selection: Vec<Item>,
    host: Box<dyn HostControl>,
    events: EventSink,
    language: Arc<Language>,
}

impl ItemStore {
    /// Create a store, adopting whatever the host control already has selected.
    pub fn new(
        mode: SelectionMode,
        host: Box<dyn HostControl>,
        events: EventSink,
        language: Arc<Language>,
    ) -> Self {
        let mut selection = host.initial_selection();
        if mode == SelectionMode::Single && selection.len() > 1 {
            selection.drain(..selection.len() - 1);
        }
        if let SelectionMode::Multiple { maximum } = mode
            && maximum > 0
        {
            selection.truncate(maximum);
        }

        Self {
            mode,
            universe: Arc::from(Vec::new()),
            selection,
            host,
            events,
            language,
        }
    }

    /// The cardinality rules in force.
    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Replace the whole collection and announce it.
    ///
    /// An empty list clears the collection.
    pub fn set_data(&mut self, entries: Vec<Entry>) {
        tracing::debug!(target: targets::STORE, count = entries.len(), "data loaded");
        self.universe = Arc::from(entries.clone());
        self.events.emit(SelectEvent::DataLoaded { data: entries });
    }

    /// Swap in a new universe snapshot without announcing it.
    pub fn replace_universe(&mut self, entries: impl Into<Arc<[Entry]>>) {
        self.universe = entries.into();
    }

    /// The full, unfiltered collection.
    pub fn query(&self) -> Arc<[Entry]> {
        Arc::clone(&self.universe)
    }

    /// Look up an item by id in the universe, then in the selection.
    pub fn find(&self, id: &ItemId) -> Option<Item> {
        item::find(&self.universe, id)
            .or_else(|| self.selection.iter().find(|item| &item.id == id))
            .cloned()
    }

    /// The current selection, in order.
    pub fn current(&self) -> &[Item] {
        &self.selection
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.selection.iter().any(|item| &item.id == id)
    }

    /// Add `item` to the selection.
    ///
    /// Single mode always succeeds and replaces. Multi mode rejects
    /// duplicates and, once the cap is reached, announces
    /// [`SelectEvent::SelectionLimitReached`].
    pub fn select(&mut self, item: Item) -> Result<(), SelectRejection> {
        match self.mode {
            SelectionMode::Single => {
                self.selection.clear();
            }
            SelectionMode::Multiple { maximum } => {
                if self.is_selected(&item.id) {
                    tracing::debug!(target: targets::STORE, id = %item.id, "already selected");
                    return Err(SelectRejection::Duplicate);
                }
                if maximum > 0 && self.selection.len() >= maximum {
                    let message = self.language.translate(
                        keys::MAXIMUM_SELECTED,
                        &TranslationArgs::maximum(maximum),
                    );
                    tracing::debug!(target: targets::STORE, maximum, "selection limit reached");
                    self.events
                        .emit(SelectEvent::SelectionLimitReached { maximum, message });
                    return Err(SelectRejection::LimitReached);
                }
            }
        }

        let mut item = item;
        item.selected = true;
        self.host.ensure_option(&item);
        self.selection.push(item.clone());
        self.sync_host();

        tracing::debug!(target: targets::STORE, id = %item.id, "selected");
        self.events.emit(SelectEvent::Select { item });
        self.emit_change();
        Ok(())
    }

    /// Remove the item with `item.id` from the selection.
    ///
    /// Always re-syncs the host and announces a change; returns whether an
    /// item was actually removed.
    pub fn unselect(&mut self, item: &Item) -> bool {
        let before = self.selection.len();
        let mut removed = None;
        self.selection.retain(|selected| {
            if selected.id == item.id {
                removed = Some(selected.clone());
                false
            } else {
                true
            }
        });
        self.sync_host();

        if let Some(mut removed) = removed {
            removed.selected = false;
            tracing::debug!(target: targets::STORE, id = %removed.id, "unselected");
            self.events.emit(SelectEvent::Unselect { item: removed });
        }
        self.emit_change();
        self.selection.len() < before
    }

    /// Empty the selection and re-sync the host.
    ///
    /// Emits nothing; the caller announces the change.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.sync_host();
    }

    /// Forget the selection and the universe without touching the host.
    pub(crate) fn teardown(&mut self) {
        self.selection.clear();
        self.universe = Arc::from(Vec::new());
    }

    fn sync_host(&mut self) {
        let ids: Vec<ItemId> = self.selection.iter().map(|item| item.id.clone()).collect();
        self.host.sync_selection(&ids);
        self.host.dispatch_change();
    }

    fn emit_change(&self) {
        self.events.emit(SelectEvent::Change {
            selection: self.selection.clone(),
        });
    }
}

impl std::fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemStore")
            .field("mode", &self.mode)
            .field("universe_len", &self.universe.len())
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NativeOption, NativeSelect};
    use horizon_select_core::Signal;
    use parking_lot::Mutex;

    struct Fixture {
        store: ItemStore,
        host: Arc<Mutex<NativeSelect>>,
        events: Arc<Mutex<Vec<SelectEvent>>>,
    }

    fn fixture(mode: SelectionMode, host: NativeSelect) -> Fixture {
        let signal = Arc::new(Signal::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let seen = events.clone();
        signal.connect(move |event: &SelectEvent| seen.lock().push(event.clone()));

        let host = Arc::new(Mutex::new(host));
        let store = ItemStore::new(
            mode,
            Box::new(host.clone()),
            EventSink::direct(signal),
            Arc::new(Language::english()),
        );
        Fixture {
            store,
            host,
            events,
        }
    }

    fn ids(items: &[Item]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn test_single_select_replaces() {
        let mut f = fixture(SelectionMode::Single, NativeSelect::new());
        assert!(f.store.select(Item::new("a", "A")).is_ok());
        assert!(f.store.select(Item::new("b", "B")).is_ok());
        assert!(f.store.select(Item::new("b", "B")).is_ok());
        assert_eq!(ids(f.store.current()), vec!["b"]);
    }

    #[test]
    fn test_multi_select_duplicate_is_rejected() {
        let mut f = fixture(SelectionMode::Multiple { maximum: 0 }, NativeSelect::new());
        f.store.select(Item::new("a", "A")).unwrap();
        let before = f.events.lock().len();

        assert_eq!(
            f.store.select(Item::new("a", "A")),
            Err(SelectRejection::Duplicate)
        );
        assert_eq!(ids(f.store.current()), vec!["a"]);
        assert_eq!(f.events.lock().len(), before);
    }

    #[test]
    fn test_multi_select_limit() {
        let mut f = fixture(SelectionMode::Multiple { maximum: 2 }, NativeSelect::new());
        f.store.select(Item::new("1", "a")).unwrap();
        f.store.select(Item::new("2", "b")).unwrap();

        assert_eq!(
            f.store.select(Item::new("3", "c")),
            Err(SelectRejection::LimitReached)
        );
        assert_eq!(ids(f.store.current()), vec!["1", "2"]);
        assert_eq!(
            f.events.lock().last(),
            Some(&SelectEvent::SelectionLimitReached {
                maximum: 2,
                message: "You can only select 2 items".into()
            })
        );
    }

    #[test]
    fn test_select_syncs_host_and_emits() {
        let host = NativeSelect::from_options([NativeOption::new("a", "A", false)]);
        let mut f = fixture(SelectionMode::Multiple { maximum: 0 }, host);

        f.store.select(Item::new("a", "A")).unwrap();
        f.store.select(Item::new("tag", "tag")).unwrap();

        let host = f.host.lock();
        assert_eq!(host.options().len(), 2);
        assert_eq!(
            host.selected_values(),
            vec![ItemId::from("a"), ItemId::from("tag")]
        );
        assert_eq!(host.change_count(), 2);

        let events = f.events.lock();
        assert!(matches!(&events[0], SelectEvent::Select { item } if item.id.as_str() == "a"));
        assert!(matches!(&events[1], SelectEvent::Change { selection } if selection.len() == 1));
    }

    #[test]
    fn test_unselect() {
        let mut f = fixture(SelectionMode::Multiple { maximum: 0 }, NativeSelect::new());
        f.store.select(Item::new("a", "A")).unwrap();
        f.store.select(Item::new("b", "B")).unwrap();

        assert!(f.store.unselect(&Item::new("a", "A")));
        assert_eq!(ids(f.store.current()), vec!["b"]);
        assert!(!f.store.unselect(&Item::new("zzz", "")));
    }

    #[test]
    fn test_clear_emits_nothing() {
        let mut f = fixture(SelectionMode::Multiple { maximum: 0 }, NativeSelect::new());
        f.store.select(Item::new("a", "A")).unwrap();
        let before = f.events.lock().len();

        f.store.clear();
        assert!(f.store.current().is_empty());
        assert_eq!(f.events.lock().len(), before);
        assert!(f.host.lock().selected_values().is_empty());
    }

    #[test]
    fn test_pre_seeded_from_host() {
        let host = NativeSelect::from_options([
            NativeOption::new("a", "A", true),
            NativeOption::new("b", "B", true),
        ]);
        let f = fixture(SelectionMode::Single, host);
        assert_eq!(ids(f.store.current()), vec!["b"]);
    }

    #[test]
    fn test_set_data_and_find() {
        let mut f = fixture(SelectionMode::Single, NativeSelect::new());
        f.store.set_data(vec![Entry::Item(Item::new("1", "one"))]);

        assert!(f.store.find(&ItemId::from("1")).is_some());
        assert!(matches!(
            f.events.lock().last(),
            Some(SelectEvent::DataLoaded { data }) if data.len() == 1
        ));

        f.store.set_data(Vec::new());
        assert!(f.store.query().is_empty());
    }

    #[test]
    fn test_replace_universe_is_silent() {
        let mut f = fixture(SelectionMode::Single, NativeSelect::new());
        f.store.replace_universe(vec![Entry::Item(Item::new("r", "remote"))]);
        assert!(f.events.lock().is_empty());
        assert_eq!(f.store.find(&ItemId::from("r")).unwrap().text, "remote");
    }
}
