//! The `Select` widget engine.
//!
//! [`Select`] wires the item store, matcher, query coordinator, remote
//! source, navigator and notice board together behind one handle. All
//! methods take `&self`; state lives behind a single lock that is never held
//! across an `await` or while slots run. Events raised under the lock are
//! queued and delivered once it is released, so a slot may call straight
//! back into the widget.
//!
//! # Example
//!
//! ```
//! use horizon_select::{Entry, Item, Select, SelectConfig, SelectEvent};
//!
//! # tokio_test_block(async {
//! let select = Select::builder(SelectConfig::default().with_multiple(2))
//!     .data(vec![
//!         Entry::from(Item::new("fr", "France")),
//!         Entry::from(Item::new("es", "España")),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! select.events().connect(|event| {
//!     if let SelectEvent::Results { results } = event {
//!         println!("{} results", results.len());
//!     }
//! });
//!
//! select.search("espana").await;
//! assert_eq!(select.results().len(), 1);
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use horizon_select_core::Signal;
use horizon_select_core::logging::targets;
use horizon_select_net::HttpClient;
use parking_lot::Mutex;

use crate::callbacks::Callbacks;
use crate::config::SelectConfig;
use crate::coordinator::{Completion, QueryCoordinator, QueryPlan, QueryState, QueryTicket};
use crate::error::Result;
use crate::events::{EventSink, SelectEvent};
use crate::host::{DetachedHost, HostControl};
use crate::item::{self, Entry, Item, ItemId};
use crate::language::{Language, TranslationArgs, keys};
use crate::matcher::TextMatcher;
use crate::navigation::{NavigationIntent, Navigator};
use crate::notice::{Notice, NoticeBoard, NoticeKind};
use crate::remote::{Fetch, RemotePage, RemoteSource};
use crate::store::{ItemStore, SelectRejection, SelectionMode};

/// Mutable widget state, guarded by one lock.
#[derive(Debug)]
struct State {
    store: ItemStore,
    coordinator: QueryCoordinator,
    navigator: Navigator,
    notices: NoticeBoard,
    open: bool,
    destroyed: bool,
}

/// A searchable, optionally remote-backed selection widget.
pub struct Select {
    config: SelectConfig,
    callbacks: Callbacks,
    language: Arc<Language>,
    matcher: TextMatcher,
    signal: Arc<Signal<SelectEvent>>,
    events: EventSink,
    remote: Option<Arc<RemoteSource>>,
    state: Mutex<State>,
    input_generation: AtomicU64,
}

impl Select {
    /// Create a widget attached to `host`.
    ///
    /// Fails when the configuration is contradictory or a remote source is
    /// configured without a usable endpoint.
    pub fn new(
        config: SelectConfig,
        callbacks: Callbacks,
        host: impl HostControl + 'static,
    ) -> Result<Self> {
        Self::builder(config).callbacks(callbacks).host(host).build()
    }

    /// Create a widget seeded with local data.
    pub fn with_data(
        config: SelectConfig,
        callbacks: Callbacks,
        host: impl HostControl + 'static,
        data: Vec<Entry>,
    ) -> Result<Self> {
        Self::builder(config)
            .callbacks(callbacks)
            .host(host)
            .data(data)
            .build()
    }

    /// Start building a widget from `config`.
    pub fn builder(config: SelectConfig) -> SelectBuilder {
        SelectBuilder::new(config)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The widget's event signal.
    pub fn events(&self) -> &Arc<Signal<SelectEvent>> {
        &self.signal
    }

    /// The configuration the widget was built with.
    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    /// The language table in use.
    pub fn language(&self) -> &Language {
        &self.language
    }

    /// The remote source, when one is configured.
    pub fn remote_source(&self) -> Option<&Arc<RemoteSource>> {
        self.remote.as_ref()
    }

    /// The current selection, in order.
    pub fn selection(&self) -> Vec<Item> {
        self.state.lock().store.current().to_vec()
    }

    /// The full, unfiltered collection.
    pub fn data(&self) -> Arc<[Entry]> {
        self.state.lock().store.query()
    }

    /// The result list on display.
    pub fn results(&self) -> Vec<Entry> {
        self.state.lock().coordinator.results().to_vec()
    }

    /// The current search term.
    pub fn term(&self) -> String {
        self.state.lock().coordinator.term().to_string()
    }

    /// The conceptual query state.
    pub fn query_state(&self) -> QueryState {
        self.state.lock().coordinator.state()
    }

    /// Whether the server reported another page for the current term.
    pub fn has_more(&self) -> bool {
        self.state.lock().coordinator.has_more()
    }

    /// The current remote page.
    pub fn current_page(&self) -> u32 {
        self.state.lock().coordinator.current_page()
    }

    /// The highlighted row.
    pub fn highlighted(&self) -> Option<Item> {
        self.state.lock().navigator.highlighted_item().cloned()
    }

    /// Messages on display.
    pub fn notices(&self) -> Vec<Notice> {
        self.state.lock().notices.active()
    }

    /// Whether the dropdown is open.
    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    // =========================================================================
    // Data and querying
    // =========================================================================

    /// Replace the local collection.
    ///
    /// The result list is not refreshed; run [`search`](Self::search) for that.
    pub fn set_data(&self, entries: Vec<Entry>) {
        self.state.lock().store.set_data(entries);
        self.events.flush();
    }

    /// Typed input.
    ///
    /// Waits for the configured debounce (`searchDelay`, or `ajax.delay` for
    /// a remote widget) and then searches. A newer call made while this one
    /// is still waiting wins; this one then returns without searching.
    /// Ignored when the widget is not searchable.
    pub async fn input(&self, term: &str) {
        if !self.config.searchable {
            return;
        }

        let generation = self.input_generation.fetch_add(1, Ordering::AcqRel) + 1;
        let delay = self.config.input_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.input_generation.load(Ordering::Acquire) != generation {
            tracing::trace!(target: targets::SELECT, term, "input superseded");
            return;
        }
        self.search(term).await;
    }

    /// Search for `term` now.
    #[tracing::instrument(skip(self), target = "horizon_select::select", level = "debug")]
    pub async fn search(&self, term: &str) {
        let ticket = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            self.begin_search(&mut state, term)
        };
        self.events.flush();

        if let Some(ticket) = ticket {
            self.run_remote(ticket).await;
        }
    }

    /// Fetch the next page of the current term.
    ///
    /// Returns `false` if there is nothing to load or a request is already
    /// in flight.
    pub async fn load_more(&self) -> bool {
        let ticket = {
            let mut state = self.state.lock();
            if state.destroyed {
                return false;
            }
            let Some(ticket) = state.coordinator.begin_load_more() else {
                return false;
            };
            let message = self
                .language
                .translate(keys::LOADING_MORE, &TranslationArgs::default());
            state
                .notices
                .post(NoticeKind::LoadingMore, message, now());
            ticket
        };
        self.events.flush();

        self.run_remote(ticket).await;
        true
    }

    fn begin_search(&self, state: &mut State, term: &str) -> Option<QueryTicket> {
        let now = now();
        self.events.emit(SelectEvent::Query {
            term: term.to_string(),
        });

        // A new term also supersedes any page still loading for the old one.
        for kind in [
            NoticeKind::InputTooShort,
            NoticeKind::InputTooLong,
            NoticeKind::NoResults,
            NoticeKind::LoadingMore,
        ] {
            state.notices.dismiss(kind, now);
        }

        let length = term.chars().count();
        let minimum = self.config.search_minimum_length;
        let maximum = self.config.maximum_input_length;
        let rejected = if length < minimum {
            let args = TranslationArgs::minimum(minimum, term);
            Some((NoticeKind::InputTooShort, keys::INPUT_TOO_SHORT, args))
        } else if maximum > 0 && length > maximum {
            let args = TranslationArgs {
                maximum,
                input: term.to_string(),
                ..TranslationArgs::default()
            };
            Some((NoticeKind::InputTooLong, keys::INPUT_TOO_LONG, args))
        } else {
            None
        };

        if let Some((kind, key, args)) = rejected {
            tracing::debug!(target: targets::SELECT, term, ?kind, "term rejected");
            state.coordinator.abandon(term);
            state.navigator.clear();
            state.notices.dismiss(NoticeKind::Searching, now);
            state
                .notices
                .post(kind, self.language.translate(key, &args), now);
            self.events.emit(SelectEvent::Results {
                results: Vec::new(),
            });
            return None;
        }

        match state.coordinator.begin_search(term) {
            QueryPlan::Local => {
                let universe = state.store.query();
                let results = state
                    .coordinator
                    .filter_local(&universe, &self.matcher, &self.callbacks)
                    .to_vec();
                self.show_results(state, results, now);
                None
            }
            QueryPlan::Remote(ticket) => {
                let message = self
                    .language
                    .translate(keys::SEARCHING, &TranslationArgs::default());
                state.notices.post(NoticeKind::Searching, message, now);
                Some(ticket)
            }
        }
    }

    async fn run_remote(&self, ticket: QueryTicket) {
        let Some(remote) = &self.remote else {
            return;
        };
        let outcome = remote.fetch(ticket.params()).await;

        {
            let mut state = self.state.lock();
            let now = now();
            let (page, failed) = match outcome {
                Fetch::Page(page) => (page, false),
                Fetch::Cancelled => (RemotePage::default(), false),
                Fetch::Failed => (RemotePage::default(), true),
            };

            let completion = state.coordinator.complete(&ticket, page, &self.callbacks);
            let Completion::Applied { appended } = completion else {
                return;
            };

            state.notices.dismiss(NoticeKind::Searching, now);
            if appended {
                state.notices.dismiss(NoticeKind::LoadingMore, now);
            }
            if failed {
                let message = self
                    .language
                    .translate(keys::ERROR_LOADING, &TranslationArgs::default());
                state.notices.post(NoticeKind::Error, message, now);
            }

            let accumulated = state.coordinator.accumulated().to_vec();
            state.store.replace_universe(accumulated);
            let results = state.coordinator.results().to_vec();
            self.show_results(&mut state, results, now);
        }
        self.events.flush();
    }

    fn show_results(&self, state: &mut State, results: Vec<Entry>, now: Instant) {
        state.navigator.set_results(&results);
        if results.is_empty() {
            let message = self
                .language
                .translate(keys::NO_RESULTS, &TranslationArgs::default());
            state.notices.post(NoticeKind::NoResults, message, now);
        } else {
            state.notices.dismiss(NoticeKind::NoResults, now);
        }
        self.events.emit(SelectEvent::Results { results });
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Apply a navigation intent.
    ///
    /// `Confirm` toggles the highlighted row. After a selection the dropdown
    /// closes in single mode (when `closeOnSelect` is set); in multi mode the
    /// term is cleared and the unfiltered list is queried again.
    pub async fn navigate(&self, intent: NavigationIntent) {
        let requery = {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            match intent {
                NavigationIntent::Next => state.navigator.move_by(1),
                NavigationIntent::Previous => state.navigator.move_by(-1),
                NavigationIntent::First => state.navigator.move_to_first(),
                NavigationIntent::Last => state.navigator.move_to_last(),
                NavigationIntent::Cancel => self.set_open(&mut state, false),
                NavigationIntent::Confirm => {}
            }
            intent == NavigationIntent::Confirm && self.confirm(&mut state)
        };
        self.events.flush();

        if requery {
            self.search("").await;
        }
    }

    /// Returns `true` when the caller should re-query the empty term.
    fn confirm(&self, state: &mut State) -> bool {
        let Some(item) = state.navigator.confirm_highlighted().cloned() else {
            return false;
        };
        let multiple = matches!(state.store.mode(), SelectionMode::Multiple { .. });

        if multiple && state.store.is_selected(&item.id) {
            state.store.unselect(&item);
            return false;
        }
        if self.select_locked(state, item).is_err() {
            return false;
        }

        if multiple {
            true
        } else {
            if self.config.close_on_select {
                self.set_open(state, false);
            }
            false
        }
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select the item with `id`.
    ///
    /// The item is looked up in the collection, the selection and the result
    /// list on display (which may hold a tag). Returns `false` if it is
    /// unknown, disabled, already selected or over the limit.
    pub fn select_item(&self, id: &ItemId) -> bool {
        let selected = {
            let mut state = self.state.lock();
            let found = state
                .store
                .find(id)
                .or_else(|| item::find(state.coordinator.results(), id).cloned());
            match found {
                Some(item) if !item.disabled && !state.destroyed => {
                    self.select_locked(&mut state, item).is_ok()
                }
                _ => false,
            }
        };
        self.events.flush();
        selected
    }

    /// Remove the item with `id` from the selection.
    pub fn unselect_item(&self, id: &ItemId) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let found = state
                .store
                .current()
                .iter()
                .find(|item| &item.id == id)
                .cloned();
            match found {
                Some(item) => state.store.unselect(&item),
                None => false,
            }
        };
        self.events.flush();
        removed
    }

    /// Empty the selection.
    ///
    /// Announces `Clear` and then `Change` once; does nothing if the
    /// selection is already empty.
    pub fn clear(&self) -> bool {
        {
            let mut state = self.state.lock();
            if state.store.current().is_empty() {
                return false;
            }
            state.store.clear();
            self.events.emit(SelectEvent::Clear);
            self.events.emit(SelectEvent::Change {
                selection: Vec::new(),
            });
        }
        self.events.flush();
        true
    }

    fn select_locked(
        &self,
        state: &mut State,
        item: Item,
    ) -> std::result::Result<(), SelectRejection> {
        let result = state.store.select(item);
        if result == Err(SelectRejection::LimitReached)
            && let SelectionMode::Multiple { maximum } = state.store.mode()
        {
            let message = self
                .language
                .translate(keys::MAXIMUM_SELECTED, &TranslationArgs::maximum(maximum));
            state
                .notices
                .post(NoticeKind::SelectionLimit, message, now());
        }
        result
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the dropdown.
    pub fn open(&self) {
        {
            let mut state = self.state.lock();
            if !state.destroyed {
                self.set_open(&mut state, true);
            }
        }
        self.events.flush();
    }

    /// Close the dropdown.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            self.set_open(&mut state, false);
        }
        self.events.flush();
    }

    fn set_open(&self, state: &mut State, open: bool) {
        if state.open == open {
            return;
        }
        state.open = open;
        tracing::debug!(target: targets::SELECT, open, "dropdown toggled");
        self.events.emit(if open {
            SelectEvent::Open
        } else {
            SelectEvent::Close
        });
    }

    /// Fire due notice timers.
    pub fn tick(&self, now: Instant) {
        self.state.lock().notices.tick(now);
    }

    /// Earliest notice deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.lock().notices.next_deadline()
    }

    /// Tear the widget down.
    ///
    /// Empties the selection and collection, cancels the in-flight request,
    /// pending debounces and notice timers, clears the remote cache and
    /// disconnects every slot. Later calls are no-ops.
    pub fn destroy(&self) {
        {
            let mut state = self.state.lock();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.open = false;
            state.store.teardown();
            state.coordinator.reset();
            state.navigator.clear();
            state.notices.clear();
        }

        self.input_generation.fetch_add(1, Ordering::AcqRel);
        if let Some(remote) = &self.remote {
            remote.cancel_pending();
            remote.clear_cache();
        }
        self.events.discard();
        self.signal.disconnect_all();
        tracing::debug!(target: targets::SELECT, "destroyed");
    }

    /// Whether [`destroy`](Self::destroy) was called.
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }
}

impl std::fmt::Debug for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .field("remote", &self.remote)
            .finish_non_exhaustive()
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for [`Select`].
pub struct SelectBuilder {
    config: SelectConfig,
    callbacks: Callbacks,
    host: Box<dyn HostControl>,
    language: Option<Language>,
    data: Option<Vec<Entry>>,
    http_client: Option<HttpClient>,
}

impl SelectBuilder {
    /// Start from `config`, detached from any host control.
    pub fn new(config: SelectConfig) -> Self {
        Self {
            config,
            callbacks: Callbacks::default(),
            host: Box::new(DetachedHost),
            language: None,
            data: None,
            http_client: None,
        }
    }

    /// Set the caller-supplied functions.
    pub fn callbacks(mut self, callbacks: Callbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Attach to a host control.
    pub fn host(mut self, host: impl HostControl + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    /// Replace the built-in language table picked from `locale`.
    pub fn language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    /// Seed the local collection.
    pub fn data(mut self, data: Vec<Entry>) -> Self {
        self.data = Some(data);
        self
    }

    /// Use a preconfigured HTTP client for the built-in transport.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validate the configuration and build the widget.
    pub fn build(self) -> Result<Select> {
        self.config
            .validate(self.callbacks.transport.is_some())?;

        let language = Arc::new(self.language.unwrap_or_else(|| self.config.language()));
        let signal = Arc::new(Signal::new());
        let events = EventSink::queued(Arc::clone(&signal));

        let remote = match &self.config.ajax {
            Some(ajax) => {
                let mut source = RemoteSource::new(
                    ajax.clone(),
                    self.callbacks.clone(),
                    EventSink::direct(Arc::clone(&signal)),
                )?;
                if let Some(client) = self.http_client {
                    source = source.with_http_client(client);
                }
                Some(Arc::new(source))
            }
            None => None,
        };

        let matcher = match &self.callbacks.matcher {
            Some(custom) => TextMatcher::custom(Arc::clone(custom)),
            None => TextMatcher::new(self.config.match_strategy),
        };

        let mut store = ItemStore::new(
            self.config.selection_mode(),
            self.host,
            events.clone(),
            Arc::clone(&language),
        );
        if let Some(data) = self.data {
            store.set_data(data);
        }
        // Nothing is connected yet.
        events.discard();

        let coordinator = QueryCoordinator::new(remote.is_some(), self.config.tags);
        tracing::debug!(
            target: targets::SELECT,
            remote = remote.is_some(),
            mode = ?self.config.selection_mode(),
            "select created"
        );

        Ok(Select {
            config: self.config,
            callbacks: self.callbacks,
            language,
            matcher,
            signal,
            events,
            remote,
            state: Mutex::new(State {
                store,
                coordinator,
                navigator: Navigator::new(),
                notices: NoticeBoard::new(),
                open: false,
                destroyed: false,
            }),
            input_generation: AtomicU64::new(0),
        })
    }
}

impl std::fmt::Debug for SelectBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectBuilder")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}
