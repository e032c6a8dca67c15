//! Query coordination.
//!
//! The [`QueryCoordinator`] is a synchronous state machine. It owns the
//! current term, the page cursor and the accumulated remote results, and it
//! decides whether a search is answered locally or by the remote source.
//!
//! Asynchrony stays outside: starting a remote search hands out a
//! [`QueryTicket`], the caller performs the fetch, and hands the page back
//! through [`QueryCoordinator::complete`]. Every new search bumps a
//! generation counter, so a ticket from an older search no longer matches
//! and its page is discarded no matter when it arrives.
//!
//! ```
//! use horizon_select::coordinator::{Completion, QueryCoordinator, QueryPlan};
//! use horizon_select::{Callbacks, RemotePage};
//!
//! let mut coordinator = QueryCoordinator::new(true, false);
//! let callbacks = Callbacks::new();
//!
//! let QueryPlan::Remote(first) = coordinator.begin_search("a") else { unreachable!() };
//! let QueryPlan::Remote(second) = coordinator.begin_search("ab") else { unreachable!() };
//!
//! // The older response arrives last and is ignored.
//! assert!(coordinator.complete(&second, RemotePage::default(), &callbacks).is_applied());
//! assert_eq!(
//!     coordinator.complete(&first, RemotePage::default(), &callbacks),
//!     Completion::Superseded
//! );
//! ```

use horizon_select_core::logging::targets;

use crate::callbacks::Callbacks;
use crate::item::{Entry, flatten};
use crate::matcher::TextMatcher;
use crate::remote::{QueryParams, RemotePage};

/// Conceptual state of the active search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueryState {
    /// No term; the unfiltered collection (or nothing, before the first remote page).
    #[default]
    Idle,
    /// A term is filtered locally.
    LocalFiltering,
    /// A remote request is in flight.
    RemotePending,
    /// At least one page has been applied for the current term.
    RemoteAccumulating,
}

/// Identity of one issued remote request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryTicket {
    generation: u64,
    params: QueryParams,
}

impl QueryTicket {
    /// The query to send.
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Search generation this ticket belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the caller must do to answer a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryPlan {
    /// Filter the local collection with [`QueryCoordinator::filter_local`].
    Local,
    /// Fetch the ticket's page and hand it to [`QueryCoordinator::complete`].
    Remote(QueryTicket),
}

/// Result of handing a page back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Completion {
    /// The page was merged.
    Applied {
        /// `true` if the page was appended to earlier pages.
        appended: bool,
    },
    /// The ticket belongs to an older request; the page was dropped.
    Superseded,
}

impl Completion {
    /// Whether the page was merged.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

/// Owns the term, page cursor and result accumulation.
#[derive(Debug, Default)]
pub struct QueryCoordinator {
    remote: bool,
    tags: bool,
    term: String,
    page: u32,
    generation: u64,
    in_flight: Option<QueryTicket>,
    loading_more: bool,
    has_more: bool,
    accumulated: Vec<Entry>,
    results: Vec<Entry>,
    state: QueryState,
}

impl QueryCoordinator {
    /// Create a coordinator for a local or remote widget.
    pub fn new(remote: bool, tags: bool) -> Self {
        Self {
            remote,
            tags,
            page: 1,
            ..Self::default()
        }
    }

    /// Whether searches go to the remote source.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// The current term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// The current page, starting at 1.
    pub fn current_page(&self) -> u32 {
        self.page
    }

    /// Remote results accumulated for the current term.
    pub fn accumulated(&self) -> &[Entry] {
        &self.accumulated
    }

    /// Whether the server reported another page.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a "load more" request is in flight.
    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Whether any remote request is awaited.
    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// The result list currently on display.
    pub fn results(&self) -> &[Entry] {
        &self.results
    }

    /// The conceptual state.
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// The current search generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a search for `term`.
    ///
    /// Resets the page cursor and the accumulation before anything is
    /// issued, and invalidates every ticket handed out so far.
    pub fn begin_search(&mut self, term: &str) -> QueryPlan {
        self.invalidate();
        self.term = term.to_string();

        if self.remote {
            let ticket = QueryTicket {
                generation: self.generation,
                params: QueryParams::new(term, self.page),
            };
            self.in_flight = Some(ticket.clone());
            self.state = QueryState::RemotePending;
            tracing::debug!(
                target: targets::COORDINATOR,
                term,
                generation = self.generation,
                "remote search issued"
            );
            QueryPlan::Remote(ticket)
        } else {
            self.state = if term.trim().is_empty() {
                QueryState::Idle
            } else {
                QueryState::LocalFiltering
            };
            QueryPlan::Local
        }
    }

    /// Forget the current search without starting another one.
    ///
    /// Used when a term is rejected (too short or too long): any pending
    /// response becomes stale and the result list empties.
    pub fn abandon(&mut self, term: &str) {
        self.invalidate();
        self.term = term.to_string();
        self.results.clear();
        self.state = QueryState::Idle;
    }

    /// Request the next page of the current term.
    ///
    /// Returns `None` unless the widget is remote, the server reported more
    /// pages and no request is in flight.
    pub fn begin_load_more(&mut self) -> Option<QueryTicket> {
        if !self.remote || !self.has_more || self.loading_more || self.in_flight.is_some() {
            return None;
        }

        self.page += 1;
        self.loading_more = true;
        let ticket = QueryTicket {
            generation: self.generation,
            params: QueryParams::new(self.term.clone(), self.page),
        };
        self.in_flight = Some(ticket.clone());
        self.state = QueryState::RemotePending;
        tracing::debug!(
            target: targets::COORDINATOR,
            term = %self.term,
            page = self.page,
            "load more issued"
        );
        Some(ticket)
    }

    /// Filter the local collection for the current term and inject a tag.
    pub fn filter_local(
        &mut self,
        universe: &[Entry],
        matcher: &TextMatcher,
        callbacks: &Callbacks,
    ) -> &[Entry] {
        let mut results = matcher.search(universe, &self.term);
        self.inject_tag(&mut results, callbacks);
        self.results = results;
        &self.results
    }

    /// Hand back the page fetched for `ticket`.
    #[tracing::instrument(
        skip_all,
        target = "horizon_select::coordinator",
        level = "trace",
        fields(generation = ticket.generation, page = ticket.params.page)
    )]
    pub fn complete(
        &mut self,
        ticket: &QueryTicket,
        page: RemotePage,
        callbacks: &Callbacks,
    ) -> Completion {
        if self.in_flight.as_ref() != Some(ticket) {
            tracing::debug!(
                target: targets::COORDINATOR,
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded response"
            );
            return Completion::Superseded;
        }

        self.in_flight = None;
        self.loading_more = false;
        self.has_more = page.pagination.more;

        let appended = ticket.params.page > 1;
        if appended {
            self.accumulated.extend(page.results);
            self.state = QueryState::RemoteAccumulating;
        } else {
            self.accumulated = page.results;
            self.state = if self.term.is_empty() {
                QueryState::Idle
            } else {
                QueryState::RemoteAccumulating
            };
        }

        let mut results = self.accumulated.clone();
        self.inject_tag(&mut results, callbacks);
        self.results = results;

        tracing::debug!(
            target: targets::COORDINATOR,
            count = self.accumulated.len(),
            more = self.has_more,
            appended,
            "response applied"
        );
        Completion::Applied { appended }
    }

    /// Return to the initial state.
    pub fn reset(&mut self) {
        self.invalidate();
        self.term.clear();
        self.results.clear();
        self.state = QueryState::Idle;
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.page = 1;
        self.accumulated.clear();
        self.has_more = false;
        self.loading_more = false;
        self.in_flight = None;
    }

    /// Offer the trimmed term as a new entry unless an item with the same id
    /// (ignoring case) is already listed.
    fn inject_tag(&self, results: &mut Vec<Entry>, callbacks: &Callbacks) {
        let term = self.term.trim();
        if !self.tags || term.is_empty() {
            return;
        }

        let Some(mut tag) = callbacks.create_tag(term) else {
            return;
        };
        if flatten(results)
            .iter()
            .any(|item| item.id.eq_ignore_case(&tag.id))
        {
            return;
        }

        tag.is_tag = true;
        tracing::trace!(target: targets::COORDINATOR, id = %tag.id, "injecting tag");
        callbacks.insert_tag(results, tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Group, Item};
    use crate::remote::Pagination;

    fn page(ids: &[&str], more: bool) -> RemotePage {
        RemotePage {
            results: ids
                .iter()
                .map(|id| Entry::Item(Item::new(*id, *id)))
                .collect(),
            pagination: Pagination { more },
        }
    }

    fn remote_ticket(coordinator: &mut QueryCoordinator, term: &str) -> QueryTicket {
        match coordinator.begin_search(term) {
            QueryPlan::Remote(ticket) => ticket,
            QueryPlan::Local => panic!("expected a remote plan"),
        }
    }

    #[test]
    fn test_local_plan_and_filter() {
        let mut coordinator = QueryCoordinator::new(false, false);
        assert_eq!(coordinator.begin_search("ap"), QueryPlan::Local);
        assert_eq!(coordinator.state(), QueryState::LocalFiltering);

        let universe = vec![
            Entry::Item(Item::new("1", "apple")),
            Entry::Item(Item::new("2", "pear")),
        ];
        let results =
            coordinator.filter_local(&universe, &TextMatcher::default(), &Callbacks::new());
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_pagination_accumulates() {
        let mut coordinator = QueryCoordinator::new(true, false);
        let callbacks = Callbacks::new();

        let first = remote_ticket(&mut coordinator, "");
        coordinator.complete(&first, page(&["x"], true), &callbacks);

        let second = coordinator.begin_load_more().unwrap();
        assert_eq!(second.params().page, 2);
        assert!(coordinator.is_loading_more());
        assert!(coordinator.begin_load_more().is_none());

        let outcome = coordinator.complete(&second, page(&["y"], false), &callbacks);
        assert_eq!(outcome, Completion::Applied { appended: true });
        assert_eq!(flatten(coordinator.results()).len(), 2);
        assert_eq!(coordinator.results()[1], Entry::Item(Item::new("y", "y")));
        assert!(!coordinator.has_more());
        assert!(coordinator.begin_load_more().is_none());
    }

    #[test]
    fn test_term_change_resets_page() {
        let mut coordinator = QueryCoordinator::new(true, false);
        let callbacks = Callbacks::new();

        let first = remote_ticket(&mut coordinator, "a");
        coordinator.complete(&first, page(&["a1"], true), &callbacks);
        let more = coordinator.begin_load_more().unwrap();
        coordinator.complete(&more, page(&["a2"], true), &callbacks);
        assert_eq!(coordinator.current_page(), 2);

        let ticket = remote_ticket(&mut coordinator, "b");
        assert_eq!(coordinator.current_page(), 1);
        assert!(coordinator.accumulated().is_empty());
        assert_eq!(ticket.params().page, 1);
    }

    #[test]
    fn test_stale_ticket_is_discarded() {
        let mut coordinator = QueryCoordinator::new(true, false);
        let callbacks = Callbacks::new();

        let a = remote_ticket(&mut coordinator, "a");
        let b = remote_ticket(&mut coordinator, "b");

        assert!(coordinator.complete(&b, page(&["b"], false), &callbacks).is_applied());
        assert_eq!(
            coordinator.complete(&a, page(&["a"], false), &callbacks),
            Completion::Superseded
        );
        assert_eq!(coordinator.results(), page(&["b"], false).results.as_slice());
    }

    #[test]
    fn test_load_more_superseded_by_new_search() {
        let mut coordinator = QueryCoordinator::new(true, false);
        let callbacks = Callbacks::new();

        let first = remote_ticket(&mut coordinator, "a");
        coordinator.complete(&first, page(&["a1"], true), &callbacks);
        let more = coordinator.begin_load_more().unwrap();

        let fresh = remote_ticket(&mut coordinator, "b");
        assert_eq!(
            coordinator.complete(&more, page(&["a2"], false), &callbacks),
            Completion::Superseded
        );
        assert!(!coordinator.is_loading_more());
        assert!(coordinator.complete(&fresh, page(&["b1"], false), &callbacks).is_applied());
    }

    #[test]
    fn test_abandon_invalidates_pending() {
        let mut coordinator = QueryCoordinator::new(true, false);
        let ticket = remote_ticket(&mut coordinator, "a");
        coordinator.abandon("");
        assert_eq!(
            coordinator.complete(&ticket, page(&["a"], false), &Callbacks::new()),
            Completion::Superseded
        );
    }

    #[test]
    fn test_tag_injection() {
        let mut coordinator = QueryCoordinator::new(false, true);
        let callbacks = Callbacks::new();
        coordinator.begin_search(" new ");

        let universe = vec![Entry::Item(Item::new("1", "news"))];
        let results = coordinator.filter_local(&universe, &TextMatcher::default(), &callbacks);

        let Entry::Item(tag) = &results[0] else {
            panic!("expected the tag first");
        };
        assert!(tag.is_tag);
        assert_eq!(tag.text, "new");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_tag_not_injected_when_id_exists() {
        let mut coordinator = QueryCoordinator::new(false, true);
        coordinator.begin_search("NEW");

        let universe = vec![Entry::Group(Group::new("g", vec![Item::new("new", "New")]))];
        let results =
            coordinator.filter_local(&universe, &TextMatcher::default(), &Callbacks::new());
        assert_eq!(flatten(results).iter().filter(|i| i.is_tag).count(), 0);
    }

    #[test]
    fn test_no_tag_for_blank_term() {
        let mut coordinator = QueryCoordinator::new(false, true);
        coordinator.begin_search("   ");
        let results = coordinator.filter_local(&[], &TextMatcher::default(), &Callbacks::new());
        assert!(results.is_empty());
    }
}
