//! Caller-supplied functions.
//!
//! Each slot is a named function type with a fixed contract. Every call into
//! caller code goes through [`guarded`], which catches a panic, logs it and
//! lets the engine continue with the slot's documented fallback:
//!
//! | slot | fallback on panic |
//! |---|---|
//! | `matcher` | the item does not match |
//! | `create_tag` | no tag is offered |
//! | `insert_tag` | the tag is prepended to the results |
//! | `ajax_data` | default `{term, page}` parameters |
//! | `process_results` | the response is treated as a failed request |

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use horizon_select_core::logging::targets;
use serde_json::Value;

use crate::item::{Entry, Item};
use crate::remote::{QueryParams, RequestParams, TransportRequest};

/// Decides whether `item` matches the search term.
///
/// Receives the raw term; no normalization is applied beforehand.
pub type MatcherFn = Arc<dyn Fn(&str, &Item) -> bool + Send + Sync>;

/// Builds a tag candidate from the trimmed, non-empty search term.
pub type CreateTagFn = Arc<dyn Fn(&str) -> Option<Item> + Send + Sync>;

/// Splices a tag into the result list wherever the caller wants it.
pub type InsertTagFn = Arc<dyn Fn(&mut Vec<Entry>, Item) + Send + Sync>;

/// Turns the query into the parameters sent to the server.
pub type AjaxDataFn = Arc<dyn Fn(&QueryParams) -> RequestParams + Send + Sync>;

/// Reshapes a raw server response into `{results, pagination: {more}}`.
pub type ProcessResultsFn = Arc<dyn Fn(Value, &QueryParams) -> Value + Send + Sync>;

/// Replaces the built-in HTTP transport.
///
/// The returned future is dropped when the request is superseded, and a
/// [`NetworkError::Cancelled`](horizon_select_net::NetworkError::Cancelled)
/// result is treated as a silent cancellation.
pub type TransportFn = Arc<
    dyn Fn(TransportRequest) -> BoxFuture<'static, horizon_select_net::Result<Value>> + Send + Sync,
>;

/// The set of caller-supplied functions.
#[derive(Clone, Default)]
pub struct Callbacks {
    /// Custom matcher; replaces the built-in text matcher.
    pub matcher: Option<MatcherFn>,
    /// Tag factory; defaults to an item whose id and text are the term.
    pub create_tag: Option<CreateTagFn>,
    /// Tag placement; defaults to the front of the list.
    pub insert_tag: Option<InsertTagFn>,
    /// Request parameter transform; defaults to `{term, page}`.
    pub ajax_data: Option<AjaxDataFn>,
    /// Response transform; defaults to the identity.
    pub process_results: Option<ProcessResultsFn>,
    /// Custom transport; defaults to the HTTP client.
    pub transport: Option<TransportFn>,
}

impl Callbacks {
    /// No callbacks; every slot uses its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the matcher.
    pub fn with_matcher<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &Item) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(f));
        self
    }

    /// Set the tag factory.
    pub fn with_create_tag<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> Option<Item> + Send + Sync + 'static,
    {
        self.create_tag = Some(Arc::new(f));
        self
    }

    /// Set the tag placement.
    pub fn with_insert_tag<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Vec<Entry>, Item) + Send + Sync + 'static,
    {
        self.insert_tag = Some(Arc::new(f));
        self
    }

    /// Set the request parameter transform.
    pub fn with_ajax_data<F>(mut self, f: F) -> Self
    where
        F: Fn(&QueryParams) -> RequestParams + Send + Sync + 'static,
    {
        self.ajax_data = Some(Arc::new(f));
        self
    }

    /// Set the response transform.
    pub fn with_process_results<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &QueryParams) -> Value + Send + Sync + 'static,
    {
        self.process_results = Some(Arc::new(f));
        self
    }

    /// Set a custom transport.
    pub fn with_transport<F>(mut self, f: F) -> Self
    where
        F: Fn(TransportRequest) -> BoxFuture<'static, horizon_select_net::Result<Value>>
            + Send
            + Sync
            + 'static,
    {
        self.transport = Some(Arc::new(f));
        self
    }

    /// Build a tag candidate for `term`, or `None` if no tag should be offered.
    pub(crate) fn create_tag(&self, term: &str) -> Option<Item> {
        match &self.create_tag {
            Some(f) => guarded("create_tag", || f(term)).flatten(),
            None => Some(Item::new(term, term)),
        }
    }

    /// Place `tag` into `results`.
    pub(crate) fn insert_tag(&self, results: &mut Vec<Entry>, tag: Item) {
        if let Some(f) = &self.insert_tag {
            let mut candidate = results.clone();
            let inserted = guarded("insert_tag", || {
                f(&mut candidate, tag.clone());
                candidate
            });
            if let Some(candidate) = inserted {
                *results = candidate;
                return;
            }
        }
        results.insert(0, Entry::Item(tag));
    }

    /// Parameters sent to the server for `query`.
    pub(crate) fn request_params(&self, query: &QueryParams) -> RequestParams {
        self.ajax_data
            .as_ref()
            .and_then(|f| guarded("ajax_data", || f(query)))
            .unwrap_or_else(|| query.to_params())
    }

    /// Apply the response transform; `None` means the transform panicked.
    pub(crate) fn process_results(&self, data: Value, query: &QueryParams) -> Option<Value> {
        match &self.process_results {
            Some(f) => guarded("process_results", || f(data, query)),
            None => Some(data),
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("matcher", &self.matcher.is_some())
            .field("create_tag", &self.create_tag.is_some())
            .field("insert_tag", &self.insert_tag.is_some())
            .field("ajax_data", &self.ajax_data.is_some())
            .field("process_results", &self.process_results.is_some())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

/// Run caller code, turning a panic into `None`.
pub(crate) fn guarded<T>(callback: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(
                target: targets::CALLBACKS,
                callback,
                panic = %panic_message(payload.as_ref()),
                "callback panicked, using fallback"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
