//! Paginated remote data source.
//!
//! A [`RemoteSource`] fetches one page of results for a term. It is
//! single-flight: starting a query cancels whatever request the same source
//! still has in flight. Whatever happens on the wire, [`RemoteSource::query`]
//! resolves to a [`RemotePage`]; failures resolve to an empty page and are
//! reported through [`SelectEvent::AjaxError`], cancellations are silent.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use horizon_select_core::logging::targets;
use horizon_select_net::{HttpClient, HttpMethod, NetworkError, RequestHandle, cancellation_pair};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::callbacks::Callbacks;
use crate::config::AjaxConfig;
use crate::error::{Result, SelectError};
use crate::events::{EventSink, SelectEvent};
use crate::item::Entry;

/// Parameters sent to the server, after the `ajax_data` transform.
pub type RequestParams = Map<String, Value>;

/// The logical query: a term and a 1-based page.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryParams {
    /// Search term.
    pub term: String,
    /// Page number, starting at 1.
    pub page: u32,
}

impl QueryParams {
    /// Create query parameters.
    pub fn new(term: impl Into<String>, page: u32) -> Self {
        Self {
            term: term.into(),
            page,
        }
    }

    /// The default request parameters: `{term, page}`.
    pub fn to_params(&self) -> RequestParams {
        let mut params = Map::new();
        params.insert("term".into(), Value::String(self.term.clone()));
        params.insert("page".into(), Value::from(self.page));
        params
    }
}

/// Everything a transport needs to perform one request.
#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    /// Endpoint URL.
    pub url: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Request parameters.
    pub params: RequestParams,
    /// Per-request timeout.
    pub timeout: Option<Duration>,
}

impl TransportRequest {
    /// Parameters flattened to string pairs, as sent in a query string or form body.
    ///
    /// Strings are sent as-is, `null` as an empty string and anything else
    /// as its JSON text.
    pub fn param_pairs(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// The "more pages available" marker of a response.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Whether another page can be requested.
    pub more: bool,
}

/// One normalized page of remote results.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemotePage {
    /// Normalized entries.
    pub results: Vec<Entry>,
    /// Pagination marker.
    pub pagination: Pagination,
}

impl RemotePage {
    /// Parse a processed response shaped `{results: [...], pagination: {more}}`.
    ///
    /// A bare array is accepted as a single, final page. Entries that cannot
    /// be normalized are dropped with a warning.
    pub fn from_value(value: Value) -> Result<Self> {
        let (raw, more) = match value {
            Value::Array(raw) => (raw, false),
            Value::Object(mut map) => {
                let raw = match map.remove("results") {
                    Some(Value::Array(raw)) => raw,
                    Some(other) => {
                        return Err(SelectError::Parse(format!(
                            "`results` must be an array, found {other}"
                        )));
                    }
                    None => {
                        return Err(SelectError::Parse("response has no `results`".into()));
                    }
                };
                let more = map
                    .get("pagination")
                    .and_then(|p| p.get("more"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                (raw, more)
            }
            other => {
                return Err(SelectError::Parse(format!(
                    "expected an object or array, found {other}"
                )));
            }
        };

        let results = raw
            .into_iter()
            .filter_map(|entry| match Entry::from_value(entry) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    tracing::warn!(target: targets::REMOTE, %err, "dropping malformed result");
                    None
                }
            })
            .collect();

        Ok(Self {
            results,
            pagination: Pagination { more },
        })
    }
}

/// How a fetch ended.
#[derive(Debug)]
pub(crate) enum Fetch {
    Page(RemotePage),
    Cancelled,
    Failed,
}

/// Fetches pages of results from a server.
pub struct RemoteSource {
    config: AjaxConfig,
    callbacks: Callbacks,
    client: Option<HttpClient>,
    cache: Mutex<HashMap<String, RemotePage>>,
    pending: Mutex<Option<RequestHandle>>,
    events: EventSink,
}

impl RemoteSource {
    /// Create a remote source.
    ///
    /// Fails if neither a valid `url` nor a custom transport is configured.
    pub fn new(config: AjaxConfig, callbacks: Callbacks, events: EventSink) -> Result<Self> {
        config.validate(callbacks.transport.is_some())?;

        let client = match callbacks.transport {
            Some(_) => None,
            None => Some(HttpClient::builder().build()?),
        };

        Ok(Self {
            config,
            callbacks,
            client,
            cache: Mutex::new(HashMap::new()),
            pending: Mutex::new(None),
            events,
        })
    }

    /// Use a preconfigured HTTP client for the built-in transport.
    pub fn with_http_client(mut self, client: HttpClient) -> Self {
        if self.callbacks.transport.is_none() {
            self.client = Some(client);
        }
        self
    }

    /// The remote configuration.
    pub fn config(&self) -> &AjaxConfig {
        &self.config
    }

    /// Fetch one page.
    #[tracing::instrument(
        skip_all,
        target = "horizon_select::remote",
        level = "debug",
        fields(term = %query.term, page = query.page)
    )]
    pub async fn query(&self, query: &QueryParams) -> RemotePage {
        match self.fetch(query).await {
            Fetch::Page(page) => page,
            Fetch::Cancelled | Fetch::Failed => RemotePage::default(),
        }
    }

    /// Fetch one page, reporting how the request ended.
    pub(crate) async fn fetch(&self, query: &QueryParams) -> Fetch {
        let params = self.callbacks.request_params(query);
        let request = TransportRequest {
            url: self.config.url.clone().unwrap_or_default(),
            method: self.config.method,
            headers: self.config.headers.clone(),
            params: params.clone(),
            timeout: self.config.request_timeout(),
        };

        let cached_under = self.config.cache.then(|| cache_key(&request));
        if let Some(key) = &cached_under
            && let Some(page) = self.cache.lock().get(key)
        {
            tracing::debug!(target: targets::REMOTE, "cache hit");
            return Fetch::Page(page.clone());
        }

        let (handle, cancellation) = cancellation_pair();
        let request_id = handle.id;
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.cancel();
        }

        self.events.emit(SelectEvent::AjaxLoading {
            params: params.clone(),
        });

        let outcome = match (&self.callbacks.transport, &self.client) {
            (Some(transport), _) => cancellation.run(transport(request)).await,
            (None, Some(client)) => {
                cancellation
                    .run(default_transport(client.clone(), request))
                    .await
            }
            (None, None) => Err(NetworkError::Request("no transport configured".into())),
        };

        {
            let mut pending = self.pending.lock();
            if pending.as_ref().is_some_and(|h| h.id == request_id) {
                *pending = None;
            }
        }

        let data = match outcome {
            Ok(data) => data,
            Err(err) if err.is_cancelled() => {
                tracing::debug!(target: targets::REMOTE, "request cancelled");
                return Fetch::Cancelled;
            }
            Err(err) => {
                tracing::warn!(target: targets::REMOTE, %err, "request failed");
                return self.fail(err.into(), params);
            }
        };

        let page = match self
            .callbacks
            .process_results(data, query)
            .ok_or_else(|| SelectError::Parse("process_results panicked".into()))
            .and_then(RemotePage::from_value)
        {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(target: targets::REMOTE, %err, "unusable response");
                return self.fail(err, params);
            }
        };

        if let Some(key) = cached_under {
            self.cache.lock().insert(key, page.clone());
        }

        tracing::debug!(
            target: targets::REMOTE,
            count = page.results.len(),
            more = page.pagination.more,
            "page loaded"
        );
        self.events.emit(SelectEvent::AjaxSuccess {
            results: page.results.clone(),
            params,
        });
        Fetch::Page(page)
    }

    /// Cancel the in-flight request, if any.
    pub fn cancel_pending(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) => handle.cancel(),
            None => false,
        }
    }

    /// Whether a request is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(RequestHandle::is_pending)
    }

    /// Drop every cached page.
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached pages.
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn fail(&self, error: SelectError, params: RequestParams) -> Fetch {
        self.events.emit(SelectEvent::AjaxError { error, params });
        Fetch::Failed
    }
}

impl std::fmt::Debug for RemoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSource")
            .field("config", &self.config)
            .field("callbacks", &self.callbacks)
            .field("cached", &self.cache_len())
            .finish_non_exhaustive()
    }
}

/// Cache key over everything that shapes the response.
fn cache_key(request: &TransportRequest) -> String {
    serde_json::json!({
        "url": request.url,
        "method": request.method.to_string(),
        "params": request.params,
    })
    .to_string()
}

/// The built-in HTTP transport: GET sends parameters in the query string,
/// every other method in a form body.
async fn default_transport(
    client: HttpClient,
    request: TransportRequest,
) -> horizon_select_net::Result<Value> {
    let pairs = request.param_pairs();
    let mut builder = client.request(request.method, &request.url);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = request.timeout {
        builder = builder.timeout(timeout);
    }
    builder = if request.method.uses_query_string() {
        builder.query_pairs(pairs)
    } else {
        builder.form_pairs(pairs)
    };

    builder.send().await?.error_for_status()?.json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::FutureExt;
    use horizon_select_core::Signal;
    use serde_json::json;
    use std::sync::Arc;

    fn source_with(
        callbacks: Callbacks,
        cache: bool,
    ) -> (RemoteSource, Arc<Mutex<Vec<SelectEvent>>>) {
        let signal = Arc::new(Signal::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        signal.connect(move |event: &SelectEvent| sink.lock().push(event.clone()));

        let config = AjaxConfig {
            cache,
            ..AjaxConfig::default()
        };
        let source = RemoteSource::new(config, callbacks, EventSink::direct(signal)).unwrap();
        (source, seen)
    }

    fn counting_transport(calls: Arc<Mutex<u32>>, response: Value) -> Callbacks {
        Callbacks::new().with_transport(move |_request| {
            *calls.lock() += 1;
            let response = response.clone();
            async move { Ok(response) }.boxed()
        })
    }

    #[test]
    fn test_missing_url_without_transport_is_config_error() {
        let signal = Arc::new(Signal::new());
        let err = RemoteSource::new(
            AjaxConfig::default(),
            Callbacks::new(),
            EventSink::direct(signal),
        )
        .unwrap_err();
        assert!(matches!(err, SelectError::Config(_)));
    }

    #[test]
    fn test_page_parsing() {
        let page = RemotePage::from_value(json!({
            "results": [{"id": 1, "text": "x"}, {"bogus": true}],
            "pagination": {"more": true}
        }))
        .unwrap();
        assert_eq!(page.results.len(), 1);
        assert!(page.pagination.more);

        let page = RemotePage::from_value(json!(["a", "b"])).unwrap();
        assert_eq!(page.results.len(), 2);
        assert!(!page.pagination.more);

        assert!(RemotePage::from_value(json!({"items": []})).is_err());
    }

    #[test]
    fn test_param_pairs() {
        let mut params = QueryParams::new("fr", 2).to_params();
        params.insert("flag".into(), Value::Null);
        let request = TransportRequest {
            url: String::new(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            params,
            timeout: None,
        };
        let pairs = request.param_pairs();
        assert!(pairs.contains(&("term".into(), "fr".into())));
        assert!(pairs.contains(&("page".into(), "2".into())));
        assert!(pairs.contains(&("flag".into(), String::new())));
    }

    #[tokio::test]
    async fn test_success_emits_loading_and_success() {
        let calls = Arc::new(Mutex::new(0));
        let (source, events) = source_with(
            counting_transport(calls, json!({"results": [{"id": 1, "text": "x"}]})),
            false,
        );

        let page = source.query(&QueryParams::new("x", 1)).await;
        assert_eq!(page.results.len(), 1);

        let events = events.lock();
        assert!(matches!(&events[0], SelectEvent::AjaxLoading { params } if params["term"] == "x"));
        assert!(matches!(&events[1], SelectEvent::AjaxSuccess { results, .. } if results.len() == 1));
    }

    #[tokio::test]
    async fn test_cache_skips_transport() {
        let calls = Arc::new(Mutex::new(0));
        let (source, _) = source_with(
            counting_transport(calls.clone(), json!({"results": []})),
            true,
        );

        source.query(&QueryParams::new("a", 1)).await;
        source.query(&QueryParams::new("a", 1)).await;
        source.query(&QueryParams::new("a", 2)).await;
        assert_eq!(*calls.lock(), 2);
        assert_eq!(source.cache_len(), 2);

        source.clear_cache();
        source.query(&QueryParams::new("a", 1)).await;
        assert_eq!(*calls.lock(), 3);
    }

    #[tokio::test]
    async fn test_failure_resolves_empty_and_reports() {
        let callbacks = Callbacks::new().with_transport(|_| {
            async { Err(NetworkError::HttpStatus { status: 500, message: None }) }.boxed()
        });
        let (source, events) = source_with(callbacks, false);

        let page = source.query(&QueryParams::new("x", 1)).await;
        assert_eq!(page, RemotePage::default());
        assert!(matches!(
            events.lock().last(),
            Some(SelectEvent::AjaxError { error: SelectError::Network(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_cancellation_is_silent() {
        let callbacks = Callbacks::new()
            .with_transport(|_| async { Err(NetworkError::Cancelled) }.boxed());
        let (source, events) = source_with(callbacks, false);

        let page = source.query(&QueryParams::new("x", 1)).await;
        assert!(page.results.is_empty());
        assert!(
            !events
                .lock()
                .iter()
                .any(|e| matches!(e, SelectEvent::AjaxError { .. }))
        );
    }

    #[tokio::test]
    async fn test_panicking_process_results_takes_error_path() {
        let callbacks = counting_transport(Arc::new(Mutex::new(0)), json!({"results": []}))
            .with_process_results(|_, _| panic!("bad shape"));
        let (source, events) = source_with(callbacks, false);

        let page = source.query(&QueryParams::new("x", 1)).await;
        assert!(page.results.is_empty());
        assert!(matches!(
            events.lock().last(),
            Some(SelectEvent::AjaxError { error: SelectError::Parse(_), .. })
        ));
    }

    #[tokio::test]
    async fn test_new_query_cancels_previous() {
        let callbacks = Callbacks::new().with_transport(|request| {
            async move {
                if request.params["term"] == "slow" {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
                Ok(json!({"results": [request.params["term"].clone()]}))
            }
            .boxed()
        });
        let (source, events) = source_with(callbacks, false);
        let source = Arc::new(source);

        let slow = tokio::spawn({
            let source = source.clone();
            async move { source.query(&QueryParams::new("slow", 1)).await }
        });
        tokio::task::yield_now().await;
        while !source.is_pending() {
            tokio::task::yield_now().await;
        }

        let fast = source.query(&QueryParams::new("fast", 1)).await;
        assert_eq!(fast.results.len(), 1);

        let slow = slow.await.unwrap();
        assert!(slow.results.is_empty());
        assert!(
            !events
                .lock()
                .iter()
                .any(|e| matches!(e, SelectEvent::AjaxError { .. }))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_queries_leave_one_request_uncancelled() {
        const QUERIES: usize = 16;
        let started = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = started.clone();
        let callbacks = Callbacks::new().with_transport(move |_request| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            futures_util::future::pending().boxed()
        });
        let (source, _events) = source_with(callbacks, false);
        let source = Arc::new(source);

        let queries: Vec<_> = (0..QUERIES)
            .map(|n| {
                let source = source.clone();
                tokio::spawn(async move { source.query(&QueryParams::new(n.to_string(), 1)).await })
            })
            .collect();
        while started.load(std::sync::atomic::Ordering::SeqCst) < QUERIES {
            tokio::task::yield_now().await;
        }

        // Each query cancelled its predecessor, so one cancel ends the last.
        assert!(source.cancel_pending());
        for query in queries {
            let page = tokio::time::timeout(Duration::from_secs(5), query)
                .await
                .expect("query escaped cancellation")
                .unwrap();
            assert!(page.results.is_empty());
        }
        assert!(!source.is_pending());
    }
}
