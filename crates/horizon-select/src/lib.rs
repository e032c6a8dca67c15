//! Horizon Select: a searchable, paginated selection engine.
//!
//! This crate holds everything a select/autocomplete widget needs below its
//! rendering layer:
//!
//! - **Item model**: [`Item`], [`Group`] and [`Entry`], normalized from JSON
//! - **Item Store**: the item universe and the selection, mirrored onto a [`HostControl`]
//! - **Text Matcher**: case- and diacritic-insensitive filtering that keeps groups intact
//! - **Remote Source**: paginated HTTP fetching with caching and cancellation
//! - **Query Coordinator**: local/remote dispatch, page accumulation, stale-response discard
//! - **Navigation**: a highlight cursor that skips disabled rows
//! - **Notices**: timed inline messages for limits, errors and loading
//!
//! The [`Select`] facade wires them together and publishes every change as a
//! [`SelectEvent`] on one signal.
//!
//! # Local data
//!
//! ```
//! use horizon_select::{Item, ItemId, Select, SelectConfig, SelectEvent};
//!
//! let select = Select::builder(SelectConfig::default().with_multiple(2))
//!     .data(vec![
//!         Item::new("1", "a").into(),
//!         Item::new("2", "b").into(),
//!         Item::new("3", "c").into(),
//!     ])
//!     .build()
//!     .unwrap();
//!
//! select.events().connect(|event| {
//!     if let SelectEvent::SelectionLimitReached { message, .. } = event {
//!         println!("{message}");
//!     }
//! });
//!
//! assert!(select.select_item(&ItemId::from("1")));
//! assert!(select.select_item(&ItemId::from("2")));
//! assert!(!select.select_item(&ItemId::from("3")));
//! assert_eq!(select.selection().len(), 2);
//! ```
//!
//! # Remote data
//!
//! ```ignore
//! use horizon_select::{AjaxConfig, Select, SelectConfig};
//!
//! let config = SelectConfig::default()
//!     .with_ajax(AjaxConfig::new("https://api.example.com/countries"));
//! let select = Select::builder(config).build()?;
//!
//! select.input("fra").await;
//! if select.has_more() {
//!     select.load_more().await;
//! }
//! ```

mod callbacks;
mod config;
pub mod coordinator;
mod error;
mod events;
mod host;
mod item;
mod language;
mod matcher;
pub mod navigation;
pub mod notice;
mod remote;
mod select;
mod store;

pub use callbacks::{
    AjaxDataFn, Callbacks, CreateTagFn, InsertTagFn, MatcherFn, ProcessResultsFn, TransportFn,
};
pub use config::{AjaxConfig, SelectConfig};
pub use coordinator::{Completion, QueryCoordinator, QueryPlan, QueryState, QueryTicket};
pub use error::{Result, SelectError};
pub use events::{EventSink, SelectEvent};
pub use host::{DetachedHost, HostControl, NativeOption, NativeSelect};
pub use item::{Entry, Group, Item, ItemId, find, flatten};
pub use language::{Language, TemplateFn, Translation, TranslationArgs, keys};
pub use matcher::{MatchStrategy, TextMatcher, fold};
pub use navigation::{NavigationIntent, Navigator};
pub use notice::{Notice, NoticeBoard, NoticeKind};
pub use remote::{
    Pagination, QueryParams, RemotePage, RemoteSource, RequestParams, TransportRequest,
};
pub use select::{Select, SelectBuilder};
pub use store::{ItemStore, SelectRejection, SelectionMode};

// Re-export the layers below for callers that need them directly
pub use horizon_select_core::{ConnectionGuard, ConnectionId, Signal};
pub use horizon_select_net::{HttpClient, HttpMethod, NetworkError};
