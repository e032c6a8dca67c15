//! Widget configuration.
//!
//! [`SelectConfig`] holds every serialisable option and can be loaded from
//! TOML or JSON with the same camelCase keys. Caller-supplied functions live
//! separately in [`Callbacks`](crate::Callbacks).
//!
//! ```
//! use horizon_select::SelectConfig;
//!
//! let config = SelectConfig::from_toml_str(r#"
//!     multiple = true
//!     maximumSelectionLength = 3
//!
//!     [ajax]
//!     url = "https://api.example.com/countries"
//!     delay = 250
//! "#).unwrap();
//!
//! assert_eq!(config.maximum_selection_length, 3);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use horizon_select_net::HttpMethod;
use serde::Deserialize;

use crate::error::{Result, SelectError};
use crate::language::Language;
use crate::matcher::MatchStrategy;
use crate::store::SelectionMode;

/// Remote data source options.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AjaxConfig {
    /// Endpoint URL. Required unless a custom transport is supplied.
    pub url: Option<String>,
    /// HTTP method; `GET` sends parameters in the query string.
    pub method: HttpMethod,
    /// Input debounce in milliseconds.
    pub delay: u64,
    /// Cache pages by request parameters.
    pub cache: bool,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
    /// Request timeout in milliseconds; no timeout when unset.
    pub timeout: Option<u64>,
}

impl AjaxConfig {
    /// Remote options for `url` with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Input debounce.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    /// Per-request timeout, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_millis)
    }

    /// Check that a request can be built.
    pub fn validate(&self, has_transport: bool) -> Result<()> {
        if has_transport {
            return Ok(());
        }
        match self.url.as_deref() {
            None | Some("") => Err(SelectError::Config(
                "ajax.url is required without a custom transport".into(),
            )),
            Some(url) => url::Url::parse(url)
                .map(|_| ())
                .map_err(|e| SelectError::Config(format!("ajax.url `{url}` is invalid: {e}"))),
        }
    }
}

/// Every serialisable widget option.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectConfig {
    /// Allow more than one selected item.
    pub multiple: bool,
    /// Multi-selection cap; `0` means unlimited.
    pub maximum_selection_length: usize,
    /// Whether typed input filters the results at all.
    pub searchable: bool,
    /// Terms shorter than this (in characters) do not query.
    pub search_minimum_length: usize,
    /// Terms longer than this do not query; `0` means unlimited.
    pub maximum_input_length: usize,
    /// Local input debounce in milliseconds.
    pub search_delay: u64,
    /// Built-in matcher strategy.
    pub match_strategy: MatchStrategy,
    /// Offer the typed term as a new entry.
    pub tags: bool,
    /// Close after a selection in single mode.
    pub close_on_select: bool,
    /// BCP-47 style locale tag for the built-in strings.
    pub locale: Option<String>,
    /// Remote source options; local filtering when absent.
    pub ajax: Option<AjaxConfig>,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            multiple: false,
            maximum_selection_length: 0,
            searchable: true,
            search_minimum_length: 0,
            maximum_input_length: 0,
            search_delay: 0,
            match_strategy: MatchStrategy::default(),
            tags: false,
            close_on_select: true,
            locale: None,
            ajax: None,
        }
    }
}

impl SelectConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Enable multi-selection with an optional cap (`0` = unlimited).
    pub fn with_multiple(mut self, maximum: usize) -> Self {
        self.multiple = true;
        self.maximum_selection_length = maximum;
        self
    }

    /// Set the matcher strategy.
    pub fn with_match_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.match_strategy = strategy;
        self
    }

    /// Enable or disable tagging.
    pub fn with_tags(mut self, tags: bool) -> Self {
        self.tags = tags;
        self
    }

    /// Set the local input debounce.
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the minimum term length.
    pub fn with_search_minimum_length(mut self, minimum: usize) -> Self {
        self.search_minimum_length = minimum;
        self
    }

    /// Set the maximum term length.
    pub fn with_maximum_input_length(mut self, maximum: usize) -> Self {
        self.maximum_input_length = maximum;
        self
    }

    /// Set whether single mode closes after a selection.
    pub fn with_close_on_select(mut self, close: bool) -> Self {
        self.close_on_select = close;
        self
    }

    /// Set the locale tag.
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Use a remote source.
    pub fn with_ajax(mut self, ajax: AjaxConfig) -> Self {
        self.ajax = Some(ajax);
        self
    }

    /// Selection cardinality implied by `multiple` and `maximumSelectionLength`.
    pub fn selection_mode(&self) -> SelectionMode {
        if self.multiple {
            SelectionMode::Multiple {
                maximum: self.maximum_selection_length,
            }
        } else {
            SelectionMode::Single
        }
    }

    /// Debounce applied to typed input.
    pub fn input_delay(&self) -> Duration {
        match &self.ajax {
            Some(ajax) => ajax.delay(),
            None => Duration::from_millis(self.search_delay),
        }
    }

    /// Built-in language table for the configured locale.
    pub fn language(&self) -> Language {
        match &self.locale {
            Some(tag) => Language::for_locale(tag),
            None => Language::english(),
        }
    }

    /// Reject contradictory or incomplete options.
    pub fn validate(&self, has_transport: bool) -> Result<()> {
        if self.maximum_selection_length > 0 && !self.multiple {
            return Err(SelectError::Config(
                "maximumSelectionLength requires multiple".into(),
            ));
        }
        if self.maximum_input_length > 0 && self.search_minimum_length > self.maximum_input_length
        {
            return Err(SelectError::Config(
                "searchMinimumLength exceeds maximumInputLength".into(),
            ));
        }
        if let Some(ajax) = &self.ajax {
            ajax.validate(has_transport)?;
        }
        Ok(())
    }
}
