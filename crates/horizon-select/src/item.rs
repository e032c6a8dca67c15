//! Item data model.
//!
//! Every entry that reaches the engine, whether seeded locally or returned by
//! a remote source, goes through the same normalization:
//!
//! - a missing `id` is filled from `text`, a missing `text` from `id`
//! - `disabled` and `selected` default to `false`
//! - unknown fields are preserved verbatim in [`Item::extra`]
//! - an object with a `children` array becomes a [`Group`]
//!
//! Identity is string based: `{"id": 1}` and `{"id": "1"}` name the same item.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{Result, SelectError};

/// Identity key of an item.
///
/// Numeric ids are stored in their decimal string form so that identity
/// comparisons never trip over number/string mismatches.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Create an id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The string form of this id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, used when deduplicating tags.
    pub fn eq_ignore_case(&self, other: &ItemId) -> bool {
        self.0.to_lowercase() == other.0.to_lowercase()
    }

    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Bool(b) => Some(Self(b.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).ok_or_else(|| de::Error::custom("id must be a string or number"))
    }
}

/// Keys with a dedicated field on [`Item`]; everything else lands in `extra`.
const RESERVED_KEYS: [&str; 5] = ["id", "text", "disabled", "selected", "isTag"];

/// The atomic selectable unit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Item {
    /// Identity key, unique within one flat result list.
    pub id: ItemId,
    /// Display text.
    pub text: String,
    /// Disabled items are visible but never matched or confirmed.
    pub disabled: bool,
    /// Advisory flag from the source data; the item store owns the real selection.
    pub selected: bool,
    /// Caller-defined fields, preserved verbatim.
    pub extra: Map<String, Value>,
    /// Marks a synthesized "create new entry" item.
    pub is_tag: bool,
}

impl Item {
    /// Create an enabled item.
    pub fn new(id: impl Into<ItemId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter for `disabled`.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Builder-style setter for a caller-defined field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Look up a caller-defined field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Normalize a raw JSON entry into an item.
    ///
    /// Bare strings and numbers are accepted as shorthand for an item whose
    /// id and text are both that value.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            Value::String(s) => return Ok(Self::new(s.clone(), s)),
            Value::Number(n) => return Ok(Self::new(n.to_string(), n.to_string())),
            other => {
                return Err(SelectError::Normalize(format!(
                    "expected an object, found {other}"
                )));
            }
        };

        if map.contains_key("children") {
            return Err(SelectError::Normalize("groups do not nest".into()));
        }

        let id = map.get("id").and_then(ItemId::from_json);
        let text = map.get("text").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        let (id, text) = match (id, text) {
            (Some(id), Some(text)) => (id, text),
            (Some(id), None) => {
                let text = id.to_string();
                (id, text)
            }
            (None, Some(text)) => (ItemId::new(text.clone()), text),
            (None, None) => {
                return Err(SelectError::Normalize(
                    "entry has neither id nor text".into(),
                ));
            }
        };

        let flag = |map: &Map<String, Value>, key: &str| {
            map.get(key).and_then(Value::as_bool).unwrap_or(false)
        };
        let disabled = flag(&map, "disabled");
        let selected = flag(&map, "selected");

        for key in RESERVED_KEYS {
            map.remove(key);
        }

        Ok(Self {
            id,
            text,
            disabled,
            selected,
            extra: map,
            is_tag: false,
        })
    }

    /// Convert back into a JSON object, with extra fields alongside the known ones.
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert("id".into(), Value::String(self.id.to_string()));
        map.insert("text".into(), Value::String(self.text.clone()));
        map.insert("disabled".into(), Value::Bool(self.disabled));
        map.insert("selected".into(), Value::Bool(self.selected));
        if self.is_tag {
            map.insert("isTag".into(), Value::Bool(true));
        }
        Value::Object(map)
    }
}

impl<'de> Deserialize<'de> for Item {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// A labelled bucket of items, one level deep.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Group {
    /// Group label. Never used for matching.
    pub text: String,
    /// Member items, in display order.
    pub children: Vec<Item>,
}

impl Group {
    /// Create a group.
    pub fn new(text: impl Into<String>, children: Vec<Item>) -> Self {
        Self {
            text: text.into(),
            children,
        }
    }
}

/// One top-level row of a result list.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    /// A plain item.
    Item(Item),
    /// A group of items.
    Group(Group),
}

impl Entry {
    /// Normalize a raw JSON entry.
    pub fn from_value(value: Value) -> Result<Self> {
        let children = match &value {
            Value::Object(map) => map.get("children").cloned(),
            _ => None,
        };

        let Some(children) = children else {
            return Item::from_value(value).map(Entry::Item);
        };

        let Value::Array(children) = children else {
            return Err(SelectError::Normalize("children must be an array".into()));
        };
        let text = value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let children = children
            .into_iter()
            .map(Item::from_value)
            .collect::<Result<Vec<_>>>()?;

        Ok(Entry::Group(Group { text, children }))
    }

    /// Normalize a JSON array of entries.
    pub fn list_from_value(value: Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(values) => values.into_iter().map(Self::from_value).collect(),
            other => Err(SelectError::Normalize(format!(
                "expected an array of entries, found {other}"
            ))),
        }
    }

    /// Iterate over the items of this entry (the entry itself, or a group's children).
    pub fn items(&self) -> std::slice::Iter<'_, Item> {
        match self {
            Entry::Item(item) => std::slice::from_ref(item).iter(),
            Entry::Group(group) => group.children.iter(),
        }
    }
}

impl From<Item> for Entry {
    fn from(item: Item) -> Self {
        Entry::Item(item)
    }
}

impl From<Group> for Entry {
    fn from(group: Group) -> Self {
        Entry::Group(group)
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

/// Flatten a group-preserving list into its items, in display order.
pub fn flatten(entries: &[Entry]) -> Vec<Item> {
    entries.iter().flat_map(Entry::items).cloned().collect()
}

/// Find an item by id anywhere in a group-preserving list.
pub fn find<'a>(entries: &'a [Entry], id: &ItemId) -> Option<&'a Item> {
    entries.iter().flat_map(Entry::items).find(|item| &item.id == id)
}
