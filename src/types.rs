//! Core types for watchlist

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The field set of one stored document
pub type Fields = Map<String, Value>;

/// Team members, keyed by member name. Member values are opaque.
pub type Members = Map<String, Value>;

/// Top-level collection holding one document per team
pub const TEAMS_COLLECTION: &str = "Teams";

/// Per-team sub-collection holding one document per watch list
pub const LISTS_COLLECTION: &str = "Lists";

/// A team document
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Team {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Members>,
    /// Fields this service does not interpret
    #[serde(flatten)]
    pub extra: Fields,
}

impl Team {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A watch list document
///
/// Created with only a `timestamp`; schedule data is merged in later as
/// arbitrary top-level fields. Every field, `timestamp` included, is kept
/// as stored, so a `null` reads back as `null`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchList {
    #[serde(flatten)]
    pub fields: Fields,
}

impl WatchList {
    pub fn with_timestamp(timestamp: Value) -> Self {
        let mut fields = Fields::new();
        fields.insert("timestamp".to_string(), timestamp);
        Self { fields }
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.fields.get("timestamp")
    }
}

/// A watch list as returned by `getWatchLists`: the stored fields plus its id
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WatchListEntry {
    #[serde(flatten)]
    pub list: WatchList,
    #[serde(rename = "listName")]
    pub list_name: String,
}

impl WatchListEntry {
    /// The document id always wins over a stored `listName` field.
    pub fn new(list_name: impl Into<String>, mut list: WatchList) -> Self {
        list.fields.remove("listName");
        Self {
            list,
            list_name: list_name.into(),
        }
    }
}

/// Payload of `addList`: a full list document that names itself
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListData {
    #[serde(rename = "listName", default)]
    pub list_name: String,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Convert a typed document into its stored field set
pub fn to_fields<T: Serialize>(value: &T) -> crate::Result<Fields> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(crate::Error::internal(format!(
            "document must serialize to an object, got {}",
            other
        ))),
    }
}

/// Read a typed document back out of its stored field set
pub fn from_fields<T: for<'de> Deserialize<'de>>(fields: Fields) -> crate::Result<T> {
    Ok(serde_json::from_value(Value::Object(fields))?)
}
