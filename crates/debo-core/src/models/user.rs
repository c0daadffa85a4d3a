use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An account record. Fields beyond `id` and `email` are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub email: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl User {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            extra: Map::new(),
        }
    }

    /// Look up a field the model does not name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}
