//! Lenient deserializers for editor-authored fields
//!
//! Records coming from the repository are shaped by whoever edited the
//! custom type, so individual fields may be null, missing, or of the wrong
//! type. These helpers keep whatever parses and drop the rest.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Treat `null` like a missing field
pub fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept any JSON value, keeping only the array elements that parse as `T`
pub fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(seq_from_value(value))
}

/// Same as [`lenient_seq`] for an already-parsed value
pub fn seq_from_value<T: DeserializeOwned>(value: Value) -> Vec<T> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::debug!("Skipping malformed element: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Accept a string, a number, or anything else (as empty)
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_seq")]
        items: Vec<Item>,
        #[serde(default, deserialize_with = "nullable")]
        name: String,
        #[serde(default, deserialize_with = "lenient_string")]
        label: String,
    }

    #[test]
    fn test_keeps_valid_elements() {
        let holder: Holder =
            serde_json::from_str(r#"{"items": [{"id": 1}, "junk", {"id": "x"}, {"id": 3}]}"#)
                .unwrap();
        assert_eq!(holder.items, vec![Item { id: 1 }, Item { id: 3 }]);
    }

    #[test]
    fn test_non_array_is_empty() {
        let holder: Holder = serde_json::from_str(r#"{"items": {"id": 1}}"#).unwrap();
        assert!(holder.items.is_empty());
    }

    #[test]
    fn test_null_and_missing_fields() {
        let holder: Holder = serde_json::from_str(r#"{"name": null, "label": 42}"#).unwrap();
        assert_eq!(holder.name, "");
        assert_eq!(holder.label, "42");
        assert!(holder.items.is_empty());
    }
}
