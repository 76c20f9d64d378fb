//! Forgiving field deserializers for hand-edited records.
//!
//! A record is kept even when single leaves are blank, mistyped or out of
//! range: the leaf falls back to its default and the rest of the record
//! loads. Only YAML that does not parse at all is rejected upstream.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use tracing::debug;

/// Deserialize `T`, substituting `T::default()` for null or unusable input.
///
/// A quoted scalar is given a second chance as YAML, so `'2.26'` still reads
/// as a float and `'Yes'` as an enum variant.
pub(crate) fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_or_default(value))
}

fn value_or_default<T: DeserializeOwned + Default>(value: Value) -> T {
    if value.is_null() {
        return T::default();
    }
    let reparse = match &value {
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    };
    match serde_yaml::from_value::<T>(value) {
        Ok(v) => v,
        Err(e) => {
            if let Some(v) = reparse.and_then(|s| serde_yaml::from_str::<T>(&s).ok()) {
                return v;
            }
            debug!(
                "Replacing unreadable {} value with its default: {e}",
                std::any::type_name::<T>()
            );
            T::default()
        }
    }
}

/// Deserialize a text leaf. Numbers and booleans keep their text (a calibre
/// written as `308` is `"308"`); null and collections read as empty.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Tagged(tagged) => match tagged.value {
            Value::String(s) => s,
            _ => String::new(),
        },
        Value::Sequence(_) | Value::Mapping(_) => {
            debug!("Replacing non-scalar text value with an empty string");
            String::new()
        }
    })
}
