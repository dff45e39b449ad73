//! Serde helpers for partial-update payloads.

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]`: absent gives
/// `None`, `null` gives `Some(None)`, a value gives `Some(Some(v))`.
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[serde(default, deserialize_with = "nullable")]
        notes: Option<Option<String>>,
    }

    #[test]
    fn absent_null_and_value_are_distinct() {
        let absent: Payload = serde_json::from_str("{}").unwrap();
        let null: Payload = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        let value: Payload = serde_json::from_str(r#"{"notes": "hi"}"#).unwrap();

        assert_eq!(absent.notes, None);
        assert_eq!(null.notes, Some(None));
        assert_eq!(value.notes, Some(Some("hi".to_string())));
    }
}
