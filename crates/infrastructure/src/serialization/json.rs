//! JSON serialization helpers for deterministic output.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Error type for serialization operations.
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// JSON deserialization failed.
    #[error("JSON deserialization failed: {0}")]
    Deserialize(serde_json::Error),

    /// UTF-8 encoding error.
    #[error("UTF-8 encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Serializes a value to deterministic JSON.
///
/// Output format:
/// - 2-space indentation
/// - Trailing newline
/// - Object keys in the order of the source type (sorted for `serde_json::Value`)
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable<T: Serialize>(value: &T) -> Result<String, SerializationError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"  ");
    let mut serializer = Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;

    let mut json = String::from_utf8(buffer)?;
    json.push('\n');
    Ok(json)
}

/// Same as [`to_json_stable`] but returns bytes for direct file writing.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json_stable_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, SerializationError> {
    to_json_stable(value).map(String::into_bytes)
}

/// Deserializes JSON from bytes, pretty-printed or minified.
///
/// # Errors
///
/// Returns an error if the JSON is invalid or doesn't match the expected type.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, SerializationError> {
    serde_json::from_slice(bytes).map_err(SerializationError::Deserialize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stable_serialization_format() {
        let json = to_json_stable(&json!({"version": 1})).expect("serialization should work");
        assert_eq!(json, "{\n  \"version\": 1\n}\n");
    }

    #[test]
    fn test_value_keys_are_sorted() {
        let value: serde_json::Value =
            from_json_bytes(br#"{"zebra": 1, "apple": 2, "mango": 3}"#).unwrap();

        let json = to_json_stable(&value).expect("serialization should work");
        let apple = json.find("apple").expect("apple should be in json");
        let mango = json.find("mango").expect("mango should be in json");
        let zebra = json.find("zebra").expect("zebra should be in json");
        assert!(apple < mango && mango < zebra);
    }

    #[test]
    fn test_invalid_bytes_are_rejected() {
        let result: Result<serde_json::Value, _> = from_json_bytes(b"{not json");
        assert!(matches!(result, Err(SerializationError::Deserialize(_))));
    }
}
