// src/lro/serializer.rs

//! Pluggable body deserialization.
//!
//! The poller never parses bodies itself; it asks a [`SerializerAdapter`] to
//! turn bytes into a `serde_json::Value` and then maps that onto the
//! caller's type. Tests and callers with non-JSON wire formats can provide
//! their own adapter.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::LroError;

pub trait SerializerAdapter: Send + Sync {
    fn to_value(&self, body: &[u8]) -> Result<Value, LroError>;
}

/// Default adapter: bodies are JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl SerializerAdapter for JsonSerializer {
    fn to_value(&self, body: &[u8]) -> Result<Value, LroError> {
        serde_json::from_slice(body).map_err(|e| LroError::Deserialization(e.to_string()))
    }
}

/// Deserialize `body` into `T` through the given adapter.
pub fn deserialize<T: DeserializeOwned>(
    serializer: &dyn SerializerAdapter,
    body: &[u8],
) -> Result<T, LroError> {
    let value = serializer.to_value(body)?;
    serde_json::from_value(value).map_err(|e| LroError::Deserialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Disk {
        name: String,
        size_gb: u32,
    }

    #[test]
    fn json_round_trip_into_type() {
        let disk: Disk =
            deserialize(&JsonSerializer, br#"{"name":"osdisk","size_gb":128}"#).unwrap();
        assert_eq!(
            disk,
            Disk {
                name: "osdisk".into(),
                size_gb: 128
            }
        );
    }

    #[test]
    fn shape_mismatch_is_deserialization_error() {
        let err = deserialize::<Disk>(&JsonSerializer, br#"{"name":1}"#).unwrap_err();
        assert!(matches!(err, LroError::Deserialization(_)));

        let err = deserialize::<Disk>(&JsonSerializer, b"not json").unwrap_err();
        assert!(matches!(err, LroError::Deserialization(_)));
    }
}
