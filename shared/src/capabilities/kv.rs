use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const MAX_VALUE_SIZE: usize = 1024 * 1024;
pub const KEY_PREFIX: &str = "vision_board";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    #[error("value too large: {size} bytes, max {max}")]
    ValueTooLarge { size: usize, max: usize },

    #[error("serialization error for key {key}: {message}")]
    Serialization { message: String, key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyNamespace {
    Session,
}

impl KeyNamespace {
    pub const fn prefix(self) -> &'static str {
        match self {
            KeyNamespace::Session => "session",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KvKey {
    namespace: KeyNamespace,
}

impl KvKey {
    pub const SESSION: KvKey = KvKey::new(KeyNamespace::Session);

    pub const fn new(namespace: KeyNamespace) -> Self {
        Self { namespace }
    }

    pub fn raw(&self) -> String {
        format!("{KEY_PREFIX}:{}", self.namespace.prefix())
    }
}

pub fn encode<T: Serialize>(key: KvKey, value: &T) -> Result<Vec<u8>, KvError> {
    let data = serde_json::to_vec(value).map_err(|e| KvError::Serialization {
        message: e.to_string(),
        key: key.raw(),
    })?;
    if data.len() > MAX_VALUE_SIZE {
        return Err(KvError::ValueTooLarge {
            size: data.len(),
            max: MAX_VALUE_SIZE,
        });
    }
    Ok(data)
}

pub fn decode<T: DeserializeOwned>(key: KvKey, data: &[u8]) -> Result<T, KvError> {
    serde_json::from_slice(data).map_err(|e| KvError::Serialization {
        message: e.to_string(),
        key: key.raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_is_namespaced() {
        assert_eq!(KvKey::SESSION.raw(), "vision_board:session");
    }

    #[test]
    fn decode_reports_key_on_failure() {
        let err = decode::<u32>(KvKey::SESSION, b"not json").unwrap_err();
        assert!(matches!(err, KvError::Serialization { key, .. } if key == "vision_board:session"));
    }

    #[test]
    fn oversized_values_are_refused() {
        let big = "x".repeat(MAX_VALUE_SIZE);
        assert!(matches!(
            encode(KvKey::SESSION, &big),
            Err(KvError::ValueTooLarge { .. })
        ));
    }

    #[test]
    fn encode_then_decode() {
        let bytes = encode(KvKey::SESSION, &vec![1u8, 2, 3]).unwrap();
        assert_eq!(decode::<Vec<u8>>(KvKey::SESSION, &bytes).unwrap(), vec![1, 2, 3]);
    }
}
