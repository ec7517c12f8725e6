//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::MAX_KEY_LENGTH;
use crate::error::{CacheError, Result};

/// Rejects empty keys and keys longer than [`MAX_KEY_LENGTH`] bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Request body for PUT /ttl/set
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl_ms`: Optional TTL in milliseconds (uses the server default if absent)
#[derive(Debug, Clone, Deserialize)]
pub struct TtlSetRequest {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl TtlSetRequest {
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)
    }
}

/// Request body for PUT /lru/add
#[derive(Debug, Clone, Deserialize)]
pub struct LruAddRequest {
    pub key: String,
    pub value: String,
}

impl LruAddRequest {
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: TtlSetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.ttl_ms.is_none());
    }

    #[test]
    fn test_ttl_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl_ms": 1500}"#;
        let req: TtlSetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl_ms, Some(1500));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = LruAddRequest {
            key: "".to_string(),
            value: "test".to_string(),
        };
        assert!(matches!(req.validate(), Err(CacheError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_key_length_boundary() {
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH)).is_ok());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = TtlSetRequest {
            key: "valid_key".to_string(),
            value: "test".to_string(),
            ttl_ms: Some(60_000),
        };
        assert!(req.validate().is_ok());
    }
}
