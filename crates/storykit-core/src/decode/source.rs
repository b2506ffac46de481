//! URI resolution.

use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use super::DecodeError;

/// Resolves a media or sticker URI to its encoded bytes.
pub trait AssetLoader {
    fn load(&self, uri: &str) -> Result<Vec<u8>, DecodeError>;
}

/// Split a `data:` URI into its MIME type and payload bytes.
///
/// Supports base64 payloads (`;base64,`) and raw payloads.
pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>), DecodeError> {
    let invalid = || DecodeError::InvalidDataUri(truncate(uri));

    let rest = uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let mime = mime.split(';').next().unwrap_or_default().to_string();

    let bytes = if is_base64 {
        BASE64_STANDARD
            .decode(payload.trim())
            .map_err(|_| invalid())?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok((mime, bytes))
}

fn truncate(uri: &str) -> String {
    uri.chars().take(48).collect()
}

/// Bytes registered by the host ahead of time, keyed by URI.
///
/// Unregistered `data:` URIs are decoded inline.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, bytes: Vec<u8>) {
        self.assets.insert(uri.into(), bytes);
    }

    pub fn remove(&mut self, uri: &str) -> Option<Vec<u8>> {
        self.assets.remove(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.assets.contains_key(uri)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl AssetLoader for MemoryLoader {
    fn load(&self, uri: &str) -> Result<Vec<u8>, DecodeError> {
        if let Some(bytes) = self.assets.get(uri) {
            return Ok(bytes.clone());
        }
        if uri.starts_with("data:") {
            return parse_data_uri(uri).map(|(_, bytes)| bytes);
        }
        Err(DecodeError::AssetNotFound(truncate(uri)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base64_data_uri() {
        let (mime, bytes) = parse_data_uri("data:image/png;base64,AQID").unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_raw_data_uri() {
        let (mime, bytes) = parse_data_uri("data:text/plain;charset=utf-8,hi").unwrap();
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"hi".to_vec());
    }

    #[test]
    fn test_parse_invalid_data_uri() {
        assert!(matches!(
            parse_data_uri("https://example.com/a.png"),
            Err(DecodeError::InvalidDataUri(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64"),
            Err(DecodeError::InvalidDataUri(_))
        ));
        assert!(matches!(
            parse_data_uri("data:image/png;base64,@@@"),
            Err(DecodeError::InvalidDataUri(_))
        ));
    }

    #[test]
    fn test_memory_loader_prefers_registered_bytes() {
        let mut loader = MemoryLoader::new();
        loader.insert("https://cdn.example.com/s.png", vec![9, 9]);
        assert!(loader.contains("https://cdn.example.com/s.png"));
        assert_eq!(loader.load("https://cdn.example.com/s.png").unwrap(), vec![9, 9]);
        assert_eq!(loader.load("data:;base64,AQ==").unwrap(), vec![1]);
        assert!(loader.load("https://cdn.example.com/missing.png").is_err());
    }

    #[test]
    fn test_memory_loader_remove() {
        let mut loader = MemoryLoader::new();
        loader.insert("a", vec![1]);
        assert_eq!(loader.len(), 1);
        assert_eq!(loader.remove("a"), Some(vec![1]));
        assert!(loader.is_empty());
    }
}
