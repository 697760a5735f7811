//! Media host seam for avatar uploads

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{ChatlinkError, Result, TransportError};

/// Image upload backend returning a stable URL
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload one image and return the URL it is served from
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

/// Check that `content_type` names an image type
pub fn ensure_image(content_type: &str) -> Result<()> {
    let content_type = content_type.trim().to_ascii_lowercase();
    match content_type.split_once('/') {
        Some(("image", subtype)) if !subtype.is_empty() => Ok(()),
        _ => Err(ChatlinkError::validation(
            "content_type",
            format!("expected an image, got {:?}", content_type),
        )),
    }
}

/// Media host held in process memory, serving `memory://media/<uuid>` URLs
#[derive(Debug)]
pub struct MemoryMediaHost {
    objects: DashMap<String, (String, Vec<u8>)>,
    available: AtomicBool,
}

impl Default for MemoryMediaHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMediaHost {
    pub const URL_PREFIX: &'static str = "memory://media/";

    pub fn new() -> Self {
        Self {
            objects: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the upload service going down
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Content type and bytes stored under a URL
    pub fn get(&self, url: &str) -> Option<(String, Vec<u8>)> {
        self.objects.get(url).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl MediaUploader for MemoryMediaHost {
    async fn upload_image(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        ensure_image(content_type)?;
        if bytes.is_empty() {
            return Err(ChatlinkError::validation("image", "upload is empty"));
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(TransportError::UploadFailed {
                reason: "media host is offline".to_string(),
            }
            .into());
        }

        let url = format!("{}{}", Self::URL_PREFIX, Uuid::new_v4());
        debug!(url = %url, size = bytes.len(), "stored uploaded image");
        self.objects
            .insert(url.clone(), (content_type.trim().to_string(), bytes));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_image() {
        assert!(ensure_image("image/png").is_ok());
        assert!(ensure_image("IMAGE/JPEG").is_ok());
        assert!(ensure_image("application/pdf").is_err());
        assert!(ensure_image("image/").is_err());
        assert!(ensure_image("image").is_err());
    }

    #[tokio::test]
    async fn test_upload_returns_memory_url() {
        let host = MemoryMediaHost::new();
        let url = host.upload_image(vec![0x89, 0x50], "image/png").await.unwrap();
        assert!(url.starts_with(MemoryMediaHost::URL_PREFIX));
        assert_eq!(host.get(&url).unwrap().0, "image/png");

        assert!(host.upload_image(vec![1], "text/plain").await.is_err());
        host.set_available(false);
        let err = host.upload_image(vec![1], "image/gif").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(host.len(), 1);
    }
}
