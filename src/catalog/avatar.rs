//! Avatar uploads and the bucket they land in.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

/// Largest accepted avatar, in bytes.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

/// An image picked by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidAvatar {
    #[error("avatar must be an image, got {0}")]
    NotAnImage(String),
    #[error("avatar is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },
    #[error("avatar file is empty")]
    Empty,
}

impl AvatarUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        AvatarUpload {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn validate(&self) -> Result<(), InvalidAvatar> {
        if !self.content_type.starts_with("image/") {
            return Err(InvalidAvatar::NotAnImage(self.content_type.clone()));
        }
        if self.bytes.is_empty() {
            return Err(InvalidAvatar::Empty);
        }
        if self.bytes.len() > MAX_AVATAR_BYTES {
            return Err(InvalidAvatar::TooLarge {
                size: self.bytes.len(),
                max: MAX_AVATAR_BYTES,
            });
        }
        Ok(())
    }

    /// File extension taken from the name, falling back to the image subtype.
    pub fn extension(&self) -> String {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .or_else(|| self.content_type.strip_prefix("image/"))
            .unwrap_or("img")
            .to_ascii_lowercase()
    }

    /// Object path for `owner_id`; re-uploads replace the previous avatar.
    pub fn object_path(&self, owner_id: &str) -> String {
        format!("{}/avatar.{}", owner_id, self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvatarError {
    #[error("avatar storage error: {0}")]
    Storage(String),
}

/// Bucket storage for avatar images.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Store `upload` for `owner_id` and return its public URL.
    async fn put(&self, owner_id: &str, upload: &AvatarUpload) -> Result<String, AvatarError>;
}

/// In-memory avatar bucket. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryAvatarStore {
    base_url: String,
    objects: Arc<RwLock<HashMap<String, AvatarUpload>>>,
}

impl Default for InMemoryAvatarStore {
    fn default() -> Self {
        Self::new("memory://avatars")
    }
}

impl InMemoryAvatarStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        InMemoryAvatarStore {
            base_url: base_url.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn get(&self, path: &str) -> Option<AvatarUpload> {
        self.objects.read().ok()?.get(path).cloned()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AvatarStore for InMemoryAvatarStore {
    async fn put(&self, owner_id: &str, upload: &AvatarUpload) -> Result<String, AvatarError> {
        let path = upload.object_path(owner_id);
        self.objects
            .write()
            .map_err(|_| AvatarError::Storage("lock poisoned".into()))?
            .insert(path.clone(), upload.clone());
        Ok(format!("{}/{}", self.base_url.trim_end_matches('/'), path))
    }
}
