//! Profile - the signed-in user's public profile and account stats.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::avatar::{AvatarStore, AvatarUpload};
use super::favorite::Favorite;
use super::review::Review;
use crate::record::Enriched;
use crate::store::{Filter, StoreError};
use crate::sync::{IdentityWatch, SyncConfig, SyncContext, SyncError, Synchronizer};
use crate::Payload;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Payload)]
#[payload(collection = "profiles", owner = "user_id", subject = "profile")]
pub struct Profile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Activity counters shown on the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStats {
    pub favorites: u64,
    pub reviews: u64,
}

/// The signed-in user's profile. Follows sign-in and sign-out.
pub struct ProfileBook {
    sync: Synchronizer<Profile>,
    avatars: Arc<dyn AvatarStore>,
}

impl ProfileBook {
    pub fn new(ctx: SyncContext, avatars: impl AvatarStore + 'static) -> Self {
        ProfileBook {
            sync: Synchronizer::new(ctx, SyncConfig::for_actor()),
            avatars: Arc::new(avatars),
        }
    }

    pub async fn start(&self) -> IdentityWatch {
        self.sync.start().await
    }

    pub fn sync(&self) -> &Synchronizer<Profile> {
        &self.sync
    }

    pub fn profile(&self) -> Option<Enriched<Profile>> {
        self.sync.own_record()
    }

    pub fn is_loading(&self) -> bool {
        self.sync.is_loading()
    }

    /// Apply `patch` to the profile, creating the profile if the store holds
    /// none for the user yet.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), SyncError> {
        self.sync.require_actor()?;
        if let Some(username) = &patch.username {
            if username.trim().is_empty() {
                return Err(self.sync.reject("username cannot be empty"));
            }
        }

        let fallback = Profile {
            username: patch.username.clone(),
            avatar_url: patch.avatar_url.clone(),
        };
        // The owner filter added by the synchronizer is the whole key.
        self.sync
            .update_or_create(Filter::new(), &patch, fallback)
            .await?;
        Ok(())
    }

    /// Store `upload` as the user's avatar and point the profile at it.
    /// Returns the avatar URL.
    pub async fn upload_avatar(&self, upload: AvatarUpload) -> Result<String, SyncError> {
        let actor = self.sync.require_actor()?;
        upload
            .validate()
            .map_err(|invalid| self.sync.reject(invalid.to_string()))?;

        let url = self
            .avatars
            .put(&actor.id, &upload)
            .await
            .map_err(|e| self.sync.fail("upload avatar", "could not upload your avatar".into(), e))?;

        if let Err(err) = self
            .update_profile(ProfilePatch::default().avatar_url(url.clone()))
            .await
        {
            warn!(actor = %actor.id, url = %url, error = %err, "avatar stored but profile not updated");
            return Err(err);
        }
        Ok(url)
    }

    /// Count the user's favorites and reviews.
    pub async fn stats(&self) -> Result<ProfileStats, SyncError> {
        let actor = self
            .sync
            .context()
            .current_actor()
            .ok_or(SyncError::NotAuthenticated)?;
        let store = self.sync.context().store();

        let favorites = Filter::new().eq(Favorite::OWNER_FIELD, actor.id.as_str());
        let reviews = Filter::new().eq(Review::OWNER_FIELD, actor.id.as_str());
        let counts = async {
            let favorites = store.count(Favorite::COLLECTION, &favorites).await?;
            let reviews = store.count(Review::COLLECTION, &reviews).await?;
            Ok::<_, StoreError>(ProfileStats { favorites, reviews })
        };

        counts.await.map_err(|err| {
            warn!(actor = %actor.id, error = %err, "profile stats unavailable");
            SyncError::FetchFailed(err.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_is_scoped_to_its_owner() {
        assert_eq!(Profile::COLLECTION, "profiles");
        assert_eq!(Profile::OWNER_FIELD, "user_id");
        assert_eq!(Profile::PARENT_FIELD, "user_id");
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let value = serde_json::to_value(ProfilePatch::default()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
