//! Favorites - the titles a user has saved.

use serde::{Deserialize, Serialize};

use crate::record::{Enriched, Record};
use crate::store::Filter;
use crate::sync::{IdentityWatch, SyncConfig, SyncContext, SyncError, Synchronizer};
use crate::Payload;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Payload)]
#[payload(collection = "favorites", owner = "user_id", subject = "favorite")]
pub struct Favorite {
    pub movie_id: String,
    pub movie_title: String,
    #[serde(default)]
    pub movie_image: Option<String>,
}

impl Favorite {
    pub fn new(movie_id: impl Into<String>, movie_title: impl Into<String>) -> Self {
        Favorite {
            movie_id: movie_id.into(),
            movie_title: movie_title.into(),
            movie_image: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.movie_image = Some(url.into());
        self
    }
}

const MOVIE_ID_FIELD: &str = "movie_id";

/// The signed-in user's favorites. Follows sign-in and sign-out.
pub struct Favorites {
    sync: Synchronizer<Favorite>,
}

impl Favorites {
    pub fn new(ctx: SyncContext) -> Self {
        Favorites {
            sync: Synchronizer::new(ctx, SyncConfig::for_actor()),
        }
    }

    pub async fn start(&self) -> IdentityWatch {
        self.sync.start().await
    }

    pub fn sync(&self) -> &Synchronizer<Favorite> {
        &self.sync
    }

    /// Favorites, most recently added first.
    pub fn favorites(&self) -> Vec<Enriched<Favorite>> {
        self.sync.collection()
    }

    pub fn len(&self) -> usize {
        self.sync.collection().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the loaded favorites include `movie_id`.
    pub fn contains(&self, movie_id: &str) -> bool {
        self.sync
            .collection()
            .iter()
            .any(|f| f.payload.movie_id == movie_id)
    }

    pub async fn add(&self, favorite: Favorite) -> Result<Record<Favorite>, SyncError> {
        self.sync.create(favorite).await
    }

    /// Remove `movie_id` from the user's favorites in the store. Returns 0
    /// when it was not among them.
    pub async fn remove(&self, movie_id: &str) -> Result<u64, SyncError> {
        self.sync.delete_where(Self::title(movie_id)).await
    }

    /// Add the title if absent, remove it otherwise. Returns whether it is a
    /// favorite afterwards. Presence is read from the store, not from the
    /// loaded favorites.
    pub async fn toggle(&self, favorite: Favorite) -> Result<bool, SyncError> {
        let saved = self
            .sync
            .exists_owned("toggle", Self::title(&favorite.movie_id))
            .await?;
        if saved {
            self.remove(&favorite.movie_id).await?;
            Ok(false)
        } else {
            self.add(favorite).await?;
            Ok(true)
        }
    }

    fn title(movie_id: &str) -> Filter {
        Filter::new().eq(MOVIE_ID_FIELD, movie_id)
    }
}
