//! Reviews - one rating and comment per user per title.

use serde::{Deserialize, Serialize};

use crate::record::{Enriched, Record};
use crate::sync::{IdentityWatch, SyncConfig, SyncContext, SyncError, Synchronizer};
use crate::Payload;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Payload)]
#[payload(collection = "reviews", owner = "user_id", parent = "movie_id", subject = "review")]
pub struct Review {
    pub rating: u8,
    pub content: String,
    #[serde(default)]
    pub likes: u32,
}

impl Review {
    pub fn new(rating: u8, content: impl Into<String>) -> Self {
        Review {
            rating,
            content: content.into(),
            likes: 0,
        }
    }
}

/// Partial update of a review; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ReviewPatch {
    pub fn rating(mut self, rating: u8) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Reviews of a single title.
pub struct Reviews {
    sync: Synchronizer<Review>,
}

impl Reviews {
    pub fn new(ctx: SyncContext, movie_id: impl Into<String>) -> Self {
        Self::with_config(ctx, SyncConfig::for_parent(movie_id))
    }

    pub fn with_config(ctx: SyncContext, config: SyncConfig) -> Self {
        Reviews {
            sync: Synchronizer::new(ctx, config),
        }
    }

    /// Watch the identity and load the reviews.
    pub async fn start(&self) -> IdentityWatch {
        self.sync.start().await
    }

    pub fn sync(&self) -> &Synchronizer<Review> {
        &self.sync
    }

    /// Reviews of the title, newest first.
    pub fn reviews(&self) -> Vec<Enriched<Review>> {
        self.sync.collection()
    }

    /// The signed-in user's review of the title.
    pub fn my_review(&self) -> Option<Enriched<Review>> {
        self.sync.own_record()
    }

    pub fn is_loading(&self) -> bool {
        self.sync.is_loading()
    }

    /// Mean rating over the loaded reviews.
    pub fn average_rating(&self) -> Option<f32> {
        let reviews = self.sync.collection();
        if reviews.is_empty() {
            return None;
        }
        let total: u32 = reviews.iter().map(|r| u32::from(r.payload.rating)).sum();
        Some(total as f32 / reviews.len() as f32)
    }

    pub async fn refresh(&self) -> Result<(), SyncError> {
        self.sync.refresh().await
    }

    /// Show the reviews of another title.
    pub async fn switch_movie(&self, movie_id: impl Into<String>) -> Result<(), SyncError> {
        self.sync.bind(movie_id).await
    }

    pub async fn add(&self, rating: u8, content: impl Into<String>) -> Result<Record<Review>, SyncError> {
        self.check_rating(rating)?;
        self.sync.create(Review::new(rating, content)).await
    }

    pub async fn edit(&self, review_id: &str, patch: ReviewPatch) -> Result<u64, SyncError> {
        if let Some(rating) = patch.rating {
            self.check_rating(rating)?;
        }
        self.sync.update(review_id, &patch).await
    }

    pub async fn remove(&self, review_id: &str) -> Result<u64, SyncError> {
        self.sync.delete(review_id).await
    }

    fn check_rating(&self, rating: u8) -> Result<(), SyncError> {
        if (MIN_RATING..=MAX_RATING).contains(&rating) {
            Ok(())
        } else {
            Err(self.sync.reject(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )))
        }
    }
}
