//! Catalog - the synchronized collections of the streaming catalog.
//!
//! Each type here wraps a [`Synchronizer`](crate::Synchronizer) bound to one
//! collection and adds the rules of that collection:
//!
//! - [`Reviews`]: reviews of one title, at most one per user, rated 1 to 5.
//! - [`Favorites`]: the signed-in user's saved titles.
//! - [`ProfileBook`]: the signed-in user's profile, avatar and stats.

mod avatar;
mod favorite;
mod profile;
mod review;

pub use avatar::{
    AvatarError, AvatarStore, AvatarUpload, InMemoryAvatarStore, InvalidAvatar, MAX_AVATAR_BYTES,
};
pub use favorite::{Favorite, Favorites};
pub use profile::{Profile, ProfileBook, ProfilePatch, ProfileStats};
pub use review::{Review, ReviewPatch, Reviews, MAX_RATING, MIN_RATING};
