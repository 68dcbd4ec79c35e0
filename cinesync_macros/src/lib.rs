mod payload;

use proc_macro::TokenStream;

/// Derive macro for the `Payload` trait.
///
/// Binds a payload struct to the collection its records live in and to the
/// row fields carrying the owner id and the parent key.
///
/// # Example
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Payload)]
/// #[payload(collection = "reviews", owner = "user_id", parent = "movie_id", subject = "review")]
/// struct Review {
///     pub rating: u8,
///     pub content: String,
/// }
/// ```
///
/// - `collection` defaults to the snake_case struct name + "s".
/// - `owner` defaults to `"user_id"`.
/// - `parent` defaults to the owner field, for collections scoped to the owner.
/// - `subject` is the word used in user-facing messages; defaults to the
///   struct name in lower case.
#[proc_macro_derive(Payload, attributes(payload))]
pub fn derive_payload(input: TokenStream) -> TokenStream {
    payload::derive_payload(input)
}
