//! Records - typed rows belonging to a remote collection.
//!
//! The remote store speaks in JSON rows. A [`Payload`] type binds a plain
//! struct to the collection it lives in and names the row fields that carry
//! the owner and the parent key. Everything else in the row is payload.
//!
//! ## Example
//!
//! ```ignore
//! use cinesync::Payload;
//!
//! #[derive(Clone, Serialize, Deserialize, Payload)]
//! #[payload(collection = "reviews", owner = "user_id", parent = "movie_id", subject = "review")]
//! struct Review {
//!     rating: u8,
//!     content: String,
//! }
//! ```

use std::ops::Deref;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

/// A row as exchanged with the remote store.
pub type Row = Map<String, Value>;

pub const ID_FIELD: &str = "id";
pub const CREATED_AT_FIELD: &str = "created_at";
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Trait for types that can be stored as the payload of a collection record.
pub trait Payload: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection (table) holding records of this type.
    const COLLECTION: &'static str;

    /// Row field holding the id of the actor that created the record.
    const OWNER_FIELD: &'static str;

    /// Row field holding the key of the subject the record is attached to.
    /// May equal `OWNER_FIELD` for collections scoped to the owner itself.
    const PARENT_FIELD: &'static str;

    /// Human-readable name used in user-facing messages ("review", "favorite").
    const SUBJECT: &'static str;

    /// Whether `field` is managed by the record envelope rather than the payload.
    fn is_reserved(field: &str) -> bool {
        field == ID_FIELD
            || field == CREATED_AT_FIELD
            || field == UPDATED_AT_FIELD
            || field == Self::OWNER_FIELD
            || field == Self::PARENT_FIELD
    }
}

/// Error decoding or encoding a record row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("{collection} row is missing field `{field}`")]
    MissingField {
        collection: &'static str,
        field: &'static str,
    },
    #[error("invalid timestamp in `{field}`: {value}")]
    InvalidTimestamp { field: &'static str, value: String },
    #[error("payload error: {0}")]
    Payload(String),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
    /// Key fields are compared as strings by the store, so they must be text.
    #[error("`{field}` must be a string, got {found}")]
    NotText {
        field: &'static str,
        found: &'static str,
    },
}

/// A persisted entity belonging to a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<P> {
    pub id: String,
    pub owner_id: String,
    pub parent_key: String,
    pub payload: P,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<P: Payload> Record<P> {
    /// Decode a record from a store row.
    pub fn from_row(row: &Row) -> Result<Self, RecordError> {
        let id = text_field::<P>(row, ID_FIELD)?;
        let owner_id = text_field::<P>(row, P::OWNER_FIELD)?;
        let parent_key = text_field::<P>(row, P::PARENT_FIELD)?;
        let created_at = timestamp_field::<P>(row, CREATED_AT_FIELD)?;
        let updated_at = timestamp_field::<P>(row, UPDATED_AT_FIELD)?;

        let payload_fields: Row = row
            .iter()
            .filter(|(field, _)| !P::is_reserved(field))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect();
        let payload = serde_json::from_value(Value::Object(payload_fields))
            .map_err(|e| RecordError::Payload(e.to_string()))?;

        Ok(Record {
            id,
            owner_id,
            parent_key,
            payload,
            created_at,
            updated_at,
        })
    }

    /// Build the row submitted for a new record. Id and timestamps are left
    /// for the store to assign.
    pub fn new_row(owner_id: &str, parent_key: &str, payload: &P) -> Result<Row, RecordError> {
        let mut row = payload_object::<P, _>(payload)?;
        row.insert(P::OWNER_FIELD.to_string(), Value::from(owner_id));
        row.insert(P::PARENT_FIELD.to_string(), Value::from(parent_key));
        Ok(row)
    }
}

/// Serialize an update patch into the fields sent to the store. Reserved
/// fields are dropped so identity, ownership and creation time never change.
pub fn patch_fields<P: Payload, U: Serialize>(patch: &U) -> Result<Row, RecordError> {
    payload_object::<P, U>(patch)
}

fn payload_object<P: Payload, T: Serialize>(value: &T) -> Result<Row, RecordError> {
    match serde_json::to_value(value).map_err(|e| RecordError::Payload(e.to_string()))? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .filter(|(field, _)| !P::is_reserved(field))
            .collect()),
        other => Err(RecordError::NotAnObject(json_kind(&other))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text_field<P: Payload>(row: &Row, field: &'static str) -> Result<String, RecordError> {
    match row.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(RecordError::MissingField {
            collection: P::COLLECTION,
            field,
        }),
        Some(other) => Err(RecordError::NotText {
            field,
            found: json_kind(other),
        }),
    }
}

fn timestamp_field<P: Payload>(row: &Row, field: &'static str) -> Result<DateTime<Utc>, RecordError> {
    let raw = row
        .get(field)
        .and_then(Value::as_str)
        .ok_or(RecordError::MissingField {
            collection: P::COLLECTION,
            field,
        })?;
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| RecordError::InvalidTimestamp {
            field,
            value: raw.to_string(),
        })
}

/// Public display attributes of a record's owner, captured at read time.
///
/// The default value is the placeholder used when no profile could be found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    pub display_name: Option<String>,
    pub avatar: Option<String>,
}

impl OwnerSnapshot {
    pub fn is_placeholder(&self) -> bool {
        self.display_name.is_none() && self.avatar.is_none()
    }
}

/// A record joined with its owner's display snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enriched<P> {
    pub record: Record<P>,
    pub owner: OwnerSnapshot,
}

impl<P> Deref for Enriched<P> {
    type Target = Record<P>;

    fn deref(&self) -> &Record<P> {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
        #[serde(default)]
        pinned: bool,
    }

    impl Payload for Note {
        const COLLECTION: &'static str = "notes";
        const OWNER_FIELD: &'static str = "author_id";
        const PARENT_FIELD: &'static str = "board_id";
        const SUBJECT: &'static str = "note";
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows are objects"),
        }
    }

    #[test]
    fn decodes_envelope_and_payload() {
        let row = row(json!({
            "id": "n1",
            "author_id": "u1",
            "board_id": "b1",
            "text": "hello",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T11:00:00.000001Z",
        }));

        let record = Record::<Note>::from_row(&row).unwrap();
        assert_eq!(record.id, "n1");
        assert_eq!(record.owner_id, "u1");
        assert_eq!(record.parent_key, "b1");
        assert_eq!(record.payload.text, "hello");
        assert!(!record.payload.pinned);
        assert!(record.updated_at > record.created_at);
    }

    #[test]
    fn missing_owner_is_reported() {
        let row = row(json!({
            "id": "n1",
            "board_id": "b1",
            "text": "hello",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
        }));

        let err = Record::<Note>::from_row(&row).unwrap_err();
        assert_eq!(
            err,
            RecordError::MissingField {
                collection: "notes",
                field: "author_id"
            }
        );
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let row = row(json!({
            "id": "n1",
            "author_id": "u1",
            "board_id": "b1",
            "text": "hello",
            "created_at": "yesterday",
            "updated_at": "2024-05-01T10:00:00Z",
        }));

        let err = Record::<Note>::from_row(&row).unwrap_err();
        assert!(matches!(err, RecordError::InvalidTimestamp { field: "created_at", .. }));
    }

    #[test]
    fn numeric_owner_is_rejected() {
        let row = row(json!({
            "id": "n1",
            "author_id": 17,
            "board_id": "b1",
            "text": "hello",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
        }));

        let err = Record::<Note>::from_row(&row).unwrap_err();
        assert_eq!(
            err,
            RecordError::NotText {
                field: "author_id",
                found: "a number",
            }
        );
    }

    #[test]
    fn new_row_sets_owner_and_parent() {
        let note = Note {
            text: "hi".into(),
            pinned: true,
        };
        let row = Record::new_row("u1", "b9", &note).unwrap();
        assert_eq!(row["author_id"], json!("u1"));
        assert_eq!(row["board_id"], json!("b9"));
        assert_eq!(row["text"], json!("hi"));
        assert!(!row.contains_key("id"));
    }

    #[test]
    fn patch_drops_reserved_fields() {
        let patch = json!({
            "text": "edited",
            "author_id": "intruder",
            "board_id": "elsewhere",
            "id": "other",
            "created_at": "2000-01-01T00:00:00Z",
        });
        let fields = patch_fields::<Note, _>(&patch).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["text"], json!("edited"));
    }

    #[test]
    fn patch_must_be_an_object() {
        let err = patch_fields::<Note, _>(&"text").unwrap_err();
        assert_eq!(err, RecordError::NotAnObject("a string"));
    }

    #[test]
    fn placeholder_snapshot() {
        assert!(OwnerSnapshot::default().is_placeholder());
        let named = OwnerSnapshot {
            display_name: Some("sara".into()),
            avatar: None,
        };
        assert!(!named.is_placeholder());
    }
}
