//! Entity trait: identity + the collection a record lives in.

use serde::{Serialize, de::DeserializeOwned};

use crate::DocumentId;

/// Stored record with a stable identity.
///
/// Entities round-trip through JSON documents; field names in the document
/// are the serde names of the struct.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Name of the collection the entity is stored in.
    const COLLECTION: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> DocumentId;
}
