//! User attributes of nodes.
//!
//! The user attributes of a node are a JSON object stored at `{path}/.attrs`, independent of the earray metadata.
//! The library stores and copies attributes but never interprets them.

use serde_json::{Map, Value};

use crate::node::{NodePath, meta_key_attributes};
use crate::storage::{Bytes, ReadableStorageTraits, StorageError, WritableStorageTraits};

/// Retrieve the user attributes of the node at `path`.
///
/// A node without attributes has an empty map.
///
/// # Errors
/// Returns [`StorageError::InvalidMetadata`] if the stored attributes are not a JSON object, or a [`StorageError`] if there is an underlying error with the store.
pub fn retrieve_attributes<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Map<String, Value>, StorageError> {
    let key = meta_key_attributes(path);
    match storage.get(&key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|err| StorageError::InvalidMetadata(key, err.to_string())),
        None => Ok(Map::new()),
    }
}

/// Store the user attributes of the node at `path`, replacing any existing attributes.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn store_attributes<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    attributes: &Map<String, Value>,
) -> Result<(), StorageError> {
    let json = serde_json::to_vec_pretty(attributes).map_err(|err| StorageError::Other(err.to_string()))?;
    storage.set(&meta_key_attributes(path), Bytes::from(json))
}
