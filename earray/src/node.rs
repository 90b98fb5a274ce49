//! Nodes of an earray container.
//!
//! A node is identified by a [`NodePath`], such as `/group/earray1`.
//! The node at path `/group/earray1` keeps its metadata at the store key `group/earray1/.earray`, its user attributes at `group/earray1/.attrs` and its chunks below `group/earray1/c/`.
//!
//! An earray is a leaf: no earray may be nested inside another, since erasing a node erases every key below it.

mod node_path;

pub use node_path::{NodePath, NodePathError};

use crate::array::ArrayCreateError;
use crate::storage::{
    Bytes, ListableStorageTraits, ReadableStorageTraits, StorageError, StoreKey, StorePrefix,
    WritableStorageTraits,
};

/// The name of the metadata document of an earray node.
pub const EARRAY_METADATA_NAME: &str = ".earray";

/// The name of the user attributes document of a node.
pub const ATTRIBUTES_NAME: &str = ".attrs";

fn node_key(path: &NodePath, name: &str) -> StoreKey {
    let path = path.as_str();
    let key = if path == "/" {
        name.to_string()
    } else {
        format!("{}/{name}", path.strip_prefix('/').unwrap_or(path))
    };
    // SAFETY: a valid node path joined with a non-empty name is a valid key
    unsafe { StoreKey::new_unchecked(key) }
}

/// Return the earray metadata key of the node at `path`.
#[must_use]
pub fn meta_key_earray(path: &NodePath) -> StoreKey {
    node_key(path, EARRAY_METADATA_NAME)
}

/// Return the user attributes key of the node at `path`.
#[must_use]
pub fn meta_key_attributes(path: &NodePath) -> StoreKey {
    node_key(path, ATTRIBUTES_NAME)
}

/// Return the prefix holding the chunks of the earray at `path`.
#[must_use]
pub fn chunk_prefix(path: &NodePath) -> StorePrefix {
    let prefix = StorePrefix::from(path);
    // SAFETY: a valid prefix extended with a component and `/` is a valid prefix
    unsafe { StorePrefix::new_unchecked(format!("{}c/", prefix.as_str())) }
}

/// Return the key of chunk `index` of the earray at `path`.
#[must_use]
pub fn chunk_key(path: &NodePath, index: u64) -> StoreKey {
    // SAFETY: a valid prefix followed by a number is a valid key
    unsafe { StoreKey::new_unchecked(format!("{}{index}", chunk_prefix(path).as_str())) }
}

/// Return true if an earray node exists at `path`.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn node_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<bool, StorageError> {
    Ok(storage.get(&meta_key_earray(path))?.is_some())
}

/// Return the earray nodes strictly below `path`, in order.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn nodes_below<TStorage: ?Sized + ListableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Vec<NodePath>, StorageError> {
    let own_key = meta_key_earray(path);
    let suffix = format!("/{EARRAY_METADATA_NAME}");
    let mut nodes = Vec::new();
    for key in storage.list_prefix(&StorePrefix::from(path))? {
        if key == own_key {
            continue;
        }
        if let Some(node) = key.as_str().strip_suffix(&suffix) {
            nodes.push(
                NodePath::new(&format!("/{node}"))
                    .map_err(|err| StorageError::Other(err.to_string()))?,
            );
        }
    }
    nodes.sort();
    Ok(nodes)
}

/// Return the nearest ancestor of `path` that is an earray.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn earray_ancestor<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Option<NodePath>, StorageError> {
    for ancestor in path.ancestors() {
        if node_exists(storage, &ancestor)? {
            return Ok(Some(ancestor));
        }
    }
    Ok(None)
}

/// Check that an earray can be created at `path` without nesting it inside or above another earray.
pub(crate) fn check_leaf<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<(), ArrayCreateError> {
    if let Some(ancestor) = earray_ancestor(storage, path)? {
        return Err(ArrayCreateError::InsideEArray(path.clone(), ancestor));
    }
    if let Some(below) = nodes_below(storage, path)?.into_iter().next() {
        return Err(ArrayCreateError::EArrayBelow(path.clone(), below));
    }
    Ok(())
}

/// The stored values of a node, taken before the node is replaced so it can be restored.
#[derive(Debug)]
#[must_use]
pub(crate) struct NodeSnapshot {
    path: NodePath,
    values: Vec<(StoreKey, Bytes)>,
}

impl NodeSnapshot {
    /// Read every value below `path`.
    pub(crate) fn take<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits>(
        storage: &TStorage,
        path: &NodePath,
    ) -> Result<Self, StorageError> {
        let mut values = Vec::new();
        for key in storage.list_prefix(&StorePrefix::from(path))? {
            if let Some(value) = storage.get(&key)? {
                values.push((key, value));
            }
        }
        Ok(Self {
            path: path.clone(),
            values,
        })
    }

    /// Erase whatever is now below the node and store the snapshot values again.
    pub(crate) fn restore<TStorage: ?Sized + WritableStorageTraits>(
        self,
        storage: &TStorage,
    ) -> Result<(), StorageError> {
        erase_node(storage, &self.path)?;
        for (key, value) in self.values {
            storage.set(&key, value)?;
        }
        Ok(())
    }
}

/// Erase a node and everything below it.
///
/// Erasing the root node clears the whole store.
///
/// # Errors
/// Returns a [`StorageError`] if there is an underlying error with the store.
pub fn erase_node<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<(), StorageError> {
    storage.erase_prefix(&StorePrefix::from(path))
}
