//! The earray container.
//!
//! A [`File`] is a store opened with an [`OpenMode`].
//! It creates, opens, lists, copies and removes the earray nodes of the store and manages their user attributes.
//!
//! Arrays obtained from a [`File`] are independent handles: closing the file does not close them.
//! Call [`EArray::close`] on every array that was written to, so its buffered rows and metadata are stored.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::array::{ArrayBuilder, ArrayCreateError, ArrayError, CopyOptions, EArray};
use crate::attributes::{retrieve_attributes, store_attributes};
use crate::node::{NodePath, NodePathError, check_leaf, erase_node, node_exists, nodes_below};
use crate::storage::{ReadableWritableListableStorageTraits, StorageError, StorePrefix};

/// The mode a [`File`] is opened with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Read only. Every write fails with [`StorageError::ReadOnly`].
    Read,
    /// Read and write, creating the container if the store is empty.
    #[default]
    Append,
    /// Read and write an existing container.
    ReadWrite,
    /// Erase the contents of the store and create a new container.
    Truncate,
}

impl OpenMode {
    /// Return true if the mode permits writes.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// A container error.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum FileError {
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An error creating or opening an array.
    #[error(transparent)]
    ArrayCreateError(#[from] ArrayCreateError),
    /// An array error.
    #[error(transparent)]
    ArrayError(#[from] ArrayError),
    /// An invalid node path.
    #[error(transparent)]
    NodePathError(#[from] NodePathError),
    /// A node already exists at the path.
    #[error("a node already exists at {_0}")]
    NodeExists(NodePath),
    /// There is no node at the path.
    #[error("there is no node at {_0}")]
    NodeNotFound(NodePath),
    /// A node cannot be copied onto itself.
    #[error("cannot copy {_0} onto itself")]
    CopyOntoItself(NodePath),
    /// The store holds no container.
    #[error("the store is empty, open it with OpenMode::Append or OpenMode::Truncate to create a container")]
    NotFound,
    /// The file is closed.
    #[error("the file is closed")]
    Closed,
}

/// An earray container.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use earray::array::{ArrayBuilder, AtomKind, RowRange};
/// use earray::file::{File, OpenMode};
/// # let store = Arc::new(earray::storage::store::MemoryStore::new());
/// let file = File::open(store, OpenMode::Truncate)?;
/// let mut array = file.create_earray("/earray1", &ArrayBuilder::new(vec![0], AtomKind::Int32))?;
/// array.append((&[1i32, 2, 3][..], &[3u64][..]))?;
/// array.close()?;
///
/// let array = file.get_earray("/earray1")?;
/// assert_eq!(array.read_elements::<i32>(RowRange::all())?, vec![1, 2, 3]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct File<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    mode: OpenMode,
    closed: bool,
}

impl<TStorage: ?Sized + ReadableWritableListableStorageTraits + 'static> File<TStorage> {
    /// Open a container in `storage` with `mode`.
    ///
    /// # Errors
    /// Returns [`FileError::NotFound`] if the mode is [`OpenMode::ReadWrite`] and the store is empty, or a [`FileError`] if there is an underlying store error.
    pub fn open(storage: Arc<TStorage>, mode: OpenMode) -> Result<Self, FileError> {
        match mode {
            OpenMode::Truncate => {
                log::debug!("erasing the store for a new container");
                storage.erase_prefix(&StorePrefix::root())?;
            }
            OpenMode::ReadWrite => {
                if storage.list()?.is_empty() {
                    return Err(FileError::NotFound);
                }
            }
            OpenMode::Read | OpenMode::Append => {}
        }
        Ok(Self {
            storage,
            mode,
            closed: false,
        })
    }

    /// Return the open mode.
    #[must_use]
    pub const fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Return the storage.
    #[must_use]
    pub fn storage(&self) -> Arc<TStorage> {
        self.storage.clone()
    }

    /// Return true if the file is closed.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    /// Create a new earray at `path` and store its metadata.
    ///
    /// # Errors
    /// Returns
    ///  - [`FileError::NodeExists`] if a node exists at `path`,
    ///  - [`ArrayCreateError::InsideEArray`] or [`ArrayCreateError::EArrayBelow`] if the new earray would be nested inside or above another,
    ///  - [`StorageError::ReadOnly`] if the file is read only, or
    ///  - a [`FileError`] if the builder configuration is invalid or there is an underlying store error.
    pub fn create_earray(
        &self,
        path: &str,
        builder: &ArrayBuilder,
    ) -> Result<EArray<TStorage>, FileError> {
        self.check_writable()?;
        let node = NodePath::new(path)?;
        if node_exists(&*self.storage, &node)? {
            return Err(FileError::NodeExists(node));
        }
        check_leaf(&*self.storage, &node)?;
        let mut array = builder.build(self.storage.clone(), path)?;
        array.store_metadata()?;
        Ok(array)
    }

    /// Open the earray at `path`.
    ///
    /// The array refuses writes if the file is read only.
    ///
    /// # Errors
    /// Returns [`FileError::NodeNotFound`] if there is no earray at `path`, or a [`FileError`] if its metadata is invalid or there is an underlying store error.
    pub fn get_earray(&self, path: &str) -> Result<EArray<TStorage>, FileError> {
        self.check_open()?;
        let node = self.existing_node(path)?;
        let array = if self.mode.is_writable() {
            EArray::open(self.storage.clone(), node.as_str())?
        } else {
            EArray::open_read_only(self.storage.clone(), node.as_str())?
        };
        Ok(array)
    }

    /// Remove the node at `path` with its chunks and attributes.
    ///
    /// # Errors
    /// Returns [`FileError::NodeNotFound`] if there is no node at `path`, [`StorageError::ReadOnly`] if the file is read only, or a [`FileError`] if there is an underlying store error.
    pub fn remove_node(&self, path: &str) -> Result<(), FileError> {
        self.check_writable()?;
        let node = self.existing_node(path)?;
        log::debug!("removing node {node}");
        erase_node(&*self.storage, &node)?;
        Ok(())
    }

    /// Return the paths of every earray in the container, in order.
    ///
    /// # Errors
    /// Returns a [`FileError`] if there is an underlying store error.
    pub fn list_nodes(&self) -> Result<Vec<NodePath>, FileError> {
        self.check_open()?;
        let root = NodePath::root();
        let mut nodes = Vec::new();
        if node_exists(&*self.storage, &root)? {
            nodes.push(root.clone());
        }
        nodes.extend(nodes_below(&*self.storage, &root)?);
        Ok(nodes)
    }

    /// Return the user attributes of the node at `path`.
    ///
    /// # Errors
    /// Returns [`FileError::NodeNotFound`] if there is no node at `path`, or a [`FileError`] if the attributes are invalid or there is an underlying store error.
    pub fn attributes(&self, path: &str) -> Result<Map<String, Value>, FileError> {
        self.check_open()?;
        let node = self.existing_node(path)?;
        Ok(retrieve_attributes(&*self.storage, &node)?)
    }

    /// Replace the user attributes of the node at `path`.
    ///
    /// # Errors
    /// Returns [`FileError::NodeNotFound`] if there is no node at `path`, [`StorageError::ReadOnly`] if the file is read only, or a [`FileError`] if there is an underlying store error.
    pub fn set_attributes(&self, path: &str, attributes: &Map<String, Value>) -> Result<(), FileError> {
        self.check_writable()?;
        let node = self.existing_node(path)?;
        Ok(store_attributes(&*self.storage, &node, attributes)?)
    }

    /// Copy the earray at `source` to `dest`, see [`EArray::copy_to`].
    ///
    /// # Errors
    /// Returns
    ///  - [`FileError::NodeNotFound`] if there is no earray at `source`,
    ///  - [`FileError::CopyOntoItself`] if `source` and `dest` are the same path,
    ///  - [`StorageError::ReadOnly`] if the file is read only, or
    ///  - a [`FileError`] if the copy fails, see [`EArray::copy_to`].
    pub fn copy_node(
        &self,
        source: &str,
        dest: &str,
        options: &CopyOptions,
    ) -> Result<EArray<TStorage>, FileError> {
        self.check_writable()?;
        let source_node = self.existing_node(source)?;
        let dest_node = NodePath::new(dest)?;
        if source_node == dest_node {
            return Err(FileError::CopyOntoItself(dest_node));
        }
        let source = EArray::open_read_only(self.storage.clone(), source_node.as_str())?;
        Ok(source.copy_to(self.storage.clone(), dest, options)?)
    }

    /// Close the file.
    ///
    /// Every later operation fails with [`FileError::Closed`].
    ///
    /// # Errors
    /// Returns [`FileError::Closed`] if the file is already closed.
    pub fn close(&mut self) -> Result<(), FileError> {
        self.check_open()?;
        self.closed = true;
        Ok(())
    }

    fn check_open(&self) -> Result<(), FileError> {
        if self.closed {
            Err(FileError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> Result<(), FileError> {
        self.check_open()?;
        if self.mode.is_writable() {
            Ok(())
        } else {
            Err(StorageError::ReadOnly.into())
        }
    }

    fn existing_node(&self, path: &str) -> Result<NodePath, FileError> {
        let node = NodePath::new(path)?;
        if node_exists(&*self.storage, &node)? {
            Ok(node)
        } else {
            Err(FileError::NodeNotFound(node))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::{AtomKind, RowRange};
    use crate::storage::store::MemoryStore;

    #[test]
    fn file_modes() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            File::open(store.clone(), OpenMode::ReadWrite),
            Err(FileError::NotFound)
        ));

        let mut file = File::open(store.clone(), OpenMode::Append)?;
        let builder = ArrayBuilder::new(vec![0], AtomKind::UInt16);
        file.create_earray("/a", &builder)?.close()?;
        file.create_earray("/group/b", &builder)?.close()?;
        assert!(matches!(
            file.create_earray("/a", &builder),
            Err(FileError::NodeExists(_))
        ));
        assert_eq!(
            file.list_nodes()?,
            vec![NodePath::new("/a")?, NodePath::new("/group/b")?]
        );
        file.close()?;
        assert!(matches!(file.list_nodes(), Err(FileError::Closed)));

        let file = File::open(store.clone(), OpenMode::Read)?;
        let mut array = file.get_earray("/a")?;
        assert!(array.is_read_only());
        assert!(array.append((&[1u16][..], &[1u64][..])).is_err());
        assert!(matches!(
            file.create_earray("/c", &builder),
            Err(FileError::StorageError(StorageError::ReadOnly))
        ));
        assert!(matches!(
            file.get_earray("/c"),
            Err(FileError::NodeNotFound(_))
        ));

        let file = File::open(store.clone(), OpenMode::ReadWrite)?;
        file.remove_node("/a")?;
        assert_eq!(file.list_nodes()?, vec![NodePath::new("/group/b")?]);

        let file = File::open(store, OpenMode::Truncate)?;
        assert!(file.list_nodes()?.is_empty());
        Ok(())
    }

    #[test]
    fn file_attributes_and_copy() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let file = File::open(store, OpenMode::Truncate)?;
        let mut array = file.create_earray("/a", &ArrayBuilder::new(vec![0], AtomKind::Int32))?;
        let elements: Vec<i32> = (0..10).collect();
        array.append((elements.as_slice(), &[10u64][..]))?;
        array.close()?;

        let mut attributes = Map::new();
        attributes.insert("units".to_string(), Value::from("K"));
        file.set_attributes("/a", &attributes)?;
        assert_eq!(file.attributes("/a")?, attributes);
        assert!(file.set_attributes("/missing", &attributes).is_err());

        let copy = file.copy_node(
            "/a",
            "/b",
            &CopyOptions::default().with_range(RowRange::new(Some(-3), None, None)),
        )?;
        assert_eq!(copy.read_elements::<i32>(RowRange::all())?, vec![7]);
        assert_eq!(file.attributes("/b")?, attributes);

        file.copy_node(
            "/a",
            "/c",
            &CopyOptions::default()
                .with_range(RowRange::span(2, 5))
                .with_copy_user_attrs(false),
        )?;
        assert!(file.attributes("/c")?.is_empty());
        assert!(matches!(
            file.copy_node("/a", "/a", &CopyOptions::default().with_overwrite(true)),
            Err(FileError::CopyOntoItself(_))
        ));
        Ok(())
    }

    #[test]
    fn file_earrays_are_leaves() -> Result<(), Box<dyn std::error::Error>> {
        let store = Arc::new(MemoryStore::new());
        let file = File::open(store, OpenMode::Truncate)?;
        let builder = ArrayBuilder::new(vec![0], AtomKind::Int8);
        file.create_earray("/g", &builder)?.close()?;
        file.create_earray("/h/a", &builder)?.close()?;

        assert!(matches!(
            file.create_earray("/g/a", &builder),
            Err(FileError::ArrayCreateError(ArrayCreateError::InsideEArray(path, ancestor)))
                if path.as_str() == "/g/a" && ancestor.as_str() == "/g"
        ));
        assert!(matches!(
            file.create_earray("/h", &builder),
            Err(FileError::ArrayCreateError(ArrayCreateError::EArrayBelow(_, below)))
                if below.as_str() == "/h/a"
        ));
        assert!(matches!(
            file.copy_node("/h/a", "/h", &CopyOptions::default().with_overwrite(true)),
            Err(FileError::ArrayError(ArrayError::ArrayCreateError(
                ArrayCreateError::EArrayBelow(..)
            )))
        ));
        assert!(matches!(
            file.copy_node("/g", "/g/copy", &CopyOptions::default()),
            Err(FileError::ArrayError(ArrayError::ArrayCreateError(
                ArrayCreateError::InsideEArray(..)
            )))
        ));

        // removing a node leaves its siblings
        file.create_earray("/h/b", &builder)?.close()?;
        file.remove_node("/h/a")?;
        assert_eq!(
            file.list_nodes()?,
            vec![NodePath::new("/g")?, NodePath::new("/h/b")?]
        );
        file.remove_node("/g")?;
        assert_eq!(file.list_nodes()?, vec![NodePath::new("/h/b")?]);
        Ok(())
    }
}
