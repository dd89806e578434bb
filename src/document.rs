//! In-memory PDF document.
//!
//! A [`Document`] pairs an [`ObjectStore`] with the trailer dictionary that
//! names its catalog (`Root`), `Info` and `Encrypt` objects.

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::page_tree::PageTree;
use crate::store::ObjectStore;
use crate::writer::{PdfWriter, WriterConfig};
use std::path::Path;

/// A PDF document held entirely in memory.
#[derive(Debug, Clone)]
pub struct Document {
    objects: ObjectStore,
    trailer: Dictionary,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document: a catalog and a `Pages` root with no kids.
    pub fn new() -> Self {
        let mut objects = ObjectStore::new();
        let pages = objects.create_object(Object::dict(vec![
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]));
        let catalog = objects.create_object(Object::dict(vec![
            ("Type", Object::name("Catalog")),
            ("Pages", pages.into()),
        ]));

        let mut trailer = Dictionary::new();
        trailer.insert("Root".to_string(), catalog.into());

        Self { objects, trailer }
    }

    /// Wrap an existing object graph.
    pub fn from_parts(objects: ObjectStore, trailer: Dictionary) -> Self {
        Self { objects, trailer }
    }

    /// Split into the object graph and trailer.
    pub fn into_parts(self) -> (ObjectStore, Dictionary) {
        (self.objects, self.trailer)
    }

    /// The object store.
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The object store, mutably.
    pub fn objects_mut(&mut self) -> &mut ObjectStore {
        &mut self.objects
    }

    /// The trailer dictionary.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// The trailer dictionary, mutably.
    pub fn trailer_mut(&mut self) -> &mut Dictionary {
        &mut self.trailer
    }

    /// Mutable access to both halves at once.
    pub(crate) fn parts_mut(&mut self) -> (&mut ObjectStore, &mut Dictionary) {
        (&mut self.objects, &mut self.trailer)
    }

    /// Reference to the document catalog, from the trailer's `Root`.
    pub fn catalog_ref(&self) -> Result<ObjectRef> {
        match self.trailer.get("Root") {
            Some(Object::Reference(r)) => Ok(*r),
            Some(other) => Err(Error::InvalidObjectType {
                expected: "Reference (trailer /Root)".to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(Error::InvalidObjectType {
                expected: "Reference (trailer /Root)".to_string(),
                found: "nothing".to_string(),
            }),
        }
    }

    /// The catalog dictionary.
    pub fn catalog(&self) -> Result<&Dictionary> {
        let root = self.catalog_ref()?;
        self.objects
            .get_dict(root)
            .ok_or_else(|| Error::InvalidHandle(format!("catalog {} does not exist", root)))
    }

    /// Reference to the root of the page tree, from the catalog's `Pages`.
    pub fn pages_root(&self) -> Result<ObjectRef> {
        match self.catalog()?.get("Pages") {
            Some(Object::Reference(r)) => Ok(*r),
            Some(other) => Err(Error::InvalidObjectType {
                expected: "Reference (catalog /Pages)".to_string(),
                found: other.type_name().to_string(),
            }),
            None => Err(Error::InvalidObjectType {
                expected: "Reference (catalog /Pages)".to_string(),
                found: "nothing".to_string(),
            }),
        }
    }

    /// Open the page tree for lookups and edits.
    pub fn page_tree(&mut self) -> Result<PageTree<'_>> {
        let root = self.pages_root()?;
        PageTree::new(&mut self.objects, root)
    }

    /// Number of pages according to the page tree root.
    pub fn page_count(&mut self) -> Result<usize> {
        Ok(self.page_tree()?.total_pages())
    }

    /// Set an entry of the document information dictionary, creating the
    /// dictionary if the trailer has none.
    pub fn set_info(&mut self, key: &str, value: Object) {
        let existing = self.trailer.get("Info").and_then(Object::as_reference);
        if let Some(dict) = existing.and_then(|r| self.objects.get_dict_mut(r)) {
            dict.insert(key.to_string(), value);
            return;
        }

        let info = self.objects.create_object(Object::dict(vec![(key, value)]));
        self.trailer.insert("Info".to_string(), info.into());
    }

    /// Serialize into a byte buffer.
    pub fn write_to_vec(&mut self, config: WriterConfig) -> Result<Vec<u8>> {
        PdfWriter::with_config(self, config).write_to_vec()
    }

    /// Serialize to a file.
    pub fn save(&mut self, path: impl AsRef<Path>, config: WriterConfig) -> Result<()> {
        PdfWriter::with_config(self, config).write_to_file(path)
    }
}
