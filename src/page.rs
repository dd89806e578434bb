//! Page handles.

use crate::geometry::Rect;
use crate::object::{Object, ObjectRef};
use crate::store::ObjectStore;

/// Standard procedure sets advertised by newly created pages.
const PROC_SET: [&str; 5] = ["PDF", "Text", "ImageB", "ImageC", "ImageI"];

/// A resolved page: the page object's reference plus the chain of `Pages`
/// nodes leading to it, root first, immediate parent last.
///
/// A `Page` does not own anything. It goes stale when the page tree is
/// mutated and should be resolved again afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The page object
    pub reference: ObjectRef,
    /// Ancestor `Pages` nodes, root first
    pub parents: Vec<ObjectRef>,
}

impl Page {
    /// Immediate parent node, if the page was resolved through one.
    pub fn parent(&self) -> Option<ObjectRef> {
        self.parents.last().copied()
    }

    /// Look up `key` on the page, then on each ancestor, nearest first.
    ///
    /// This is how inheritable attributes such as `Resources`, `MediaBox`,
    /// `CropBox` and `Rotate` are found.
    pub fn inherited_attribute<'s>(&self, objects: &'s ObjectStore, key: &str) -> Option<&'s Object> {
        std::iter::once(&self.reference)
            .chain(self.parents.iter().rev())
            .filter_map(|node| objects.get_dict(*node))
            .find_map(|dict| dict.get(key))
    }

    /// Effective media box, taking inheritance into account.
    pub fn media_box(&self, objects: &ObjectStore) -> Option<Rect> {
        self.inherited_attribute(objects, "MediaBox")
            .and_then(Rect::from_object)
    }

    /// Add a blank page object (and its empty content stream) to `objects`.
    ///
    /// The page is not linked into any page tree yet.
    pub(crate) fn create_object(objects: &mut ObjectStore, size: &Rect) -> ObjectRef {
        let contents = objects.create_object(Object::Stream {
            dict: Default::default(),
            data: bytes::Bytes::new(),
        });

        let proc_set = PROC_SET.iter().map(|name| Object::name(name)).collect();
        objects.create_object(Object::dict(vec![
            ("Type", Object::name("Page")),
            ("MediaBox", size.to_object()),
            ("Resources", Object::dict(vec![("ProcSet", Object::Array(proc_set))])),
            ("Contents", contents.into()),
        ]))
    }
}
