//! Page tree index.
//!
//! Translates between zero-based page positions and page objects inside the
//! `Pages`/`Kids`/`Count` tree of a document, and mutates that tree while
//! keeping every ancestor's `Count` equal to the number of leaves below it.
//!
//! Malformed trees are tolerated where possible:
//! - a `Kids` slot holding an array instead of a reference is walked like an
//!   inline `Kids` array, except where every kid stands for one page and the
//!   slot resolves to its first element
//! - `Pages` nodes with a single kid are walked through and recorded in the
//!   parent chain
//! - a missing `Count` reads as 0, a missing `Type` is inferred from `Kids`
//! - cycles, dangling references and bad `Kids` entries resolve to "not
//!   found" and are logged

use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::object::{Dictionary, Object, ObjectRef};
use crate::page::Page;
use crate::store::ObjectStore;
use std::collections::HashSet;
use std::ops::ControlFlow;

/// `after` value for [`PageTree::insert_page`] that inserts before page 0.
pub const INSERT_BEFORE_FIRST_PAGE: i32 = -1;

/// Maximum nesting of array-wrapped kids that will be followed.
const MAX_ARRAY_NESTING: usize = 32;

/// Node kind of a page tree object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Pages,
    Page,
}

fn node_type(dict: &Dictionary) -> Option<NodeType> {
    match dict.get("Type").and_then(Object::as_name) {
        Some("Pages") => Some(NodeType::Pages),
        Some("Page") => Some(NodeType::Page),
        Some(_) => None,
        None if dict.contains_key("Kids") => Some(NodeType::Pages),
        None => Some(NodeType::Page),
    }
}

fn count_of(dict: &Dictionary) -> usize {
    dict.get("Count")
        .and_then(Object::as_integer)
        .map(|c| c.max(0) as usize)
        .unwrap_or(0)
}

/// Strip array wrappers from a `Kids` slot down to the first reference inside.
fn unwrap_kid(kid: &Object) -> std::result::Result<ObjectRef, &'static str> {
    let mut current = kid;
    for _ in 0..MAX_ARRAY_NESTING {
        match current {
            Object::Reference(r) => return Ok(*r),
            Object::Array(nested) => current = nested.first().ok_or("empty array")?,
            other => return Err(other.type_name()),
        }
    }
    Err("nested too deeply")
}

/// Index path to `target` through `kids` and any arrays nested in it.
fn kid_path(kids: &[Object], target: ObjectRef, depth: usize) -> Option<Vec<usize>> {
    for (i, kid) in kids.iter().enumerate() {
        match kid {
            Object::Reference(r) if *r == target => return Some(vec![i]),
            Object::Array(nested) if depth < MAX_ARRAY_NESTING => {
                if let Some(mut path) = kid_path(nested, target, depth + 1) {
                    path.insert(0, i);
                    return Some(path);
                }
            },
            _ => {},
        }
    }
    None
}

/// The array reached by following `path` down from `kids`.
fn nested_kids_mut<'k>(mut kids: &'k mut Vec<Object>, path: &[usize]) -> Option<&'k mut Vec<Object>> {
    for &i in path {
        kids = kids.get_mut(i)?.as_array_mut()?;
    }
    Some(kids)
}

/// Remove the kid at `path`, dropping nested arrays it leaves empty.
fn remove_kid_at(kids: &mut Vec<Object>, path: &[usize]) -> Option<Object> {
    match path {
        [] => None,
        [last] => (*last < kids.len()).then(|| kids.remove(*last)),
        [first, rest @ ..] => {
            let nested = kids.get_mut(*first)?.as_array_mut()?;
            let removed = remove_kid_at(nested, rest)?;
            if nested.is_empty() {
                kids.remove(*first);
            }
            Some(removed)
        },
    }
}

/// Index over the page tree of one document.
///
/// Holds the object store for the duration of its use; resolved pages are
/// cached by index and the cache is dropped whenever the tree is mutated.
pub struct PageTree<'a> {
    objects: &'a mut ObjectStore,
    root: ObjectRef,
    cache: Vec<Option<Page>>,
}

impl<'a> PageTree<'a> {
    /// Open the tree rooted at `root`.
    pub fn new(objects: &'a mut ObjectStore, root: ObjectRef) -> Result<Self> {
        let count = match objects.get(root) {
            Some(obj) => count_of(obj.as_dict().ok_or_else(|| Error::InvalidObjectType {
                expected: "Dictionary".to_string(),
                found: obj.type_name().to_string(),
            })?),
            None => {
                return Err(Error::InvalidHandle(format!("page tree root {} does not exist", root)))
            },
        };

        Ok(Self {
            objects,
            root,
            cache: vec![None; count],
        })
    }

    /// Reference of the root `Pages` node.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// The underlying object store.
    pub fn objects(&self) -> &ObjectStore {
        self.objects
    }

    /// Root `Count`, or 0 when absent.
    pub fn total_pages(&self) -> usize {
        self.objects.get_dict(self.root).map(count_of).unwrap_or(0)
    }

    /// Resolve a page by position. Returns `None` past the end or when the
    /// tree is too damaged to reach the page.
    pub fn get_page(&mut self, index: usize) -> Option<Page> {
        if index >= self.total_pages() {
            log::debug!("Page index {} out of range ({} pages)", index, self.total_pages());
            return None;
        }

        if let Some(Some(page)) = self.cache.get(index) {
            return Some(page.clone());
        }

        let mut parents = Vec::new();
        let mut visited = HashSet::new();
        let page = self.resolve_in_node(self.root, index, &mut parents, &mut visited)?;

        if self.cache.len() <= index {
            self.cache.resize(index + 1, None);
        }
        self.cache[index] = Some(page.clone());
        Some(page)
    }

    /// Resolve a page by its object reference. Linear in the page count.
    pub fn get_page_by_ref(&mut self, reference: ObjectRef) -> Option<Page> {
        self.page_index(reference)
            .and_then(|index| self.get_page(index))
    }

    /// Position of a page object in document order.
    pub fn page_index(&mut self, reference: ObjectRef) -> Option<usize> {
        (0..self.total_pages()).find(|&i| {
            self.get_page(i)
                .is_some_and(|page| page.reference == reference)
        })
    }

    fn resolve_in_node(
        &self,
        node_ref: ObjectRef,
        index: usize,
        parents: &mut Vec<ObjectRef>,
        visited: &mut HashSet<ObjectRef>,
    ) -> Option<Page> {
        if !visited.insert(node_ref) {
            log::warn!("Cycle in page tree: {} is its own ancestor", node_ref);
            return None;
        }

        let Some(node) = self.objects.get_dict(node_ref) else {
            log::error!("Page tree node {} cannot be resolved", node_ref);
            return None;
        };
        let Some(kids) = node.get("Kids").and_then(Object::as_array) else {
            log::warn!("Pages node {} has no Kids array", node_ref);
            return None;
        };
        let count = count_of(node);
        parents.push(node_ref);

        if kids.len() == count {
            // every kid stands for exactly one page
            let Some(kid) = kids.get(index) else {
                log::warn!("Pages node {} has no kid at {}", node_ref, index);
                return None;
            };
            let kid_ref = match unwrap_kid(kid) {
                Ok(r) => r,
                Err(found) => {
                    log::warn!("Invalid Kids entry in {}: {}", node_ref, found);
                    return None;
                },
            };
            return self.resolve_kid(kid_ref, 0, parents, visited);
        }

        let mut remaining = index;
        if let ControlFlow::Break(page) =
            self.scan_kids(node_ref, kids, &mut remaining, 0, parents, visited)
        {
            return page;
        }

        log::warn!(
            "Pages node {} claims {} pages but its kids hold fewer (index {})",
            node_ref,
            count,
            index
        );
        None
    }

    /// Walk `kids` left to right, counting down `remaining` by one per page
    /// and by `Count` per skipped subtree. Nested arrays are walked in place.
    /// Breaks with the page, or with `None` on a malformed entry; continues
    /// once the whole array lies before the target.
    fn scan_kids(
        &self,
        node_ref: ObjectRef,
        kids: &[Object],
        remaining: &mut usize,
        depth: usize,
        parents: &mut Vec<ObjectRef>,
        visited: &mut HashSet<ObjectRef>,
    ) -> ControlFlow<Option<Page>> {
        for kid in kids {
            let kid_ref = match kid {
                Object::Reference(r) => *r,
                Object::Array(nested) => {
                    if depth >= MAX_ARRAY_NESTING {
                        log::warn!("Kids of {} are nested too deeply", node_ref);
                        return ControlFlow::Break(None);
                    }
                    if let ControlFlow::Break(page) =
                        self.scan_kids(node_ref, nested, remaining, depth + 1, parents, visited)
                    {
                        return ControlFlow::Break(page);
                    }
                    continue;
                },
                other => {
                    log::warn!("Invalid Kids entry in {}: {}", node_ref, other.type_name());
                    return ControlFlow::Break(None);
                },
            };
            let Some(kid_dict) = self.objects.get_dict(kid_ref) else {
                log::error!("Page tree kid {} of {} cannot be resolved", kid_ref, node_ref);
                return ControlFlow::Break(None);
            };

            match node_type(kid_dict) {
                Some(NodeType::Pages) => {
                    let kid_count = count_of(kid_dict);
                    if *remaining < kid_count {
                        return ControlFlow::Break(
                            self.resolve_in_node(kid_ref, *remaining, parents, visited),
                        );
                    }
                    *remaining -= kid_count;
                },
                Some(NodeType::Page) => {
                    if *remaining == 0 {
                        return ControlFlow::Break(Some(Page {
                            reference: kid_ref,
                            parents: parents.clone(),
                        }));
                    }
                    *remaining -= 1;
                },
                None => {
                    log::warn!("Kid {} of {} is neither Page nor Pages", kid_ref, node_ref);
                    return ControlFlow::Break(None);
                },
            }
        }
        ControlFlow::Continue(())
    }

    /// Resolve a kid reference reached through the one-page-per-kid path.
    fn resolve_kid(
        &self,
        kid_ref: ObjectRef,
        index: usize,
        parents: &mut Vec<ObjectRef>,
        visited: &mut HashSet<ObjectRef>,
    ) -> Option<Page> {
        let Some(kid_dict) = self.objects.get_dict(kid_ref) else {
            log::error!("Page tree kid {} cannot be resolved", kid_ref);
            return None;
        };

        match node_type(kid_dict) {
            Some(NodeType::Page) => Some(Page {
                reference: kid_ref,
                parents: parents.clone(),
            }),
            // single-kid wrappers land on the fast path again with index 0
            Some(NodeType::Pages) => self.resolve_in_node(kid_ref, index, parents, visited),
            None => {
                log::warn!("Kid {} is neither Page nor Pages", kid_ref);
                None
            },
        }
    }

    /// Insert an existing page object after page `after`.
    ///
    /// `after == INSERT_BEFORE_FIRST_PAGE` inserts at the front. Other
    /// negative values are ignored. On an empty tree the page becomes the
    /// root's first kid. Every node on the parent chain gets its `Count`
    /// incremented. Returns whether the page was inserted.
    pub fn insert_page(&mut self, after: i32, page_ref: ObjectRef) -> Result<bool> {
        if after < 0 && after != INSERT_BEFORE_FIRST_PAGE {
            log::info!("Ignoring insert after invalid page index {}", after);
            return Ok(false);
        }
        if !self.objects.contains(page_ref) {
            return Err(Error::InvalidHandle(format!("page object {} does not exist", page_ref)));
        }

        let before_first = after == INSERT_BEFORE_FIRST_PAGE;
        let target = if before_first { 0 } else { after as usize };

        // `container` leads from the parent's Kids to the array receiving the page
        let (parent, container, position, chain) = match self.get_page(target) {
            Some(page) => {
                let Some(parent) = page.parent() else {
                    log::error!("Page {} has no parent, cannot insert after it", target);
                    return Ok(false);
                };
                if before_first {
                    (parent, Vec::new(), 0, page.parents)
                } else {
                    let mut path = self.kid_path_in(parent, page.reference).unwrap_or_default();
                    let Some(last) = path.pop() else {
                        log::error!("Page {} not found in Kids of {}", page.reference, parent);
                        return Ok(false);
                    };
                    (parent, path, last + 1, page.parents)
                }
            },
            None if self.total_pages() == 0 => (self.root, Vec::new(), 0, vec![self.root]),
            None => {
                log::error!("Cannot find page {} to insert after", target);
                return Ok(false);
            },
        };

        let Some(parent_dict) = self.objects.get_dict_mut(parent) else {
            log::error!("Parent node {} vanished during insert", parent);
            return Ok(false);
        };
        let kids = parent_dict
            .entry("Kids".to_string())
            .or_insert_with(|| Object::Array(Vec::new()));
        let Some(kids) = kids.as_array_mut().and_then(|k| nested_kids_mut(k, &container)) else {
            log::error!("Kids of {} is not an array", parent);
            return Ok(false);
        };
        let position = position.min(kids.len());
        kids.insert(position, page_ref.into());

        if let Some(page_dict) = self.objects.get_dict_mut(page_ref) {
            page_dict.insert("Parent".to_string(), parent.into());
        }

        for node in chain.iter().rev() {
            self.change_pages_count(*node, 1);
        }
        self.invalidate();

        log::debug!("Inserted page {} into {} at kid {}", page_ref, parent, position);
        Ok(true)
    }

    /// Create a blank page of the given size and append it.
    pub fn create_page(&mut self, size: &Rect) -> Result<Page> {
        let total = self.total_pages();
        let after = i32::try_from(total)
            .map_err(|_| Error::Unsupported(format!("page tree with {} pages", total)))?
            - 1;

        let page_ref = Page::create_object(self.objects, size);
        if !self.insert_page(after, page_ref)? {
            self.discard_page_objects(page_ref);
            return Err(Error::InvalidPdf("could not link new page into the page tree".to_string()));
        }

        self.get_page(total)
            .ok_or_else(|| Error::InvalidPdf(format!("new page {} is not reachable", page_ref)))
    }

    fn discard_page_objects(&mut self, page_ref: ObjectRef) {
        let contents = self
            .objects
            .get_dict(page_ref)
            .and_then(|d| d.get("Contents"))
            .and_then(Object::as_reference);
        self.objects.take(page_ref);
        if let Some(contents) = contents {
            self.objects.take(contents);
        }
    }

    /// Unlink page `index` from the tree and delete its page object.
    ///
    /// Counts along the parent chain are decremented the same way insertion
    /// increments them. Content streams and resources are left in place since
    /// other pages may share them. Intermediate `Pages` nodes left without
    /// pages are unlinked and deleted as well. Returns whether a page was
    /// deleted.
    pub fn delete_page(&mut self, index: usize) -> Result<bool> {
        let Some(page) = self.get_page(index) else {
            log::info!("Cannot delete page {}: not found", index);
            return Ok(false);
        };
        let Some(parent) = page.parent() else {
            log::error!("Page {} has no parent", index);
            return Ok(false);
        };
        if !self.unlink_kid(parent, page.reference) {
            log::error!("Page {} not found in Kids of {}", page.reference, parent);
            return Ok(false);
        }

        for node in page.parents.iter().rev() {
            self.change_pages_count(*node, -1);
        }
        self.objects.remove(page.reference);
        self.prune_empty_nodes(&page.parents);
        self.invalidate();

        log::debug!("Deleted page {} ({})", index, page.reference);
        Ok(true)
    }

    /// Unlink `Pages` nodes of `chain` that no longer hold any page, innermost
    /// first. The root is kept even when empty.
    fn prune_empty_nodes(&mut self, chain: &[ObjectRef]) {
        for pair in chain.windows(2).rev() {
            let (up, node) = (pair[0], pair[1]);
            let empty = self.objects.get_dict(node).is_some_and(|dict| {
                count_of(dict) == 0
                    && dict
                        .get("Kids")
                        .and_then(Object::as_array)
                        .map_or(true, Vec::is_empty)
            });
            if !empty {
                break;
            }
            if !self.unlink_kid(up, node) {
                log::warn!("Empty Pages node {} not found in Kids of {}", node, up);
                break;
            }
            self.objects.remove(node);
            log::debug!("Removed empty Pages node {}", node);
        }
    }

    /// Remove `kid` from the `Kids` of `parent`, looking inside nested arrays.
    fn unlink_kid(&mut self, parent: ObjectRef, kid: ObjectRef) -> bool {
        let Some(kids) = self
            .objects
            .get_dict_mut(parent)
            .and_then(|d| d.get_mut("Kids"))
            .and_then(Object::as_array_mut)
        else {
            return false;
        };
        kid_path(kids, kid, 0).is_some_and(|path| remove_kid_at(kids, &path).is_some())
    }

    fn kid_path_in(&self, parent: ObjectRef, kid: ObjectRef) -> Option<Vec<usize>> {
        let kids = self.objects.get_dict(parent)?.get("Kids").and_then(Object::as_array)?;
        kid_path(kids, kid, 0)
    }

    /// Position of `page_ref` within the `Kids` of `parent`. A page inside a
    /// nested array reports the position of that array.
    pub fn get_pos_in_kids(&self, page_ref: ObjectRef, parent: Option<ObjectRef>) -> Option<usize> {
        self.kid_path_in(parent?, page_ref)?.first().copied()
    }

    /// Add `delta` to a node's `Count` and return the new value.
    pub fn change_pages_count(&mut self, node: ObjectRef, delta: i64) -> i64 {
        let Some(dict) = self.objects.get_dict_mut(node) else {
            log::warn!("Cannot update Count of missing node {}", node);
            return 0;
        };
        let current = dict.get("Count").and_then(Object::as_integer).unwrap_or(0);
        if delta == 0 {
            return current;
        }
        let updated = current + delta;
        dict.insert("Count".to_string(), Object::Integer(updated));
        updated
    }

    fn invalidate(&mut self) {
        self.cache.clear();
        self.cache.resize(self.total_pages(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages_node(kids: Vec<Object>, count: i64) -> Object {
        Object::dict(vec![
            ("Type", Object::name("Pages")),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ])
    }

    fn leaf(objects: &mut ObjectStore) -> ObjectRef {
        objects.create_object(Object::dict(vec![("Type", Object::name("Page"))]))
    }

    fn empty_tree() -> (ObjectStore, ObjectRef) {
        let mut objects = ObjectStore::new();
        let root = objects.create_object(pages_node(vec![], 0));
        (objects, root)
    }

    #[test]
    fn test_new_requires_root() {
        let mut objects = ObjectStore::new();
        let err = PageTree::new(&mut objects, ObjectRef::new(1, 0)).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidHandle);

        let not_dict = objects.create_object(Object::Integer(3));
        let err = PageTree::new(&mut objects, not_dict).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidDataType);
    }

    #[test]
    fn test_missing_count_reads_zero() {
        let mut objects = ObjectStore::new();
        let root = objects.create_object(Object::dict(vec![("Kids", Object::Array(vec![]))]));
        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(tree.total_pages(), 0);
        assert!(tree.get_page(0).is_none());
    }

    #[test]
    fn test_fast_path_direct_kids() {
        let mut objects = ObjectStore::new();
        let a = leaf(&mut objects);
        let b = leaf(&mut objects);
        let root = objects.create_object(pages_node(vec![a.into(), b.into()], 2));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        let page = tree.get_page(1).unwrap();
        assert_eq!(page.reference, b);
        assert_eq!(page.parents, vec![root]);
    }

    #[test]
    fn test_missing_type_is_inferred() {
        let mut objects = ObjectStore::new();
        let a = objects.create_object(Object::dict(vec![("MediaBox", Rect::a4().to_object())]));
        let b = objects.create_object(Object::dict(vec![("MediaBox", Rect::a4().to_object())]));
        let mid = objects.create_object(Object::dict(vec![
            ("Kids", Object::Array(vec![a.into(), b.into()])),
            ("Count", Object::Integer(2)),
        ]));
        let c = leaf(&mut objects);
        let root = objects.create_object(pages_node(vec![mid.into(), c.into()], 3));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(tree.get_page(1).unwrap().reference, b);
        assert_eq!(tree.get_page(2).unwrap().reference, c);
    }

    #[test]
    fn test_unknown_kid_type_aborts() {
        let mut objects = ObjectStore::new();
        let odd = objects.create_object(Object::dict(vec![("Type", Object::name("Template"))]));
        let a = leaf(&mut objects);
        let root = objects.create_object(pages_node(vec![odd.into(), a.into()], 3));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.get_page(0).is_none());
    }

    #[test]
    fn test_change_pages_count() {
        let (mut objects, root) = empty_tree();
        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(tree.change_pages_count(root, 0), 0);
        assert_eq!(tree.change_pages_count(root, 3), 3);
        assert_eq!(tree.change_pages_count(root, -1), 2);
        assert_eq!(tree.total_pages(), 2);
        assert_eq!(tree.change_pages_count(ObjectRef::new(99, 0), 1), 0);
    }

    #[test]
    fn test_get_pos_in_kids() {
        let mut objects = ObjectStore::new();
        let a = leaf(&mut objects);
        let b = leaf(&mut objects);
        let stray = leaf(&mut objects);
        let root = objects.create_object(pages_node(
            vec![a.into(), Object::Array(vec![b.into()])],
            2,
        ));

        let tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(tree.get_pos_in_kids(a, Some(root)), Some(0));
        assert_eq!(tree.get_pos_in_kids(b, Some(root)), Some(1));
        assert_eq!(tree.get_pos_in_kids(stray, Some(root)), None);
        assert_eq!(tree.get_pos_in_kids(a, None), None);
    }

    #[test]
    fn test_insert_sets_parent_and_counts() {
        let mut objects = ObjectStore::new();
        let a = leaf(&mut objects);
        let b = leaf(&mut objects);
        let child = objects.create_object(pages_node(vec![a.into(), b.into()], 2));
        let root = objects.create_object(pages_node(vec![child.into()], 2));
        let new_page = leaf(&mut objects);

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.insert_page(0, new_page).unwrap());
        assert_eq!(tree.total_pages(), 3);
        assert_eq!(tree.get_page(1).unwrap().reference, new_page);
        assert_eq!(tree.get_page(2).unwrap().reference, b);

        let page_dict = objects.get_dict(new_page).unwrap();
        assert_eq!(page_dict["Parent"].as_reference(), Some(child));
        assert_eq!(objects.get_dict(child).unwrap()["Count"].as_integer(), Some(3));
    }

    #[test]
    fn test_insert_unknown_page_object_is_an_error() {
        let (mut objects, root) = empty_tree();
        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.insert_page(INSERT_BEFORE_FIRST_PAGE, ObjectRef::new(42, 0)).is_err());
    }

    #[test]
    fn test_create_page_rolls_back_on_failure() {
        let mut objects = ObjectStore::new();
        // root claims a page it cannot produce
        let root = objects.create_object(pages_node(vec![], 1));
        let before = objects.len();

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.create_page(&Rect::letter()).is_err());
        assert_eq!(objects.len(), before);
    }

    #[test]
    fn test_delete_page() {
        let (mut objects, root) = empty_tree();
        let mut tree = PageTree::new(&mut objects, root).unwrap();
        let first = tree.create_page(&Rect::letter()).unwrap();
        let second = tree.create_page(&Rect::a4()).unwrap();

        assert!(tree.delete_page(0).unwrap());
        assert_eq!(tree.total_pages(), 1);
        assert_eq!(tree.get_page(0).unwrap().reference, second.reference);
        assert!(!tree.delete_page(5).unwrap());

        assert!(objects.get(first.reference).is_none());
        assert_eq!(objects.free_objects(), &[ObjectRef::new(first.reference.id, 1)]);
    }

    fn refs(targets: &[ObjectRef]) -> Vec<Object> {
        targets.iter().map(|&r| r.into()).collect()
    }

    fn order(tree: &mut PageTree<'_>) -> Vec<Option<ObjectRef>> {
        (0..tree.total_pages())
            .map(|i| tree.get_page(i).map(|p| p.reference))
            .collect()
    }

    #[test]
    fn test_general_path_walks_nested_array_by_position() {
        let mut objects = ObjectStore::new();
        let leaves: Vec<ObjectRef> = (0..3).map(|_| leaf(&mut objects)).collect();
        let root = objects.create_object(pages_node(vec![Object::Array(refs(&leaves))], 3));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(order(&mut tree), leaves.iter().copied().map(Some).collect::<Vec<_>>());
        assert_eq!(tree.get_page(2).unwrap().parents, vec![root]);
        assert!(tree.get_page(3).is_none());
    }

    #[test]
    fn test_nested_array_holding_subtree() {
        let mut objects = ObjectStore::new();
        let leaves: Vec<ObjectRef> = (0..5).map(|_| leaf(&mut objects)).collect();
        let sub = objects.create_object(pages_node(refs(&leaves[2..4]), 2));
        let root = objects.create_object(pages_node(
            vec![
                leaves[0].into(),
                Object::Array(vec![leaves[1].into(), sub.into()]),
                leaves[4].into(),
            ],
            5,
        ));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert_eq!(order(&mut tree), leaves.iter().copied().map(Some).collect::<Vec<_>>());
        assert_eq!(tree.get_page(3).unwrap().parents, vec![root, sub]);
        assert_eq!(tree.get_pos_in_kids(leaves[1], Some(root)), Some(1));
    }

    #[test]
    fn test_edit_inside_nested_array() {
        let mut objects = ObjectStore::new();
        let leaves: Vec<ObjectRef> = (0..3).map(|_| leaf(&mut objects)).collect();
        let root = objects.create_object(pages_node(vec![Object::Array(refs(&leaves))], 3));
        let new_page = leaf(&mut objects);

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.insert_page(1, new_page).unwrap());
        assert_eq!(
            order(&mut tree),
            vec![Some(leaves[0]), Some(leaves[1]), Some(new_page), Some(leaves[2])]
        );

        assert!(tree.delete_page(0).unwrap());
        assert_eq!(order(&mut tree), vec![Some(leaves[1]), Some(new_page), Some(leaves[2])]);
        let kids = tree.objects().get_dict(root).unwrap()["Kids"].as_array().unwrap().clone();
        assert_eq!(kids, vec![Object::Array(refs(&[leaves[1], new_page, leaves[2]]))]);
    }

    #[test]
    fn test_delete_drops_emptied_nested_array() {
        let mut objects = ObjectStore::new();
        let a = leaf(&mut objects);
        let b = leaf(&mut objects);
        let root = objects.create_object(pages_node(vec![Object::Array(vec![a.into()]), b.into()], 2));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.delete_page(0).unwrap());
        let kids = tree.objects().get_dict(root).unwrap()["Kids"].as_array().unwrap().clone();
        assert_eq!(kids, vec![Object::from(b)]);
        assert_eq!(order(&mut tree), vec![Some(b)]);
    }

    #[test]
    fn test_delete_unlinks_emptied_intermediate_node() {
        let mut objects = ObjectStore::new();
        let leaves: Vec<ObjectRef> = (0..5).map(|_| leaf(&mut objects)).collect();
        let first = objects.create_object(pages_node(refs(&leaves[..2]), 2));
        let second = objects.create_object(pages_node(refs(&leaves[2..]), 3));
        let root = objects.create_object(pages_node(refs(&[first, second]), 5));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        for _ in 0..3 {
            assert!(tree.delete_page(0).unwrap());
        }

        // root Kids length now matches its Count; resolution must stay correct
        assert_eq!(tree.total_pages(), 2);
        assert_eq!(order(&mut tree), vec![Some(leaves[3]), Some(leaves[4])]);
        assert_eq!(tree.get_pos_in_kids(second, Some(root)), Some(0));
        assert!(!tree.objects().contains(first));
        assert!(tree.objects().contains(second));
    }

    #[test]
    fn test_delete_collapses_wrapper_chain() {
        let mut objects = ObjectStore::new();
        let p = leaf(&mut objects);
        let q = leaf(&mut objects);
        let inner = objects.create_object(pages_node(refs(&[p]), 1));
        let outer = objects.create_object(pages_node(refs(&[inner]), 1));
        let root = objects.create_object(pages_node(refs(&[outer, q]), 2));

        let mut tree = PageTree::new(&mut objects, root).unwrap();
        assert!(tree.delete_page(0).unwrap());

        let kids = tree.objects().get_dict(root).unwrap()["Kids"].as_array().unwrap().clone();
        assert_eq!(kids, refs(&[q]));
        assert!(!tree.objects().contains(inner));
        assert!(!tree.objects().contains(outer));
        assert_eq!(order(&mut tree), vec![Some(q)]);

        // the root itself survives emptying
        assert!(tree.delete_page(0).unwrap());
        assert!(tree.objects().contains(root));
        assert_eq!(tree.total_pages(), 0);
    }
}
