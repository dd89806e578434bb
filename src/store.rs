//! Indirect object storage.
//!
//! [`ObjectStore`] is the sole owner of every indirect object in a document.
//! Objects keep their insertion order ("storage order"), which is the order
//! the writer emits them in. Deleted references are remembered on a free list
//! so the cross-reference section can report them.

use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::{HashMap, HashSet};

/// An object together with the reference it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct IndirectObject {
    /// Object number and generation
    pub reference: ObjectRef,
    /// Object value
    pub object: Object,
}

/// Storage for the indirect objects of one document.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: Vec<IndirectObject>,
    positions: HashMap<ObjectRef, usize>,
    free: Vec<ObjectRef>,
    next_id: u32,
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore {
    /// Create an empty store. Object numbers start at 1.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            positions: HashMap::new(),
            free: Vec::new(),
            next_id: 1,
        }
    }

    /// Add an object under the next unused object number.
    pub fn create_object(&mut self, object: Object) -> ObjectRef {
        let reference = ObjectRef::new(self.next_id, 0);
        self.insert(reference, object);
        reference
    }

    /// Store `object` under an explicit reference, replacing any previous value.
    pub fn insert(&mut self, reference: ObjectRef, object: Object) {
        if let Some(&pos) = self.positions.get(&reference) {
            self.objects[pos].object = object;
            return;
        }

        self.free.retain(|r| r.id != reference.id);
        self.positions.insert(reference, self.objects.len());
        self.objects.push(IndirectObject { reference, object });
        self.next_id = self.next_id.max(reference.id.saturating_add(1));
    }

    /// Delete an object and put its number on the free list.
    ///
    /// The free entry carries the next generation number, so a later object
    /// reusing the number is distinguishable from the deleted one.
    pub fn remove(&mut self, reference: ObjectRef) -> Option<Object> {
        let object = self.take(reference)?;
        self.free
            .push(ObjectRef::new(reference.id, reference.gen.saturating_add(1)));
        Some(object)
    }

    /// Delete an object without recording a free entry.
    pub(crate) fn take(&mut self, reference: ObjectRef) -> Option<Object> {
        let pos = self.positions.remove(&reference)?;
        let entry = self.objects.remove(pos);
        for (i, item) in self.objects.iter().enumerate().skip(pos) {
            self.positions.insert(item.reference, i);
        }
        Some(entry.object)
    }

    /// Look up an object.
    pub fn get(&self, reference: ObjectRef) -> Option<&Object> {
        self.positions
            .get(&reference)
            .map(|&pos| &self.objects[pos].object)
    }

    /// Look up an object for mutation.
    pub fn get_mut(&mut self, reference: ObjectRef) -> Option<&mut Object> {
        let pos = *self.positions.get(&reference)?;
        Some(&mut self.objects[pos].object)
    }

    /// Look up a dictionary (or stream dictionary).
    pub fn get_dict(&self, reference: ObjectRef) -> Option<&Dictionary> {
        self.get(reference).and_then(Object::as_dict)
    }

    /// Look up a dictionary (or stream dictionary) for mutation.
    pub fn get_dict_mut(&mut self, reference: ObjectRef) -> Option<&mut Dictionary> {
        self.get_mut(reference).and_then(Object::as_dict_mut)
    }

    /// Whether an object is stored under `reference`.
    pub fn contains(&self, reference: ObjectRef) -> bool {
        self.positions.contains_key(&reference)
    }

    /// Storage position of an object.
    pub fn index_of(&self, reference: ObjectRef) -> Option<usize> {
        self.positions.get(&reference).copied()
    }

    /// Entry at a storage position.
    pub fn at(&self, index: usize) -> Option<&IndirectObject> {
        self.objects.get(index)
    }

    /// Iterate in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &IndirectObject> {
        self.objects.iter()
    }

    /// Iterate in storage order, with mutable access to the object values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectRef, &mut Object)> {
        self.objects
            .iter_mut()
            .map(|entry| (entry.reference, &mut entry.object))
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// References freed since the last renumbering, in deletion order.
    pub fn free_objects(&self) -> &[ObjectRef] {
        &self.free
    }

    /// The object number the next [`create_object`](Self::create_object) will use.
    pub fn next_object_number(&self) -> u32 {
        self.next_id
    }

    /// Exchange two storage positions.
    pub fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.objects.swap(a, b);
        self.positions.insert(self.objects[a].reference, a);
        self.positions.insert(self.objects[b].reference, b);
    }

    /// Transitive dependency closure of `start`, excluding `start` itself.
    ///
    /// Every reachable object is visited once, in depth-first discovery order.
    /// `Parent` entries are not followed. References to objects that are not
    /// stored are skipped.
    pub fn dependencies(&self, start: ObjectRef) -> Vec<ObjectRef> {
        let mut visited = HashSet::new();
        visited.insert(start);

        let mut closure = Vec::new();
        let mut stack: Vec<ObjectRef> = match self.get(start) {
            Some(object) => object.references().into_iter().rev().collect(),
            None => return closure,
        };

        while let Some(reference) = stack.pop() {
            if !visited.insert(reference) {
                continue;
            }
            let Some(object) = self.get(reference) else {
                log::debug!("Skipping unresolved dependency {}", reference);
                continue;
            };
            closure.push(reference);
            stack.extend(object.references().into_iter().rev());
        }

        closure
    }

    /// Renumber every object by its storage position (1, 2, ...), generation 0.
    ///
    /// Runs in two passes: the old-to-new mapping is built first, then every
    /// reference in every object and in `trailer` is rewritten through it.
    /// References to objects that are not stored become `null`. The free
    /// list is cleared, since freed numbers are no longer meaningful.
    pub fn renumber(&mut self, trailer: &mut Dictionary) -> HashMap<ObjectRef, ObjectRef> {
        let mapping: HashMap<ObjectRef, ObjectRef> = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.reference, ObjectRef::new(i as u32 + 1, 0)))
            .collect();

        let mut dropped = 0;
        for entry in &mut self.objects {
            entry.reference = mapping[&entry.reference];
            dropped += entry.object.rewrite_references(&mapping);
        }
        for value in trailer.values_mut() {
            dropped += value.rewrite_references(&mapping);
        }
        if dropped > 0 {
            log::warn!("Renumbering dropped {} dangling references", dropped);
        }

        self.positions = self
            .objects
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.reference, i))
            .collect();
        self.free.clear();
        self.next_id = self.objects.len() as u32 + 1;

        log::debug!("Renumbered {} objects", self.objects.len());
        mapping
    }
}
