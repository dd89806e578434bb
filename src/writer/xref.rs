//! Cross-reference section builders.
//!
//! Both forms collect (reference, offset, in-use/free) entries while objects
//! are written and emit them afterwards:
//! - [`XRefTable`]: the classic `xref` keyword followed by 20-byte records,
//!   then a separate `trailer` dictionary
//! - [`XRefStream`]: a `/Type /XRef` stream object (PDF 1.5+) with the trailer
//!   keys folded into its dictionary

use super::object_serializer::ObjectSerializer;
use super::pdf_writer::compress_data;
use crate::error::Result;
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::BTreeMap;
use std::io::Write;

/// Generation number recorded for the head of the free list (object 0).
pub const FREE_LIST_HEAD_GENERATION: u16 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    InUse(u64),
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    gen: u16,
    kind: EntryKind,
}

/// Interface the document writer uses to populate and emit a cross-reference
/// section, independent of its physical form.
pub trait XRef {
    /// Record an object written at `offset`.
    fn add_in_use(&mut self, reference: ObjectRef, offset: u64);

    /// Record a freed object number. `reference.gen` is the generation a
    /// future object with this number must use.
    fn add_free(&mut self, reference: ObjectRef);

    /// Value for the trailer's `Size`: highest object number plus one.
    fn size(&self) -> u32;

    /// Whether [`write`](Self::write) already carries the trailer keys, so no
    /// separate `trailer` dictionary is written.
    fn contains_trailer(&self) -> bool;

    /// Emit the section. `offset` is the position the section starts at.
    /// Forms that do not contain the trailer ignore `trailer`.
    fn write(&mut self, w: &mut dyn Write, offset: u64, trailer: &Dictionary) -> Result<()>;
}

/// Entries sorted by object number, shared by both forms.
#[derive(Debug, Clone, Default)]
struct Entries {
    map: BTreeMap<u32, Entry>,
}

impl Entries {
    fn add_in_use(&mut self, reference: ObjectRef, offset: u64) {
        self.map.insert(
            reference.id,
            Entry {
                gen: reference.gen,
                kind: EntryKind::InUse(offset),
            },
        );
    }

    fn add_free(&mut self, reference: ObjectRef) {
        // a number that is live again keeps its in-use entry
        if let Some(Entry {
            kind: EntryKind::InUse(_),
            ..
        }) = self.map.get(&reference.id)
        {
            return;
        }
        self.map.insert(
            reference.id,
            Entry {
                gen: reference.gen,
                kind: EntryKind::Free,
            },
        );
    }

    fn size(&self) -> u32 {
        self.map.keys().next_back().map_or(1, |id| id + 1)
    }

    /// Next free object number after `id`, wrapping to 0 at the end of the chain.
    fn next_free(&self, id: u32) -> u32 {
        self.map
            .range(id + 1..)
            .find(|(_, e)| e.kind == EntryKind::Free)
            .map_or(0, |(n, _)| *n)
    }

    /// Runs of consecutive object numbers as `(first, count)`.
    fn subsections(&self) -> Vec<(u32, u32)> {
        let mut sections: Vec<(u32, u32)> = Vec::new();
        for &id in self.map.keys() {
            match sections.last_mut() {
                Some((start, count)) if *start + *count == id => *count += 1,
                _ => sections.push((id, 1)),
            }
        }
        sections
    }
}

/// Classic cross-reference table.
#[derive(Debug, Clone)]
pub struct XRefTable {
    entries: Entries,
}

impl Default for XRefTable {
    fn default() -> Self {
        Self::new()
    }
}

impl XRefTable {
    /// A table whose free list starts at object 0, as every complete file needs.
    pub fn new() -> Self {
        let mut entries = Entries::default();
        entries.add_free(ObjectRef::new(0, FREE_LIST_HEAD_GENERATION));
        Self { entries }
    }

    /// A table for a partial section that lists only the objects added to it.
    pub fn section() -> Self {
        Self {
            entries: Entries::default(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.map.len()
    }

    /// Whether no entries were added.
    pub fn is_empty(&self) -> bool {
        self.entries.map.is_empty()
    }

    /// Write `xref`, the subsection headers and the entry records.
    ///
    /// Returns the number of bytes written before the first entry record.
    pub fn write_entries(&self, w: &mut dyn Write) -> std::io::Result<u64> {
        let mut written = 5;
        w.write_all(b"xref\n")?;

        let mut first_entry = None;
        for (start, count) in self.entries.subsections() {
            let header = format!("{} {}\n", start, count);
            w.write_all(header.as_bytes())?;
            written += header.len() as u64;
            first_entry.get_or_insert(written);

            for id in start..start + count {
                let entry = self.entries.map[&id];
                match entry.kind {
                    EntryKind::InUse(offset) => write!(w, "{:010} {:05} n \n", offset, entry.gen)?,
                    EntryKind::Free => {
                        write!(w, "{:010} {:05} f \n", self.entries.next_free(id), entry.gen)?
                    },
                }
                written += 20;
            }
        }

        Ok(first_entry.unwrap_or(written))
    }
}

impl XRef for XRefTable {
    fn add_in_use(&mut self, reference: ObjectRef, offset: u64) {
        self.entries.add_in_use(reference, offset);
    }

    fn add_free(&mut self, reference: ObjectRef) {
        self.entries.add_free(reference);
    }

    fn size(&self) -> u32 {
        self.entries.size()
    }

    fn contains_trailer(&self) -> bool {
        false
    }

    fn write(&mut self, w: &mut dyn Write, _offset: u64, _trailer: &Dictionary) -> Result<()> {
        self.write_entries(w)?;
        Ok(())
    }
}

/// Cross-reference stream.
///
/// The stream is itself an indirect object; its reference must be reserved
/// before writing starts so that `Size` accounts for it.
#[derive(Debug, Clone)]
pub struct XRefStream {
    entries: Entries,
    reference: ObjectRef,
    compress: bool,
}

impl XRefStream {
    /// Create a builder for the stream object `reference`.
    pub fn new(reference: ObjectRef, compress: bool) -> Self {
        let mut entries = Entries::default();
        entries.add_free(ObjectRef::new(0, FREE_LIST_HEAD_GENERATION));
        Self {
            entries,
            reference,
            compress,
        }
    }

    /// Minimum bytes needed to represent `value` (at least one).
    fn bytes_needed(value: u64) -> usize {
        if value == 0 {
            1
        } else {
            (value.ilog2() / 8 + 1) as usize
        }
    }

    /// Big-endian field of `width` bytes.
    fn write_field(data: &mut Vec<u8>, value: u64, width: usize) {
        for i in (0..width).rev() {
            data.push(((value >> (i * 8)) & 0xFF) as u8);
        }
    }

    /// Field widths `[type, field2, field3]`.
    fn widths(&self) -> [usize; 3] {
        let field2 = self
            .entries
            .map
            .iter()
            .map(|(&id, e)| match e.kind {
                EntryKind::InUse(offset) => offset,
                EntryKind::Free => self.entries.next_free(id) as u64,
            })
            .map(Self::bytes_needed)
            .max()
            .unwrap_or(1);
        [1, field2, 2]
    }

    fn encode_entries(&self, widths: [usize; 3]) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.entries.map.len() * widths.iter().sum::<usize>());
        for (&id, entry) in &self.entries.map {
            let (kind, field2) = match entry.kind {
                EntryKind::Free => (0, self.entries.next_free(id) as u64),
                EntryKind::InUse(offset) => (1, offset),
            };
            Self::write_field(&mut data, kind, widths[0]);
            Self::write_field(&mut data, field2, widths[1]);
            Self::write_field(&mut data, entry.gen as u64, widths[2]);
        }
        data
    }
}

impl XRef for XRefStream {
    fn add_in_use(&mut self, reference: ObjectRef, offset: u64) {
        self.entries.add_in_use(reference, offset);
    }

    fn add_free(&mut self, reference: ObjectRef) {
        self.entries.add_free(reference);
    }

    fn size(&self) -> u32 {
        self.entries.size().max(self.reference.id + 1)
    }

    fn contains_trailer(&self) -> bool {
        true
    }

    fn write(&mut self, w: &mut dyn Write, offset: u64, trailer: &Dictionary) -> Result<()> {
        self.entries.add_in_use(self.reference, offset);

        let widths = self.widths();
        let mut data = self.encode_entries(widths);

        let mut dict = trailer.clone();
        dict.insert("Type".to_string(), Object::name("XRef"));
        dict.insert("Size".to_string(), Object::Integer(self.size() as i64));
        dict.insert(
            "W".to_string(),
            Object::Array(widths.iter().map(|&w| Object::Integer(w as i64)).collect()),
        );
        dict.insert(
            "Index".to_string(),
            Object::Array(
                self.entries
                    .subsections()
                    .into_iter()
                    .flat_map(|(start, count)| {
                        [Object::Integer(start as i64), Object::Integer(count as i64)]
                    })
                    .collect(),
            ),
        );
        if self.compress {
            data = compress_data(&data)?;
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
        }

        let stream = Object::Stream {
            dict,
            data: bytes::Bytes::from(data),
        };
        ObjectSerializer::new().write_indirect(w, self.reference, &stream)?;
        Ok(())
    }
}
