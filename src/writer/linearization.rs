//! PDF Linearization (Fast Web View) support.
//!
//! Linearized output places everything needed to display the first page at
//! the front of the file so a viewer can render it before the rest arrives.
//!
//! ## File layout
//!
//! 1. Header
//! 2. Linearization parameter dictionary
//! 3. First-page cross-reference section and trailer
//! 4. First-page objects: catalog, primary hint stream, first page and its
//!    dependencies
//! 5. Remaining objects
//! 6. Main cross-reference table and trailer
//!
//! Offsets that are only known once the whole file is written (`L`, `H`,
//! `E`, `T`, the first-page section and its `Prev`) are written first as
//! fixed-width zero-padded numbers, then overwritten in place.
//!
//! ## Standards Reference
//!
//! - PDF Reference 1.7: Annex F "Linearized PDF"
//! - ISO 32000-1:2008: Annex F

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::page::Page;
use crate::store::ObjectStore;
use std::collections::HashSet;

/// Width of every number that is patched after the first pass.
pub const PLACEHOLDER_WIDTH: usize = 10;

const PLACEHOLDER_MAX: u64 = 9_999_999_999;

/// Catalog entries added to the first-page group together with everything
/// they reference.
const CATALOG_DEPENDENCY_KEYS: [&str; 4] = ["ViewerPreferences", "PageMode", "OpenAction", "Encrypt"];

/// Catalog entries added to the first-page group on their own.
const CATALOG_BARE_KEYS: [&str; 2] = ["Threads", "AcroForm"];

/// Linearization parameter dictionary entries.
///
/// Per ISO 32000-1 Table F.1.
#[derive(Debug, Clone, Default)]
pub struct LinearizationParams {
    /// Total length of the file in bytes.
    pub file_length: u64,
    /// Offset and length of primary hint stream [offset, length].
    pub hint_stream: [u64; 2],
    /// Object number of first page's page object.
    pub first_page_object: u32,
    /// Offset of end of first page.
    pub end_of_first_page: u64,
    /// Number of pages in document.
    pub num_pages: u32,
    /// Offset of the white-space before the first entry of the main
    /// cross-reference table.
    pub main_xref_offset: u64,
}

impl LinearizationParams {
    /// Create a new linearization parameters structure.
    pub fn new(num_pages: u32) -> Self {
        Self {
            num_pages,
            ..Self::default()
        }
    }

    /// The dictionary as a PDF object, for storing in the object graph.
    pub fn to_object(&self) -> Object {
        Object::dict(vec![
            ("Linearized", Object::Integer(1)),
            ("L", Object::Integer(self.file_length as i64)),
            (
                "H",
                Object::Array(vec![
                    Object::Integer(self.hint_stream[0] as i64),
                    Object::Integer(self.hint_stream[1] as i64),
                ]),
            ),
            ("O", Object::Integer(self.first_page_object as i64)),
            ("E", Object::Integer(self.end_of_first_page as i64)),
            ("N", Object::Integer(self.num_pages as i64)),
            ("T", Object::Integer(self.main_xref_offset as i64)),
        ])
    }

    /// Serialize with every number zero-padded to [`PLACEHOLDER_WIDTH`], so
    /// the output length does not depend on the values.
    pub fn to_padded_bytes(&self) -> Result<Vec<u8>> {
        let values = [
            self.file_length,
            self.hint_stream[0],
            self.hint_stream[1],
            self.first_page_object as u64,
            self.end_of_first_page,
            self.num_pages as u64,
            self.main_xref_offset,
        ];
        if let Some(too_large) = values.iter().find(|&&v| v > PLACEHOLDER_MAX) {
            return Err(Error::Unsupported(format!(
                "linearization value {} does not fit in {} digits",
                too_large, PLACEHOLDER_WIDTH
            )));
        }

        Ok(format!(
            "<</Linearized 1/L {:010}/H [{:010} {:010}]/O {:010}/E {:010}/N {:010}/T {:010}>>",
            values[0], values[1], values[2], values[3], values[4], values[5], values[6]
        )
        .into_bytes())
    }
}

/// Page offset hint table entry per ISO 32000-1 Table F.4.
#[derive(Debug, Clone, Default)]
pub struct PageOffsetEntry {
    /// Number of objects in the page (delta from minimum).
    pub num_objects_delta: u32,
    /// Page length in bytes (delta from minimum).
    pub page_length_delta: u32,
    /// Number of shared objects referenced from this page.
    pub num_shared_objects: u32,
}

/// Page offset hint table header per ISO 32000-1 Table F.3.
#[derive(Debug, Clone, Default)]
pub struct PageOffsetHeader {
    /// Object number of the first page's page object.
    pub min_object_num: u32,
    /// Location of first page's page object.
    pub first_page_location: u64,
    /// Bits needed for page length delta.
    pub bits_page_length: u8,
    /// Minimum page length.
    pub min_page_length: u32,
    /// Bits needed for object count delta.
    pub bits_object_count: u8,
    /// Minimum object count per page.
    pub min_object_count: u32,
    /// Bits for shared object identifier.
    pub bits_shared_object_id: u8,
}

/// Shared object hint table header per ISO 32000-1 Table F.5.
#[derive(Debug, Clone, Default)]
pub struct SharedObjectHeader {
    /// Object number of first shared object.
    pub first_object_num: u32,
    /// Location of first shared object.
    pub first_object_location: u64,
    /// Number of shared object entries for first page.
    pub num_first_page_entries: u32,
    /// Number of shared object entries for remaining pages.
    pub num_remaining_entries: u32,
}

/// Primary hint stream contents.
#[derive(Debug, Clone, Default)]
pub struct HintTables {
    /// Page offset hint table header.
    pub page_offset_header: PageOffsetHeader,
    /// Page offset entries (one per page).
    pub page_offset_entries: Vec<PageOffsetEntry>,
    /// Shared object hint table header.
    pub shared_object_header: SharedObjectHeader,
}

impl HintTables {
    /// Create new empty hint tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Page offset table for a document whose pages need `object_counts`
    /// objects each. The first page's object number and location are set
    /// separately once known.
    pub fn from_object_counts(object_counts: &[u32]) -> Self {
        let (min, bits) = calculate_delta_encoding(object_counts);
        let mut tables = Self::new();
        tables.page_offset_header.min_object_count = min;
        tables.page_offset_header.bits_object_count = bits;
        tables.page_offset_entries = object_counts
            .iter()
            .map(|&count| PageOffsetEntry {
                num_objects_delta: count - min,
                ..Default::default()
            })
            .collect();
        tables
    }

    /// Serialize hint tables to bytes.
    ///
    /// The length depends only on the number of pages and the bit widths,
    /// never on offsets, so the stream can be rewritten in place.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.write_page_offset_table(&mut data);
        self.write_shared_object_table(&mut data);
        data
    }

    /// Byte offset of the shared object table inside [`to_bytes`](Self::to_bytes).
    pub fn shared_table_offset(&self) -> usize {
        let mut data = Vec::new();
        self.write_page_offset_table(&mut data);
        data.len()
    }

    fn write_page_offset_table(&self, data: &mut Vec<u8>) {
        let header = &self.page_offset_header;

        Self::write_u32(data, header.min_object_num);
        Self::write_u64(data, header.first_page_location);
        Self::write_u16(data, header.bits_page_length as u16);
        Self::write_u32(data, header.min_page_length);
        Self::write_u16(data, header.bits_object_count as u16);
        Self::write_u32(data, header.min_object_count);
        Self::write_u16(data, header.bits_shared_object_id as u16);

        let mut bit_writer = BitWriter::new();
        for entry in &self.page_offset_entries {
            bit_writer.write_bits(entry.num_objects_delta as u64, header.bits_object_count);
            bit_writer.write_bits(entry.page_length_delta as u64, header.bits_page_length);
            bit_writer.write_bits(entry.num_shared_objects as u64, header.bits_shared_object_id);
        }
        data.extend(bit_writer.finish());
    }

    fn write_shared_object_table(&self, data: &mut Vec<u8>) {
        let header = &self.shared_object_header;

        Self::write_u32(data, header.first_object_num);
        Self::write_u64(data, header.first_object_location);
        Self::write_u32(data, header.num_first_page_entries);
        Self::write_u32(data, header.num_remaining_entries);
    }

    fn write_u16(data: &mut Vec<u8>, value: u16) {
        data.extend(&value.to_be_bytes());
    }

    fn write_u32(data: &mut Vec<u8>, value: u32) {
        data.extend(&value.to_be_bytes());
    }

    fn write_u64(data: &mut Vec<u8>, value: u64) {
        data.extend(&value.to_be_bytes());
    }
}

/// Bit writer for encoding hint table entries.
struct BitWriter {
    buffer: Vec<u8>,
    current_byte: u8,
    bit_position: u8,
}

impl BitWriter {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            current_byte: 0,
            bit_position: 0,
        }
    }

    fn write_bits(&mut self, value: u64, num_bits: u8) {
        for i in (0..num_bits).rev() {
            let bit = ((value >> i) & 1) as u8;
            self.current_byte = (self.current_byte << 1) | bit;
            self.bit_position += 1;

            if self.bit_position == 8 {
                self.buffer.push(self.current_byte);
                self.current_byte = 0;
                self.bit_position = 0;
            }
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bit_position > 0 {
            self.current_byte <<= 8 - self.bit_position;
            self.buffer.push(self.current_byte);
        }
        self.buffer
    }
}

/// Calculate the number of bits needed to represent a value.
pub fn bits_needed(value: u32) -> u8 {
    if value == 0 {
        return 0;
    }
    32 - value.leading_zeros() as u8
}

/// Calculate minimum and bits needed for a set of values.
pub fn calculate_delta_encoding(values: &[u32]) -> (u32, u8) {
    let Some(&min) = values.iter().min() else {
        return (0, 0);
    };
    let max_delta = values.iter().map(|&v| v - min).max().unwrap_or(0);
    (min, bits_needed(max_delta))
}

/// Where the first-page group ended up after reordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearizedLayout {
    /// Storage index of the first group member; the group runs to the end.
    pub first_page_start: usize,
    /// The first page object, renumbered.
    pub first_page: ObjectRef,
    /// The catalog, renumbered.
    pub catalog: ObjectRef,
    /// The primary hint stream, renumbered.
    pub hint_stream: ObjectRef,
    /// The linearization parameter dictionary, renumbered.
    pub params_dict: ObjectRef,
}

/// Objects needed to show the first page, in discovery order.
///
/// That is the first page's dependency closure, the catalog, the page itself,
/// selected catalog entries, the page's ancestors, the hint stream and the
/// parameter dictionary. Ancestors are added without their dependencies,
/// which would otherwise pull in every page.
pub fn linearization_group(
    objects: &ObjectStore,
    catalog: ObjectRef,
    first_page: &Page,
    hint_stream: ObjectRef,
    params_dict: ObjectRef,
) -> Vec<ObjectRef> {
    let mut group = Vec::new();
    let mut seen = HashSet::new();
    let mut add = |r: ObjectRef| {
        if objects.contains(r) && seen.insert(r) {
            group.push(r);
        }
    };

    for dep in objects.dependencies(first_page.reference) {
        add(dep);
    }
    add(catalog);
    add(first_page.reference);

    if let Some(catalog_dict) = objects.get_dict(catalog) {
        for key in CATALOG_DEPENDENCY_KEYS {
            let Some(value) = catalog_dict.get(key) else {
                continue;
            };
            for r in value.references() {
                add(r);
                for dep in objects.dependencies(r) {
                    add(dep);
                }
            }
        }
        for key in CATALOG_BARE_KEYS {
            if let Some(r) = catalog_dict.get(key).and_then(Object::as_reference) {
                add(r);
            }
        }
    }

    for parent in &first_page.parents {
        add(*parent);
    }
    add(hint_stream);
    add(params_dict);

    group
}

/// Move the first-page group to the end of storage and renumber everything.
///
/// Walks storage backwards, swapping each group member into the next free
/// slot at the tail. Afterwards the group occupies
/// `first_page_start..objects.len()` and object numbers follow storage order,
/// so the group also holds the highest numbers.
pub fn reorder_objects_linearized(
    objects: &mut ObjectStore,
    trailer: &mut Dictionary,
    catalog: ObjectRef,
    first_page: &Page,
    hint_stream: ObjectRef,
    params_dict: ObjectRef,
) -> Result<LinearizedLayout> {
    let group = linearization_group(objects, catalog, first_page, hint_stream, params_dict);
    let members: HashSet<ObjectRef> = group.iter().copied().collect();

    let mut tail = objects.len();
    for i in (0..objects.len()).rev() {
        let is_member = objects
            .at(i)
            .is_some_and(|entry| members.contains(&entry.reference));
        if is_member {
            tail -= 1;
            objects.swap(i, tail);
        }
    }
    log::debug!(
        "Linearization group of {} objects starts at storage index {}",
        group.len(),
        tail
    );

    let mapping = objects.renumber(trailer);
    let remap = |r: ObjectRef| {
        mapping
            .get(&r)
            .copied()
            .ok_or(Error::ObjectNotFound(r.id, r.gen))
    };

    Ok(LinearizedLayout {
        first_page_start: tail,
        first_page: remap(first_page.reference)?,
        catalog: remap(catalog)?,
        hint_stream: remap(hint_stream)?,
        params_dict: remap(params_dict)?,
    })
}
