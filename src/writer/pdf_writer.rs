//! PDF document writer.
//!
//! Serializes a [`Document`] with proper structure: header, body,
//! cross-reference section and trailer. Optionally compresses streams,
//! emits a cross-reference stream instead of a table, or linearizes the
//! file for Fast Web View.

use super::device::OutputDevice;
use super::linearization::{self, HintTables, LinearizationParams, LinearizedLayout};
use super::object_serializer::ObjectSerializer;
use super::trailer::{fill_trailer_object, serialize_with_prev};
use super::xref::{XRef, XRefStream, XRefTable};
use crate::document::Document;
use crate::error::{Error, Result, ResultExt};
use crate::object::{Dictionary, Object, ObjectRef};
use crate::store::{IndirectObject, ObjectStore};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

/// Bytes reserved up front by [`PdfWriter::write_to_vec`].
const INITIAL_BUFFER_CAPACITY: usize = 16 * 1024;

/// PDF version written to the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum PdfVersion {
    /// PDF 1.0
    V1_0,
    /// PDF 1.1
    V1_1,
    /// PDF 1.2
    V1_2,
    /// PDF 1.3
    V1_3,
    /// PDF 1.4
    V1_4,
    /// PDF 1.5, the first version with cross-reference streams
    V1_5,
    /// PDF 1.6
    V1_6,
    /// PDF 1.7
    #[default]
    V1_7,
}

impl PdfVersion {
    /// Minor version number.
    pub fn minor(self) -> u8 {
        match self {
            PdfVersion::V1_0 => 0,
            PdfVersion::V1_1 => 1,
            PdfVersion::V1_2 => 2,
            PdfVersion::V1_3 => 3,
            PdfVersion::V1_4 => 4,
            PdfVersion::V1_5 => 5,
            PdfVersion::V1_6 => 6,
            PdfVersion::V1_7 => 7,
        }
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1.{}", self.minor())
    }
}

/// Configuration for PDF output.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// PDF version for the header.
    pub version: PdfVersion,
    /// Whether to compress streams that have no filter yet.
    pub compress: bool,
    /// Write a cross-reference stream instead of a table.
    pub xref_stream: bool,
    /// Produce a linearized file.
    pub linearize: bool,
    /// `Location` entry hashed into the file identifier.
    pub location: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            version: PdfVersion::default(),
            compress: true,
            xref_stream: false,
            linearize: false,
            location: "pdf_assembly".to_string(),
        }
    }
}

impl WriterConfig {
    /// Set the header version.
    pub fn with_version(mut self, version: PdfVersion) -> Self {
        self.version = version;
        self
    }

    /// Enable or disable stream compression.
    ///
    /// When enabled, every stream without a `Filter` is compressed with
    /// FlateDecode (zlib/deflate) before it is written.
    pub fn with_compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Use a cross-reference stream (PDF 1.5+).
    pub fn with_xref_stream(mut self, xref_stream: bool) -> Self {
        self.xref_stream = xref_stream;
        self
    }

    /// Enable or disable linearization.
    pub fn with_linearize(mut self, linearize: bool) -> Self {
        self.linearize = linearize;
        self
    }

    /// Set the location string used for the file identifier.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

/// Compress data using Flate/Deflate compression.
///
/// Returns compressed bytes suitable for FlateDecode filter.
pub(crate) fn compress_data(data: &[u8]) -> std::io::Result<Vec<u8>> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Write the file header: version line plus a comment of high-bit bytes so
/// transfer tools treat the file as binary.
pub fn write_pdf_header<W: Write>(device: &mut OutputDevice<W>, version: PdfVersion) -> Result<()> {
    writeln!(device, "%PDF-{}", version)?;
    device.write_all(b"%\xE2\xE3\xCF\xD3\n")?;
    Ok(())
}

/// Write every stored object in storage order, recording each offset in
/// `xref`, then record the free object numbers.
pub fn write_pdf_objects<W: Write>(
    device: &mut OutputDevice<W>,
    objects: &ObjectStore,
    xref: &mut dyn XRef,
) -> Result<()> {
    let serializer = ObjectSerializer::new();
    for entry in objects.iter() {
        xref.add_in_use(entry.reference, device.position());
        serializer.write_indirect(device, entry.reference, &entry.object)?;
    }
    for &free in objects.free_objects() {
        xref.add_free(free);
    }
    log::debug!(
        "Wrote {} objects, {} free entries",
        objects.len(),
        objects.free_objects().len()
    );
    Ok(())
}

/// Write a standalone `trailer` dictionary, as used after a cross-reference table.
fn write_trailer<W: Write>(device: &mut OutputDevice<W>, trailer: &Dictionary) -> Result<()> {
    device.write_all(b"trailer\n")?;
    ObjectSerializer::new().write_object(device, &Object::Dictionary(trailer.clone()))?;
    device.write_all(b"\n")?;
    Ok(())
}

/// Writes a [`Document`] to an output.
///
/// Writing mutates the document: with compression enabled, unfiltered
/// streams are replaced by their compressed form, and linearization
/// reorders and renumbers every object.
pub struct PdfWriter<'a> {
    document: &'a mut Document,
    config: WriterConfig,
}

impl<'a> PdfWriter<'a> {
    /// Create a writer with default configuration.
    pub fn new(document: &'a mut Document) -> Self {
        Self::with_config(document, WriterConfig::default())
    }

    /// Create a writer with custom configuration.
    pub fn with_config(document: &'a mut Document, config: WriterConfig) -> Self {
        Self { document, config }
    }

    /// The active configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Write the document to `out` and hand it back.
    pub fn write<W: Write + Seek>(&mut self, out: W) -> Result<W> {
        let mut device = OutputDevice::new(out);

        if self.config.compress {
            self.compress_objects().context("compressing streams")?;
        }

        if self.config.linearize {
            self.write_linearized(&mut device)
                .context("writing linearized document")?;
        } else {
            self.write_plain(&mut device).context("writing document")?;
        }

        log::info!("Wrote PDF {} ({} bytes)", self.config.version, device.length());
        Ok(device.into_inner()?)
    }

    /// Write the document into a new byte buffer.
    pub fn write_to_vec(&mut self) -> Result<Vec<u8>> {
        let capacity = INITIAL_BUFFER_CAPACITY.max(self.document.objects().len() * 64);
        let mut buffer = Vec::new();
        buffer
            .try_reserve(capacity)
            .map_err(|_| Error::OutOfMemory(capacity))?;
        Ok(self.write(Cursor::new(buffer))?.into_inner())
    }

    /// Write the document to a file. The path becomes the identifier's
    /// `Location`.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.config.location = path.display().to_string();
        let file = File::create(path)?;
        self.write(BufWriter::new(file))?;
        Ok(())
    }

    fn compress_objects(&mut self) -> Result<()> {
        let mut compressed = 0;
        for (_, object) in self.document.objects_mut().iter_mut() {
            let Object::Stream { dict, data } = object else {
                continue;
            };
            if data.is_empty() || dict.contains_key("Filter") {
                continue;
            }
            *data = bytes::Bytes::from(compress_data(data)?);
            dict.insert("Filter".to_string(), Object::name("FlateDecode"));
            compressed += 1;
        }
        log::debug!("Compressed {} streams", compressed);
        Ok(())
    }

    fn write_plain<W: Write>(&mut self, device: &mut OutputDevice<W>) -> Result<()> {
        write_pdf_header(device, self.config.version)?;

        let objects = self.document.objects();
        let mut xref: Box<dyn XRef> = if self.config.xref_stream {
            if self.config.version < PdfVersion::V1_5 {
                log::warn!(
                    "Cross-reference streams need PDF 1.5, header says {}",
                    self.config.version
                );
            }
            let reference = ObjectRef::new(objects.next_object_number(), 0);
            Box::new(XRefStream::new(reference, self.config.compress))
        } else {
            Box::new(XRefTable::new())
        };

        write_pdf_objects(device, objects, xref.as_mut())?;

        let xref_offset = device.position();
        let trailer = fill_trailer_object(
            objects,
            self.document.trailer(),
            xref.size(),
            false,
            &self.config.location,
        )?;
        xref.write(device, xref_offset, &trailer)?;
        if !xref.contains_trailer() {
            write_trailer(device, &trailer)?;
        }
        write!(device, "startxref\n{}\n%%EOF\n", xref_offset)?;
        Ok(())
    }

    fn write_linearized<W: Write + Seek>(&mut self, device: &mut OutputDevice<W>) -> Result<()> {
        if self.config.xref_stream {
            log::warn!("Linearized output always uses a cross-reference table");
        }

        let catalog = self.document.catalog_ref()?;
        let (first_page, object_counts) = {
            let mut tree = self.document.page_tree()?;
            let first_page = tree.get_page(0).ok_or_else(|| {
                Error::InvalidPdf("linearization needs a resolvable first page".to_string())
            })?;
            let mut counts = Vec::with_capacity(tree.total_pages());
            for index in 0..tree.total_pages() {
                if let Some(page) = tree.get_page(index) {
                    let dependencies = tree.objects().dependencies(page.reference);
                    counts.push(1 + dependencies.len() as u32);
                }
            }
            (first_page, counts)
        };

        let (objects, trailer) = self.document.parts_mut();
        let hint_tables = HintTables::from_object_counts(&object_counts);
        let hint_stream = objects.create_object(hint_stream_object(&hint_tables));
        let num_pages = object_counts.len() as u32;
        let params_dict = objects.create_object(LinearizationParams::new(num_pages).to_object());

        let layout = linearization::reorder_objects_linearized(
            objects,
            trailer,
            catalog,
            &first_page,
            hint_stream,
            params_dict,
        )?;

        let result = write_linearized_layout(
            device,
            objects,
            trailer,
            &layout,
            hint_tables,
            num_pages,
            &self.config,
        );

        objects.take(layout.params_dict);
        objects.take(layout.hint_stream);
        result
    }
}

fn hint_stream_object(tables: &HintTables) -> Object {
    let mut dict = Dictionary::new();
    dict.insert("S".to_string(), Object::Integer(tables.shared_table_offset() as i64));
    Object::Stream {
        dict,
        data: bytes::Bytes::from(tables.to_bytes()),
    }
}

/// Emit a store already reordered by
/// [`reorder_objects_linearized`](linearization::reorder_objects_linearized),
/// then patch the placeholders.
fn write_linearized_layout<W: Write + Seek>(
    device: &mut OutputDevice<W>,
    objects: &ObjectStore,
    trailer: &Dictionary,
    layout: &LinearizedLayout,
    mut hint_tables: HintTables,
    num_pages: u32,
    config: &WriterConfig,
) -> Result<()> {
    let serializer = ObjectSerializer::new();
    let size = objects.len() as u32 + 1;

    write_pdf_header(device, config.version)?;

    let mut params = LinearizationParams::new(num_pages);
    params.first_page_object = layout.first_page.id;
    let params_offset = device.position();
    writeln!(device, "{} {} obj", layout.params_dict.id, layout.params_dict.gen)?;
    let params_body = device.position();
    device.write_all(&params.to_padded_bytes()?)?;
    device.write_all(b"\nendobj\n")?;

    let group: Vec<&IndirectObject> = objects.iter().skip(layout.first_page_start).collect();

    // offsets are not known yet; zero records of the same width stand in
    let mut first_section = XRefTable::section();
    for entry in &group {
        first_section.add_in_use(entry.reference, 0);
    }
    let first_xref_offset = device.position();
    first_section.write_entries(device)?;

    let first_trailer = fill_trailer_object(objects, trailer, size, false, &config.location)?;
    device.write_all(b"trailer\n")?;
    let first_trailer_offset = device.position();
    device.write_all(&serialize_with_prev(&first_trailer, 0)?)?;
    device.write_all(b"\nstartxref\n0\n%%EOF\n")?;

    first_section.add_in_use(layout.params_dict, params_offset);
    let mut hint_offset = 0;
    let mut first_page_offset = 0;
    for entry in &group {
        if entry.reference == layout.params_dict {
            continue;
        }
        let offset = device.position();
        first_section.add_in_use(entry.reference, offset);
        serializer.write_indirect(device, entry.reference, &entry.object)?;

        if entry.reference == layout.hint_stream {
            hint_offset = offset;
            params.hint_stream = [offset, device.position() - offset];
        } else if entry.reference == layout.first_page {
            first_page_offset = offset;
        }
    }
    params.end_of_first_page = device.position();

    let mut main_table = XRefTable::new();
    for entry in objects.iter().take(layout.first_page_start) {
        main_table.add_in_use(entry.reference, device.position());
        serializer.write_indirect(device, entry.reference, &entry.object)?;
    }

    let main_xref_offset = device.position();
    let first_entry = main_table.write_entries(device)?;
    let main_trailer = fill_trailer_object(objects, trailer, size, true, &config.location)?;
    write_trailer(device, &main_trailer)?;
    write!(device, "startxref\n{}\n%%EOF\n", first_xref_offset)?;

    params.file_length = device.length();
    params.main_xref_offset = main_xref_offset + first_entry - 1;
    log::debug!(
        "Linearized {} objects: first page ends at {}, main xref at {}",
        objects.len(),
        params.end_of_first_page,
        main_xref_offset
    );

    device.patch(params_body, &params.to_padded_bytes()?)?;

    let mut section = Vec::new();
    first_section.write_entries(&mut section)?;
    device.patch(first_xref_offset, &section)?;

    device.patch(
        first_trailer_offset,
        &serialize_with_prev(&first_trailer, main_xref_offset)?,
    )?;

    hint_tables.page_offset_header.min_object_num = layout.first_page.id;
    hint_tables.page_offset_header.first_page_location = first_page_offset;
    let hint_bytes =
        serializer.serialize_indirect(layout.hint_stream, &hint_stream_object(&hint_tables))?;
    device.patch(hint_offset, &hint_bytes)?;

    Ok(())
}
