//! PDF writing module.
//!
//! Serializes a [`Document`](crate::document::Document) to bytes.
//!
//! ## Architecture
//!
//! ```text
//! Document (object store + trailer)
//!     ↓
//! [PdfWriter] (compression, plain or linearized layout)
//!     ↓
//! [ObjectSerializer] (serializes PDF objects)    [XRef] (table or stream)
//!     ↓                                              ↓
//! [OutputDevice] (offset tracking, placeholder patching)
//!     ↓
//! PDF bytes
//! ```
//!
//! ## Example
//!
//! ```
//! use pdf_assembly::geometry::Rect;
//! use pdf_assembly::writer::{PdfWriter, WriterConfig};
//! use pdf_assembly::Document;
//!
//! # fn main() -> pdf_assembly::Result<()> {
//! let mut doc = Document::new();
//! doc.page_tree()?.create_page(&Rect::a4())?;
//!
//! let config = WriterConfig::default().with_linearize(true);
//! let bytes = PdfWriter::with_config(&mut doc, config).write_to_vec()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok(())
//! # }
//! ```

mod device;
pub mod linearization;
mod object_serializer;
mod pdf_writer;
pub mod trailer;
pub mod xref;

pub use device::OutputDevice;
pub use linearization::{
    HintTables, LinearizationParams, LinearizedLayout, PageOffsetEntry, PageOffsetHeader,
    SharedObjectHeader,
};
pub use object_serializer::ObjectSerializer;
pub use pdf_writer::{write_pdf_header, write_pdf_objects, PdfVersion, PdfWriter, WriterConfig};
pub use xref::{XRef, XRefStream, XRefTable};
