// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::should_implement_trait)]

//! # PDF Assembly
//!
//! In-memory PDF object graphs: page tree navigation and editing, and
//! serialization with cross-reference tables or streams, file identifiers
//! and optional linearization.
//!
//! ## Core Features
//!
//! - **Page Tree Index**: resolve a zero-based page index through nested
//!   `Pages` nodes, with a per-index cache, cycle detection and tolerance for
//!   malformed `Kids` arrays
//! - **Page Editing**: insert, create and delete pages while keeping every
//!   ancestor's `Count` consistent
//! - **Document Writer**: header, body, cross-reference table or stream,
//!   trailer with a fresh MD5 file identifier
//! - **Linearization**: first-page objects reordered to the front with a
//!   hint stream and patched parameter dictionary (ISO 32000-1 Annex F)
//!
//! ## Quick Start
//!
//! ```
//! use pdf_assembly::{Document, Rect, WriterConfig};
//!
//! # fn main() -> pdf_assembly::Result<()> {
//! let mut doc = Document::new();
//! {
//!     let mut tree = doc.page_tree()?;
//!     tree.create_page(&Rect::letter())?;
//!     tree.create_page(&Rect::a4())?;
//!     assert_eq!(tree.total_pages(), 2);
//! }
//!
//! let bytes = doc.write_to_vec(WriterConfig::default())?;
//! assert!(bytes.ends_with(b"%%EOF\n"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

// Error handling
pub mod error;

// Object model
pub mod object;
pub mod store;

// Pages
pub mod geometry;
pub mod page;
pub mod page_tree;

// Document and output
pub mod document;
pub mod writer;

pub use document::Document;
pub use error::{Error, ErrorKind, Result};
pub use geometry::Rect;
pub use object::{Dictionary, Object, ObjectRef};
pub use page::Page;
pub use page_tree::{PageTree, INSERT_BEFORE_FIRST_PAGE};
pub use store::{IndirectObject, ObjectStore};
pub use writer::{PdfVersion, PdfWriter, WriterConfig};
