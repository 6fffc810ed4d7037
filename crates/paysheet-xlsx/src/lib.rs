//! `.xlsx`/`.xlsm` import and export for paysheet workbooks.
//!
//! This crate intentionally operates at the ZIP/Open Packaging Convention
//! layer: a workbook is a ZIP of XML "parts". Reading extracts plain cell
//! tables from the parts the report needs; writing generates a fresh minimal
//! package (content types, relationships, shared strings, styles, one
//! worksheet part per sheet). There is no round-trip preservation; the
//! generator always produces new files.

mod archive;
mod read;
mod write;

pub use archive::{ArchiveError, WorkbookArchive};
pub use read::{read_from_bytes, read_from_path, ReadError, SourceSheet, SourceWorkbook};
pub use write::{write_to_file, write_to_vec, WriteError};
