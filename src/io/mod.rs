//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (import rows, listing output)
//! - `reader` - Streaming reader for recognition import files

pub mod csv_format;
pub mod reader;

pub use csv_format::{
    convert_csv_record, write_recognitions_csv, write_redemptions_csv, write_students_csv,
    CsvRecord,
};
pub use reader::RecognitionReader;
