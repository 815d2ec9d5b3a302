//! Streaming reader for recognition import files
//!
//! Provides an iterator over recognition requests from a CSV file with the
//! columns `sender,receiver,amount,message`. Format concerns are delegated to
//! the csv_format module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `Err` items, with the line number,
//!   so one bad row does not abort an import

use std::fs::File;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::RecognitionRequest;

/// Iterator over the rows of a recognition import file
#[derive(Debug)]
pub struct RecognitionReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl RecognitionReader {
    /// Open an import file
    ///
    /// The CSV reader trims whitespace from all fields and accepts rows
    /// without the trailing message column.
    ///
    /// # Errors
    ///
    /// Returns a message naming the path if the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, String> {
        let file = File::open(path)
            .map_err(|e| format!("Failed to open file '{}': {}", path.display(), e))?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for RecognitionReader {
    type Item = Result<RecognitionRequest, String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|e| format!("Line {}: {}", self.line_num, e))
            }
            Err(e) => Err(format!("Line {}: CSV parse error: {}", self.line_num, e)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_missing_file() {
        let err = RecognitionReader::new(Path::new("does-not-exist.csv")).unwrap_err();
        assert!(err.contains("Failed to open file"));
    }

    #[test]
    fn test_reads_rows_in_order() {
        let file = create_temp_csv(
            "sender,receiver,amount,message\n\
             1,2,10,great demo\n\
             2,1,5,\n\
             1,3,20,\"thanks, again\"\n",
        );

        let requests: Vec<_> = RecognitionReader::new(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(
            requests,
            vec![
                RecognitionRequest {
                    sender_id: 1,
                    receiver_id: 2,
                    amount: 10,
                    message: Some("great demo".to_string()),
                },
                RecognitionRequest {
                    sender_id: 2,
                    receiver_id: 1,
                    amount: 5,
                    message: None,
                },
                RecognitionRequest {
                    sender_id: 1,
                    receiver_id: 3,
                    amount: 20,
                    message: Some("thanks, again".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_message_column_is_optional() {
        let file = create_temp_csv("sender,receiver,amount\n 4 , 5 , 7 \n");

        let requests: Vec<_> = RecognitionReader::new(file.path()).unwrap().collect();
        assert_eq!(requests.len(), 1);
        let request = requests[0].as_ref().unwrap();
        assert_eq!((request.sender_id, request.receiver_id, request.amount), (4, 5, 7));
        assert_eq!(request.message, None);
    }

    #[test]
    fn test_bad_rows_report_line_and_continue() {
        let file = create_temp_csv(
            "sender,receiver,amount,message\n\
             1,2,abc,\n\
             x,2,5,\n\
             1,2,5,ok\n",
        );

        let rows: Vec<_> = RecognitionReader::new(file.path()).unwrap().collect();
        assert_eq!(rows.len(), 3);

        let first = rows[0].as_ref().unwrap_err();
        assert!(first.starts_with("Line 2:"));
        assert!(first.contains("Invalid amount"));

        let second = rows[1].as_ref().unwrap_err();
        assert!(second.starts_with("Line 3: CSV parse error"));

        assert_eq!(rows[2].as_ref().unwrap().amount, 5);
    }
}
