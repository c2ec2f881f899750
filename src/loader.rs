use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    error::{MissingRequiredColumn, SourceUnreadable},
    io_utils,
    schema::SalesColumns,
    workbook,
};

/// Untyped rows as read from the source, with the required columns verified
/// present in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    columns: SalesColumns,
}

impl RawTable {
    pub fn new(
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    ) -> Result<Self, MissingRequiredColumn> {
        let columns = SalesColumns::resolve(&headers)?;
        Ok(RawTable {
            headers,
            rows,
            columns,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn columns(&self) -> SalesColumns {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Loader {
    delimiter: Option<u8>,
    encoding: &'static Encoding,
}

impl Default for Loader {
    fn default() -> Self {
        Loader {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

impl Loader {
    pub fn new(delimiter: Option<u8>, encoding: &'static Encoding) -> Self {
        Loader {
            delimiter,
            encoding,
        }
    }

    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Reads the whole source or fails; a partially read table is never returned.
    ///
    /// Workbooks are read from their first sheet; everything else is
    /// delimited text.
    pub fn load(&self, path: &Path) -> Result<RawTable, SourceUnreadable> {
        if io_utils::is_spreadsheet(path) {
            return self.load_workbook(path);
        }
        let delimiter = io_utils::resolve_input_delimiter(path, self.delimiter);
        debug!(
            "Loading {:?} with delimiter '{}' and encoding {}",
            path,
            crate::printable_delimiter(delimiter),
            self.encoding.name()
        );
        let mut reader =
            io_utils::open_csv_reader_from_path(path, delimiter).map_err(|source| {
                SourceUnreadable::Io {
                    path: path.to_path_buf(),
                    source,
                }
            })?;

        let header_record = reader
            .byte_headers()
            .map_err(|source| self.malformed(path, 1, source))?
            .clone();
        if header_record.is_empty() {
            return Err(SourceUnreadable::Empty {
                path: path.to_path_buf(),
            });
        }
        let headers = self.decode(path, 1, &header_record)?;
        let columns = resolve_columns(path, &headers)?;

        let mut rows = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let row_number = idx + 2;
            let record = record.map_err(|source| self.malformed(path, row_number, source))?;
            rows.push(self.decode(path, row_number, &record)?);
        }

        info!(
            "Loaded {} row(s) across {} column(s) from {:?}",
            rows.len(),
            headers.len(),
            path
        );
        Ok(RawTable {
            headers,
            rows,
            columns,
        })
    }

    fn load_workbook(&self, path: &Path) -> Result<RawTable, SourceUnreadable> {
        debug!("Loading first sheet of workbook {path:?}");
        let mut sheet = workbook::read_first_sheet(path)
            .map_err(|err| match err {
                calamine::Error::Io(source) => SourceUnreadable::Io {
                    path: path.to_path_buf(),
                    source,
                },
                source => SourceUnreadable::Workbook {
                    path: path.to_path_buf(),
                    source,
                },
            })?
            .into_iter();
        let headers = match sheet.next() {
            Some(headers) if headers.iter().any(|h| !h.is_empty()) => headers,
            _ => {
                return Err(SourceUnreadable::Empty {
                    path: path.to_path_buf(),
                });
            }
        };
        let columns = resolve_columns(path, &headers)?;
        let rows = sheet.collect::<Vec<_>>();

        info!(
            "Loaded {} row(s) across {} column(s) from workbook {:?}",
            rows.len(),
            headers.len(),
            path
        );
        Ok(RawTable {
            headers,
            rows,
            columns,
        })
    }

    fn decode(
        &self,
        path: &Path,
        row: usize,
        record: &csv::ByteRecord,
    ) -> Result<Vec<String>, SourceUnreadable> {
        io_utils::decode_record(record, self.encoding).ok_or_else(|| SourceUnreadable::Decode {
            path: path.to_path_buf(),
            row,
            encoding: self.encoding.name(),
        })
    }

    fn malformed(&self, path: &Path, row: usize, source: csv::Error) -> SourceUnreadable {
        SourceUnreadable::Malformed {
            path: PathBuf::from(path),
            row,
            source,
        }
    }
}

fn resolve_columns(path: &Path, headers: &[String]) -> Result<SalesColumns, SourceUnreadable> {
    SalesColumns::resolve(headers).map_err(|source| SourceUnreadable::MissingRequiredColumn {
        path: path.to_path_buf(),
        source,
    })
}
