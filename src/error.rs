//! Typed errors raised while loading a sales source.
//!
//! Everything that can go wrong before a table exists is a
//! [`SourceUnreadable`]; once a [`crate::derive::SalesTable`] has been built,
//! every downstream computation is total and has no error type at all.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A required column is absent from the source header.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Required column '{column}' not found in header")]
pub struct MissingRequiredColumn {
    pub column: String,
}

#[derive(Debug, Error)]
pub enum SourceUnreadable {
    #[error("Opening source {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Reading workbook {path:?}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Source {path:?} is empty")]
    Empty { path: PathBuf },

    #[error("Malformed content in {path:?} at row {row}")]
    Malformed {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to decode row {row} of {path:?} with encoding {encoding}")]
    Decode {
        path: PathBuf,
        row: usize,
        encoding: &'static str,
    },

    #[error("Source {path:?} is missing a required column")]
    MissingRequiredColumn {
        path: PathBuf,
        #[source]
        source: MissingRequiredColumn,
    },
}

impl SourceUnreadable {
    pub fn path(&self) -> &PathBuf {
        match self {
            SourceUnreadable::Io { path, .. }
            | SourceUnreadable::Workbook { path, .. }
            | SourceUnreadable::Empty { path }
            | SourceUnreadable::Malformed { path, .. }
            | SourceUnreadable::Decode { path, .. }
            | SourceUnreadable::MissingRequiredColumn { path, .. } => path,
        }
    }

    /// Name of the absent column when the failure is a schema mismatch.
    pub fn missing_column(&self) -> Option<&str> {
        match self {
            SourceUnreadable::MissingRequiredColumn { source, .. } => Some(&source.column),
            _ => None,
        }
    }
}
