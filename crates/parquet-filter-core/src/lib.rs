//! Concurrent CSV-to-Parquet conversion pipeline
//!
//! `parquet-filter-core` converts sets of delimiter-separated text files
//! into columnar Parquet files, filtering rows by a case-insensitive
//! pattern on the way through.
//!
//! # Key Components
//!
//! - **Schema**: flat column schema inferred from a file's first line,
//!   persisted between stages as a one-line message-text description
//! - **RowFilter**: lazy, order-preserving regex filter over a line source
//! - **RecordEncoder**: typed columnar encoding of split text records
//!   through [`parquet::arrow::ArrowWriter`]
//! - **FileConverter**: runs one file through infer → filter → encode,
//!   reporting the failing stage on error
//! - **ConversionOrchestrator**: fans tasks out over a bounded worker pool
//!   and collects one [`ConversionResult`] per input file
//!
//! # Design Notes
//!
//! Schema inference deliberately types every column as binary; the
//! encoder's full type dispatch is driven by declared schemas. An empty
//! field value is omitted from its record (readers see the column absent,
//! not empty). Worker tasks own disjoint path sets, so a run needs no
//! locking; per-file failures are collected, not propagated.

pub mod convert;
pub mod encode;
pub mod error;
pub mod filter;
pub mod orchestrate;
pub mod schema;
pub mod value;

pub use convert::{
    strip_extensions, ConversionOutcome, ConversionResult, ConversionStage, ConversionTask,
    FileConverter,
};
pub use encode::RecordEncoder;
pub use error::{ConvertError, Result};
pub use filter::RowFilter;
pub use orchestrate::{CancelToken, ConversionOrchestrator, ConversionSettings, RunSummary};
pub use schema::{ColumnDescriptor, ColumnType, Schema};
pub use value::ColumnValue;
