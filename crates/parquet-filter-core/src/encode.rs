//! Streaming columnar record encoding.
//!
//! [`RecordEncoder`] turns delimiter-split text records into typed columns
//! and writes them through [`parquet::arrow::ArrowWriter`]. Values accumulate
//! in per-column Arrow builders and are flushed batch-wise; there is no
//! intermediate row buffer.

use std::io::Write;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use arrow_array::builder::{
    BinaryBuilder, BooleanBuilder, Float32Builder, Float64Builder, Int32Builder, Int64Builder,
};
use arrow_array::ArrayRef;
use arrow_schema::{DataType, Field};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::{ColumnType, ColumnValue, ConvertError, Result, Schema};

const DEFAULT_BATCH_SIZE: usize = 1024;

enum ColumnBuilder {
    Boolean(BooleanBuilder),
    Float(Float32Builder),
    Double(Float64Builder),
    Int32(Int32Builder),
    Int64(Int64Builder),
    Binary(BinaryBuilder),
}

impl ColumnBuilder {
    fn for_type(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Boolean => ColumnBuilder::Boolean(BooleanBuilder::new()),
            ColumnType::Float => ColumnBuilder::Float(Float32Builder::new()),
            ColumnType::Double => ColumnBuilder::Double(Float64Builder::new()),
            ColumnType::Int32 => ColumnBuilder::Int32(Int32Builder::new()),
            ColumnType::Int64 => ColumnBuilder::Int64(Int64Builder::new()),
            ColumnType::Binary => ColumnBuilder::Binary(BinaryBuilder::new()),
        }
    }

    fn append_null(&mut self) {
        match self {
            ColumnBuilder::Boolean(b) => b.append_null(),
            ColumnBuilder::Float(b) => b.append_null(),
            ColumnBuilder::Double(b) => b.append_null(),
            ColumnBuilder::Int32(b) => b.append_null(),
            ColumnBuilder::Int64(b) => b.append_null(),
            ColumnBuilder::Binary(b) => b.append_null(),
        }
    }

    fn append(&mut self, value: ColumnValue) -> Result<()> {
        match (self, value) {
            (ColumnBuilder::Boolean(b), ColumnValue::Boolean(v)) => b.append_value(v),
            (ColumnBuilder::Float(b), ColumnValue::Float(v)) => b.append_value(v),
            (ColumnBuilder::Double(b), ColumnValue::Double(v)) => b.append_value(v),
            (ColumnBuilder::Int32(b), ColumnValue::Int32(v)) => b.append_value(v),
            (ColumnBuilder::Int64(b), ColumnValue::Int64(v)) => b.append_value(v),
            (ColumnBuilder::Binary(b), ColumnValue::Binary(v)) => b.append_value(&v),
            (_, value) => {
                return Err(ConvertError::encoding(format!(
                    "{} value does not match its column builder",
                    value.type_name()
                )))
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Boolean(b) => Arc::new(b.finish()),
            ColumnBuilder::Float(b) => Arc::new(b.finish()),
            ColumnBuilder::Double(b) => Arc::new(b.finish()),
            ColumnBuilder::Int32(b) => Arc::new(b.finish()),
            ColumnBuilder::Int64(b) => Arc::new(b.finish()),
            ColumnBuilder::Binary(b) => Arc::new(b.finish()),
        }
    }
}

/// Columnar record encoder for one output file
pub struct RecordEncoder<W: Write + Send> {
    schema: Schema,
    arrow_schema: Arc<arrow_schema::Schema>,
    builders: Vec<ColumnBuilder>,
    writer: ArrowWriter<W>,
    pending_rows: usize,
    total_rows: u64,
    batch_size: usize,
}

impl<W: Write + Send> RecordEncoder<W> {
    /// Create an encoder writing records under `schema` into `sink`
    pub fn new(sink: W, schema: Schema) -> Result<Self> {
        Self::with_batch_size(sink, schema, DEFAULT_BATCH_SIZE)
    }

    /// Create an encoder with a custom flush threshold
    pub fn with_batch_size(sink: W, schema: Schema, batch_size: usize) -> Result<Self> {
        let arrow_schema = Arc::new(schema_to_arrow(&schema));
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(sink, arrow_schema.clone(), Some(props))?;
        let builders = schema
            .columns()
            .iter()
            .map(|c| ColumnBuilder::for_type(c.column_type))
            .collect();
        Ok(RecordEncoder {
            schema,
            arrow_schema,
            builders,
            writer,
            pending_rows: 0,
            total_rows: 0,
            batch_size: batch_size.max(1),
        })
    }

    /// Encode one record of delimiter-split field values.
    ///
    /// The record length must equal the schema's column count; a violation is
    /// a caller bug and fails with an encoding error. A zero-length field
    /// value is omitted from the record: the column gets a null slot rather
    /// than an empty or zero value, so downstream readers see it absent.
    ///
    /// After an error the encoder is left mid-record and must be dropped.
    pub fn write_record(&mut self, fields: &[&str]) -> Result<()> {
        if fields.len() != self.schema.len() {
            return Err(ConvertError::encoding(format!(
                "record has {} fields but schema has {} columns",
                fields.len(),
                self.schema.len()
            )));
        }
        for ((column, builder), text) in self
            .schema
            .columns()
            .iter()
            .zip(self.builders.iter_mut())
            .zip(fields)
        {
            if text.is_empty() {
                builder.append_null();
                continue;
            }
            let value = match ColumnValue::parse(column.column_type, text) {
                Ok(value) => value,
                Err(ConvertError::Encoding(msg)) => {
                    return Err(ConvertError::encoding(format!(
                        "column `{}` (position {}): {msg}",
                        column.name,
                        column.position + 1
                    )))
                }
                Err(other) => return Err(other),
            };
            builder.append(value)?;
        }
        self.pending_rows += 1;
        self.total_rows += 1;
        if self.pending_rows >= self.batch_size {
            self.flush_batch()?;
        }
        Ok(())
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.pending_rows == 0 {
            return Ok(());
        }
        let columns: Vec<ArrayRef> = self.builders.iter_mut().map(|b| b.finish()).collect();
        let batch = RecordBatch::try_new(self.arrow_schema.clone(), columns)?;
        self.writer.write(&batch)?;
        self.pending_rows = 0;
        Ok(())
    }

    /// Flush remaining rows, write the file footer, and return the number of
    /// records encoded. Must be called to finalize the output.
    pub fn close(mut self) -> Result<u64> {
        self.flush_batch()?;
        self.writer.close()?;
        Ok(self.total_rows)
    }
}

/// Map the flat schema onto Arrow fields.
///
/// Every field is nullable at the Arrow level regardless of the descriptor's
/// `required` flag: a null slot is the columnar representation of a field
/// omitted from its record.
fn schema_to_arrow(schema: &Schema) -> arrow_schema::Schema {
    let fields: Vec<Field> = schema
        .columns()
        .iter()
        .map(|c| Field::new(&c.name, column_type_to_arrow(c.column_type), true))
        .collect();
    arrow_schema::Schema::new(fields)
}

fn column_type_to_arrow(column_type: ColumnType) -> DataType {
    match column_type {
        ColumnType::Boolean => DataType::Boolean,
        ColumnType::Float => DataType::Float32,
        ColumnType::Double => DataType::Float64,
        ColumnType::Int32 => DataType::Int32,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Binary => DataType::Binary,
    }
}
