use crate::base::*;
use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::compute::{cast, concat_batches, take};
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use flate2::read::MultiGzDecoder;
use function_name::named;
use log::{debug, info};
use ndarray::prelude::*;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const KEY_COLUMNS: [&str; 4] = [
    "chromosome",
    "base_pair_location",
    "effect_allele",
    "other_allele",
];
pub const VALUE_COLUMNS: [&str; 3] = ["beta", "se", "effect_allele_frequency"];
const TEXT_COLUMNS: [&str; 3] = ["chromosome", "effect_allele", "other_allele"];

/// Number of rows used to infer the column types of delimited text files
const INFER_SCHEMA_ROWS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Parquet,
    Delimited(u8),
}

fn table_format(filename: &str) -> TableFormat {
    let lower = filename.to_ascii_lowercase();
    let stem = lower.strip_suffix(".gz").unwrap_or(&lower);
    if stem.contains(".parquet") {
        TableFormat::Parquet
    } else if stem.ends_with(".csv") {
        TableFormat::Delimited(b',')
    } else {
        TableFormat::Delimited(b'\t')
    }
}

fn open_text(filename: &str) -> Result<Box<dyn Read>> {
    let file = File::open(filename)?;
    if filename.to_ascii_lowercase().ends_with(".gz") {
        Ok(Box::new(MultiGzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn read_parquet(filename: &str) -> Result<RecordBatch> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(filename)?)?;
    let schema = builder.schema().clone();
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

fn read_delimited(filename: &str, delimiter: u8) -> Result<RecordBatch> {
    let format = Format::default()
        .with_header(true)
        .with_delimiter(delimiter);
    let (inferred, _) = format.infer_schema(open_text(filename)?, Some(INFER_SCHEMA_ROWS))?;
    // sorted files may only reach chromosome X (or non-numeric alleles) after the inference window
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| {
            if TEXT_COLUMNS.contains(&field.name().as_str()) {
                Field::new(field.name(), DataType::Utf8, true)
            } else {
                field.as_ref().clone()
            }
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let batches = arrow::csv::ReaderBuilder::new(schema.clone())
        .with_format(format)
        .build(open_text(filename)?)?
        .collect::<std::result::Result<Vec<RecordBatch>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Required column cast into `data_type`, rejecting nulls (including values which failed to cast)
#[named]
fn required_column(batch: &RecordBatch, name: &str, data_type: &DataType) -> Result<ArrayRef> {
    let idx = batch.schema().index_of(name).map_err(|_| {
        RatioError::InvalidInput(format!(
            "{}: missing required column '{}'",
            function_name!(),
            name
        ))
    })?;
    let column = cast(batch.column(idx), data_type)?;
    if column.null_count() > 0 {
        return Err(RatioError::InvalidInput(format!(
            "{}: {} missing or unparsable values in column '{}'",
            function_name!(),
            column.null_count(),
            name
        )));
    }
    Ok(column)
}

fn string_column(batch: &RecordBatch, name: &str) -> Result<Vec<String>> {
    let column = required_column(batch, name, &DataType::Utf8)?;
    let values = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| RatioError::InvalidInput(format!("column '{}' is not text", name)))?;
    Ok(values.iter().map(|x| x.unwrap_or("").to_owned()).collect())
}

fn u64_column(batch: &RecordBatch, name: &str) -> Result<Vec<u64>> {
    let column = required_column(batch, name, &DataType::UInt64)?;
    let values = column
        .as_any()
        .downcast_ref::<UInt64Array>()
        .ok_or_else(|| RatioError::InvalidInput(format!("column '{}' is not an integer", name)))?;
    Ok(values.values().iter().copied().collect())
}

fn f64_column(batch: &RecordBatch, name: &str) -> Result<Array1<f64>> {
    let column = required_column(batch, name, &DataType::Float64)?;
    let values = column
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| RatioError::InvalidInput(format!("column '{}' is not numeric", name)))?;
    Ok(values.values().iter().copied().collect())
}

/// Split a table into the summary statistics and the columns to pass through
/// Index columns written by pandas (`__index_level_*`) are dropped.
pub fn record_batch_to_sumstats(batch: &RecordBatch) -> Result<LoadedSumStats> {
    let sumstats = SumStats {
        chromosome: string_column(batch, "chromosome")?,
        base_pair_location: u64_column(batch, "base_pair_location")?,
        effect_allele: string_column(batch, "effect_allele")?,
        other_allele: string_column(batch, "other_allele")?,
        beta: f64_column(batch, "beta")?,
        se: f64_column(batch, "se")?,
        effect_allele_frequency: f64_column(batch, "effect_allele_frequency")?,
    };
    let mut passthrough = Passthrough::default();
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        let name = field.name();
        if KEY_COLUMNS.contains(&name.as_str())
            || VALUE_COLUMNS.contains(&name.as_str())
            || name.starts_with("__index_level_")
        {
            continue;
        }
        passthrough.names.push(name.clone());
        passthrough.columns.push(column.clone());
    }
    Ok(LoadedSumStats {
        sumstats,
        passthrough,
    })
}

impl Parse<LoadedSumStats> for FileSumStats {
    fn lparse(&self) -> Result<LoadedSumStats> {
        let batch = match table_format(&self.filename) {
            TableFormat::Parquet => read_parquet(&self.filename)?,
            TableFormat::Delimited(delimiter) => read_delimited(&self.filename, delimiter)?,
        };
        let loaded = record_batch_to_sumstats(&batch)?;
        loaded.sumstats.check()?;
        info!(
            "Loaded {} variants from {} ({} extra columns)",
            loaded.sumstats.len(),
            self.filename,
            loaded.passthrough.names.len()
        );
        Ok(loaded)
    }
}

const DERIVED_COLUMNS: [&str; 7] = ["maf", "z_1", "z_2", "se", "beta", "z", "p_value"];

/// Output names of the passthrough columns following pandas merge suffixes:
/// only names present in both tables get `_1` / `_2`, and names taken by the
/// ratio statistics (e.g. an input `z` becoming `z_1`) are dropped as they are recomputed
fn passthrough_names(
    passthrough_1: &Passthrough,
    passthrough_2: &Passthrough,
) -> (Vec<Option<String>>, Vec<Option<String>>) {
    let names_1: HashSet<&String> = passthrough_1.names.iter().collect();
    let names_2: HashSet<&String> = passthrough_2.names.iter().collect();
    let rename = |name: &String, other: &HashSet<&String>, suffix: &str| {
        let renamed = if other.contains(name) {
            format!("{}{}", name, suffix)
        } else {
            name.clone()
        };
        if DERIVED_COLUMNS.contains(&renamed.as_str()) {
            None
        } else {
            Some(renamed)
        }
    };
    (
        passthrough_1.names.iter().map(|x| rename(x, &names_2, "_1")).collect(),
        passthrough_2.names.iter().map(|x| rename(x, &names_1, "_2")).collect(),
    )
}

fn rows_to_indices(rows: &[usize]) -> Result<UInt32Array> {
    rows.iter()
        .map(|&i| {
            u32::try_from(i).map_err(|_| {
                RatioError::InvalidInput(format!("row index {} exceeds the supported table size", i))
            })
        })
        .collect::<Result<Vec<u32>>>()
        .map(UInt32Array::from)
}

fn f64_array(x: &Array1<f64>) -> ArrayRef {
    Arc::new(Float64Array::from(x.to_vec()))
}

impl RatioSumStats {
    /// Output table: join keys, numerator columns (`_1`), denominator columns (`_2`), then the ratio statistics
    pub fn to_record_batch(
        &self,
        passthrough_1: &Passthrough,
        passthrough_2: &Passthrough,
    ) -> Result<RecordBatch> {
        let merged = &self.merged;
        let mut fields: Vec<Field> = vec![
            Field::new("chromosome", DataType::Utf8, false),
            Field::new("base_pair_location", DataType::UInt64, false),
            Field::new("effect_allele", DataType::Utf8, false),
            Field::new("other_allele", DataType::Utf8, false),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from(merged.chromosome.clone())),
            Arc::new(UInt64Array::from(merged.base_pair_location.clone())),
            Arc::new(StringArray::from(merged.effect_allele.clone())),
            Arc::new(StringArray::from(merged.other_allele.clone())),
        ];
        let (names_1, names_2) = passthrough_names(passthrough_1, passthrough_2);
        let sides = [
            (
                "_1",
                &merged.row_1,
                passthrough_1,
                names_1,
                [&merged.beta_1, &merged.se_1, &merged.effect_allele_frequency_1],
            ),
            (
                "_2",
                &merged.row_2,
                passthrough_2,
                names_2,
                [&merged.beta_2, &merged.se_2, &merged.effect_allele_frequency_2],
            ),
        ];
        for (suffix, rows, passthrough, names, values) in sides {
            for (name, value) in VALUE_COLUMNS.iter().zip(values) {
                fields.push(Field::new(format!("{}{}", name, suffix), DataType::Float64, false));
                columns.push(f64_array(value));
            }
            let indices = rows_to_indices(rows)?;
            for (name, column) in names.into_iter().zip(&passthrough.columns) {
                let Some(name) = name else { continue };
                fields.push(Field::new(name, column.data_type().clone(), true));
                columns.push(take(column.as_ref(), &indices, None)?);
            }
        }
        let derived = [
            &self.maf,
            &self.z_1,
            &self.z_2,
            &self.se,
            &self.beta,
            &self.z,
            &self.p_value,
        ];
        for (name, value) in DERIVED_COLUMNS.iter().zip(derived) {
            fields.push(Field::new(*name, DataType::Float64, false));
            columns.push(f64_array(value));
        }
        Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
    }
}

impl SaveTable for RatioSumStats {
    fn write_table(
        &self,
        passthrough_1: &Passthrough,
        passthrough_2: &Passthrough,
        out: &String,
    ) -> Result<String> {
        let batch = self.to_record_batch(passthrough_1, passthrough_2)?;
        // written next to the output and renamed once complete, so failures leave no partial table
        let dir = match Path::new(out).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        match table_format(out) {
            TableFormat::Parquet => {
                let props = WriterProperties::builder()
                    .set_compression(Compression::SNAPPY)
                    .build();
                let mut writer =
                    ArrowWriter::try_new(tmp.as_file_mut(), batch.schema(), Some(props))?;
                writer.write(&batch)?;
                writer.close()?;
            }
            TableFormat::Delimited(delimiter) => {
                let mut writer = arrow::csv::WriterBuilder::new()
                    .with_header(true)
                    .with_delimiter(delimiter)
                    .build(tmp.as_file_mut());
                writer.write(&batch)?;
            }
        }
        tmp.persist(out).map_err(|e| e.error)?;
        debug!("Wrote {} rows to {}", batch.num_rows(), out);
        Ok(out.to_owned())
    }
}
