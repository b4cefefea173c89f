use log::info;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A type that can be written as one row of a CSV trace.
pub trait CsvRow {
    /// Column names, comma separated, no trailing newline.
    const CSV_HEADER: &'static str;

    /// Only write the fields and commas. Do NOT write the newline.
    fn format_payload<W: core::fmt::Write>(&self, cursor: &mut W) -> core::fmt::Result;

    fn to_row(&self) -> String {
        let mut row = String::new();
        // Writing into a String cannot fail.
        let _ = self.format_payload(&mut row);
        row
    }
}

/// Builds the rows of a trace: header first, then one row per record in order.
pub fn trace_rows<T: CsvRow>(records: &[T]) -> Vec<String> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(T::CSV_HEADER.to_string());
    rows.extend(records.iter().map(CsvRow::to_row));
    rows
}

/// Destination of the recorded ascent trace.
pub trait TraceSink {
    /// Persists `rows` in order. The first row is the header.
    fn write_rows(&mut self, rows: &[String]) -> std::io::Result<()>;
}

/// Writes the trace as a flat CSV file, replacing any previous file.
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TraceSink for CsvFileSink {
    fn write_rows(&mut self, rows: &[String]) -> std::io::Result<()> {
        info!("Writing telemetry report to {}...", self.path.display());
        let mut writer = BufWriter::new(File::create(&self.path)?);
        for row in rows {
            writer.write_all(row.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!("Done! {} rows written", rows.len());
        Ok(())
    }
}

/// Appends `value` with a fixed number of decimals, the way every float
/// column of the trace is rendered.
pub(crate) fn write_fixed<W: core::fmt::Write>(
    cursor: &mut W,
    value: f64,
    decimals: usize,
) -> core::fmt::Result {
    write!(cursor, "{:.*}", decimals, value)
}
