mod csv;
mod json;
mod text;
mod traces;

use std::io::Write;

use crate::detection::DetectionRecord;
use crate::error::Result;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::text::TextFormatter;
pub use self::traces::write_traces;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Text,
}

pub trait Formatter: Send {
    fn format(&self, record: &DetectionRecord) -> String;

    fn header(&self) -> Option<&'static str> {
        None
    }
}

pub fn create_formatter(format: OutputFormat, verbose: bool) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Csv => Box::new(CsvFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Text => Box::new(TextFormatter::new(verbose)),
    }
}

/// Write the formatter's header (if any) and one line per record.
pub fn write_detections<W: Write>(
    writer: &mut W,
    formatter: &dyn Formatter,
    records: &[DetectionRecord],
) -> Result<()> {
    if let Some(header) = formatter.header() {
        writeln!(writer, "{}", header)?;
    }
    for record in records {
        writeln!(writer, "{}", formatter.format(record))?;
    }
    Ok(())
}
