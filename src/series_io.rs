//! Reading and writing per-station sample files.
//!
//! CSV files need a header with a column starting with `time_rel` (seconds
//! since the catalog reference time) and one starting with `velocity`; any
//! other columns are ignored, and quoted fields are rejected. WAV files are read from the first channel, with
//! sample `i` placed at `i / sample_rate` seconds.

use chrono::NaiveDateTime;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::catalog::{column_index, format_timestamp, split_fields};
use crate::detection::offset_time;
use crate::error::{DetectError, Result};
use crate::series::TimeSeries;

/// Parse a sample table into a [`TimeSeries`].
pub fn parse_series_csv<R: BufRead>(reader: R) -> Result<TimeSeries> {
    let mut lines = reader.lines();
    let header_line = match lines.next() {
        Some(line) => line?,
        None => return Err(DetectError::Catalog("empty sample file".to_string())),
    };
    let header = split_fields(&header_line, 0)?;
    let time_col = column_index(&header, "time_rel")?;
    let value_col = column_index(&header, "velocity")?;

    let mut times = Vec::new();
    let mut amplitudes = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(&line, line_no + 1)?;
        let number = |col: usize| -> Result<f64> {
            let raw = fields.get(col).copied().unwrap_or("").trim();
            raw.parse().map_err(|_| {
                DetectError::Catalog(format!(
                    "row {}: invalid number {:?} in column {}",
                    line_no + 1,
                    raw,
                    col
                ))
            })
        };
        times.push(number(time_col)?);
        amplitudes.push(number(value_col)?);
    }

    TimeSeries::new(times, amplitudes)
}

/// Read the first channel of a WAV file.
pub fn load_wav(path: &Path) -> Result<TimeSeries> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| DetectError::Catalog(e.to_string()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .step_by(channels)
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<f64>, hound::Error>>(),
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f64;
            reader
                .samples::<i32>()
                .step_by(channels)
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<std::result::Result<Vec<f64>, hound::Error>>()
        }
    }
    .map_err(|e| DetectError::Catalog(e.to_string()))?;

    TimeSeries::from_uniform(samples, spec.sample_rate as f64, 0.0)
}

/// Load a sample file, choosing the reader from the extension (`.wav` or CSV).
pub fn load_series(path: &Path) -> Result<TimeSeries> {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    let series = if is_wav {
        load_wav(path)?
    } else {
        let file = std::fs::File::open(path)?;
        parse_series_csv(std::io::BufReader::new(file))?
    };

    log::debug!(
        "{}: {} samples at {:.4} Hz",
        path.display(),
        series.len(),
        series.sampling_rate()
    );
    Ok(series)
}

/// Write a series in the same layout the CSV reader accepts, with an absolute
/// time column derived from `reference_time`.
pub fn write_series_csv<W: Write>(
    writer: &mut W,
    series: &TimeSeries,
    reference_time: NaiveDateTime,
) -> Result<()> {
    writeln!(
        writer,
        "time_abs(%Y-%m-%dT%H:%M:%S.%f),time_rel(sec),velocity(m/s)"
    )?;
    for (&t, &v) in series.times().iter().zip(series.amplitudes()) {
        writeln!(
            writer,
            "{},{},{:e}",
            format_timestamp(&offset_time(reference_time, t)?),
            t,
            v
        )?;
    }
    Ok(())
}
