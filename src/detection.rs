use chrono::{NaiveDateTime, TimeDelta};
use std::ops::RangeInclusive;

use crate::catalog::format_timestamp;
use crate::error::{DetectError, Result};
use crate::signal_processing::TriggerWindow;

/// One detected event, summarized from a trigger window.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionRecord {
    /// Identifier of the trace the event came from, passed through unchanged
    pub source_id: String,
    /// Reference time plus the relative onset, to the microsecond
    pub absolute_onset_time: NaiveDateTime,
    /// Trace time of the onset sample in seconds
    pub relative_onset_time_seconds: f64,
    /// Trace time of the trigger-off sample in seconds
    pub relative_offset_time_seconds: f64,
    pub onset_index: usize,
    pub offset_index: usize,
    /// Largest filtered amplitude around the onset
    pub max_amplitude: f64,
    /// Smallest filtered amplitude around the onset
    pub min_amplitude: f64,
}

impl DetectionRecord {
    /// Absolute onset as ISO-8601 with microsecond precision.
    pub fn absolute_onset_iso(&self) -> String {
        format_timestamp(&self.absolute_onset_time)
    }
}

/// Sample range inspected for peak amplitudes around an onset.
///
/// Spans `sta_samples / 2` samples either side of `onset_index`, clamped to
/// `[0, len - 1]`. `len` must be non-zero.
pub fn extraction_range(onset_index: usize, sta_samples: usize, len: usize) -> RangeInclusive<usize> {
    let half = sta_samples / 2;
    let last = len.saturating_sub(1);
    let start = onset_index.saturating_sub(half).min(last);
    let end = onset_index.saturating_add(half).min(last);
    start..=end
}

/// Offset `reference_time` by `seconds`, rounded to the nearest microsecond.
///
/// # Errors
/// Returns `DetectError::InvalidInput` if `seconds` is not finite or the
/// result falls outside the representable date range.
pub fn offset_time(reference_time: NaiveDateTime, seconds: f64) -> Result<NaiveDateTime> {
    let micros = (seconds * 1e6).round();
    // `i64::MAX as f64` rounds up to 2^63, hence the strict bound.
    let delta = (micros.is_finite() && micros.abs() < i64::MAX as f64)
        .then(|| TimeDelta::microseconds(micros as i64));
    delta
        .and_then(|d| reference_time.checked_add_signed(d))
        .ok_or_else(|| {
            DetectError::InvalidInput(format!(
                "{} s from {} is outside the supported date range",
                seconds,
                format_timestamp(&reference_time)
            ))
        })
}

/// Check that every time in a strictly increasing `times` can be placed
/// relative to `reference_time`. Only the ends need checking.
pub fn validate_time_span(reference_time: NaiveDateTime, times: &[f64]) -> Result<()> {
    if let (Some(&first), Some(&last)) = (times.first(), times.last()) {
        offset_time(reference_time, first)?;
        offset_time(reference_time, last)?;
    }
    Ok(())
}

/// Turn trigger windows into detection records, one per window, in order.
///
/// `filtered` and `times` must share a length and every window must lie
/// inside it, which holds for windows produced by
/// [`crate::signal_processing::TriggerDetector`] over the same trace.
///
/// # Errors
/// `DetectError::InvalidInput` if an onset cannot be offset from
/// `reference_time`; [`validate_time_span`] rules this out beforehand.
pub fn extract_detections(
    filtered: &[f64],
    times: &[f64],
    windows: &[TriggerWindow],
    sta_samples: usize,
    reference_time: NaiveDateTime,
    source_id: &str,
) -> Result<Vec<DetectionRecord>> {
    windows
        .iter()
        .map(|window| {
            let range = extraction_range(window.onset_index, sta_samples, filtered.len());
            let span = &filtered[range];
            let max_amplitude = span.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let min_amplitude = span.iter().copied().fold(f64::INFINITY, f64::min);

            let relative_onset = times[window.onset_index];
            Ok(DetectionRecord {
                source_id: source_id.to_string(),
                absolute_onset_time: offset_time(reference_time, relative_onset)?,
                relative_onset_time_seconds: relative_onset,
                relative_offset_time_seconds: times[window.offset_index],
                onset_index: window.onset_index,
                offset_index: window.offset_index,
                max_amplitude,
                min_amplitude,
            })
        })
        .collect()
}
