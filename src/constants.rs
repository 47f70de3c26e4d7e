//! Numeric and format constants shared across the detection pipeline.

/// Smallest LTA average used as a divisor.
/// An all-zero stretch then produces a ratio of 0 instead of NaN.
pub const MIN_LTA_AVERAGE: f64 = f64::MIN_POSITIVE;

/// Characteristic function value emitted before the long window has filled.
pub const DEFAULT_WARMUP_FILL: f64 = 1.0;

/// Default edge pad is this many times the number of filter coefficients
/// (`2 * order + 1`) per side.
pub const PAD_LEN_FACTOR: usize = 3;

/// Filter warm-up never runs longer than this many times the trace length.
pub const SETTLE_LEN_CAP_FACTOR: usize = 10;

/// Timestamp layout used by catalogs and result tables (microsecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Timestamp layout accepted when parsing (any fractional precision).
pub const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
