//! Configuration for the quaketrigger detection pipeline.
//!
//! All tunables live in [`DetectionConfig`] and are passed explicitly into
//! [`crate::pipeline::DetectionPipeline`]. Defaults reproduce the lunar
//! catalog run: a 0.8-2.0 Hz band, 120 s STA, 600 s LTA, trigger on at 4.8
//! and off at 1.5.
//!
//! Configuration can also be read from TOML:
//!
//! ```toml
//! [filter]
//! low_cutoff_hz = 0.5
//! high_cutoff_hz = 1.0
//!
//! [trigger]
//! sta = "60s"
//! lta = "3000smp"
//! threshold_on = 4.0
//! threshold_off = 1.5
//! ```

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::constants::{DEFAULT_WARMUP_FILL, PAD_LEN_FACTOR};
use crate::error::{DetectError, Result};

/// STA or LTA window length
///
/// Can be given either as a duration in seconds or directly as a sample count.
///
/// # Parsing formats
/// - `120` or `120s` - duration in seconds
/// - `750smp` or `750samples` - sample count
///
/// In TOML a bare number (`sta = 120`) is also read as seconds.
///
/// # Example
/// ```
/// use quaketrigger::config::WindowLength;
///
/// let sta: WindowLength = "120s".parse().unwrap();
/// assert_eq!(sta.to_samples(6.625), 795);
///
/// let lta: WindowLength = "4000smp".parse().unwrap();
/// assert_eq!(lta.to_samples(6.625), 4000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "WindowLengthRepr")]
pub enum WindowLength {
    Seconds(f64),
    Samples(usize),
}

impl WindowLength {
    /// Convert to a sample count at the given rate.
    ///
    /// Durations truncate toward zero, so a window never covers more time than
    /// requested.
    pub fn to_samples(&self, sampling_rate: f64) -> usize {
        match *self {
            Self::Seconds(s) => (s * sampling_rate) as usize,
            Self::Samples(n) => n,
        }
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(s) => write!(f, "{}s", s),
            Self::Samples(n) => write!(f, "{}smp", n),
        }
    }
}

impl FromStr for WindowLength {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(num) = s
            .strip_suffix("samples")
            .or_else(|| s.strip_suffix("smp"))
        {
            let n: usize = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid sample count: {}", s))?;
            if n == 0 {
                return Err("window must span at least one sample".to_string());
            }
            return Ok(Self::Samples(n));
        }

        let num = s.strip_suffix('s').unwrap_or(s);
        let secs: f64 = num
            .trim()
            .parse()
            .map_err(|_| format!("invalid window duration: {}", s))?;
        Self::seconds(secs)
    }
}

impl WindowLength {
    fn seconds(secs: f64) -> std::result::Result<Self, String> {
        if !secs.is_finite() || secs <= 0.0 {
            return Err("window duration must be positive".to_string());
        }
        Ok(Self::Seconds(secs))
    }
}

/// TOML form of a window: a bare number of seconds or a suffixed string.
#[derive(Deserialize)]
#[serde(untagged)]
enum WindowLengthRepr {
    Number(f64),
    Text(String),
}

impl TryFrom<WindowLengthRepr> for WindowLength {
    type Error = String;

    fn try_from(repr: WindowLengthRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            WindowLengthRepr::Number(secs) => Self::seconds(secs),
            WindowLengthRepr::Text(s) => s.parse(),
        }
    }
}

/// How the signal is extended past its ends before zero-phase filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PadMode {
    /// Point reflection about the edge sample (`2 * x[0] - x[i]`)
    Odd,
    /// Mirror about the edge sample (`x[i]`)
    Even,
    /// Repeat the edge sample
    Constant,
    /// No extension
    None,
}

/// What to do with a trigger still open when the characteristic function ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TrailingPolicy {
    /// Close the window at the last sample
    Close,
    /// Drop the incomplete window
    Discard,
}

/// Band-pass stage configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Lower band edge in Hz
    pub low_cutoff_hz: f64,
    /// Upper band edge in Hz (must stay below Nyquist)
    pub high_cutoff_hz: f64,
    /// Butterworth prototype order (band-pass has twice as many poles)
    pub order: usize,
    /// Edge extension strategy for forward-backward filtering
    pub pad_mode: PadMode,
    /// Samples of extension per side; `None` uses `3 * (2 * order + 1)`
    pub pad_len: Option<usize>,
}

impl FilterConfig {
    pub fn new(low_cutoff_hz: f64, high_cutoff_hz: f64, order: usize) -> Self {
        Self {
            low_cutoff_hz,
            high_cutoff_hz,
            order,
            ..Self::default()
        }
    }

    /// Check everything that does not depend on the sampling rate.
    ///
    /// # Errors
    /// Returns `DetectError::InvalidFilterConfig` for non-positive or
    /// non-finite cutoffs, `low >= high`, or a zero order.
    pub fn validate(&self) -> Result<()> {
        let (low, high) = (self.low_cutoff_hz, self.high_cutoff_hz);
        if !low.is_finite() || !high.is_finite() || low <= 0.0 || high <= 0.0 {
            return Err(DetectError::InvalidFilterConfig(format!(
                "cutoffs must be positive and finite, got {}-{} Hz",
                low, high
            )));
        }
        if low >= high {
            return Err(DetectError::InvalidFilterConfig(format!(
                "low cutoff {} Hz must be below high cutoff {} Hz",
                low, high
            )));
        }
        if self.order == 0 {
            return Err(DetectError::InvalidFilterConfig(
                "filter order must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Full check including the Nyquist limit for `sampling_rate`.
    pub fn validate_for_rate(&self, sampling_rate: f64) -> Result<()> {
        self.validate()?;
        let nyquist = sampling_rate / 2.0;
        if self.high_cutoff_hz >= nyquist {
            return Err(DetectError::InvalidFilterConfig(format!(
                "high cutoff {} Hz must be below Nyquist {} Hz",
                self.high_cutoff_hz, nyquist
            )));
        }
        Ok(())
    }

    /// Requested pad per side before clamping to the signal length.
    pub fn default_pad_len(&self) -> usize {
        match self.pad_mode {
            PadMode::None => 0,
            _ => self
                .pad_len
                .unwrap_or(PAD_LEN_FACTOR * (2 * self.order + 1)),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            low_cutoff_hz: 0.8,
            high_cutoff_hz: 2.0,
            order: 4,
            pad_mode: PadMode::Odd,
            pad_len: None,
        }
    }
}

/// STA/LTA trigger configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Short-term average window
    pub sta: WindowLength,
    /// Long-term average window (must be longer than `sta`)
    pub lta: WindowLength,
    /// Ratio at or above which a trigger opens
    pub threshold_on: f64,
    /// Ratio at or below which an open trigger closes
    pub threshold_off: f64,
    /// Handling of a trigger still open at the end of the trace
    pub trailing: TrailingPolicy,
    /// Characteristic function value before the LTA window has filled
    pub warmup_fill: f64,
}

impl TriggerConfig {
    /// Check the thresholds; window sizes are checked once the rate is known.
    pub fn validate(&self) -> Result<()> {
        if !(self.threshold_on > self.threshold_off) {
            return Err(DetectError::InvalidThresholds {
                on: self.threshold_on,
                off: self.threshold_off,
            });
        }
        Ok(())
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            sta: WindowLength::Seconds(120.0),
            lta: WindowLength::Seconds(600.0),
            threshold_on: 4.8,
            threshold_off: 1.5,
            trailing: TrailingPolicy::Close,
            warmup_fill: DEFAULT_WARMUP_FILL,
        }
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use quaketrigger::config::DetectionConfig;
///
/// let mut config = DetectionConfig::default();
/// config.trigger.threshold_on = 3.5;
/// assert!(config.filter.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Band-pass stage; `None` passes amplitudes through unfiltered
    pub filter: Option<FilterConfig>,
    /// STA/LTA and trigger stage
    pub trigger: TriggerConfig,
}

impl DetectionConfig {
    /// Parse a TOML document; missing sections and keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DetectError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            filter: Some(FilterConfig::default()),
            trigger: TriggerConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_length_seconds() {
        let w: WindowLength = "120".parse().unwrap();
        assert_eq!(w, WindowLength::Seconds(120.0));

        let w: WindowLength = "2.5s".parse().unwrap();
        assert_eq!(w, WindowLength::Seconds(2.5));
        assert_eq!(w.to_samples(10.0), 25);
    }

    #[test]
    fn test_window_length_samples() {
        let w: WindowLength = "750smp".parse().unwrap();
        assert_eq!(w, WindowLength::Samples(750));

        let w: WindowLength = "12 samples".parse().unwrap();
        assert_eq!(w.to_samples(1000.0), 12);
    }

    #[test]
    fn test_window_length_truncates() {
        // 120 s at 6.625 Hz is 795 samples exactly; 1 s at 6.625 Hz truncates to 6
        assert_eq!(WindowLength::Seconds(120.0).to_samples(6.625), 795);
        assert_eq!(WindowLength::Seconds(1.0).to_samples(6.625), 6);
    }

    #[test]
    fn test_window_length_invalid() {
        assert!("abc".parse::<WindowLength>().is_err());
        assert!("-5s".parse::<WindowLength>().is_err());
        assert!("0smp".parse::<WindowLength>().is_err());
        assert!("1.5smp".parse::<WindowLength>().is_err());
    }

    #[test]
    fn test_window_length_display_round_trips() {
        for w in [WindowLength::Seconds(60.0), WindowLength::Samples(42)] {
            assert_eq!(w.to_string().parse::<WindowLength>().unwrap(), w);
        }
    }

    #[test]
    fn test_filter_validate() {
        assert!(FilterConfig::default().validate().is_ok());
        assert!(FilterConfig::new(2.0, 0.8, 4).validate().is_err());
        assert!(FilterConfig::new(1.0, 1.0, 4).validate().is_err());
        assert!(FilterConfig::new(0.0, 1.0, 4).validate().is_err());
        assert!(FilterConfig::new(-1.0, 1.0, 4).validate().is_err());
        assert!(FilterConfig::new(0.5, 1.0, 0).validate().is_err());
        assert!(FilterConfig::new(f64::NAN, 1.0, 2).validate().is_err());
    }

    #[test]
    fn test_filter_validate_nyquist() {
        let config = FilterConfig::new(0.8, 2.0, 4);
        assert!(config.validate_for_rate(6.625).is_ok());
        assert!(matches!(
            config.validate_for_rate(4.0),
            Err(DetectError::InvalidFilterConfig(_))
        ));
    }

    #[test]
    fn test_default_pad_len() {
        let mut config = FilterConfig::default();
        assert_eq!(config.default_pad_len(), 27);
        config.pad_len = Some(5);
        assert_eq!(config.default_pad_len(), 5);
        config.pad_mode = PadMode::None;
        assert_eq!(config.default_pad_len(), 0);
    }

    #[test]
    fn test_trigger_validate() {
        assert!(TriggerConfig::default().validate().is_ok());
        let config = TriggerConfig {
            threshold_on: 1.0,
            threshold_off: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(DetectError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_from_toml() {
        let config = DetectionConfig::from_toml_str(
            r#"
            [filter]
            low_cutoff_hz = 0.5
            high_cutoff_hz = 1.0
            pad_mode = "even"

            [trigger]
            sta = "60s"
            lta = "3000smp"
            threshold_on = 4.0
            trailing = "discard"
            "#,
        )
        .unwrap();

        let filter = config.filter.unwrap();
        assert_eq!(filter.low_cutoff_hz, 0.5);
        assert_eq!(filter.order, 4);
        assert_eq!(filter.pad_mode, PadMode::Even);
        assert_eq!(config.trigger.sta, WindowLength::Seconds(60.0));
        assert_eq!(config.trigger.lta, WindowLength::Samples(3000));
        assert_eq!(config.trigger.threshold_on, 4.0);
        assert_eq!(config.trigger.threshold_off, 1.5);
        assert_eq!(config.trigger.trailing, TrailingPolicy::Discard);
    }

    #[test]
    fn test_from_toml_numeric_windows() {
        let config = DetectionConfig::from_toml_str(
            r#"
            [trigger]
            sta = 120
            lta = 600.5
            "#,
        )
        .unwrap();
        assert_eq!(config.trigger.sta, WindowLength::Seconds(120.0));
        assert_eq!(config.trigger.lta, WindowLength::Seconds(600.5));

        assert!(DetectionConfig::from_toml_str("[trigger]\nsta = 0").is_err());
        assert!(DetectionConfig::from_toml_str("[trigger]\nsta = -3.0").is_err());
    }

    #[test]
    fn test_from_toml_empty_is_default() {
        let config = DetectionConfig::from_toml_str("").unwrap();
        assert_eq!(config, DetectionConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_bad_window() {
        let err = DetectionConfig::from_toml_str("[trigger]\nsta = \"soon\"\n").unwrap_err();
        assert!(matches!(err, DetectError::Config(_)));
    }
}
