use crate::config::{FilterConfig, PadMode};
use crate::constants::SETTLE_LEN_CAP_FACTOR;
use crate::error::{DetectError, Result};
use iir_filters::filter::{DirectForm2Transposed, Filter};
use iir_filters::filter_design::{FilterType, butter};
use iir_filters::sos::zpk2sos;

/// Zero-phase Butterworth band-pass filter
///
/// Designs a Butterworth band-pass as cascaded second-order sections
/// (direct form II transposed) and runs it forward then backward over the
/// whole trace, so the output has the squared magnitude response of the
/// single-pass filter and no phase shift.
///
/// The trace is extended past both ends according to the configured
/// [`PadMode`] before filtering, and each pass starts with its section state
/// warmed on the first extended sample. Both measures keep the start-up
/// transient out of the returned samples.
pub struct ZeroPhaseBandpass {
    config: FilterConfig,
    sampling_rate: f64,
}

impl ZeroPhaseBandpass {
    /// Create a new zero-phase band-pass filter
    ///
    /// # Arguments
    /// * `config` - Band edges, order and edge padding
    /// * `sampling_rate` - Trace sample rate in Hz
    ///
    /// # Errors
    /// Returns `DetectError::InvalidFilterConfig` if the band is malformed or
    /// reaches Nyquist, and `DetectError::FilterDesign` if the section design
    /// itself fails.
    pub fn new(config: &FilterConfig, sampling_rate: f64) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(DetectError::InvalidInput(format!(
                "degenerate sampling rate {}",
                sampling_rate
            )));
        }
        config.validate_for_rate(sampling_rate)?;

        let filter = Self {
            config: config.clone(),
            sampling_rate,
        };
        // Surface design failures at construction rather than on first use.
        filter.design()?;
        Ok(filter)
    }

    fn design(&self) -> Result<DirectForm2Transposed> {
        let zpk = butter(
            self.config.order as u32,
            FilterType::BandPass(self.config.low_cutoff_hz, self.config.high_cutoff_hz),
            self.sampling_rate,
        )
        .map_err(|e| DetectError::FilterDesign(format!("{:?}", e)))?;

        let sos = zpk2sos(&zpk, None).map_err(|e| DetectError::FilterDesign(format!("{:?}", e)))?;

        Ok(DirectForm2Transposed::new(&sos))
    }

    /// Pad length actually applied to a trace of `len` samples.
    ///
    /// The requested pad is clamped to `len - 1` because reflection needs that
    /// many interior samples.
    pub fn pad_len(&self, len: usize) -> usize {
        self.config.default_pad_len().min(len.saturating_sub(1))
    }

    /// Warm-up samples fed before each pass over a trace of `len` samples:
    /// three periods of the lower band edge and never fewer than the pad,
    /// capped at [`SETTLE_LEN_CAP_FACTOR`] times the trace length.
    fn settle_len(&self, len: usize) -> usize {
        let periods = (3.0 * self.sampling_rate / self.config.low_cutoff_hz).ceil() as usize;
        periods
            .max(self.config.default_pad_len())
            .min(len.saturating_mul(SETTLE_LEN_CAP_FACTOR))
            .max(1)
    }

    /// Filter a whole trace, returning a new buffer of the same length.
    pub fn apply(&self, samples: &[f64]) -> Result<Vec<f64>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let pad = self.pad_len(samples.len());
        let mut buffer = extend_edges(samples, pad, self.config.pad_mode);

        let settle = self.settle_len(samples.len());
        self.run_pass(&mut buffer, settle)?;
        buffer.reverse();
        self.run_pass(&mut buffer, settle)?;
        buffer.reverse();

        Ok(buffer[pad..pad + samples.len()].to_vec())
    }

    /// One causal pass in place, starting from state settled on `buffer[0]`.
    fn run_pass(&self, buffer: &mut [f64], settle: usize) -> Result<()> {
        let mut sections = self.design()?;
        let warmup = buffer[0];
        for _ in 0..settle {
            sections.filter(warmup);
        }
        for sample in buffer.iter_mut() {
            *sample = sections.filter(*sample);
        }
        Ok(())
    }
}

/// Band-pass `samples` with zero phase.
///
/// Convenience wrapper around [`ZeroPhaseBandpass`] for one-shot use.
pub fn bandpass_filter(
    samples: &[f64],
    config: &FilterConfig,
    sampling_rate: f64,
) -> Result<Vec<f64>> {
    ZeroPhaseBandpass::new(config, sampling_rate)?.apply(samples)
}

/// Extend `samples` by `pad` samples on each side.
///
/// `pad` must not exceed `samples.len() - 1`.
pub fn extend_edges(samples: &[f64], pad: usize, mode: PadMode) -> Vec<f64> {
    let n = samples.len();
    if pad == 0 || n == 0 {
        return samples.to_vec();
    }
    let first = samples[0];
    let last = samples[n - 1];

    let mut out = Vec::with_capacity(n + 2 * pad);
    for i in (1..=pad).rev() {
        out.push(match mode {
            PadMode::Odd => 2.0 * first - samples[i],
            PadMode::Even => samples[i],
            PadMode::Constant | PadMode::None => first,
        });
    }
    out.extend_from_slice(samples);
    for i in 1..=pad {
        let mirrored = samples[n - 1 - i];
        out.push(match mode {
            PadMode::Odd => 2.0 * last - mirrored,
            PadMode::Even => mirrored,
            PadMode::Constant | PadMode::None => last,
        });
    }
    out
}
