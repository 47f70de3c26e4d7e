use crate::constants::{DEFAULT_WARMUP_FILL, MIN_LTA_AVERAGE};
use crate::error::{DetectError, Result};

/// Trailing running sum of squared samples over a fixed window
///
/// Keeps the window in a circular buffer so each update is O(1): the incoming
/// energy is added and the energy leaving the window subtracted.
pub struct RunningEnergy {
    buffer: Vec<f64>,
    index: usize,
    sum: f64,
}

impl RunningEnergy {
    /// Create a window spanning `window_size` samples (at least one).
    pub fn new(window_size: usize) -> Self {
        Self {
            buffer: vec![0.0; window_size.max(1)],
            index: 0,
            sum: 0.0,
        }
    }

    /// Push the next sample and return the updated energy sum.
    pub fn push(&mut self, sample: f64) -> f64 {
        let energy = sample * sample;
        let leaving = std::mem::replace(&mut self.buffer[self.index], energy);
        // Cancellation can leave a tiny negative residue after a loud stretch.
        self.sum = (self.sum + energy - leaving).max(0.0);
        self.index = (self.index + 1) % self.buffer.len();
        self.sum
    }

    /// Mean energy over the full window length.
    pub fn average(&self) -> f64 {
        self.sum / self.buffer.len() as f64
    }
}

/// Check STA/LTA window sizes against a trace of `len` samples.
///
/// # Errors
/// Returns `DetectError::InvalidWindowConfig` if `sta_samples < 1`,
/// `sta_samples >= lta_samples`, or `lta_samples > len`.
pub fn validate_windows(sta_samples: usize, lta_samples: usize, len: usize) -> Result<()> {
    if sta_samples < 1 {
        return Err(DetectError::InvalidWindowConfig(
            "STA window must span at least one sample".to_string(),
        ));
    }
    if sta_samples >= lta_samples {
        return Err(DetectError::InvalidWindowConfig(format!(
            "STA window ({} samples) must be shorter than LTA window ({} samples)",
            sta_samples, lta_samples
        )));
    }
    if lta_samples > len {
        return Err(DetectError::InvalidWindowConfig(format!(
            "LTA window ({} samples) exceeds series length ({} samples)",
            lta_samples, len
        )));
    }
    Ok(())
}

/// Classic STA/LTA characteristic function.
///
/// `CF[i]` is the mean energy of the `sta_samples` samples ending at `i`
/// divided by the mean energy of the `lta_samples` samples ending at `i`.
/// Indices before the long window has filled (`i < lta_samples`) hold
/// [`DEFAULT_WARMUP_FILL`].
pub fn classic_sta_lta(filtered: &[f64], sta_samples: usize, lta_samples: usize) -> Result<Vec<f64>> {
    classic_sta_lta_with_fill(filtered, sta_samples, lta_samples, DEFAULT_WARMUP_FILL)
}

/// [`classic_sta_lta`] with an explicit value for the warm-up region.
pub fn classic_sta_lta_with_fill(
    filtered: &[f64],
    sta_samples: usize,
    lta_samples: usize,
    warmup_fill: f64,
) -> Result<Vec<f64>> {
    validate_windows(sta_samples, lta_samples, filtered.len())?;

    let mut sta = RunningEnergy::new(sta_samples);
    let mut lta = RunningEnergy::new(lta_samples);
    let mut cf = Vec::with_capacity(filtered.len());

    for (i, &sample) in filtered.iter().enumerate() {
        sta.push(sample);
        lta.push(sample);

        if i < lta_samples {
            cf.push(warmup_fill);
        } else {
            cf.push(sta.average() / lta.average().max(MIN_LTA_AVERAGE));
        }
    }

    Ok(cf)
}
