use crate::error::{DetectError, Result};

/// Uniformly sampled single-channel trace.
///
/// Holds relative times in seconds (strictly increasing) and one amplitude per
/// time. The sampling rate is derived once at construction as the inverse of
/// the mean time step.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    times: Vec<f64>,
    amplitudes: Vec<f64>,
    sampling_rate: f64,
}

impl TimeSeries {
    /// Build a series from parallel time and amplitude vectors.
    ///
    /// # Errors
    /// Returns `DetectError::InvalidInput` if the series is empty or shorter
    /// than two samples, the vectors differ in length, any value is not
    /// finite, times are not strictly increasing, or the derived sampling
    /// rate is degenerate.
    pub fn new(times: Vec<f64>, amplitudes: Vec<f64>) -> Result<Self> {
        if times.is_empty() {
            return Err(DetectError::InvalidInput("empty time series".to_string()));
        }
        if times.len() != amplitudes.len() {
            return Err(DetectError::InvalidInput(format!(
                "{} times but {} amplitudes",
                times.len(),
                amplitudes.len()
            )));
        }
        if times.len() < 2 {
            return Err(DetectError::InvalidInput(
                "need at least two samples to derive a sampling rate".to_string(),
            ));
        }
        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(DetectError::InvalidInput(format!(
                "non-finite time at sample {}",
                i
            )));
        }
        if let Some(i) = amplitudes.iter().position(|a| !a.is_finite()) {
            return Err(DetectError::InvalidInput(format!(
                "non-finite amplitude at sample {}",
                i
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DetectError::InvalidInput(format!(
                "times not strictly increasing at sample {} ({} -> {})",
                i + 1,
                times[i],
                times[i + 1]
            )));
        }

        // Mean of successive deltas telescopes to the span over the step count.
        let span = times[times.len() - 1] - times[0];
        let mean_step = span / (times.len() - 1) as f64;
        let sampling_rate = 1.0 / mean_step;
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(DetectError::InvalidInput(format!(
                "degenerate sampling rate {}",
                sampling_rate
            )));
        }

        Ok(Self {
            times,
            amplitudes,
            sampling_rate,
        })
    }

    /// Build a series from `(time, amplitude)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (times, amplitudes) = pairs.into_iter().unzip();
        Self::new(times, amplitudes)
    }

    /// Build a series whose sample `i` sits at `start + i / sampling_rate`.
    pub fn from_uniform(amplitudes: Vec<f64>, sampling_rate: f64, start: f64) -> Result<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(DetectError::InvalidInput(format!(
                "degenerate sampling rate {}",
                sampling_rate
            )));
        }
        let times = (0..amplitudes.len())
            .map(|i| start + i as f64 / sampling_rate)
            .collect();
        let mut series = Self::new(times, amplitudes)?;
        // Keep the exact rate rather than the one re-derived from rounded times.
        series.sampling_rate = sampling_rate;
        Ok(series)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn amplitudes(&self) -> &[f64] {
        &self.amplitudes
    }

    /// Samples per second, `1 / mean(successive time deltas)`.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sampling_rate_from_mean_step() {
        let series = TimeSeries::new(vec![0.0, 0.1, 0.2, 0.3], vec![0.0; 4]).unwrap();
        assert_relative_eq!(series.sampling_rate(), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_from_uniform() {
        let series = TimeSeries::from_uniform(vec![1.0, 2.0, 3.0], 4.0, 10.0).unwrap();
        assert_eq!(series.times(), &[10.0, 10.25, 10.5]);
        assert_relative_eq!(series.sampling_rate(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_empty() {
        let err = TimeSeries::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_single_sample() {
        assert!(matches!(
            TimeSeries::new(vec![0.0], vec![1.0]),
            Err(DetectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_rejects_non_monotonic() {
        let err = TimeSeries::new(vec![0.0, 1.0, 1.0, 2.0], vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));

        let err = TimeSeries::from_pairs([(0.0, 0.0), (2.0, 0.0), (1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, DetectError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_length_mismatch_and_nan() {
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(TimeSeries::new(vec![0.0, 1.0], vec![0.0, f64::NAN]).is_err());
        assert!(TimeSeries::from_uniform(vec![0.0, 1.0], 0.0, 0.0).is_err());
    }
}
