use serde::Deserialize;
use std::f64::consts::PI;

/// A synthetic seismic arrival: a sinusoidal carrier under a linear-rise,
/// exponential-decay envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyntheticEvent {
    /// Arrival time in seconds from the start of the trace
    pub onset_seconds: f64,
    /// Peak envelope amplitude
    pub amplitude: f64,
    /// Carrier frequency in Hz
    pub frequency_hz: f64,
    /// Time from onset to peak envelope
    #[serde(default)]
    pub rise_seconds: f64,
    /// Envelope e-folding time after the peak
    pub decay_seconds: f64,
}

impl SyntheticEvent {
    pub fn new(onset_seconds: f64, amplitude: f64, frequency_hz: f64, decay_seconds: f64) -> Self {
        Self {
            onset_seconds,
            amplitude,
            frequency_hz,
            rise_seconds: 0.0,
            decay_seconds,
        }
    }

    pub fn with_rise(mut self, rise_seconds: f64) -> Self {
        self.rise_seconds = rise_seconds;
        self
    }

    /// Envelope value `t` seconds into the trace.
    pub fn envelope(&self, t: f64) -> f64 {
        let dt = t - self.onset_seconds;
        if dt < 0.0 {
            return 0.0;
        }
        if dt < self.rise_seconds {
            return self.amplitude * dt / self.rise_seconds;
        }
        let decay = self.decay_seconds.max(f64::MIN_POSITIVE);
        self.amplitude * (-(dt - self.rise_seconds) / decay).exp()
    }

    /// Waveform value `t` seconds into the trace.
    pub fn value_at(&self, t: f64) -> f64 {
        let dt = t - self.onset_seconds;
        if dt < 0.0 {
            return 0.0;
        }
        self.envelope(t) * (2.0 * PI * self.frequency_hz * dt).sin()
    }
}

/// Sum of `events` sampled at `sample_rate` for `duration_secs`.
pub fn generate_trace(duration_secs: f64, sample_rate: f64, events: &[SyntheticEvent]) -> Vec<f64> {
    let num_samples = (duration_secs * sample_rate) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f64 / sample_rate;
            events.iter().map(|e| e.value_at(t)).sum()
        })
        .collect()
}
