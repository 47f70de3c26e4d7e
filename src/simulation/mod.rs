mod measure;
mod noise;
mod signal;

pub use measure::{DetectionScore, score_detections};
pub use noise::{
    AdditiveNoiseConfig, DriftConfig, ImpulseNoiseConfig, NoiseConfig, apply_noise, signal_power,
};
pub use signal::{SyntheticEvent, generate_trace};

use crate::error::Result;
use crate::series::TimeSeries;

/// Synthetic events plus noise as a [`TimeSeries`] starting at time zero.
pub fn generate_noisy_series(
    duration_secs: f64,
    sample_rate: f64,
    events: &[SyntheticEvent],
    noise: &NoiseConfig,
) -> Result<TimeSeries> {
    let clean = generate_trace(duration_secs, sample_rate, events);
    let noisy = apply_noise(&clean, noise, sample_rate)?;
    TimeSeries::from_uniform(noisy, sample_rate, 0.0)
}
