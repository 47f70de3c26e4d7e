use rand::RngExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

use crate::error::{DetectError, Result};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub impulse: Option<ImpulseNoiseConfig>,
    pub drift: Option<DriftConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_gaussian(mut self, std_dev: f64) -> Self {
        self.additive = Some(AdditiveNoiseConfig { std_dev });
        self
    }

    pub fn with_impulse(mut self, rate_hz: f64, amplitude: f64, duration_samples: usize) -> Self {
        self.impulse = Some(ImpulseNoiseConfig {
            rate_hz,
            amplitude,
            duration_samples,
        });
        self
    }

    pub fn with_drift(mut self, amplitude: f64, period_seconds: f64) -> Self {
        self.drift = Some(DriftConfig {
            amplitude,
            period_seconds,
        });
        self
    }
}

/// White Gaussian background noise
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub std_dev: f64,
}

/// Randomly spaced rectangular glitches of random sign
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ImpulseNoiseConfig {
    pub rate_hz: f64,
    pub amplitude: f64,
    pub duration_samples: usize,
}

/// Slow sinusoidal baseline wander, well below any detection band
#[derive(Clone, Debug, serde::Deserialize)]
pub struct DriftConfig {
    pub amplitude: f64,
    pub period_seconds: f64,
}

fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

pub fn signal_power(signal: &[f64]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|&x| x * x).sum::<f64>() / signal.len() as f64
}

fn apply_additive_noise(
    signal: &mut [f64],
    config: &AdditiveNoiseConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    if config.std_dev == 0.0 {
        return Ok(());
    }
    let normal = Normal::new(0.0, config.std_dev)
        .map_err(|e| DetectError::Config(format!("noise std_dev {}: {}", config.std_dev, e)))?;

    for sample in signal.iter_mut() {
        *sample += normal.sample(rng);
    }
    Ok(())
}

fn apply_impulse_noise(
    signal: &mut [f64],
    config: &ImpulseNoiseConfig,
    sample_rate: f64,
    rng: &mut ChaCha8Rng,
) {
    let n = signal.len();
    if n == 0 || config.rate_hz <= 0.0 {
        return;
    }

    let avg_samples_between_impulses = sample_rate / config.rate_hz;

    let mut pos = 0usize;
    loop {
        let interval = (rng.random::<f64>() * 2.0 * avg_samples_between_impulses) as usize;
        pos += interval.max(1);

        if pos >= n {
            break;
        }

        let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
        let end = (pos + config.duration_samples).min(n);

        for sample in signal[pos..end].iter_mut() {
            *sample += sign * config.amplitude;
        }
    }
}

fn apply_drift(signal: &mut [f64], config: &DriftConfig, sample_rate: f64) {
    if config.period_seconds <= 0.0 {
        return;
    }
    for (i, s) in signal.iter_mut().enumerate() {
        let t = i as f64 / sample_rate;
        *s += config.amplitude * (2.0 * PI * t / config.period_seconds).sin();
    }
}

pub fn apply_noise(clean_signal: &[f64], config: &NoiseConfig, sample_rate: f64) -> Result<Vec<f64>> {
    let mut signal = clean_signal.to_vec();
    let mut rng = create_rng(config.seed);

    if let Some(ref drift_config) = config.drift {
        apply_drift(&mut signal, drift_config, sample_rate);
    }

    if let Some(ref additive_config) = config.additive {
        apply_additive_noise(&mut signal, additive_config, &mut rng)?;
    }

    if let Some(ref impulse_config) = config.impulse {
        apply_impulse_noise(&mut signal, impulse_config, sample_rate, &mut rng);
    }

    Ok(signal)
}
