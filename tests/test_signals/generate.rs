use quaketrigger::TimeSeries;
use std::f64::consts::PI;

/// All-zero trace of `len` samples with `amplitude` on `[start, end)`.
pub fn rectangular_pulse(len: usize, start: usize, end: usize, amplitude: f64) -> Vec<f64> {
    let mut samples = vec![0.0; len];
    for s in &mut samples[start..end] {
        *s = amplitude;
    }
    samples
}

/// Rectangular pulse as a series sampled at `sample_rate`, starting at t = 0.
pub fn pulse_series(
    len: usize,
    start: usize,
    end: usize,
    amplitude: f64,
    sample_rate: f64,
) -> TimeSeries {
    TimeSeries::from_uniform(rectangular_pulse(len, start, end, amplitude), sample_rate, 0.0)
        .expect("pulse series")
}

pub fn sine_wave(len: usize, sample_rate: f64, freq_hz: f64, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|i| amplitude * (2.0 * PI * freq_hz * i as f64 / sample_rate).sin())
        .collect()
}
