pub mod generate;

pub use generate::{pulse_series, rectangular_pulse, sine_wave};
