pub mod bandpass;
pub mod sta_lta;
pub mod trigger;

pub use bandpass::{ZeroPhaseBandpass, bandpass_filter, extend_edges};
pub use sta_lta::{RunningEnergy, classic_sta_lta, classic_sta_lta_with_fill, validate_windows};
pub use trigger::{TriggerDetector, TriggerWindow, trigger_onset};
