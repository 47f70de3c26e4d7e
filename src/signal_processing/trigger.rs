use crate::config::TrailingPolicy;
use crate::error::{DetectError, Result};

/// Trigger-on/trigger-off index pair bounding one detected event.
///
/// `onset_index < offset_index` always holds for windows produced by
/// [`TriggerDetector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerWindow {
    pub onset_index: usize,
    pub offset_index: usize,
}

impl TriggerWindow {
    pub fn new(onset_index: usize, offset_index: usize) -> Self {
        Self {
            onset_index,
            offset_index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerState {
    Off,
    On { onset_index: usize },
}

/// Two-threshold trigger over a characteristic function
///
/// Opens a window when the function rises to `threshold_on` or above and
/// closes it at the first later sample at or below `threshold_off`. Scanning
/// resumes after the closing sample, so windows never overlap.
///
/// A window still open when the function ends is closed at the last sample
/// (the default [`TrailingPolicy::Close`]) or dropped
/// ([`TrailingPolicy::Discard`]).
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    threshold_on: f64,
    threshold_off: f64,
    trailing: TrailingPolicy,
}

impl TriggerDetector {
    /// Create a new trigger detector
    ///
    /// # Arguments
    /// * `threshold_on` - Ratio that opens a trigger
    /// * `threshold_off` - Ratio that closes an open trigger
    ///
    /// # Errors
    /// Returns `DetectError::InvalidThresholds` unless `threshold_on > threshold_off`.
    pub fn new(threshold_on: f64, threshold_off: f64) -> Result<Self> {
        if !(threshold_on > threshold_off) {
            return Err(DetectError::InvalidThresholds {
                on: threshold_on,
                off: threshold_off,
            });
        }
        Ok(Self {
            threshold_on,
            threshold_off,
            trailing: TrailingPolicy::Close,
        })
    }

    /// Choose what happens to a trigger still open at the end of the scan.
    pub fn with_trailing_policy(mut self, trailing: TrailingPolicy) -> Self {
        self.trailing = trailing;
        self
    }

    /// Scan `cf` once, left to right, and return every trigger window in order.
    pub fn detect(&self, cf: &[f64]) -> Vec<TriggerWindow> {
        let mut windows = Vec::new();
        let mut state = TriggerState::Off;

        for (i, &value) in cf.iter().enumerate() {
            match state {
                TriggerState::Off => {
                    if value >= self.threshold_on {
                        log::trace!("trigger on at {} (cf {:.3})", i, value);
                        state = TriggerState::On { onset_index: i };
                    }
                }
                TriggerState::On { onset_index } => {
                    if value <= self.threshold_off {
                        log::trace!("trigger off at {} (cf {:.3})", i, value);
                        windows.push(TriggerWindow::new(onset_index, i));
                        state = TriggerState::Off;
                    }
                }
            }
        }

        if let TriggerState::On { onset_index } = state {
            let last = cf.len() - 1;
            match self.trailing {
                TrailingPolicy::Close if onset_index < last => {
                    log::warn!(
                        "trigger opened at {} still on at end of trace, closing at {}",
                        onset_index,
                        last
                    );
                    windows.push(TriggerWindow::new(onset_index, last));
                }
                _ => {
                    log::debug!("dropping trigger opened at {} with no offset", onset_index);
                }
            }
        }

        windows
    }
}

/// Trigger windows of `cf` with the default trailing policy.
pub fn trigger_onset(cf: &[f64], threshold_on: f64, threshold_off: f64) -> Result<Vec<TriggerWindow>> {
    Ok(TriggerDetector::new(threshold_on, threshold_off)?.detect(cf))
}
