use crate::detection::DetectionRecord;

use super::SyntheticEvent;

/// How well a detection list matches the events planted in a synthetic trace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionScore {
    /// Events with a detection within tolerance
    pub hits: usize,
    /// Events with no detection within tolerance
    pub misses: usize,
    /// Detections not matched to any event
    pub false_alarms: usize,
    /// Signed onset error (detected minus planted) per hit, in seconds
    pub onset_errors: Vec<f64>,
}

impl DetectionScore {
    pub fn max_abs_onset_error(&self) -> f64 {
        self.onset_errors.iter().fold(0.0, |a, &b| a.max(b.abs()))
    }
}

/// Match each planted event to the nearest unused detection within
/// `tolerance_seconds` of its onset.
pub fn score_detections(
    detections: &[DetectionRecord],
    events: &[SyntheticEvent],
    tolerance_seconds: f64,
) -> DetectionScore {
    let mut used = vec![false; detections.len()];
    let mut score = DetectionScore::default();

    for event in events {
        let nearest = detections
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, d)| (i, d.relative_onset_time_seconds - event.onset_seconds))
            .filter(|(_, err)| err.abs() <= tolerance_seconds)
            .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()));

        match nearest {
            Some((i, err)) => {
                used[i] = true;
                score.hits += 1;
                score.onset_errors.push(err);
            }
            None => score.misses += 1,
        }
    }

    score.false_alarms = used.iter().filter(|&&u| !u).count();
    score
}
