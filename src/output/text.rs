use super::{DetectionRecord, Formatter};

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &DetectionRecord) -> String {
        if self.verbose {
            format!(
                "{}: onset {} (t={:.2}s, idx {}) off t={:.2}s (idx {}) max {:.3e} min {:.3e}",
                record.source_id,
                record.absolute_onset_iso(),
                record.relative_onset_time_seconds,
                record.onset_index,
                record.relative_offset_time_seconds,
                record.offset_index,
                record.max_amplitude,
                record.min_amplitude
            )
        } else {
            format!(
                "{}: onset {} (t={:.2}s) max {:.3e} min {:.3e}",
                record.source_id,
                record.absolute_onset_iso(),
                record.relative_onset_time_seconds,
                record.max_amplitude,
                record.min_amplitude
            )
        }
    }
}
