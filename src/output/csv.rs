use super::{DetectionRecord, Formatter};

pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, record: &DetectionRecord) -> String {
        format!(
            "{},{},{},{:e},{:e}",
            record.source_id,
            record.absolute_onset_iso(),
            record.relative_onset_time_seconds,
            record.max_amplitude,
            record.min_amplitude
        )
    }

    fn header(&self) -> Option<&'static str> {
        Some(
            "filename,time_abs(%Y-%m-%dT%H:%M:%S.%f),time_rel(sec),max_velocity(m/s),min_velocity(m/s)",
        )
    }
}
