use super::{DetectionRecord, Formatter};

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, record: &DetectionRecord) -> String {
        serde_json::json!({
            "filename": record.source_id,
            "time_abs": record.absolute_onset_iso(),
            "time_rel": record.relative_onset_time_seconds,
            "time_rel_off": record.relative_offset_time_seconds,
            "onset_index": record.onset_index,
            "offset_index": record.offset_index,
            "max_velocity": record.max_amplitude,
            "min_velocity": record.min_amplitude,
        })
        .to_string()
    }
}
