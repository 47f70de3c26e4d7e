use chrono::NaiveDateTime;

use crate::config::DetectionConfig;
use crate::detection::{DetectionRecord, extract_detections, validate_time_span};
use crate::error::Result;
use crate::series::TimeSeries;
use crate::signal_processing::{
    TriggerDetector, TriggerWindow, ZeroPhaseBandpass, classic_sta_lta_with_fill, validate_windows,
};

/// Every intermediate trace of one pipeline run, for callers that plot or dump
/// them alongside the detections.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub sampling_rate: f64,
    pub sta_samples: usize,
    pub lta_samples: usize,
    pub filtered: Vec<f64>,
    pub characteristic: Vec<f64>,
    pub windows: Vec<TriggerWindow>,
    pub detections: Vec<DetectionRecord>,
}

/// Filter, STA/LTA, trigger and extraction for single traces.
///
/// Holds only immutable configuration, so one pipeline can be shared by
/// reference across threads processing different traces.
pub struct DetectionPipeline {
    config: DetectionConfig,
    trigger: TriggerDetector,
}

impl DetectionPipeline {
    /// Validate the rate-independent parts of `config`.
    ///
    /// # Errors
    /// `InvalidThresholds` or `InvalidFilterConfig` when the thresholds or
    /// band edges are malformed. Nyquist and window sizes are checked per
    /// trace in [`DetectionPipeline::run`].
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.trigger.validate()?;
        if let Some(ref filter) = config.filter {
            filter.validate()?;
        }
        let trigger = TriggerDetector::new(config.trigger.threshold_on, config.trigger.threshold_off)?
            .with_trailing_policy(config.trigger.trailing);

        Ok(Self { config, trigger })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the full pipeline over one trace.
    ///
    /// All validation happens before any computation, so an error never comes
    /// with partial output.
    pub fn run(
        &self,
        series: &TimeSeries,
        reference_time: NaiveDateTime,
        source_id: &str,
    ) -> Result<PipelineOutput> {
        let sampling_rate = series.sampling_rate();
        let sta_samples = self.config.trigger.sta.to_samples(sampling_rate);
        let lta_samples = self.config.trigger.lta.to_samples(sampling_rate);

        let bandpass = match self.config.filter {
            Some(ref filter) => Some(ZeroPhaseBandpass::new(filter, sampling_rate)?),
            None => None,
        };
        validate_windows(sta_samples, lta_samples, series.len())?;
        validate_time_span(reference_time, series.times())?;

        log::debug!(
            "{}: {} samples at {:.4} Hz, STA {} / LTA {} samples",
            source_id,
            series.len(),
            sampling_rate,
            sta_samples,
            lta_samples
        );

        let filtered = match bandpass {
            Some(bandpass) => bandpass.apply(series.amplitudes())?,
            None => series.amplitudes().to_vec(),
        };

        let characteristic = classic_sta_lta_with_fill(
            &filtered,
            sta_samples,
            lta_samples,
            self.config.trigger.warmup_fill,
        )?;

        let windows = self.trigger.detect(&characteristic);

        let detections = extract_detections(
            &filtered,
            series.times(),
            &windows,
            sta_samples,
            reference_time,
            source_id,
        )?;

        log::info!("{}: {} detection(s)", source_id, detections.len());

        Ok(PipelineOutput {
            sampling_rate,
            sta_samples,
            lta_samples,
            filtered,
            characteristic,
            windows,
            detections,
        })
    }

    /// Run the pipeline and keep only the detection records.
    pub fn detect(
        &self,
        series: &TimeSeries,
        reference_time: NaiveDateTime,
        source_id: &str,
    ) -> Result<Vec<DetectionRecord>> {
        Ok(self.run(series, reference_time, source_id)?.detections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FilterConfig, TriggerConfig, WindowLength};
    use crate::error::DetectError;

    fn epoch() -> NaiveDateTime {
        NaiveDateTime::UNIX_EPOCH
    }

    fn pulse_series() -> TimeSeries {
        let mut amplitudes = vec![0.0; 1000];
        for a in &mut amplitudes[400..420] {
            *a = 10.0;
        }
        TimeSeries::from_uniform(amplitudes, 100.0, 0.0).unwrap()
    }

    fn sample_trigger(on: f64, off: f64) -> TriggerConfig {
        TriggerConfig {
            sta: WindowLength::Samples(10),
            lta: WindowLength::Samples(100),
            threshold_on: on,
            threshold_off: off,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_inverted_thresholds() {
        let config = DetectionConfig {
            filter: None,
            trigger: sample_trigger(1.0, 2.0),
        };
        assert!(matches!(
            DetectionPipeline::new(config),
            Err(DetectError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_unfiltered_pulse() {
        let pipeline = DetectionPipeline::new(DetectionConfig {
            filter: None,
            trigger: sample_trigger(3.0, 1.0),
        })
        .unwrap();

        let output = pipeline.run(&pulse_series(), epoch(), "pulse").unwrap();

        assert_eq!(output.filtered.len(), 1000);
        assert_eq!(output.characteristic.len(), 1000);
        assert_eq!(output.windows, vec![TriggerWindow::new(400, 427)]);
        assert_eq!(output.detections.len(), 1);
        assert_eq!(output.detections[0].max_amplitude, 10.0);
        assert_eq!(output.detections[0].min_amplitude, 0.0);
    }

    #[test]
    fn test_run_rejects_band_above_nyquist() {
        let pipeline = DetectionPipeline::new(DetectionConfig {
            filter: Some(FilterConfig::new(1.0, 60.0, 4)),
            trigger: sample_trigger(3.0, 1.0),
        })
        .unwrap();

        assert!(matches!(
            pipeline.run(&pulse_series(), epoch(), "pulse"),
            Err(DetectError::InvalidFilterConfig(_))
        ));
    }

    #[test]
    fn test_run_rejects_lta_longer_than_series() {
        let mut trigger = sample_trigger(3.0, 1.0);
        trigger.lta = WindowLength::Seconds(20.0);
        let pipeline = DetectionPipeline::new(DetectionConfig {
            filter: None,
            trigger,
        })
        .unwrap();

        assert!(matches!(
            pipeline.run(&pulse_series(), epoch(), "pulse"),
            Err(DetectError::InvalidWindowConfig(_))
        ));
    }

    #[test]
    fn test_run_rejects_times_past_date_range() {
        let mut amplitudes = vec![0.0; 1000];
        for a in &mut amplitudes[400..420] {
            *a = 10.0;
        }
        let series = TimeSeries::from_uniform(amplitudes, 100.0, 1.0e13).unwrap();
        let pipeline = DetectionPipeline::new(DetectionConfig {
            filter: None,
            trigger: sample_trigger(3.0, 1.0),
        })
        .unwrap();

        assert!(matches!(
            pipeline.detect(&series, epoch(), "far"),
            Err(DetectError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_seconds_windows_convert_at_series_rate() {
        let mut trigger = sample_trigger(3.0, 1.0);
        trigger.sta = WindowLength::Seconds(0.1);
        trigger.lta = WindowLength::Seconds(1.0);
        let pipeline = DetectionPipeline::new(DetectionConfig {
            filter: None,
            trigger,
        })
        .unwrap();

        let output = pipeline.run(&pulse_series(), epoch(), "pulse").unwrap();
        assert_eq!(output.sta_samples, 10);
        assert_eq!(output.lta_samples, 100);
    }
}
