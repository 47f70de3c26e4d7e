mod test_signals;

use quaketrigger::catalog::parse_timestamp;
use quaketrigger::config::{FilterConfig, TrailingPolicy, TriggerConfig, WindowLength};
use quaketrigger::detection::extraction_range;
use quaketrigger::output::{CsvFormatter, write_detections};
use quaketrigger::series_io::parse_series_csv;
use quaketrigger::signal_processing::{
    TriggerDetector, TriggerWindow, bandpass_filter, classic_sta_lta, trigger_onset,
};
use quaketrigger::simulation::{NoiseConfig, apply_noise};
use quaketrigger::{DetectError, DetectionConfig, DetectionPipeline, TimeSeries};

fn sample_windows(sta: usize, lta: usize, on: f64, off: f64) -> TriggerConfig {
    TriggerConfig {
        sta: WindowLength::Samples(sta),
        lta: WindowLength::Samples(lta),
        threshold_on: on,
        threshold_off: off,
        ..Default::default()
    }
}

fn rms(samples: &[f64]) -> f64 {
    (samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64).sqrt()
}

#[test]
fn test_pulse_end_to_end() {
    let series = test_signals::pulse_series(1000, 400, 420, 10.0, 100.0);
    let pipeline = DetectionPipeline::new(DetectionConfig {
        filter: None,
        trigger: sample_windows(10, 100, 3.0, 1.0),
    })
    .unwrap();

    let reference = parse_timestamp("1970-01-19T20:25:00").unwrap();
    let detections = pipeline.detect(&series, reference, "pulse").unwrap();

    assert_eq!(detections.len(), 1);
    let d = &detections[0];
    assert!(
        (395..=405).contains(&d.onset_index),
        "onset index {} outside [395, 405]",
        d.onset_index
    );
    assert!((d.max_amplitude - 10.0).abs() < 1e-9);
    assert!((d.relative_onset_time_seconds - 4.0).abs() < 1e-9);
    assert_eq!(d.absolute_onset_iso(), "1970-01-19T20:25:04.000000");
}

#[test]
fn test_filtered_burst_end_to_end() {
    let fs = 100.0;
    let len = 3000;
    let burst = test_signals::sine_wave(100, fs, 5.0, 10.0);
    let clean: Vec<f64> = (0..len)
        .map(|i| if (1500..1600).contains(&i) { burst[i - 1500] } else { 0.0 })
        .collect();
    let noisy = apply_noise(
        &clean,
        &NoiseConfig::default().with_seed(7).with_gaussian(0.1),
        fs,
    )
    .unwrap();
    let series = TimeSeries::from_uniform(noisy, fs, 0.0).unwrap();

    let pipeline = DetectionPipeline::new(DetectionConfig {
        filter: Some(FilterConfig::new(1.0, 20.0, 4)),
        trigger: sample_windows(20, 200, 4.0, 1.5),
    })
    .unwrap();
    let output = pipeline
        .run(&series, parse_timestamp("1970-01-01T00:00:00").unwrap(), "burst")
        .unwrap();

    assert_eq!(output.filtered.len(), len);
    assert_eq!(output.characteristic.len(), len);
    assert_eq!(output.detections.len(), 1, "windows: {:?}", output.windows);
    let onset = output.detections[0].onset_index;
    assert!((1450..=1520).contains(&onset), "onset {}", onset);
}

#[test]
fn test_characteristic_length_matches_input() {
    for len in [10, 101, 997] {
        let samples = test_signals::sine_wave(len, 50.0, 3.0, 1.0);
        let lta = len / 2;
        let sta = (lta / 4).max(1);
        let cf = classic_sta_lta(&samples, sta, lta).unwrap();
        assert_eq!(cf.len(), len);
    }
}

#[test]
fn test_trigger_windows_ordered_and_disjoint() {
    for seed in 0..20 {
        let noise = NoiseConfig::default()
            .with_seed(seed)
            .with_gaussian(1.0)
            .with_impulse(2.0, 8.0, 5);
        let cf: Vec<f64> = apply_noise(&vec![0.0; 2000], &noise, 100.0)
            .unwrap()
            .into_iter()
            .map(f64::abs)
            .collect();

        for policy in [TrailingPolicy::Close, TrailingPolicy::Discard] {
            let windows = TriggerDetector::new(3.0, 1.0)
                .unwrap()
                .with_trailing_policy(policy)
                .detect(&cf);

            for w in &windows {
                assert!(w.onset_index < w.offset_index, "seed {}: {:?}", seed, w);
                assert!(w.offset_index < cf.len());
            }
            for pair in windows.windows(2) {
                assert!(
                    pair[0].offset_index < pair[1].onset_index,
                    "seed {}: {:?} overlaps {:?}",
                    seed,
                    pair[0],
                    pair[1]
                );
            }
        }
    }
}

#[test]
fn test_trigger_examples() {
    let cf = [0.0, 0.0, 5.0, 5.0, 5.0, 1.0, 1.0, 0.0];
    assert_eq!(
        trigger_onset(&cf, 4.0, 2.0).unwrap(),
        vec![TriggerWindow::new(2, 5)]
    );

    let trailing = [0.0, 5.0, 5.0, 5.0];
    assert_eq!(
        trigger_onset(&trailing, 4.0, 2.0).unwrap(),
        vec![TriggerWindow::new(1, 3)]
    );
}

#[test]
fn test_extraction_range_clamps_at_start() {
    assert_eq!(extraction_range(0, 10, 100), 0..=5);
}

#[test]
fn test_inverted_thresholds_rejected() {
    let err = DetectionPipeline::new(DetectionConfig {
        filter: None,
        trigger: sample_windows(10, 100, 1.0, 2.0),
    })
    .err()
    .unwrap();
    assert!(matches!(err, DetectError::InvalidThresholds { on, off } if on == 1.0 && off == 2.0));

    assert!(matches!(
        trigger_onset(&[0.0, 5.0], 1.0, 2.0),
        Err(DetectError::InvalidThresholds { .. })
    ));
}

#[test]
fn test_default_filter_frequency_response() {
    let fs = 6.625;
    let len = 4000;
    let config = FilterConfig::default();
    let middle = len / 4..3 * len / 4;

    let in_band = test_signals::sine_wave(len, fs, 1.2, 1.0);
    let out = bandpass_filter(&in_band, &config, fs).unwrap();
    let ratio = rms(&out[middle.clone()]) / rms(&in_band[middle.clone()]);
    assert!((ratio - 1.0).abs() < 0.1, "in-band ratio {}", ratio);

    let below = test_signals::sine_wave(len, fs, 0.1, 1.0);
    let out = bandpass_filter(&below, &config, fs).unwrap();
    let ratio = rms(&out[middle.clone()]) / rms(&below[middle]);
    assert!(ratio < 0.1, "out-of-band ratio {}", ratio);
}

#[test]
fn test_csv_samples_to_detection_rows() {
    let mut csv = String::from("time_abs(%Y-%m-%dT%H:%M:%S.%f),time_rel(sec),velocity(m/s)\n");
    for (i, v) in test_signals::rectangular_pulse(1000, 400, 420, 10.0)
        .iter()
        .enumerate()
    {
        csv.push_str(&format!("x,{},{}\n", i as f64 / 100.0, v));
    }
    let series = parse_series_csv(csv.as_bytes()).unwrap();

    let pipeline = DetectionPipeline::new(DetectionConfig {
        filter: None,
        trigger: sample_windows(10, 100, 3.0, 1.0),
    })
    .unwrap();
    let detections = pipeline
        .detect(
            &series,
            parse_timestamp("1970-03-25T03:32:00").unwrap(),
            "xa.s12.00.mhz.1970-03-25HR00_evid00003",
        )
        .unwrap();

    let mut out = Vec::new();
    write_detections(&mut out, &CsvFormatter, &detections).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("filename,time_abs"));
    assert!(lines[1].starts_with(
        "xa.s12.00.mhz.1970-03-25HR00_evid00003,1970-03-25T03:32:04.000000,"
    ));
}

#[test]
fn test_config_file_drives_pipeline() {
    let config = DetectionConfig::from_toml_str(
        r#"
        [trigger]
        sta = "10smp"
        lta = "100smp"
        threshold_on = 3.0
        threshold_off = 1.0
        "#,
    )
    .unwrap();
    assert!(config.filter.is_some());

    let config = DetectionConfig {
        filter: None,
        ..config
    };
    let pipeline = DetectionPipeline::new(config).unwrap();
    let series = test_signals::pulse_series(1000, 400, 420, 10.0, 100.0);
    let detections = pipeline
        .detect(&series, parse_timestamp("1970-01-01T00:00:00").unwrap(), "pulse")
        .unwrap();
    assert_eq!(detections.len(), 1);
}
