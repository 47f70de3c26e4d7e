use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use clap::Parser;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use quaketrigger::catalog::{CatalogEntry, load_catalog, parse_timestamp};
use quaketrigger::config::{DetectionConfig, FilterConfig, PadMode, TrailingPolicy, WindowLength};
use quaketrigger::output::{OutputFormat, create_formatter, write_detections, write_traces};
use quaketrigger::series_io::load_series;
use quaketrigger::{DetectionPipeline, DetectionRecord};

#[derive(Parser, Debug)]
#[command(name = "quaketrigger")]
#[command(about = "Detect seismic events in velocity traces with an STA/LTA trigger", long_about = None)]
struct Args {
    /// Sample files to process (CSV with time_rel/velocity columns, or WAV)
    files: Vec<PathBuf>,

    /// Event catalog; each row names a sample file and its reference time
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory holding the sample files named in the catalog
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Process only this catalog row (0-based)
    #[arg(long)]
    row: Option<usize>,

    /// Reference time for positional files (%Y-%m-%dT%H:%M:%S.%f)
    #[arg(long, default_value = "1970-01-01T00:00:00")]
    reference_time: String,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Band-pass lower cutoff in Hz
    #[arg(long)]
    low: Option<f64>,

    /// Band-pass upper cutoff in Hz
    #[arg(long)]
    high: Option<f64>,

    /// Butterworth prototype order
    #[arg(long)]
    order: Option<usize>,

    /// Edge padding for zero-phase filtering
    #[arg(long, value_enum)]
    pad_mode: Option<PadMode>,

    /// Skip the band-pass stage
    #[arg(long)]
    no_filter: bool,

    /// STA window (e.g. "120s", "120", "795smp")
    #[arg(long)]
    sta: Option<WindowLength>,

    /// LTA window (e.g. "600s", "3975smp")
    #[arg(long)]
    lta: Option<WindowLength>,

    /// Trigger-on threshold
    #[arg(long)]
    on: Option<f64>,

    /// Trigger-off threshold
    #[arg(long)]
    off: Option<f64>,

    /// Handling of a trigger still open at the end of a trace
    #[arg(long, value_enum)]
    trailing: Option<TrailingPolicy>,

    /// Output format: csv, json, text
    #[arg(short = 'f', long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Write detections here instead of stdout (parent directories are created)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Write per-sample raw/filtered/cf traces into this directory
    #[arg(long)]
    traces: Option<PathBuf>,

    /// Number of files processed in parallel
    #[arg(short = 'j', long, default_value = "1")]
    jobs: usize,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

struct Job {
    path: PathBuf,
    source_id: String,
    reference_time: NaiveDateTime,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;
    let pipeline = DetectionPipeline::new(config).context("Invalid detection configuration")?;

    let jobs = collect_jobs(&args)?;
    if jobs.is_empty() {
        anyhow::bail!("No input files; pass sample files or --catalog");
    }

    if let Some(ref dir) = args.traces {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create trace directory {}", dir.display()))?;
    }

    let results = run_jobs(&pipeline, &jobs, args.jobs.max(1), args.traces.as_deref());

    let mut detections = Vec::new();
    let mut failures = 0;
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(records) => detections.extend(records),
            Err(e) => {
                log::error!("{}: {:#}", job.path.display(), e);
                failures += 1;
            }
        }
    }

    let formatter = create_formatter(args.format, args.verbose > 0);
    match args.output {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let file = fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_detections(&mut writer, formatter.as_ref(), &detections)?;
            writer.flush()?;
            log::info!("wrote {} detection(s) to {}", detections.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_detections(&mut writer, formatter.as_ref(), &detections)?;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) failed", failures, jobs.len());
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<DetectionConfig> {
    let mut config = match args.config {
        Some(ref path) => DetectionConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DetectionConfig::default(),
    };

    if args.no_filter {
        config.filter = None;
    } else if args.low.is_some()
        || args.high.is_some()
        || args.order.is_some()
        || args.pad_mode.is_some()
    {
        let filter = config.filter.get_or_insert_with(FilterConfig::default);
        if let Some(low) = args.low {
            filter.low_cutoff_hz = low;
        }
        if let Some(high) = args.high {
            filter.high_cutoff_hz = high;
        }
        if let Some(order) = args.order {
            filter.order = order;
        }
        if let Some(pad_mode) = args.pad_mode {
            filter.pad_mode = pad_mode;
        }
    }

    let trigger = &mut config.trigger;
    if let Some(sta) = args.sta {
        trigger.sta = sta;
    }
    if let Some(lta) = args.lta {
        trigger.lta = lta;
    }
    if let Some(on) = args.on {
        trigger.threshold_on = on;
    }
    if let Some(off) = args.off {
        trigger.threshold_off = off;
    }
    if let Some(trailing) = args.trailing {
        trigger.trailing = trailing;
    }

    Ok(config)
}

fn collect_jobs(args: &Args) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();

    if let Some(ref catalog_path) = args.catalog {
        let entries = load_catalog(catalog_path)
            .with_context(|| format!("Failed to read catalog {}", catalog_path.display()))?;
        let selected: Vec<CatalogEntry> = match args.row {
            Some(row) => vec![
                entries
                    .get(row)
                    .cloned()
                    .with_context(|| format!("Catalog has {} rows, no row {}", entries.len(), row))?,
            ],
            None => entries,
        };
        for entry in selected {
            jobs.push(Job {
                path: resolve_sample_file(&args.data_dir, &entry.filename),
                source_id: entry.filename,
                reference_time: entry.reference_time,
            });
        }
    }

    if !args.files.is_empty() {
        let reference_time = parse_timestamp(&args.reference_time)
            .context("Invalid --reference-time")?;
        for path in &args.files {
            let source_id = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            jobs.push(Job {
                path: path.clone(),
                source_id,
                reference_time,
            });
        }
    }

    Ok(jobs)
}

/// Catalog file names usually omit the extension.
fn resolve_sample_file(data_dir: &Path, filename: &str) -> PathBuf {
    let direct = data_dir.join(filename);
    if direct.extension().is_some() && direct.exists() {
        return direct;
    }
    data_dir.join(format!("{}.csv", filename))
}

fn process_job(
    pipeline: &DetectionPipeline,
    job: &Job,
    traces_dir: Option<&Path>,
) -> Result<Vec<DetectionRecord>> {
    let series = load_series(&job.path)
        .with_context(|| format!("Failed to load {}", job.path.display()))?;
    let output = pipeline.run(&series, job.reference_time, &job.source_id)?;

    if let Some(dir) = traces_dir {
        let path = dir.join(format!("{}_traces.csv", job.source_id));
        let file = fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        write_traces(&mut writer, &series, &output)?;
        writer.flush()?;
    }

    Ok(output.detections)
}

/// Process every job on `workers` threads, returning results in job order.
fn run_jobs(
    pipeline: &DetectionPipeline,
    jobs: &[Job],
    workers: usize,
    traces_dir: Option<&Path>,
) -> Vec<Result<Vec<DetectionRecord>>> {
    if workers == 1 || jobs.len() == 1 {
        return jobs
            .iter()
            .map(|job| process_job(pipeline, job, traces_dir))
            .collect();
    }

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<usize>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded();
    for index in 0..jobs.len() {
        // Receiver outlives this loop, so the send cannot fail.
        let _ = job_tx.send(index);
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers.min(jobs.len()) {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for index in job_rx.iter() {
                    let result = process_job(pipeline, &jobs[index], traces_dir);
                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<Option<Result<Vec<DetectionRecord>>>> =
        (0..jobs.len()).map(|_| None).collect();
    for (index, result) in result_rx.iter() {
        results[index] = Some(result);
    }
    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Err(anyhow::anyhow!("worker exited without a result"))))
        .collect()
}
