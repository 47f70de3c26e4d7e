use anyhow::{Context, Result};
use clap::Parser;
use quaketrigger::TimeSeries;
use quaketrigger::catalog::{format_timestamp, parse_timestamp};
use quaketrigger::series_io::write_series_csv;
use quaketrigger::simulation::{
    AdditiveNoiseConfig, NoiseConfig, SyntheticEvent, generate_noisy_series,
};
use serde::Deserialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate_series")]
#[command(about = "Generate synthetic velocity traces with planted events for detector testing")]
struct Args {
    /// TOML scenario file (events and noise)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Event onsets in seconds, comma-separated (used when the scenario has no events)
    #[arg(short, long, default_value = "600")]
    events: String,

    /// Peak event amplitude for --events
    #[arg(long, default_value_t = 1.0)]
    amplitude: f64,

    /// Number of noise realisations per scenario
    #[arg(short, long, default_value_t = 1)]
    trials: u32,

    /// Base seed for reproducibility
    #[arg(short, long)]
    seed: Option<u64>,

    /// Trace duration in seconds
    #[arg(short, long, default_value_t = 1800.0)]
    duration: f64,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 6.625)]
    sample_rate: f64,

    /// Absolute time of relative time zero
    #[arg(long, default_value = "1970-01-01T00:00:00")]
    reference_time: String,

    /// Output filename prefix
    #[arg(long, default_value = "synth")]
    prefix: String,

    /// Gaussian noise standard deviation (CLI override)
    #[arg(long)]
    noise: Option<f64>,

    /// Generate manifest.json with the planted onsets
    #[arg(long)]
    manifest: bool,
}

#[derive(Debug, Deserialize, Default)]
struct Scenario {
    #[serde(default)]
    events: Vec<SyntheticEvent>,
    #[serde(default)]
    noise: NoiseConfig,
}

#[derive(Debug, serde::Serialize)]
struct ManifestEntry {
    file: String,
    trial: u32,
    seed: u64,
    onsets: Vec<f64>,
}

#[derive(Debug, serde::Serialize)]
struct Manifest {
    sample_rate: f64,
    duration: f64,
    reference_time: String,
    files: Vec<ManifestEntry>,
}

fn parse_onsets(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .filter(|p| !p.trim().is_empty())
        .map(|p| p.trim().parse::<f64>().context("Invalid onset value"))
        .collect()
}

fn load_scenario(path: &PathBuf) -> Result<Scenario> {
    let content = fs::read_to_string(path).context("Failed to read scenario file")?;
    toml::from_str(&content).context("Failed to parse scenario file")
}

fn build_events(scenario: &Scenario, args: &Args) -> Result<Vec<SyntheticEvent>> {
    if !scenario.events.is_empty() {
        return Ok(scenario.events.clone());
    }
    // Defaults sit inside the usual 0.8-2.0 Hz detection band.
    Ok(parse_onsets(&args.events)?
        .into_iter()
        .map(|onset| SyntheticEvent::new(onset, args.amplitude, 1.2, 60.0).with_rise(5.0))
        .collect())
}

fn build_noise_config(scenario: &Scenario, args: &Args, seed: u64) -> NoiseConfig {
    let mut config = scenario.noise.clone().with_seed(seed);
    if let Some(std_dev) = args.noise {
        config.additive = Some(AdditiveNoiseConfig { std_dev });
    } else if config.additive.is_none() {
        config.additive = Some(AdditiveNoiseConfig {
            std_dev: args.amplitude * 0.05,
        });
    }
    config
}

fn write_catalog(path: &PathBuf, stems: &[String], reference: &str) -> Result<()> {
    let mut writer = BufWriter::new(fs::File::create(path).context("Failed to create catalog")?);
    writeln!(writer, "filename,time_abs(%Y-%m-%dT%H:%M:%S.%f),time_rel(sec)")?;
    for stem in stems {
        writeln!(writer, "{},{},0.0", stem, reference)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    let scenario = match args.config {
        Some(ref path) => load_scenario(path)?,
        None => Scenario::default(),
    };
    let events = build_events(&scenario, &args)?;
    let reference_time = parse_timestamp(&args.reference_time).context("Invalid --reference-time")?;
    let base_seed = args.seed.unwrap_or(0);

    let mut manifest_entries = Vec::new();
    let mut stems = Vec::new();

    for trial in 0..args.trials {
        let seed = base_seed + trial as u64;
        let noise_config = build_noise_config(&scenario, &args, seed);

        let series: TimeSeries =
            generate_noisy_series(args.duration, args.sample_rate, &events, &noise_config)
                .context("Failed to generate trace")?;

        let stem = format!("{}_t{:02}", args.prefix, trial);
        let filepath = args.output_dir.join(format!("{}.csv", stem));
        let mut writer = BufWriter::new(
            fs::File::create(&filepath)
                .with_context(|| format!("Failed to create {}", filepath.display()))?,
        );
        write_series_csv(&mut writer, &series, reference_time)?;
        writer.flush()?;

        manifest_entries.push(ManifestEntry {
            file: format!("{}.csv", stem),
            trial,
            seed,
            onsets: events.iter().map(|e| e.onset_seconds).collect(),
        });
        stems.push(stem);
        eprint!("\rGenerating: {}/{}", trial + 1, args.trials);
    }
    eprintln!();

    let reference = format_timestamp(&reference_time);
    let catalog_path = args.output_dir.join("catalog.csv");
    write_catalog(&catalog_path, &stems, &reference)?;
    eprintln!("Catalog written to: {}", catalog_path.display());

    if args.manifest {
        let manifest = Manifest {
            sample_rate: args.sample_rate,
            duration: args.duration,
            reference_time: reference,
            files: manifest_entries,
        };
        let manifest_path = args.output_dir.join("manifest.json");
        let manifest_json =
            serde_json::to_string_pretty(&manifest).context("Failed to serialize manifest")?;
        fs::write(&manifest_path, manifest_json).context("Failed to write manifest")?;
        eprintln!("Manifest written to: {}", manifest_path.display());
    }

    eprintln!(
        "Generated {} files in {}",
        args.trials,
        args.output_dir.display()
    );
    Ok(())
}
