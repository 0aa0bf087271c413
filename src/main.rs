use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use env_logger::{Builder, Env};
use log::info;
use std::path::{Path, PathBuf};

use fundus_vf::config::{Config, DatasetConfig, EvaluationConfig};
use fundus_vf::dataset::{discover_pairs, PairedDataset, RoleMarkers};
use fundus_vf::error::Error;
use fundus_vf::evaluation::{evaluate, save_workbook, scan_results, ResultMarkers, SsimParams};
use fundus_vf::imaging::processor::save_preview;
use fundus_vf::imaging::{prepare_target, BlendParams};

#[derive(Parser)]
#[command(name = "fundus-vf")]
#[command(version, about = "Fundus photo / visual field pair loader and evaluator", long_about = None)]
struct Cli {
    /// JSON configuration file (fields not given keep their defaults)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log per-sample details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the (input, target) pairs found under DATAROOT/PHASE
    Pairs {
        #[command(flatten)]
        dataset: DatasetArgs,
    },

    /// Load one sample and optionally save its overlay-blended target
    Sample {
        /// Position of the pair in discovery order
        #[arg(value_name = "INDEX")]
        index: usize,

        #[command(flatten)]
        dataset: DatasetArgs,

        /// Overlay image blended into the target
        #[arg(long, value_name = "FILE")]
        overlay: Option<PathBuf>,

        /// Directory to write the blended target PNG to
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Score generated images against ground truth and write a workbook
    Evaluate {
        /// Directory with *_real_B* and *_fake_B* files
        #[arg(short, long, value_name = "DIR")]
        results: Option<PathBuf>,

        /// Workbook path (default: result_<results dir name>.xlsx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// SSIM window size (odd, >= 3)
        #[arg(long, value_name = "N")]
        win_size: Option<usize>,
    },

    /// Print the effective configuration as JSON
    Config,
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset root directory
    #[arg(long, value_name = "DIR")]
    dataroot: Option<PathBuf>,

    /// Split sub-directory (train, test, ...)
    #[arg(long, value_name = "NAME")]
    phase: Option<String>,
}

impl DatasetArgs {
    fn apply(self, cfg: &mut DatasetConfig) {
        if let Some(dataroot) = self.dataroot {
            cfg.dataroot = dataroot;
        }
        if let Some(phase) = self.phase {
            cfg.phase = phase;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Pairs { dataset } => {
            dataset.apply(&mut config.dataset);
            list_pairs(&config.dataset)
        }
        Commands::Sample {
            index,
            dataset,
            overlay,
            out,
        } => {
            dataset.apply(&mut config.dataset);
            if let Some(overlay) = overlay {
                config.dataset.overlay_path = overlay;
            }
            show_sample(&config.dataset, index, out.as_deref())
        }
        Commands::Evaluate {
            results,
            output,
            win_size,
        } => {
            if let Some(results) = results {
                config.evaluation.results_dir = results;
            }
            if output.is_some() {
                config.evaluation.output = output;
            }
            if let Some(win_size) = win_size {
                config.evaluation.ssim_window = win_size;
            }
            run_evaluation(&config.evaluation)
        }
        Commands::Config => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .init();
}

fn list_pairs(cfg: &DatasetConfig) -> Result<()> {
    cfg.validate()?;
    let root = cfg.phase_root();
    let markers = RoleMarkers::new(&cfg.input_marker, &cfg.target_marker);
    let pairs = discover_pairs(&root, &markers).with_context(|| format!("scanning {}", root.display()))?;
    if pairs.is_empty() {
        return Err(Error::EmptyDataset(format!("no pairs under {}", root.display())).into());
    }

    for pair in &pairs {
        println!("{}\t{}", pair.input.display(), pair.target.display());
    }
    info!("📊 {} pairs", pairs.len());
    Ok(())
}

fn show_sample(cfg: &DatasetConfig, index: usize, out: Option<&Path>) -> Result<()> {
    let dataset = PairedDataset::with_default_transform(cfg)?;
    let sample = dataset
        .get(index)
        .with_context(|| format!("loading sample {index}"))?;

    println!("input:  {} {:?}", sample.input_path.display(), sample.input.shape());
    println!("target: {} {:?}", sample.target_path.display(), sample.target.shape());

    if let Some(out) = out {
        let blended = prepare_target(&sample.target_path, &cfg.overlay_path, &BlendParams::from(cfg))?;
        let stem = sample
            .target_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("sample_{index}"));
        let path = out.join(format!("{stem}_blended.png"));
        save_preview(&blended, &path)?;
        info!("📸 Blended target written to {}", path.display());
    }
    Ok(())
}

fn run_evaluation(cfg: &EvaluationConfig) -> Result<()> {
    cfg.validate()?;
    let markers = ResultMarkers {
        real: cfg.real_marker.clone(),
        generated: cfg.generated_marker.clone(),
    };
    let pairs = scan_results(&cfg.results_dir, &markers)?;

    let params = SsimParams::with_window(cfg.ssim_window);
    let report = evaluate(pairs.iter().map(|pair| pair.load()), &params)
        .with_context(|| format!("evaluating {}", cfg.results_dir.display()))?;

    for line in report.summary.console_lines() {
        println!("{line}");
    }

    let output = cfg.output_path();
    save_workbook(&report, &output).with_context(|| format!("writing {}", output.display()))?;
    Ok(())
}
