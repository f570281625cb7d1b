use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::info;
use rhythm_lib::{
    batch::{process_subjects, run_batch, write_report},
    config::{read_config, AnalysisConfig},
    io::{
        combine::{combine_files, combined_output_name},
        text::subject_output_path,
    },
    metrics::rhythm::RhythmLabel,
    synth::{synthesize, SynthConfig},
};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(
    name = "rhythm",
    version,
    about = "Detect R-peaks in ECG recordings and split RR intervals by rhythm"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LabelArg {
    Normal,
    Tachycardia,
    Bradycardia,
}

impl From<LabelArg> for RhythmLabel {
    fn from(label: LabelArg) -> Self {
        match label {
            LabelArg::Normal => RhythmLabel::Normal,
            LabelArg::Tachycardia => RhythmLabel::Tachycardia,
            LabelArg::Bradycardia => RhythmLabel::Bradycardia,
        }
    }
}

/// Options shared by `analyze` and `batch`.
#[derive(Args)]
struct AnalysisArgs {
    /// Two-column `time voltage` recordings
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Directory for result files (defaults to next to each input)
    #[arg(long)]
    out_dir: Option<PathBuf>,
    /// TOML file with [detector] and [classifier] tables
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    interval_size: Option<f64>,
    #[arg(long)]
    step_size: Option<f64>,
    #[arg(long)]
    min_rr: Option<f64>,
    #[arg(long)]
    threshold_scale: Option<f64>,
    /// Log unreadable inputs and continue with the rest
    #[arg(long)]
    keep_going: bool,
}

impl AnalysisArgs {
    fn config(&self) -> Result<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => read_config(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(v) = self.interval_size {
            cfg.detector.interval_size_s = v;
        }
        if let Some(v) = self.step_size {
            cfg.detector.step_size_s = v;
        }
        if let Some(v) = self.min_rr {
            cfg.detector.min_rr_s = v;
        }
        if let Some(v) = self.threshold_scale {
            cfg.detector.threshold_scale = v;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write <stem>-<Label>.txt interval files for each recording and print a JSON report per subject
    Analyze(AnalysisArgs),
    /// Concatenate result files into one, separated by a marker line
    Combine {
        #[arg(long, value_enum)]
        label: Option<LabelArg>,
        /// Destination file; derived from the inputs when only --label is given
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Subject recordings (with --label) or result files (with --out)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Analyze every recording, then combine results per label
    Batch {
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Also write the JSON report to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Generate a synthetic two-column recording
    Synth {
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 250.0)]
        fs: f64,
        /// RR intervals in seconds (repeatable)
        #[arg(long = "rr", num_args = 1.., default_values_t = vec![1.0, 1.0, 1.0, 1.0])]
        rr: Vec<f64>,
        #[arg(long, default_value_t = 0.5)]
        lead_in: f64,
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    match cli.command {
        Commands::Analyze(args) => cmd_analyze(&args)?,
        Commands::Combine {
            label,
            out,
            out_dir,
            inputs,
        } => cmd_combine(label, out.as_deref(), out_dir.as_deref(), &inputs)?,
        Commands::Batch { analysis, report } => cmd_batch(&analysis, report.as_deref())?,
        Commands::Synth {
            out,
            fs,
            rr,
            lead_in,
            noise,
            seed,
        } => cmd_synth(
            &out,
            SynthConfig {
                fs,
                rr_s: rr,
                lead_in_s: lead_in,
                noise_amplitude: noise,
                seed,
                ..SynthConfig::default()
            },
        )?,
    }
    Ok(())
}

fn cmd_analyze(args: &AnalysisArgs) -> Result<()> {
    let cfg = args.config()?;
    let report = process_subjects(&args.inputs, args.out_dir.as_deref(), &cfg, args.keep_going)?;
    for subject in &report.subjects {
        println!("{}", serde_json::to_string(subject)?);
    }
    if !report.failed.is_empty() {
        bail!("{} of {} input(s) failed", report.failed.len(), args.inputs.len());
    }
    Ok(())
}

fn cmd_combine(
    label: Option<LabelArg>,
    out: Option<&Path>,
    out_dir: Option<&Path>,
    inputs: &[PathBuf],
) -> Result<()> {
    let (destination, sources) = match (label, out) {
        // Explicit destination: inputs are already result files.
        (_, Some(out)) => (out.to_path_buf(), inputs.to_vec()),
        // Label only: derive both per-subject result names and the combined name from recordings.
        (Some(label), None) => {
            let label = RhythmLabel::from(label);
            let dir = out_dir.unwrap_or_else(|| Path::new("."));
            let sources: Vec<PathBuf> = inputs
                .iter()
                .map(|input| subject_output_path(input, label, out_dir))
                .collect();
            (dir.join(combined_output_name(inputs, label)), sources)
        }
        (None, None) => bail!("combine needs --out or --label"),
    };
    let copied = combine_files(&destination, &sources)?;
    info!("combined {} file(s) into {}", copied, destination.display());
    println!("{}", destination.display());
    Ok(())
}

fn cmd_batch(args: &AnalysisArgs, report_path: Option<&Path>) -> Result<()> {
    let cfg = args.config()?;
    let report = run_batch(&args.inputs, args.out_dir.as_deref(), &cfg, args.keep_going)?;
    if let Some(path) = report_path {
        write_report(path, &report)?;
    }
    println!("{}", serde_json::to_string(&report)?);
    if !report.failed.is_empty() {
        bail!("{} of {} input(s) failed", report.failed.len(), args.inputs.len());
    }
    Ok(())
}

fn cmd_synth(out: &Path, cfg: SynthConfig) -> Result<()> {
    let signal = synthesize(&cfg)?;
    let file = File::create(out).with_context(|| format!("failed to create {}", out.display()))?;
    let mut writer = BufWriter::new(file);
    for (t, v) in signal.time().iter().zip(signal.voltage()) {
        writeln!(writer, "{:.6} {:.6}", t, v)?;
    }
    writer.flush()?;
    info!("wrote {} samples to {}", signal.len(), out.display());
    Ok(())
}
