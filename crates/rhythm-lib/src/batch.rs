use crate::{
    config::AnalysisConfig,
    io::{
        combine::combine_label,
        text::{read_signal, subject_output_path, write_intervals, SkippedLine},
    },
    metrics::rhythm::{analyze_signal, RhythmLabel, SegmentCounts},
};
use anyhow::{Context, Result};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Label order used when writing combined files.
pub const COMBINE_ORDER: [RhythmLabel; 3] = [
    RhythmLabel::Normal,
    RhythmLabel::Tachycardia,
    RhythmLabel::Bradycardia,
];

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub input: PathBuf,
    pub samples: usize,
    pub skipped_lines: Vec<SkippedLine>,
    pub beats: usize,
    pub counts: SegmentCounts,
    pub outputs: Vec<PathBuf>,
}

impl SubjectReport {
    pub fn output_for(&self, label: RhythmLabel) -> Option<&Path> {
        let position = RhythmLabel::ALL.iter().position(|l| *l == label)?;
        self.outputs.get(position).map(PathBuf::as_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedSubject {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub subjects: Vec<SubjectReport>,
    pub failed: Vec<FailedSubject>,
    pub combined: Vec<PathBuf>,
}

/// Load one recording, analyze it, and write its three per-label interval files.
pub fn process_subject(
    input: &Path,
    out_dir: Option<&Path>,
    config: &AnalysisConfig,
) -> Result<SubjectReport> {
    let loaded = read_signal(input)?;
    let analysis = analyze_signal(&loaded.signal, &config.detector, &config.classifier)
        .with_context(|| format!("analyzing {}", input.display()))?;

    let mut outputs = Vec::with_capacity(RhythmLabel::ALL.len());
    for (label, intervals) in analysis.segments.iter() {
        let path = subject_output_path(input, label, out_dir);
        write_intervals(&path, intervals)?;
        outputs.push(path);
    }

    let counts = analysis.segments.counts();
    info!(
        "{}: {} samples ({} skipped), {} beats, brady={} normal={} tachy={}",
        input.display(),
        loaded.signal.len(),
        loaded.skipped.len(),
        analysis.beats.len(),
        counts.bradycardia,
        counts.normal,
        counts.tachycardia
    );

    Ok(SubjectReport {
        input: input.to_path_buf(),
        samples: loaded.signal.len(),
        skipped_lines: loaded.skipped,
        beats: analysis.beats.len(),
        counts,
        outputs,
    })
}

/// Process subjects in order. Without `keep_going` the first failure aborts the run.
pub fn process_subjects<P: AsRef<Path>>(
    inputs: &[P],
    out_dir: Option<&Path>,
    config: &AnalysisConfig,
    keep_going: bool,
) -> Result<BatchReport> {
    config.validate()?;
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut report = BatchReport::default();
    for input in inputs {
        let input = input.as_ref();
        match process_subject(input, out_dir, config) {
            Ok(subject) => report.subjects.push(subject),
            Err(err) if keep_going => {
                error!("skipping {}: {:#}", input.display(), err);
                report.failed.push(FailedSubject {
                    input: input.to_path_buf(),
                    error: format!("{:#}", err),
                });
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}

/// Process every subject, then merge each label's files across subjects.
///
/// Combined files go to `out_dir`, or the working directory when none is given.
pub fn run_batch<P: AsRef<Path>>(
    inputs: &[P],
    out_dir: Option<&Path>,
    config: &AnalysisConfig,
    keep_going: bool,
) -> Result<BatchReport> {
    let mut report = process_subjects(inputs, out_dir, config, keep_going)?;
    let combine_dir = out_dir.unwrap_or_else(|| Path::new("."));
    let processed: Vec<&Path> = report.subjects.iter().map(|s| s.input.as_path()).collect();

    let mut combined = Vec::with_capacity(COMBINE_ORDER.len());
    for label in COMBINE_ORDER {
        let sources: Vec<PathBuf> = report
            .subjects
            .iter()
            .filter_map(|s| s.output_for(label).map(Path::to_path_buf))
            .collect();
        let path = combine_label(combine_dir, &processed, &sources, label)?;
        info!("combined {} file(s) into {}", sources.len(), path.display());
        combined.push(path);
    }
    report.combined = combined;
    Ok(report)
}

/// Persist a batch report as pretty JSON.
pub fn write_report(path: &Path, report: &BatchReport) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
