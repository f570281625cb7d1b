use crate::{
    error::RhythmResult,
    metrics::rhythm::RhythmLabel,
    signal::{RrInterval, Signal},
};
use anyhow::{Context, Result};
use log::warn;
use serde::Serialize;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// A record the reader could not use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// A parsed recording plus the lines dropped along the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedSignal {
    pub signal: Signal,
    pub skipped: Vec<SkippedLine>,
}

/// Parse whitespace-delimited `time voltage` records.
///
/// Empty lines and `#` comments are ignored. Lines without two finite numbers are skipped
/// with a warning; tokens past the second are ignored. When times run backwards, the
/// longest non-decreasing run of records is kept and the rest are skipped as out of order.
pub fn parse_signal(text: &str) -> RhythmResult<LoadedSignal> {
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match parse_record(line) {
            Ok((t, v)) => records.push((idx + 1, t, v)),
            Err(reason) => {
                warn!("skipping line {} ({}): {}", idx + 1, reason, line.trim());
                skipped.push(SkippedLine {
                    line: idx + 1,
                    reason,
                });
            }
        }
    }

    let keep = ordered_subset(&records);
    let mut time = Vec::with_capacity(records.len());
    let mut voltage = Vec::with_capacity(records.len());
    for (&(line, t, v), kept) in records.iter().zip(keep) {
        if kept {
            time.push(t);
            voltage.push(v);
        } else {
            let reason = format!("time {} is out of order", t);
            warn!("skipping line {} ({})", line, reason);
            skipped.push(SkippedLine { line, reason });
        }
    }
    skipped.sort_by_key(|s| s.line);

    Ok(LoadedSignal {
        signal: Signal::new(time, voltage)?,
        skipped,
    })
}

fn parse_record(line: &str) -> std::result::Result<(f64, f64), String> {
    let mut fields = line.split_whitespace();
    let (Some(t), Some(v)) = (fields.next(), fields.next()) else {
        return Err("expected time and voltage".into());
    };
    let t: f64 = t.parse().map_err(|_| format!("time is not a number: {}", t))?;
    let v: f64 = v
        .parse()
        .map_err(|_| format!("voltage is not a number: {}", v))?;
    if !t.is_finite() || !v.is_finite() {
        return Err("non-finite sample".into());
    }
    Ok((t, v))
}

/// Mark the longest subsequence of `records` whose times never decrease.
///
/// Among equally long choices the earliest records are kept.
fn ordered_subset(records: &[(usize, f64, f64)]) -> Vec<bool> {
    let n = records.len();
    // run[i]: length of the longest non-decreasing run starting at record i.
    let mut run = vec![0usize; n];
    // tails[k]: largest start time of a run of length k + 1 seen so far (scanning backwards).
    let mut tails: Vec<f64> = Vec::new();
    for i in (0..n).rev() {
        let t = records[i].1;
        let k = tails.partition_point(|&tail| tail >= t);
        if k == tails.len() {
            tails.push(t);
        } else {
            tails[k] = t;
        }
        run[i] = k + 1;
    }

    let mut keep = vec![false; n];
    let mut need = tails.len();
    let mut floor = f64::NEG_INFINITY;
    for i in 0..n {
        if need == 0 {
            break;
        }
        if run[i] == need && records[i].1 >= floor {
            keep[i] = true;
            floor = records[i].1;
            need -= 1;
        }
    }
    keep
}

/// Read a two-column recording from disk. Only an unreadable file is an error.
pub fn read_signal(path: &Path) -> Result<LoadedSignal> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_signal(&text).with_context(|| format!("failed to load {}", path.display()))
}

/// Render intervals as `start end` lines with six decimals.
pub fn format_intervals(intervals: &[RrInterval]) -> String {
    let mut out = String::with_capacity(intervals.len() * 24);
    for rr in intervals {
        out.push_str(&format!("{:.6} {:.6}\n", rr.start, rr.end));
    }
    out
}

/// Write intervals to `path`, replacing any existing file. An empty list leaves an empty file.
pub fn write_intervals(path: &Path, intervals: &[RrInterval]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(format_intervals(intervals).as_bytes())
        .and_then(|_| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// `<dir>/<input stem>-<Label>.txt`, with `dir` defaulting to the input's own directory.
pub fn subject_output_path(input: &Path, label: RhythmLabel, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{}-{}.txt", stem, label);
    match out_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}
