use crate::metrics::rhythm::RhythmLabel;
use anyhow::{Context, Result};
use log::warn;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

/// Line written between the blocks copied from consecutive subjects.
pub const BLOCK_SEPARATOR: &str = "**************";

/// `<Label>-Person-<n>-<m>.txt`, one `-<n>` for each input stem that contains a digit.
///
/// `<n>` is the tail of the stem starting at its first digit.
pub fn combined_output_name<P: AsRef<Path>>(inputs: &[P], label: RhythmLabel) -> String {
    let mut name = format!("{}-Person", label);
    for input in inputs {
        let stem = input
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(pos) = stem.find(|c: char| c.is_ascii_digit()) {
            name.push('-');
            name.push_str(&stem[pos..]);
        }
    }
    name.push_str(".txt");
    name
}

/// Concatenate `sources` into `output`, separating blocks with [`BLOCK_SEPARATOR`].
///
/// Unreadable sources are skipped with a warning and add no separator. Returns how many
/// sources were copied.
pub fn combine_files<P: AsRef<Path>>(output: &Path, sources: &[P]) -> Result<usize> {
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    let mut copied = 0usize;

    for source in sources {
        let source = source.as_ref();
        let text = match fs::read_to_string(source) {
            Ok(text) => text,
            Err(err) => {
                warn!("skipping {}: {}", source.display(), err);
                continue;
            }
        };
        if copied > 0 {
            writeln!(writer, "{}", BLOCK_SEPARATOR)?;
        }
        for line in text.lines() {
            writeln!(writer, "{}", line)?;
        }
        copied += 1;
    }

    writer
        .flush()
        .with_context(|| format!("failed to write {}", output.display()))?;
    Ok(copied)
}

/// Combine the per-subject files of one label into `<dir>/<combined name>`.
pub fn combine_label<P: AsRef<Path>>(
    dir: &Path,
    inputs: &[P],
    subject_outputs: &[PathBuf],
    label: RhythmLabel,
) -> Result<PathBuf> {
    let output = dir.join(combined_output_name(inputs, label));
    combine_files(&output, subject_outputs)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_combined_files_after_subject_numbers() {
        let inputs = ["Person1.txt", "Person3.txt"];
        assert_eq!(
            combined_output_name(&inputs, RhythmLabel::Normal),
            "Normal-Person-1-3.txt"
        );
        let inputs = ["data/subject12b.dat", "nodigits.txt", "p7"];
        assert_eq!(
            combined_output_name(&inputs, RhythmLabel::Bradycardia),
            "Bradycardia-Person-12b-7.txt"
        );
    }

    #[test]
    fn separates_blocks_and_skips_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let missing = dir.path().join("missing.txt");
        fs::write(&a, "1.000000 2.000000\n2.000000 3.000000\n").unwrap();
        fs::write(&b, "5.000000 5.500000\n").unwrap();

        let out = dir.path().join("combined.txt");
        let copied = combine_files(&out, &[missing.clone(), a, missing, b]).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "1.000000 2.000000\n2.000000 3.000000\n**************\n5.000000 5.500000\n"
        );
    }

    #[test]
    fn empty_blocks_still_get_separators() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "").unwrap();
        fs::write(&b, "").unwrap();
        let out = dir.path().join("combined.txt");
        combine_files(&out, &[a, b]).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "**************\n");
    }

    #[test]
    fn unwritable_destination_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no-such-dir").join("combined.txt");
        assert!(combine_files::<PathBuf>(&out, &[]).is_err());
    }
}
