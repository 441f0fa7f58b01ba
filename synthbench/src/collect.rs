// SPDX-License-Identifier: Apache-2.0

//! Gathering per-run summaries into a single table.

use std::path::{Path, PathBuf};

use crate::runner::ensure_parent_dir;
use crate::summary::{Summary, SummaryValue};
use crate::synthbench_error::{Result, SynthbenchError};

/// Merges the summaries at `json_paths` into one CSV at `output_csv`.
///
/// Paths that do not exist are skipped, so a partially completed run still
/// produces a table. Columns are the union of all keys in first-seen order;
/// fields a summary lacks are left blank. Returns the number of rows written.
pub fn collect_summaries_to_csv(json_paths: &[PathBuf], output_csv: &Path) -> Result<usize> {
    let mut summaries = Vec::new();
    for path in json_paths {
        if !path.exists() {
            log::warn!("Skipping missing summary {}", path.display());
            continue;
        }
        summaries.push(Summary::read_json(path)?);
    }

    let mut columns: Vec<&str> = Vec::new();
    for summary in &summaries {
        for (key, _) in summary.iter() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    ensure_parent_dir(output_csv)?;
    let csv_error = |e: csv::Error| {
        SynthbenchError::Parse(format!("failed to write {}: {}", output_csv.display(), e))
    };
    let mut writer = csv::Writer::from_path(output_csv).map_err(csv_error)?;
    // An empty header record would make the csv crate emit a blank line.
    if !columns.is_empty() {
        writer.write_record(&columns).map_err(csv_error)?;
    }
    for summary in &summaries {
        let row: Vec<String> = columns
            .iter()
            .map(|column| {
                summary
                    .get(column)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| {
        SynthbenchError::io(format!("failed to flush {}", output_csv.display()), e)
    })?;
    log::info!(
        "Collected {} of {} summaries into {}",
        summaries.len(),
        json_paths.len(),
        output_csv.display()
    );
    Ok(summaries.len())
}

/// Identifies which run of which experiment a summary came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAnnotation {
    pub iteration: u32,
    pub identifier: String,
    pub architecture: String,
    pub tool: String,
}

/// Reads the summary at `json_in`, adds the fields of `annotation`, and
/// writes the result to `json_out`.
///
/// `iteration`, `architecture` and `tool` must not already be present. An
/// existing `identifier` is replaced.
pub fn annotate_summary(
    json_in: &Path,
    json_out: &Path,
    annotation: &RunAnnotation,
) -> Result<Summary> {
    let mut summary = Summary::read_json(json_in)?;
    summary.insert_new("iteration", SummaryValue::from(i64::from(annotation.iteration)))?;
    if let Some(previous) = summary.replace(
        "identifier",
        SummaryValue::from(annotation.identifier.as_str()),
    ) {
        log::warn!(
            "Overwriting identifier {} in {} with {}",
            previous,
            json_in.display(),
            annotation.identifier
        );
    }
    summary.insert_new(
        "architecture",
        SummaryValue::from(annotation.architecture.as_str()),
    )?;
    summary.insert_new("tool", SummaryValue::from(annotation.tool.as_str()))?;
    summary.write_json(json_out)?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, name: &str, json: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_union_of_columns_with_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.json", r#"{"LUT6": 3, "time_s": 1.5, "tool": "vivado"}"#);
        let b = write(dir.path(), "b.json", r#"{"CARRY4": 1, "time_s": 0.5, "tool": "yosys"}"#);
        let out = dir.path().join("out").join("all.csv");
        let rows = collect_summaries_to_csv(&[a, b], &out).unwrap();
        assert_eq!(rows, 2);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "LUT6,time_s,tool,CARRY4\n3,1.5,vivado,\n,0.5,yosys,1\n"
        );
    }

    #[test]
    fn test_integral_float_keeps_fraction() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.json", r#"{"DFF": 2, "time_s": 2.0}"#);
        let out = dir.path().join("all.csv");
        collect_summaries_to_csv(&[a], &out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "DFF,time_s\n2,2.0\n");
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.json", r#"{"DFF": 2}"#);
        let missing = dir.path().join("never_written.json");
        let out = dir.path().join("all.csv");
        let rows = collect_summaries_to_csv(&[missing, a], &out).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "DFF\n2\n");
    }

    #[test]
    fn test_no_summaries_writes_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("all.csv");
        assert_eq!(collect_summaries_to_csv(&[], &out).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn test_malformed_summary_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.json", "not json");
        let err = collect_summaries_to_csv(&[bad], &dir.path().join("all.csv")).unwrap_err();
        assert!(matches!(err, SynthbenchError::Parse(_)), "got {:?}", err);
    }

    fn annotation() -> RunAnnotation {
        RunAnnotation {
            iteration: 2,
            identifier: "mul8".to_string(),
            architecture: "xilinx-ultrascale-plus".to_string(),
            tool: "vivado".to_string(),
        }
    }

    #[test]
    fn test_annotate_adds_fields() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "in.json", r#"{"LUT6": 3, "time_s": 1.5}"#);
        let output = dir.path().join("collected").join("out.json");
        annotate_summary(&input, &output, &annotation()).unwrap();
        let got = Summary::read_json(&output).unwrap();
        assert_eq!(got.get("iteration"), Some(&SummaryValue::Int(2)));
        assert_eq!(got.get("identifier"), Some(&SummaryValue::from("mul8")));
        assert_eq!(
            got.get("architecture"),
            Some(&SummaryValue::from("xilinx-ultrascale-plus"))
        );
        assert_eq!(got.get("tool"), Some(&SummaryValue::from("vivado")));
        assert_eq!(got.get("LUT6"), Some(&SummaryValue::Int(3)));
    }

    #[test]
    fn test_annotate_overwrites_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "in.json", r#"{"identifier": "old"}"#);
        let output = dir.path().join("out.json");
        let got = annotate_summary(&input, &output, &annotation()).unwrap();
        assert_eq!(got.get("identifier"), Some(&SummaryValue::from("mul8")));
    }

    #[test]
    fn test_annotate_rejects_existing_tool() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "in.json", r#"{"tool": "yosys"}"#);
        let output = dir.path().join("out.json");
        let err = annotate_summary(&input, &output, &annotation()).unwrap_err();
        assert!(matches!(
            err,
            SynthbenchError::SummaryFieldCollision { ref field } if field == "tool"
        ));
        assert!(!output.exists());
    }
}
