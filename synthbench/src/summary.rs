// SPDX-License-Identifier: Apache-2.0

//! The flat JSON summary written for each synthesis run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::runner::{ensure_parent_dir, ToolRun};
use crate::stat_report::ResourceCounts;
use crate::synthbench_error::{Result, SynthbenchError};

/// Reserved summary key holding the tool's wall-clock time in seconds.
pub const TIME_KEY: &str = "time_s";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl std::fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryValue::Bool(b) => write!(f, "{}", b),
            SummaryValue::Int(i) => write!(f, "{}", i),
            // Debug keeps the `.0` on integral values so floats stay
            // distinguishable from counts.
            SummaryValue::Float(x) => write!(f, "{:?}", x),
            SummaryValue::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for SummaryValue {
    fn from(b: bool) -> Self {
        SummaryValue::Bool(b)
    }
}

impl From<i64> for SummaryValue {
    fn from(i: i64) -> Self {
        SummaryValue::Int(i)
    }
}

impl From<u64> for SummaryValue {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => SummaryValue::Int(i),
            Err(_) => SummaryValue::Float(u as f64),
        }
    }
}

impl From<f64> for SummaryValue {
    fn from(x: f64) -> Self {
        SummaryValue::Float(x)
    }
}

impl From<&str> for SummaryValue {
    fn from(s: &str) -> Self {
        SummaryValue::Str(s.to_string())
    }
}

impl From<String> for SummaryValue {
    fn from(s: String) -> Self {
        SummaryValue::Str(s)
    }
}

/// Caller-supplied metadata merged into a summary, e.g. `tool` and `name`.
pub type ExtraFields = BTreeMap<String, SummaryValue>;

/// Builds an [`ExtraFields`] map from `(key, value)` pairs.
pub fn extra_fields<K, V, I>(pairs: I) -> ExtraFields
where
    K: Into<String>,
    V: Into<SummaryValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Adds `key` to `fields`, failing if it is already present.
pub fn insert_extra_field(
    fields: &mut ExtraFields,
    key: impl Into<String>,
    value: SummaryValue,
) -> Result<()> {
    let key = key.into();
    if fields.contains_key(&key) {
        return Err(SynthbenchError::SummaryFieldCollision { field: key });
    }
    fields.insert(key, value);
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(BTreeMap<String, SummaryValue>);

impl Summary {
    /// Adds a field that must not already be present.
    pub fn insert_new(&mut self, key: impl Into<String>, value: SummaryValue) -> Result<()> {
        let key = key.into();
        if self.0.contains_key(&key) {
            return Err(SynthbenchError::SummaryFieldCollision { field: key });
        }
        self.0.insert(key, value);
        Ok(())
    }

    /// Adds or replaces a field, returning the previous value.
    pub fn replace(&mut self, key: impl Into<String>, value: SummaryValue) -> Option<SummaryValue> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&SummaryValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SummaryValue)> {
        self.0.iter()
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(&self.0)
            .map_err(|e| SynthbenchError::Parse(format!("failed to serialize summary: {}", e)))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            SynthbenchError::Parse(format!("summary is not a flat JSON object: {}", e))
        })
    }

    pub fn read_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SynthbenchError::io(format!("failed to read summary {}", path.display()), e)
        })?;
        serde_json::from_str(&text).map_err(|e| {
            SynthbenchError::Parse(format!(
                "summary {} is not a flat JSON object: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        std::fs::write(path, self.to_json_string()?).map_err(|e| {
            SynthbenchError::io(format!("failed to write summary {}", path.display()), e)
        })
    }
}

/// Merges resource counts, the elapsed time, and extra fields into a summary.
///
/// Any key appearing in more than one source is a `SummaryFieldCollision`.
pub fn assemble_summary(
    counts: &ResourceCounts,
    elapsed_s: f64,
    extra: &ExtraFields,
) -> Result<Summary> {
    let mut summary = Summary::default();
    for (name, count) in counts {
        summary.insert_new(name.clone(), SummaryValue::from(*count))?;
    }
    summary.insert_new(TIME_KEY, SummaryValue::Float(elapsed_s))?;
    for (key, value) in extra {
        summary.insert_new(key.clone(), value.clone())?;
    }
    Ok(summary)
}

/// Writes `summary` as a flat JSON object, creating parent directories.
pub fn write_summary_json(summary: &Summary, path: &Path) -> Result<()> {
    summary.write_json(path)
}

/// Assembles the summary for a finished tool run and persists it.
pub(crate) fn write_run_summary(
    counts: &ResourceCounts,
    run: &ToolRun,
    extra: &ExtraFields,
    summary_path: &Path,
) -> Result<Summary> {
    let summary = assemble_summary(counts, run.elapsed.as_secs_f64(), extra)?;
    write_summary_json(&summary, summary_path)?;
    log::info!("Wrote summary to {}", summary_path.display());
    Ok(summary)
}
