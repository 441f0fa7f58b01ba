// SPDX-License-Identifier: Apache-2.0

//! Parser for the cell-count section of a yosys `stat` report.
//!
//! The section of interest looks like:
//!
//! ```text
//!    Number of cells:                  3
//!      DFF                             2
//!      LUT4                            1
//!
//! ```
//!
//! i.e. a header line, one indented `<cell type> <count>` line per cell type,
//! and a terminating blank line.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::synthbench_error::{Result, SynthbenchError};

/// Cell-type name to instance count.
pub type ResourceCounts = BTreeMap<String, u64>;

static CELL_COUNT_HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*Number of cells:\s*(?P<total>\d+)\s*$").unwrap());

static CELL_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s+(?P<name>\w+)\s+(?P<count>\d+)\s*$").unwrap());

/// Extracts the resource counts from a yosys `stat` report.
///
/// Exactly one `Number of cells:` block must be present, and it must be
/// terminated by a blank line.
pub fn parse_stat_report(text: &str) -> Result<ResourceCounts> {
    let lines: Vec<&str> = text.lines().collect();
    let headers: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| CELL_COUNT_HEADER_RE.is_match(line))
        .map(|(i, _)| i)
        .collect();
    if headers.len() != 1 {
        return Err(SynthbenchError::Parse(format!(
            "ambiguous or missing cell-count block; found {} blocks",
            headers.len()
        )));
    }
    let start = headers[0];
    let end = lines[start + 1..]
        .iter()
        .position(|line| line.trim().is_empty())
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| {
            SynthbenchError::Parse(
                "cell-count block is not terminated by a blank line".to_string(),
            )
        })?;

    let mut counts = ResourceCounts::new();
    for line in &lines[start + 1..end] {
        let Some(caps) = CELL_LINE_RE.captures(line) else {
            log::debug!("parse_stat_report; skipping line: {:?}", line);
            continue;
        };
        let name = &caps["name"];
        let count: u64 = caps["count"].parse().map_err(|e| {
            SynthbenchError::Parse(format!("bad count for cell `{}`: {}", name, e))
        })?;
        if counts.insert(name.to_string(), count).is_some() {
            return Err(SynthbenchError::Parse(format!(
                "cell type `{}` listed more than once",
                name
            )));
        }
    }

    if let Some(total) = CELL_COUNT_HEADER_RE
        .captures(lines[start])
        .and_then(|caps| caps["total"].parse::<u64>().ok())
    {
        let sum = counts.values().fold(0u64, |acc, n| acc.saturating_add(*n));
        if sum != total {
            log::debug!(
                "parse_stat_report; header total {} differs from sum of listed cells {}",
                total,
                sum
            );
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Trimmed-down output of `stat` after `synth_xilinx`.
    const XILINX_STAT: &str = "
3. Printing statistics.

=== adder ===

   Number of wires:                 10
   Number of wire bits:             40
   Number of public wires:           3
   Number of public wire bits:      24
   Number of memories:               0
   Number of memory bits:            0
   Number of processes:              0
   Number of cells:                 17
     CARRY4                          2
     IBUF                           16
     LUT2                            8
     OBUF                            8

End of script. Logfile hash: 1bd3b9a6a8
";

    #[test]
    fn test_two_cell_types() {
        let got = parse_stat_report("Number of cells: 3\n     DFF        2\n     LUT4       1\n\n")
            .unwrap();
        let want: ResourceCounts = [("DFF".to_string(), 2), ("LUT4".to_string(), 1)]
            .into_iter()
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn test_full_stat_output() {
        let got = parse_stat_report(XILINX_STAT).unwrap();
        assert_eq!(got.len(), 4);
        assert_eq!(got["CARRY4"], 2);
        assert_eq!(got["IBUF"], 16);
        assert_eq!(got["LUT2"], 8);
        assert_eq!(got["OBUF"], 8);
        // Lines ahead of the header are not part of the block.
        assert!(!got.contains_key("Number"));
    }

    #[test]
    fn test_missing_block() {
        let err = parse_stat_report("=== adder ===\n\n   Number of wires: 10\n\n").unwrap_err();
        assert!(matches!(err, SynthbenchError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_duplicate_block() {
        let text = format!("{}{}", XILINX_STAT, XILINX_STAT);
        let err = parse_stat_report(&text).unwrap_err();
        assert!(
            err.to_string().contains("found 2 blocks"),
            "unexpected error: {}",
            err
        );
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse_stat_report("   Number of cells: 1\n     LUT6 1\n").unwrap_err();
        assert!(matches!(err, SynthbenchError::Parse(_)), "got {:?}", err);
    }

    #[test]
    fn test_empty_design() {
        let got = parse_stat_report("   Number of cells:                  0\n\n").unwrap();
        assert!(got.is_empty());
    }

    #[test]
    fn test_duplicate_cell_type_in_block() {
        let err =
            parse_stat_report("   Number of cells: 2\n     LUT6 1\n     LUT6 1\n\n").unwrap_err();
        assert!(err.to_string().contains("LUT6"), "got {}", err);
    }

    #[test]
    fn test_large_counts_are_exact() {
        let got =
            parse_stat_report("   Number of cells: 9007199254740993\n     FDRE 9007199254740993\n\n")
                .unwrap();
        assert_eq!(got["FDRE"], 9_007_199_254_740_993);
    }

    #[test]
    fn test_count_overflow_is_parse_error() {
        let err = parse_stat_report(
            "   Number of cells: 1\n     FDRE 99999999999999999999999\n\n",
        )
        .unwrap_err();
        assert!(matches!(err, SynthbenchError::Parse(_)), "got {:?}", err);
        assert!(err.to_string().contains("FDRE"), "got {}", err);
    }

    #[test]
    fn test_parse_is_idempotent() {
        assert_eq!(
            parse_stat_report(XILINX_STAT).unwrap(),
            parse_stat_report(XILINX_STAT).unwrap()
        );
    }
}
