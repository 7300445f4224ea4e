//! Name-based test coverage estimation.
//!
//! A function counts as tested when some test function's name, with test
//! affixes stripped, equals the function's name. There is no call-graph or
//! execution evidence behind this: a test named after a different function
//! than the one it exercises is a false negative, and an unrelated test that
//! happens to share a name is a false positive.

use crate::model::FunctionRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const CRITICAL_BELOW: f64 = 70.0;
const WARNING_BELOW: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageEntry {
    pub function: FunctionRecord,
    pub tested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_test: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageOptions {
    /// Leave out functions whose name starts with `_`.
    pub skip_private: bool,
}

/// Strips test affixes from a test function name and lower-cases it.
///
/// `test_calculate_total`, `calculate_total_test`, `testCalculateTotal` and
/// `should calculate total` all become `calculate_total` or `calculatetotal`.
pub fn normalize_test_name(name: &str) -> String {
    let mut current = name.trim().trim_start_matches('_');
    // camelCase suffix before lower-casing loses the case boundary
    if let Some(stem) = current.strip_suffix("Test").filter(|stem| !stem.is_empty()) {
        current = stem;
    }
    let mut normalized: String = current
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect::<String>()
        .to_lowercase();

    for prefix in ["should_", "test_", "test"] {
        if let Some(rest) = normalized.strip_prefix(prefix) {
            if !rest.is_empty() {
                normalized = rest.to_string();
                break;
            }
        }
    }
    if let Some(rest) = normalized.strip_prefix("should_") {
        normalized = rest.to_string();
    }
    if let Some(rest) = normalized.strip_suffix("_test") {
        if !rest.is_empty() {
            normalized = rest.to_string();
        }
    }
    normalized.trim_start_matches('_').to_string()
}

/// Marks each function tested or untested against the given test functions.
/// Which functions are tests is the caller's decision.
pub fn match_functions(functions: &[FunctionRecord], test_functions: &[FunctionRecord]) -> Vec<CoverageEntry> {
    match_functions_with_options(functions, test_functions, CoverageOptions::default())
}

pub fn match_functions_with_options(
    functions: &[FunctionRecord],
    test_functions: &[FunctionRecord],
    options: CoverageOptions,
) -> Vec<CoverageEntry> {
    let mut by_normalized: HashMap<String, &str> = HashMap::new();
    for test in test_functions {
        by_normalized
            .entry(normalize_test_name(&test.name))
            .or_insert(test.name.as_str());
    }
    functions
        .iter()
        .filter(|function| !(options.skip_private && function.name.starts_with('_')))
        .map(|function| {
            let matched_test = by_normalized
                .get(&function.name.to_lowercase())
                .map(|name| name.to_string());
            CoverageEntry {
                function: function.clone(),
                tested: matched_test.is_some(),
                matched_test,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Critical,
    Warning,
    Good,
}

impl CoverageStatus {
    pub fn for_percentage(percentage: f64) -> Self {
        if percentage < CRITICAL_BELOW {
            CoverageStatus::Critical
        } else if percentage < WARNING_BELOW {
            CoverageStatus::Warning
        } else {
            CoverageStatus::Good
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UntestedFunction {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub total: usize,
    pub tested: usize,
    pub untested: usize,
    /// 0 to 100; 0 when there are no functions.
    pub percentage: f64,
    pub status: CoverageStatus,
    pub untested_by_file: BTreeMap<String, Vec<UntestedFunction>>,
}

impl CoverageReport {
    pub fn from_entries(entries: &[CoverageEntry]) -> Self {
        let total = entries.len();
        let tested = entries.iter().filter(|entry| entry.tested).count();
        let percentage = if total == 0 {
            0.0
        } else {
            tested as f64 * 100.0 / total as f64
        };
        let mut untested_by_file: BTreeMap<String, Vec<UntestedFunction>> = BTreeMap::new();
        for entry in entries.iter().filter(|entry| !entry.tested) {
            untested_by_file
                .entry(entry.function.file_path.clone())
                .or_default()
                .push(UntestedFunction {
                    name: entry.function.name.clone(),
                    line: entry.function.line,
                });
        }
        for functions in untested_by_file.values_mut() {
            functions.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
        }
        Self {
            total,
            tested,
            untested: total - tested,
            percentage,
            status: CoverageStatus::for_percentage(percentage),
            untested_by_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, file: &str, line: usize) -> FunctionRecord {
        FunctionRecord {
            name: name.to_string(),
            params: Vec::new(),
            return_type: None,
            line,
            is_async: false,
            is_exported: false,
            file_path: file.to_string(),
        }
    }

    #[test]
    fn normalizes_test_affixes() {
        assert_eq!(normalize_test_name("test_calculate_total"), "calculate_total");
        assert_eq!(normalize_test_name("calculate_total_test"), "calculate_total");
        assert_eq!(normalize_test_name("testCalculateTotal"), "calculatetotal");
        assert_eq!(normalize_test_name("calculateTotalTest"), "calculatetotal");
        assert_eq!(normalize_test_name("should calculate total"), "calculate_total");
        assert_eq!(normalize_test_name("test_should_load"), "load");
        assert_eq!(normalize_test_name("test"), "test");
        assert_eq!(normalize_test_name("latest"), "latest");
    }

    #[test]
    fn matches_by_normalized_name() {
        let functions = vec![
            function("calculate_total", "src/billing.py", 10),
            function("refund", "src/billing.py", 3),
            function("_helper", "src/billing.py", 20),
        ];
        let tests = vec![function("test_calculate_total", "tests/test_billing.py", 1)];
        let entries = match_functions(&functions, &tests);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].tested);
        assert_eq!(entries[0].matched_test.as_deref(), Some("test_calculate_total"));
        assert!(!entries[1].tested);
        assert_eq!(entries[1].matched_test, None);

        let public_only = match_functions_with_options(
            &functions,
            &tests,
            CoverageOptions { skip_private: true },
        );
        assert_eq!(public_only.len(), 2);
    }

    #[test]
    fn camel_case_functions_match_camel_case_tests() {
        let functions = vec![function("parseConfig", "src/config.ts", 1)];
        let tests = vec![function("testParseConfig", "src/config.test.ts", 1)];
        assert!(match_functions(&functions, &tests)[0].tested);
    }

    #[test]
    fn report_groups_untested_by_file() {
        let functions = vec![
            function("b", "src/x.py", 9),
            function("a", "src/x.py", 2),
            function("c", "src/y.py", 1),
            function("d", "src/y.py", 5),
        ];
        let tests = vec![function("test_c", "tests/test_y.py", 1)];
        let report = CoverageReport::from_entries(&match_functions(&functions, &tests));
        assert_eq!(report.total, 4);
        assert_eq!(report.tested, 1);
        assert_eq!(report.untested, 3);
        assert_eq!(report.percentage, 25.0);
        assert_eq!(report.status, CoverageStatus::Critical);
        let x: Vec<&str> = report.untested_by_file["src/x.py"]
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(x, vec!["a", "b"]);
    }

    #[test]
    fn status_bands() {
        assert_eq!(CoverageStatus::for_percentage(69.9), CoverageStatus::Critical);
        assert_eq!(CoverageStatus::for_percentage(70.0), CoverageStatus::Warning);
        assert_eq!(CoverageStatus::for_percentage(80.0), CoverageStatus::Good);
        assert_eq!(CoverageReport::from_entries(&[]).percentage, 0.0);
    }
}
