//! Test file detection
//!
//! Decides which scanned files hold tests, based on path and naming
//! conventions for Python and JavaScript/TypeScript. The coverage matcher
//! takes this decision as input and never calls it itself.

use crate::model::{DirectorySchema, FunctionRecord};

/// Detects if a file path appears to be a test file
///
/// # Conventions
///
/// ## Python
/// - `test_*.py`, `*_test.py`, `conftest.py`
/// - anything under a `tests/` or `test/` directory
///
/// ## JavaScript/TypeScript
/// - `*.test.{js,jsx,ts,tsx,...}`, `*.spec.{...}`
/// - anything under `__tests__/`
pub fn is_test_file(path: &str) -> bool {
    let path_lower = path.to_lowercase();
    let in_test_dir = path_lower
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "test" | "tests" | "__tests__" | "spec"));
    if in_test_dir {
        return true;
    }
    let file_name = path_lower.rsplit('/').next().unwrap_or(&path_lower);
    let stem = file_name.split('.').next().unwrap_or(file_name);
    stem.starts_with("test_")
        || stem.ends_with("_test")
        || stem == "conftest"
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
}

/// Splits every function in the tree (methods included) into
/// `(source_functions, test_functions)` by their file's classification.
pub fn partition_functions(
    root: &DirectorySchema,
    is_test: impl Fn(&str) -> bool,
) -> (Vec<FunctionRecord>, Vec<FunctionRecord>) {
    let mut sources = Vec::new();
    let mut tests = Vec::new();
    for file in root.all_files() {
        let target = if is_test(&file.path) {
            &mut tests
        } else {
            &mut sources
        };
        target.extend(file.all_functions().cloned());
    }
    (sources, tests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file("tests/test_core.py"));
        assert!(is_test_file("pkg/test_core.py"));
        assert!(is_test_file("pkg/core_test.py"));
        assert!(is_test_file("src/core.test.ts"));
        assert!(is_test_file("src/core.spec.jsx"));
        assert!(is_test_file("lib/__tests__/util.js"));
        assert!(is_test_file("conftest.py"));
        assert!(!is_test_file("src/core.py"));
        assert!(!is_test_file("lib/utils.js"));
        assert!(!is_test_file("src/contest.py"));
        assert!(!is_test_file("src/testing_utils.py"));
    }
}
