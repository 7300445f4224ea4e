use anyhow::{Context, Result};
use std::path::{Component, Path};

pub fn normalize_rel_path(root: &Path, path: &Path) -> Result<String> {
    let rel = path.strip_prefix(root).with_context(|| {
        format!(
            "strip prefix {} from {}",
            root.display(),
            path.display()
        )
    })?;
    Ok(normalize_path(rel))
}

pub fn normalize_path(path: &Path) -> String {
    let mut parts = Vec::new();
    for comp in path.components() {
        match comp {
            Component::Normal(os) => parts.push(os.to_string_lossy().to_string()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir => {}
            _ => {}
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Parent of a normalized relative path, `"."` at the root.
pub fn parent_dir(rel_path: &str) -> &str {
    match rel_path.rfind('/') {
        Some(idx) => &rel_path[..idx],
        None => ".",
    }
}

/// Joins `base` and `rel` and folds `.`/`..` segments. `None` when the
/// result escapes the root.
pub fn join_normalized(base: &str, rel: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    let base_parts = if base == "." { "" } else { base };
    for segment in base_parts.split('/').chain(rel.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        Some(".".to_string())
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn normalize_drops_cur_dir() {
        assert_eq!(normalize_path(&PathBuf::from("./a/./b.py")), "a/b.py");
        assert_eq!(normalize_path(&PathBuf::from("")), ".");
    }

    #[test]
    fn join_folds_parent_segments() {
        assert_eq!(join_normalized("src/app", "../lib/x").as_deref(), Some("src/lib/x"));
        assert_eq!(join_normalized(".", "./a").as_deref(), Some("a"));
        assert_eq!(join_normalized("src", "../../x"), None);
        assert_eq!(parent_dir("src/app/main.ts"), "src/app");
        assert_eq!(parent_dir("main.ts"), ".");
    }
}
