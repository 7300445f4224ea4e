use crate::indexer::extract::Language;
use anyhow::{Context, Result, bail};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub language: Language,
}

#[derive(Debug, Clone)]
pub struct LanguageSpec {
    pub language: Language,
    pub extensions: &'static [&'static str],
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Include files ignored by `.gitignore` and friends.
    pub no_ignore: bool,
    /// Query the structural matcher for languages without a native parser.
    pub use_matcher: bool,
    /// Directory names skipped in addition to [`DEFAULT_SKIP_DIRS`].
    pub extra_skip_dirs: Vec<String>,
}

impl ScanOptions {
    pub fn new(no_ignore: bool) -> Self {
        Self {
            no_ignore,
            ..Self::default()
        }
    }

    pub fn without_matcher(mut self) -> Self {
        self.use_matcher = false;
        self
    }

    pub fn skip_dir(mut self, name: impl Into<String>) -> Self {
        self.extra_skip_dirs.push(name.into());
        self
    }

    fn skips(&self, name: &str) -> bool {
        name.starts_with('.')
            || DEFAULT_SKIP_DIRS.contains(&name)
            || self.extra_skip_dirs.iter().any(|dir| dir == name)
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            no_ignore: false,
            use_matcher: true,
            extra_skip_dirs: Vec::new(),
        }
    }
}

pub const DEFAULT_SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".next",
    "dist",
    "build",
    "_site",
    ".venv",
    "venv",
    "env",
    ".cache",
    "coverage",
];

static LANGUAGE_SPECS: &[LanguageSpec] = &[
    LanguageSpec {
        language: Language::Python,
        extensions: &["py", "pyi"],
    },
    LanguageSpec {
        language: Language::JavaScript,
        extensions: &["js", "jsx", "mjs", "cjs"],
    },
    LanguageSpec {
        language: Language::TypeScript,
        extensions: &["ts", "mts", "cts"],
    },
    LanguageSpec {
        language: Language::Tsx,
        extensions: &["tsx"],
    },
];

/// Every supported source file under `root`, sorted by relative path.
///
/// Fails only when `root` itself is unusable; unreadable entries below it are
/// logged and skipped.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<Vec<ScannedFile>> {
    let metadata =
        std::fs::metadata(root).with_context(|| format!("read scan root {}", root.display()))?;
    if !metadata.is_dir() {
        bail!("scan root {} is not a directory", root.display());
    }
    let _ = std::fs::read_dir(root).with_context(|| format!("list scan root {}", root.display()))?;

    let mut files = Vec::new();
    let mut builder = WalkBuilder::new(root);
    if options.no_ignore {
        builder
            .ignore(false)
            .git_ignore(false)
            .git_global(false)
            .git_exclude(false)
            .parents(false);
    } else {
        builder
            .ignore(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .parents(true)
            .require_git(false);
    }
    let filter_options = options.clone();
    let walker = builder
        .hidden(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |entry| !is_skipped_dir(entry, &filter_options))
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "walk error");
                continue;
            }
        };
        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }
        let path = entry.path();
        let Some(language) = detect_language(path) else {
            continue;
        };
        let rel_path = crate::util::normalize_rel_path(root, path)?;
        files.push(ScannedFile {
            rel_path,
            abs_path: path.to_path_buf(),
            language,
        });
    }
    files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(files)
}

fn is_skipped_dir(entry: &ignore::DirEntry, options: &ScanOptions) -> bool {
    // depth 0 is the root itself, which may legitimately be hidden
    if entry.depth() == 0 {
        return false;
    }
    let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
    is_dir && options.skips(&entry.file_name().to_string_lossy())
}

fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension().and_then(|ext| ext.to_str())?;
    LANGUAGE_SPECS
        .iter()
        .find(|spec| spec.extensions.contains(&ext))
        .map(|spec| spec.language)
}

pub fn language_for_path(path: &Path) -> Option<Language> {
    detect_language(path)
}
