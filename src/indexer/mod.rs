use crate::config::Config;
use crate::indexer::astgrep::{AstGrepMatcher, MatcherExtractor, StructuralMatcher};
use crate::indexer::extract::{ExtractionError, Language, LanguageExtractor, SourceFile};
use crate::indexer::pattern::PatternExtractor;
use crate::indexer::python::PythonExtractor;
use crate::model::{DirectorySchema, FileSchema};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub mod astgrep;
pub mod bindings;
pub mod extract;
pub mod pattern;
pub mod python;
pub mod scan;
pub mod test_detection;

/// Picks one extraction strategy per language when constructed: native
/// parser if there is one, else the structural matcher if it is installed
/// and supports the language, else text patterns.
pub struct SchemaExtractor {
    extractors: HashMap<Language, Box<dyn LanguageExtractor>>,
}

impl SchemaExtractor {
    /// Probes the configured matcher binary when `use_matcher` is set.
    pub fn new(use_matcher: bool) -> Result<Self> {
        let matcher = if use_matcher {
            AstGrepMatcher::probe(Config::get())
                .map(|matcher| Arc::new(matcher) as Arc<dyn StructuralMatcher>)
        } else {
            None
        };
        Self::with_matcher(matcher)
    }

    pub fn with_matcher(matcher: Option<Arc<dyn StructuralMatcher>>) -> Result<Self> {
        let mut extractors: HashMap<Language, Box<dyn LanguageExtractor>> = HashMap::new();
        extractors.insert(Language::Python, Box::new(PythonExtractor::new()?));
        for language in Language::ALL.into_iter().filter(|l| l.is_c_style()) {
            let extractor: Box<dyn LanguageExtractor> = match &matcher {
                Some(matcher) if matcher.supports(language) => {
                    Box::new(MatcherExtractor::new(Arc::clone(matcher)))
                }
                _ => Box::new(PatternExtractor::new()),
            };
            extractors.insert(language, extractor);
        }
        Ok(Self { extractors })
    }

    pub fn extract_file(
        &self,
        abs_path: &Path,
        rel_path: &str,
        language: Language,
    ) -> Result<FileSchema, ExtractionError> {
        let extractor =
            self.extractors
                .get(&language)
                .ok_or_else(|| ExtractionError::UnsupportedLanguage {
                    path: rel_path.to_string(),
                    language: language.to_string(),
                })?;
        let file = SourceFile::read(abs_path, rel_path, language)?;
        extractor.extract(&file)
    }

    /// Extracts a single file given a declared language tag.
    pub fn extract_path(&self, path: &Path, language_tag: &str) -> Result<FileSchema, ExtractionError> {
        let rel_path = crate::util::normalize_path(path);
        let language =
            Language::from_tag(language_tag).ok_or_else(|| ExtractionError::UnsupportedLanguage {
                path: rel_path.clone(),
                language: language_tag.to_string(),
            })?;
        self.extract_file(path, &rel_path, language)
    }
}

/// Builds the [`DirectorySchema`] tree for one root.
pub struct Indexer {
    root: PathBuf,
    options: scan::ScanOptions,
    extractor: SchemaExtractor,
}

impl Indexer {
    pub fn new(root: PathBuf) -> Result<Self> {
        Self::new_with_options(root, scan::ScanOptions::default())
    }

    pub fn new_with_options(root: PathBuf, options: scan::ScanOptions) -> Result<Self> {
        let extractor = SchemaExtractor::new(options.use_matcher)?;
        Ok(Self::with_extractor(root, options, extractor))
    }

    pub fn with_extractor(root: PathBuf, options: scan::ScanOptions, extractor: SchemaExtractor) -> Self {
        let root = std::fs::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            options,
            extractor,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extracts every supported file below the root. Per-file failures are
    /// recorded in their directory; only an unusable root is an error.
    pub fn scan(&self) -> Result<DirectorySchema> {
        let start = Instant::now();
        let files = scan::scan_tree(&self.root, &self.options)?;
        let results: Vec<_> = files
            .par_iter()
            .map(|file| {
                let result = self
                    .extractor
                    .extract_file(&file.abs_path, &file.rel_path, file.language);
                (file, result)
            })
            .collect();

        let mut tree = DirectorySchema::new(".");
        let mut failed = 0usize;
        for (file, result) in results {
            let dir = directory_entry(&mut tree, crate::util::parent_dir(&file.rel_path));
            match result {
                Ok(schema) => {
                    debug!(path = %schema.path, provenance = ?schema.provenance, "extracted");
                    dir.files.push(schema);
                }
                Err(err) => {
                    failed += 1;
                    warn!(path = %err.path(), error = %err, "extraction failed");
                    dir.errors.push(err.to_file_error());
                }
            }
        }
        attach_git_remotes(&mut tree, &self.root);
        prune_empty(&mut tree);

        info!(
            root = %self.root.display(),
            files = files.len() - failed,
            failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "scan complete"
        );
        Ok(tree)
    }
}

fn directory_entry<'a>(root: &'a mut DirectorySchema, rel_dir: &str) -> &'a mut DirectorySchema {
    let mut current = root;
    let mut path = String::new();
    for segment in rel_dir.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(segment);
        current = current
            .children
            .entry(segment.to_string())
            .or_insert_with(|| DirectorySchema::new(path.clone()));
    }
    current
}

fn attach_git_remotes(dir: &mut DirectorySchema, abs_dir: &Path) {
    dir.git_remote = read_git_remote(abs_dir);
    for (name, child) in dir.children.iter_mut() {
        attach_git_remotes(child, &abs_dir.join(name));
    }
}

fn prune_empty(dir: &mut DirectorySchema) {
    for child in dir.children.values_mut() {
        prune_empty(child);
    }
    dir.children.retain(|_, child| !child.is_empty());
}

/// `url` of `[remote "origin"]` in `<dir>/.git/config`, if any.
pub fn read_git_remote(dir: &Path) -> Option<String> {
    let config = std::fs::read_to_string(dir.join(".git").join("config")).ok()?;
    let mut in_origin = false;
    for line in config.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_origin = line == r#"[remote "origin"]"#;
            continue;
        }
        if !in_origin {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            if key.trim() == "url" {
                let url = value.trim();
                if !url.is_empty() {
                    return Some(url.to_string());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_origin_url_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(
            dir.path().join(".git/config"),
            "[core]\n\tbare = false\n[remote \"upstream\"]\n\turl = git@example.com:up/repo.git\n[remote \"origin\"]\n\turl = https://example.com/me/repo.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n",
        )
        .unwrap();
        assert_eq!(
            read_git_remote(dir.path()).as_deref(),
            Some("https://example.com/me/repo.git")
        );
        assert_eq!(read_git_remote(&dir.path().join("missing")), None);
    }

    #[test]
    fn directory_entry_builds_nested_paths() {
        let mut root = DirectorySchema::new(".");
        directory_entry(&mut root, "a/b").files.push(FileSchema::new(
            "a/b/x.py",
            "python",
            crate::model::Provenance::NativeSyntaxTree,
        ));
        let b = root.find_dir("a/b").unwrap();
        assert_eq!(b.path, "a/b");
        assert_eq!(root.find_dir("a").unwrap().path, "a");
        assert_eq!(directory_entry(&mut root, ".").path, ".");
    }

    #[test]
    fn unsupported_language_tag_is_reported() {
        let extractor = SchemaExtractor::with_matcher(None).unwrap();
        let err = extractor
            .extract_path(Path::new("main.rb"), "ruby")
            .unwrap_err();
        assert_eq!(err.kind(), crate::model::FileErrorKind::UnsupportedLanguage);
    }
}
