use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_hint: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_hint,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub params: Vec<Parameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// 1-based.
    pub line: usize,
    pub is_async: bool,
    /// Only meaningful for backends that see `export`; always false for Python.
    pub is_exported: bool,
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRecord {
    pub name: String,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionRecord>,
    pub line: usize,
    pub is_exported: bool,
    pub file_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Static,
    Dynamic,
    Require,
    TypeOnly,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportKind::Static => "static",
            ImportKind::Dynamic => "dynamic",
            ImportKind::Require => "require",
            ImportKind::TypeOnly => "type_only",
        }
    }

    /// Rank used when two backends report the same import with different kinds.
    pub(crate) fn specificity(self) -> u8 {
        match self {
            ImportKind::Static => 0,
            ImportKind::Require => 1,
            ImportKind::Dynamic => 2,
            ImportKind::TypeOnly => 3,
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    /// Module name or path exactly as written in the source, quotes stripped.
    pub name: String,
    pub kind: ImportKind,
    /// Names pulled out of the module (`from m import a, b`), when the backend sees them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,
    pub file_path: String,
    pub line: usize,
}

/// Which backend produced a [`FileSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    NativeSyntaxTree,
    StructuralMatcher,
    /// Line-oriented regex matching. Materially less accurate than the other two.
    TextPattern,
}

impl Provenance {
    pub fn is_approximate(self) -> bool {
        matches!(self, Provenance::TextPattern)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSchema {
    pub path: String,
    pub language: String,
    pub provenance: Provenance,
    pub types: Vec<TypeRecord>,
    pub functions: Vec<FunctionRecord>,
    pub imports: Vec<ImportRecord>,
}

impl FileSchema {
    pub fn new(path: impl Into<String>, language: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            provenance,
            types: Vec::new(),
            functions: Vec::new(),
            imports: Vec::new(),
        }
    }

    /// Top-level functions followed by every method of every type.
    pub fn all_functions(&self) -> impl Iterator<Item = &FunctionRecord> {
        self.functions
            .iter()
            .chain(self.types.iter().flat_map(|ty| ty.methods.iter()))
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.functions.is_empty() && self.imports.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorKind {
    ParseFailure,
    UnsupportedLanguage,
    IoFailure,
}

/// A file that was found but could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub path: String,
    pub kind: FileErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySchema {
    /// Relative to the scan root; the root itself is `"."`.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_remote: Option<String>,
    pub files: Vec<FileSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FileError>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, DirectorySchema>,
}

impl DirectorySchema {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            git_remote: None,
            files: Vec::new(),
            errors: Vec::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.errors.is_empty() && self.children.is_empty()
    }

    /// Pre-order walk over this directory and every descendant.
    pub fn directories(&self) -> Vec<&DirectorySchema> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(dir) = stack.pop() {
            out.push(dir);
            for child in dir.children.values().rev() {
                stack.push(child);
            }
        }
        out
    }

    pub fn all_files(&self) -> Vec<&FileSchema> {
        self.directories()
            .into_iter()
            .flat_map(|dir| dir.files.iter())
            .collect()
    }

    pub fn all_errors(&self) -> Vec<&FileError> {
        self.directories()
            .into_iter()
            .flat_map(|dir| dir.errors.iter())
            .collect()
    }

    /// Looks up a descendant by its relative path (`"."` is this directory).
    pub fn find_dir(&self, rel_path: &str) -> Option<&DirectorySchema> {
        let mut current = self;
        for segment in rel_path.split('/').filter(|s| !s.is_empty() && *s != ".") {
            current = current.children.get(segment)?;
        }
        Some(current)
    }

    pub fn summary(&self) -> SchemaSummary {
        let mut summary = SchemaSummary::default();
        for dir in self.directories() {
            summary.directories += 1;
            summary.failed_files += dir.errors.len();
            for file in &dir.files {
                summary.files += 1;
                summary.types += file.types.len();
                summary.functions += file.functions.len();
                summary.methods += file.types.iter().map(|ty| ty.methods.len()).sum::<usize>();
                summary.imports += file.imports.len();
                if file.provenance.is_approximate() {
                    summary.approximate_files += 1;
                }
                *summary
                    .languages
                    .entry(file.language.clone())
                    .or_insert(0) += 1;
            }
        }
        summary
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub directories: usize,
    pub files: usize,
    pub failed_files: usize,
    pub approximate_files: usize,
    pub types: usize,
    pub functions: usize,
    pub methods: usize,
    pub imports: usize,
    pub languages: BTreeMap<String, usize>,
}
