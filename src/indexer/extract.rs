use crate::model::{FileError, FileErrorKind, FileSchema};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::Tsx,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "javascript" | "js" | "jsx" => Some(Language::JavaScript),
            "typescript" | "ts" => Some(Language::TypeScript),
            "tsx" => Some(Language::Tsx),
            _ => None,
        }
    }

    /// Tag used in schemas and understood by ast-grep's `--lang`.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
        }
    }

    pub fn is_c_style(self) -> bool {
        !matches!(self, Language::Python)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A file handed to an extractor. `text` is already decoded; `abs_path` is
/// what out-of-process backends open themselves.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub language: Language,
    pub text: String,
}

impl SourceFile {
    pub fn read(abs_path: &Path, rel_path: &str, language: Language) -> Result<Self, ExtractionError> {
        let bytes = std::fs::read(abs_path).map_err(|source| ExtractionError::IoFailure {
            path: rel_path.to_string(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|err| ExtractionError::ParseFailure {
            path: rel_path.to_string(),
            message: format!("not valid UTF-8 (at byte {})", err.utf8_error().valid_up_to()),
        })?;
        Ok(Self {
            rel_path: rel_path.to_string(),
            abs_path: abs_path.to_path_buf(),
            language,
            text,
        })
    }

    pub fn in_memory(rel_path: &str, language: Language, text: &str) -> Self {
        Self {
            rel_path: rel_path.to_string(),
            abs_path: PathBuf::from(rel_path),
            language,
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("failed to parse {path}: {message}")]
    ParseFailure { path: String, message: String },
    #[error("unsupported language `{language}` for {path}")]
    UnsupportedLanguage { path: String, language: String },
    #[error("failed to read {path}: {source}")]
    IoFailure {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ExtractionError {
    pub fn path(&self) -> &str {
        match self {
            ExtractionError::ParseFailure { path, .. }
            | ExtractionError::UnsupportedLanguage { path, .. }
            | ExtractionError::IoFailure { path, .. } => path,
        }
    }

    pub fn kind(&self) -> FileErrorKind {
        match self {
            ExtractionError::ParseFailure { .. } => FileErrorKind::ParseFailure,
            ExtractionError::UnsupportedLanguage { .. } => FileErrorKind::UnsupportedLanguage,
            ExtractionError::IoFailure { .. } => FileErrorKind::IoFailure,
        }
    }

    pub fn to_file_error(&self) -> FileError {
        FileError {
            path: self.path().to_string(),
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

/// One extraction capability. Implementations are chosen per language when
/// the [`SchemaExtractor`](crate::indexer::SchemaExtractor) is built.
pub trait LanguageExtractor: Send + Sync {
    fn extract(&self, file: &SourceFile) -> Result<FileSchema, ExtractionError>;
}

/// Restores source order inside each category after backends that report
/// matches grouped by pattern.
pub(crate) fn sort_by_line(schema: &mut FileSchema) {
    schema.types.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
    for ty in &mut schema.types {
        ty.methods
            .sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
    }
    schema
        .functions
        .sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
    schema
        .imports
        .sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.name.cmp(&b.name)));
}
