//! External structural matching through the `ast-grep` CLI.
//!
//! One process is spawned per (file, pattern). Each call is bounded by
//! [`Config::matcher_timeout_secs`](crate::config::Config); a timeout, spawn
//! failure, non-zero exit or unparseable output makes the matcher unavailable
//! for that file only, and the file is re-extracted with text patterns.

use crate::config::Config;
use crate::indexer::bindings;
use crate::indexer::extract::{ExtractionError, Language, LanguageExtractor, SourceFile};
use crate::indexer::pattern::{PatternExtractor, split_params};
use crate::model::{
    FileSchema, FunctionRecord, ImportKind, ImportRecord, Provenance, TypeRecord,
};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::{Arc, LazyLock, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);
const PIPE_GRACE: Duration = Duration::from_millis(200);

static RETURN_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^(]*\([^)]*\)\s*:\s*([^={]+?)\s*(?:\{|=>)").expect("valid return type pattern")
});

#[derive(Debug, Error)]
#[error("structural matcher unavailable: {reason}")]
pub struct MatcherUnavailable {
    pub reason: String,
}

impl MatcherUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Something that can answer structural pattern queries against a file.
///
/// Records are returned raw; read their bindings with [`bindings`]. When
/// `selector` is set, `pattern` is only context and the records are its
/// sub-nodes of that kind.
pub trait StructuralMatcher: Send + Sync {
    fn supports(&self, language: Language) -> bool;

    fn find(
        &self,
        path: &Path,
        pattern: &str,
        selector: Option<&str>,
        language: Language,
    ) -> Result<Vec<Value>, MatcherUnavailable>;
}

#[derive(Debug, Clone)]
pub struct AstGrepMatcher {
    binary: PathBuf,
    timeout: Duration,
}

impl AstGrepMatcher {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Returns a matcher only if `<binary> --version` succeeds within the probe timeout.
    pub fn probe(config: &Config) -> Option<Self> {
        let mut command = Command::new(&config.matcher_bin);
        command.arg("--version");
        let probe_timeout = Duration::from_secs(config.probe_timeout_secs);
        match run_bounded(command, probe_timeout) {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                info!(binary = %config.matcher_bin, %version, "structural matcher available");
                Some(Self::new(
                    config.matcher_bin.clone(),
                    Duration::from_secs(config.matcher_timeout_secs),
                ))
            }
            Ok(output) => {
                info!(
                    binary = %config.matcher_bin,
                    status = ?output.status.code(),
                    "structural matcher probe failed, using text patterns"
                );
                None
            }
            Err(err) => {
                info!(binary = %config.matcher_bin, reason = %err.reason, "structural matcher not found, using text patterns");
                None
            }
        }
    }
}

impl StructuralMatcher for AstGrepMatcher {
    fn supports(&self, _language: Language) -> bool {
        true
    }

    fn find(
        &self,
        path: &Path,
        pattern: &str,
        selector: Option<&str>,
        language: Language,
    ) -> Result<Vec<Value>, MatcherUnavailable> {
        let mut command = Command::new(&self.binary);
        command.arg("run").arg("-p").arg(pattern);
        if let Some(selector) = selector {
            command.arg("--selector").arg(selector);
        }
        command
            .arg("--lang")
            .arg(language.tag())
            .arg("--json")
            .arg(path);
        let output = run_bounded(command, self.timeout)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        match output.status.code() {
            // 1 means "no match" for recent releases.
            Some(0) | Some(1) if stdout.trim().is_empty() && stderr.trim().is_empty() => {
                Ok(Vec::new())
            }
            Some(0) | Some(1) if !stdout.trim().is_empty() => {
                serde_json::from_str::<Vec<Value>>(&stdout).map_err(|err| {
                    MatcherUnavailable::new(format!("unparseable matcher output: {err}"))
                })
            }
            code => Err(MatcherUnavailable::new(format!(
                "exit code {:?}: {}",
                code,
                stderr.trim()
            ))),
        }
    }
}

struct BoundedOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

fn run_bounded(mut command: Command, timeout: Duration) -> Result<BoundedOutput, MatcherUnavailable> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = command
        .spawn()
        .map_err(|err| MatcherUnavailable::new(format!("spawn failed: {err}")))?;
    // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MatcherUnavailable::new(format!(
                    "timed out after {}s",
                    timeout.as_secs_f32()
                )));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(MatcherUnavailable::new(format!("wait failed: {err}")));
            }
        }
    };
    // A grandchild can keep the pipes open after the child exits; readers
    // still running at the deadline are abandoned.
    let pipe_deadline = deadline.max(Instant::now() + PIPE_GRACE);
    Ok(BoundedOutput {
        status,
        stdout: collect_pipe(&stdout, pipe_deadline)?,
        stderr: collect_pipe(&stderr, pipe_deadline)?,
    })
}

fn spawn_reader<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}

fn collect_pipe(rx: &mpsc::Receiver<Vec<u8>>, deadline: Instant) -> Result<Vec<u8>, MatcherUnavailable> {
    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
        .map_err(|_| MatcherUnavailable::new("output still open after exit"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Function,
    Method,
    Type,
    Import(ImportKind),
}

#[derive(Debug, Clone)]
struct Query {
    pattern: String,
    selector: Option<&'static str>,
    construct: Construct,
}

fn queries_for(language: Language) -> Vec<Query> {
    let mut declarations = vec![
        ("function $NAME($$$PARAMS) { $$$ }", Construct::Function),
        ("async function $NAME($$$PARAMS) { $$$ }", Construct::Function),
        ("const $NAME = ($$$PARAMS) => $BODY", Construct::Function),
        ("const $NAME = async ($$$PARAMS) => $BODY", Construct::Function),
        ("class $NAME { $$$ }", Construct::Type),
        ("class $NAME extends $BASE { $$$ }", Construct::Type),
    ];
    if language != Language::JavaScript {
        declarations.push(("interface $NAME { $$$ }", Construct::Type));
        declarations.push(("interface $NAME extends $$$BASES { $$$ }", Construct::Type));
    }

    let mut queries = Vec::new();
    for (pattern, construct) in declarations {
        let mut variants = vec![pattern.to_string(), format!("export {pattern}")];
        if !pattern.starts_with("const") && !pattern.starts_with("interface") {
            variants.push(format!("export default {pattern}"));
        }
        queries.extend(variants.into_iter().map(|pattern| Query {
            pattern,
            selector: None,
            construct,
        }));
    }
    queries.push(Query {
        pattern: "class $CLASS { $NAME($$$PARAMS) { $$$ } }".to_string(),
        selector: Some("method_definition"),
        construct: Construct::Method,
    });

    let mut imports = vec![
        ("import $$$CLAUSE from {q}$PACKAGE{q}", ImportKind::Static),
        ("import {q}$PACKAGE{q}", ImportKind::Static),
        ("import({q}$PACKAGE{q})", ImportKind::Dynamic),
        ("require({q}$PACKAGE{q})", ImportKind::Require),
    ];
    if language != Language::JavaScript {
        imports.push(("import type $$$CLAUSE from {q}$PACKAGE{q}", ImportKind::TypeOnly));
    }
    for (template, kind) in imports {
        for quote in ["\"", "'"] {
            queries.push(Query {
                pattern: template.replace("{q}", quote),
                selector: None,
                construct: Construct::Import(kind),
            });
        }
    }
    queries
}

/// Match results keyed by (line, name): overlapping patterns collapse into
/// one record, and iteration order is source order. Functions and types keep
/// the last line of their match so nesting can be decided afterwards.
#[derive(Default)]
struct Collected {
    functions: BTreeMap<(usize, String), (FunctionRecord, usize)>,
    methods: BTreeMap<(usize, String), FunctionRecord>,
    types: BTreeMap<(usize, String), (TypeRecord, usize)>,
    imports: BTreeMap<(usize, String), ImportRecord>,
}

impl Collected {
    fn add(&mut self, query: &Query, record: &Value, path: &str) {
        let line = bindings::start_line(record);
        let end = bindings::end_line(record).max(line);
        let text = bindings::matched_text(record);
        let header = declaration_header(text);
        let exported = header.trim_start().starts_with("export");
        match query.construct {
            Construct::Function | Construct::Method => {
                let Some(name) = bindings::resolve(record, "NAME") else {
                    return;
                };
                let params = split_params(&bindings::resolve_multi(record, "PARAMS").join(","));
                let incoming = FunctionRecord {
                    name: name.clone(),
                    params,
                    return_type: RETURN_TYPE
                        .captures(text)
                        .map(|cap| cap[1].trim().to_string()),
                    line,
                    is_async: header.split_whitespace().any(|word| word == "async"),
                    is_exported: exported && query.construct == Construct::Function,
                    file_path: path.to_string(),
                };
                if query.construct == Construct::Method {
                    self.methods.entry((line, name)).or_insert(incoming);
                    return;
                }
                self.functions
                    .entry((line, name))
                    .and_modify(|(existing, existing_end)| {
                        existing.is_exported |= incoming.is_exported;
                        existing.is_async |= incoming.is_async;
                        if existing.params.is_empty() {
                            existing.params = incoming.params.clone();
                        }
                        if existing.return_type.is_none() {
                            existing.return_type = incoming.return_type.clone();
                        }
                        *existing_end = (*existing_end).max(end);
                    })
                    .or_insert((incoming, end));
            }
            Construct::Type => {
                let Some(name) = bindings::resolve(record, "NAME") else {
                    return;
                };
                let mut bases: Vec<String> = bindings::resolve(record, "BASE").into_iter().collect();
                bases.extend(bindings::resolve_multi(record, "BASES"));
                let incoming = TypeRecord {
                    name: name.clone(),
                    bases,
                    methods: Vec::new(),
                    line,
                    is_exported: exported,
                    file_path: path.to_string(),
                };
                self.types
                    .entry((line, name))
                    .and_modify(|(existing, existing_end)| {
                        existing.is_exported |= incoming.is_exported;
                        if existing.bases.is_empty() {
                            existing.bases = incoming.bases.clone();
                        }
                        *existing_end = (*existing_end).max(end);
                    })
                    .or_insert((incoming, end));
            }
            Construct::Import(kind) => {
                let Some(raw) = bindings::resolve(record, "PACKAGE") else {
                    return;
                };
                let name = raw.trim().trim_matches(['"', '\'', '`']).to_string();
                if name.is_empty() {
                    return;
                }
                let incoming = ImportRecord {
                    name: name.clone(),
                    kind,
                    members: Vec::new(),
                    file_path: path.to_string(),
                    line,
                };
                self.imports
                    .entry((line, name))
                    .and_modify(|existing| {
                        if kind.specificity() > existing.kind.specificity() {
                            existing.kind = kind;
                        }
                    })
                    .or_insert(incoming);
            }
        }
    }

    fn into_schema(self, file: &SourceFile) -> FileSchema {
        let mut schema = FileSchema::new(
            file.rel_path.clone(),
            file.language.tag(),
            Provenance::StructuralMatcher,
        );
        let spans: Vec<(usize, usize)> = self
            .functions
            .values()
            .map(|(record, end)| (record.line, *end))
            .chain(self.types.values().map(|(record, end)| (record.line, *end)))
            .collect();
        let nested = |line: usize| spans.iter().any(|(start, end)| *start < line && line <= *end);

        let mut types: Vec<(TypeRecord, usize)> = self.types.into_values().collect();
        for method in self.methods.into_values() {
            // innermost type whose body holds the method
            let owner = types
                .iter_mut()
                .filter(|(record, end)| record.line < method.line && method.line <= *end)
                .max_by_key(|(record, _)| record.line);
            if let Some((record, _)) = owner {
                record.methods.push(method);
            }
        }
        schema.functions = self
            .functions
            .into_values()
            .map(|(record, _)| record)
            .filter(|record| !nested(record.line))
            .collect();
        schema.types = types.into_iter().map(|(record, _)| record).collect();
        schema.imports = self.imports.into_values().collect();
        schema
    }
}

/// Text before the parameter list or arrow: where `export`/`async` live.
fn declaration_header(text: &str) -> &str {
    let end = [text.find('('), text.find("=>"), text.find('{')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    &text[..end]
}

/// Extractor backed by a [`StructuralMatcher`], degrading per file to
/// [`PatternExtractor`].
pub struct MatcherExtractor {
    matcher: Arc<dyn StructuralMatcher>,
    fallback: PatternExtractor,
}

impl MatcherExtractor {
    pub fn new(matcher: Arc<dyn StructuralMatcher>) -> Self {
        Self {
            matcher,
            fallback: PatternExtractor::new(),
        }
    }

    pub fn extract_with_matcher(&self, file: &SourceFile) -> Result<FileSchema, MatcherUnavailable> {
        if !self.matcher.supports(file.language) {
            return Err(MatcherUnavailable::new(format!(
                "{} not supported",
                file.language
            )));
        }
        let mut collected = Collected::default();
        for query in queries_for(file.language) {
            let records = self.matcher.find(
                &file.abs_path,
                &query.pattern,
                query.selector,
                file.language,
            )?;
            debug!(path = %file.rel_path, pattern = %query.pattern, matches = records.len(), "matcher query");
            for record in &records {
                collected.add(&query, record, &file.rel_path);
            }
        }
        Ok(collected.into_schema(file))
    }
}

impl LanguageExtractor for MatcherExtractor {
    fn extract(&self, file: &SourceFile) -> Result<FileSchema, ExtractionError> {
        match self.extract_with_matcher(file) {
            Ok(schema) => Ok(schema),
            Err(err) => {
                warn!(path = %file.rel_path, reason = %err.reason, "falling back to text patterns");
                self.fallback.extract(file)
            }
        }
    }
}
