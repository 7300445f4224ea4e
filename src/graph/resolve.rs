//! Import specifier resolution against the set of scanned files.
//!
//! Classification is a heuristic: relative-looking specifiers (`./x`, `../x`,
//! Python's leading dots, `@/x` and `~/x` aliases) are always internal, and
//! anything else is internal only if it lands on a scanned file.

use crate::model::ImportRecord;
use crate::util::{join_normalized, parent_dir};
use std::collections::BTreeSet;
use tracing::warn;

const PY_SUFFIXES: &[&str] = &[".py", ".pyi", "/__init__.py", "/__init__.pyi"];
const JS_SUFFIXES: &[&str] = &[
    "",
    ".ts",
    ".tsx",
    ".js",
    ".jsx",
    ".mjs",
    ".cjs",
    ".mts",
    ".cts",
    ".d.ts",
    "/index.ts",
    "/index.tsx",
    "/index.js",
    "/index.jsx",
    "/index.mjs",
    "/index.cjs",
];
const JS_RUNTIME_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A scanned file.
    Internal(String),
    /// Looks internal but matches no scanned file.
    Unresolved,
    External,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleResolver {
    files: BTreeSet<String>,
}

impl ModuleResolver {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    pub fn resolve(&self, importer: &str, language: &str, import: &ImportRecord) -> Resolution {
        if language == "python" {
            self.resolve_python(importer, import)
        } else {
            self.resolve_c_style(importer, &import.name)
        }
    }

    fn resolve_python(&self, importer: &str, import: &ImportRecord) -> Resolution {
        let spec = import.name.as_str();
        let dots = spec.chars().take_while(|c| *c == '.').count();
        let module = spec[dots..].replace('.', "/");
        let submodules: Vec<String> = import
            .members
            .iter()
            .filter(|member| member.as_str() != "*")
            .map(|member| {
                if module.is_empty() {
                    member.clone()
                } else {
                    format!("{module}/{member}")
                }
            })
            .collect();

        if dots > 0 {
            let mut base = parent_dir(importer).to_string();
            for _ in 1..dots {
                match join_normalized(&base, "..") {
                    Some(up) => base = up,
                    None => return Resolution::Unresolved,
                }
            }
            let mut modules = submodules;
            if !module.is_empty() {
                modules.push(module);
            } else {
                modules.push(String::new());
            }
            return self
                .first_hit(spec, importer, &[base], &modules, PY_SUFFIXES)
                .map(Resolution::Internal)
                .unwrap_or(Resolution::Unresolved);
        }

        if module.is_empty() {
            return Resolution::External;
        }
        let roots = [".".to_string(), parent_dir(importer).to_string()];
        let mut modules = submodules;
        modules.push(module);
        self.first_hit(spec, importer, &roots, &modules, PY_SUFFIXES)
            .map(Resolution::Internal)
            .unwrap_or(Resolution::External)
    }

    fn resolve_c_style(&self, importer: &str, spec: &str) -> Resolution {
        let relative = spec == "." || spec == ".." || spec.starts_with("./") || spec.starts_with("../");
        if relative {
            return self
                .first_c_style_hit(spec, importer, &[parent_dir(importer).to_string()], spec)
                .map(Resolution::Internal)
                .unwrap_or(Resolution::Unresolved);
        }
        if let Some(rest) = spec
            .strip_prefix("@/")
            .or_else(|| spec.strip_prefix("~/"))
            .or_else(|| spec.strip_prefix('/'))
        {
            let roots = ["src".to_string(), ".".to_string()];
            return self
                .first_c_style_hit(spec, importer, &roots, rest)
                .map(Resolution::Internal)
                .unwrap_or(Resolution::Unresolved);
        }
        self.first_c_style_hit(spec, importer, &[".".to_string()], spec)
            .map(Resolution::Internal)
            .unwrap_or(Resolution::External)
    }

    fn first_c_style_hit(&self, spec: &str, importer: &str, roots: &[String], rel: &str) -> Option<String> {
        let mut modules = vec![rel.to_string()];
        // `./util.js` in TypeScript sources names `util.ts`.
        for ext in JS_RUNTIME_EXTENSIONS {
            if let Some(stem) = rel.strip_suffix(ext) {
                modules.push(stem.to_string());
            }
        }
        self.first_hit(spec, importer, roots, &modules, JS_SUFFIXES)
    }

    /// First module (in priority order) with any existing candidate wins.
    /// Several candidates for the same module are ambiguous: the first is
    /// taken and the choice logged.
    fn first_hit(
        &self,
        spec: &str,
        importer: &str,
        roots: &[String],
        modules: &[String],
        suffixes: &[&str],
    ) -> Option<String> {
        for module in modules {
            let mut hits: Vec<String> = Vec::new();
            for root in roots {
                let Some(base) = join_normalized(root, module) else {
                    continue;
                };
                for suffix in suffixes {
                    let candidate = if base == "." {
                        suffix.trim_start_matches('/').to_string()
                    } else {
                        format!("{base}{suffix}")
                    };
                    if self.files.contains(&candidate) && !hits.contains(&candidate) {
                        hits.push(candidate);
                    }
                }
            }
            if hits.len() > 1 {
                warn!(
                    importer,
                    specifier = spec,
                    chosen = %hits[0],
                    candidates = ?hits,
                    "ambiguous import resolution"
                );
            }
            if let Some(first) = hits.into_iter().next() {
                return Some(first);
            }
        }
        None
    }
}
