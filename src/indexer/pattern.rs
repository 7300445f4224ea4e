//! Line-oriented regex extraction.
//!
//! Used when neither a syntax tree nor the external matcher is available for
//! a file. Every schema produced here carries [`Provenance::TextPattern`] so
//! consumers can discount it: multi-line signatures, strings that look like
//! code and unusual formatting all defeat these patterns.

use crate::indexer::extract::{ExtractionError, Language, LanguageExtractor, SourceFile, sort_by_line};
use crate::model::{
    FileSchema, FunctionRecord, ImportKind, ImportRecord, Parameter, Provenance, TypeRecord,
};
use regex::Regex;
use std::sync::LazyLock;

static PY_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(async\s+)?def\s+(\w+)\s*\(([^)]*)\)?(?:\s*->\s*([^:]+?))?\s*:?\s*(?:#.*)?$")
        .expect("valid python def pattern")
});
static PY_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class\s+(\w+)\s*(?:\(([^)]*)\))?\s*:").expect("valid python class pattern")
});
static PY_IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^import\s+([^#;]+)").expect("valid python import pattern"));
static PY_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^from\s+(\S+)\s+import\s+([^#;]+)").expect("valid python from pattern")
});
static PY_TYPE_CHECKING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^if\s+(?:\w+\.)?TYPE_CHECKING\s*:").expect("valid TYPE_CHECKING pattern")
});
static PY_DYNAMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:importlib\.import_module|__import__)\(\s*['"]([^'"]+)['"]"#)
        .expect("valid python dynamic import pattern")
});

static JS_IMPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*(?:import|export)\s+(type\s+)?(?:[^;'"\n{}]|\{[^{}'";]*\})*?\bfrom\s+['"]([^'"]+)['"]"#)
        .expect("valid import-from pattern")
});
static JS_IMPORT_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*import\s+['"]([^'"]+)['"]"#).expect("valid side-effect import pattern")
});
static JS_DYNAMIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bimport\(\s*['"`]([^'"`]+)['"`]\s*\)"#).expect("valid dynamic import pattern")
});
static JS_REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\brequire\(\s*['"`]([^'"`]+)['"`]\s*\)"#).expect("valid require pattern")
});
static JS_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)(?:<[^>{]*>)?(?:\s+extends\s+([\w.]+)(?:<[^{]*?>)?)?(?:\s+implements\s+([\w.,\s<>]+?))?\s*\{",
    )
    .expect("valid class pattern")
});
static JS_INTERFACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(export\s+)?interface\s+(\w+)(?:<[^>{]*>)?(?:\s+extends\s+([\w.,\s<>]+?))?\s*\{",
    )
    .expect("valid interface pattern")
});
static JS_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(export\s+)?(?:default\s+)?(async\s+)?function\s*\*?\s*(\w+)\s*(?:<[^>(]*>)?\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
    )
    .expect("valid function pattern")
});
static JS_ARROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=]+?)?=\s*(async\s+)?(?:\(([^)]*)\)|(\w+))\s*(?::\s*([^=]+?))?\s*=>",
    )
    .expect("valid arrow function pattern")
});
static JS_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:(?:public|private|protected|static|readonly|override|abstract|get|set)\s+)*(async\s+)?\*?\s*(#?\w+)\s*(?:<[^>(]*>)?\s*\(([^)]*)\)(?:\s*:\s*([^{;]+?))?\s*\{",
    )
    .expect("valid method pattern")
});

/// Words that look like a method header when followed by `(...) {`.
const NOT_METHODS: &[&str] = &["if", "for", "while", "switch", "catch", "with", "function", "return"];

#[derive(Debug, Default, Clone, Copy)]
pub struct PatternExtractor;

impl PatternExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LanguageExtractor for PatternExtractor {
    fn extract(&self, file: &SourceFile) -> Result<FileSchema, ExtractionError> {
        let mut schema = FileSchema::new(
            file.rel_path.clone(),
            file.language.tag(),
            Provenance::TextPattern,
        );
        match file.language {
            Language::Python => extract_python(&file.text, &mut schema),
            Language::JavaScript | Language::TypeScript | Language::Tsx => {
                extract_c_style(&file.text, &mut schema)
            }
        }
        sort_by_line(&mut schema);
        Ok(schema)
    }
}

enum Scope {
    Class { indent: usize, idx: usize },
    Function { indent: usize },
    Opaque { indent: usize },
    TypeChecking { indent: usize },
}

impl Scope {
    fn indent(&self) -> usize {
        match self {
            Scope::Class { indent, .. }
            | Scope::Function { indent }
            | Scope::Opaque { indent }
            | Scope::TypeChecking { indent } => *indent,
        }
    }
}

/// Indentation decides ownership: a `def` indented under a `class` is a
/// method, anything under a `def` is ignored.
fn extract_python(text: &str, schema: &mut FileSchema) {
    let mut scopes: Vec<Scope> = Vec::new();
    let mut open_string: Option<&'static str> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        // lines inside a multi-line string say nothing about indentation
        if let Some(delim) = open_string {
            if raw.contains(delim) {
                open_string = None;
            }
            continue;
        }
        let trimmed = raw.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        open_string = unclosed_triple_quote(raw);
        let indent = indent_width(raw);
        while scopes.last().is_some_and(|scope| indent <= scope.indent()) {
            scopes.pop();
        }
        let in_function = scopes
            .iter()
            .any(|scope| matches!(scope, Scope::Function { .. } | Scope::Opaque { .. }));
        let type_checking = scopes
            .iter()
            .any(|scope| matches!(scope, Scope::TypeChecking { .. }));

        for cap in PY_DYNAMIC.captures_iter(trimmed) {
            schema.imports.push(ImportRecord {
                name: cap[1].to_string(),
                kind: ImportKind::Dynamic,
                members: Vec::new(),
                file_path: schema.path.clone(),
                line,
            });
        }

        if let Some(cap) = PY_CLASS.captures(trimmed) {
            if in_function {
                scopes.push(Scope::Opaque { indent });
                continue;
            }
            let bases = cap
                .get(2)
                .map(|m| {
                    m.as_str()
                        .split(',')
                        .map(str::trim)
                        .filter(|base| !base.is_empty() && !base.contains('='))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            schema.types.push(TypeRecord {
                name: cap[1].to_string(),
                bases,
                methods: Vec::new(),
                line,
                is_exported: false,
                file_path: schema.path.clone(),
            });
            scopes.push(Scope::Class {
                indent,
                idx: schema.types.len() - 1,
            });
            continue;
        }
        if let Some(cap) = PY_DEF.captures(trimmed) {
            if !in_function {
                let record = FunctionRecord {
                    name: cap[2].to_string(),
                    params: cap.get(3).map(|m| split_params(m.as_str())).unwrap_or_default(),
                    return_type: cap.get(4).map(|m| m.as_str().trim().to_string()),
                    line,
                    is_async: cap.get(1).is_some(),
                    is_exported: false,
                    file_path: schema.path.clone(),
                };
                match scopes.last() {
                    Some(Scope::Class { idx, .. }) => schema.types[*idx].methods.push(record),
                    None | Some(Scope::TypeChecking { .. }) => schema.functions.push(record),
                    Some(_) => {}
                }
            }
            scopes.push(Scope::Function { indent });
            continue;
        }
        if PY_TYPE_CHECKING.is_match(trimmed) {
            scopes.push(Scope::TypeChecking { indent });
            continue;
        }
        let kind = if type_checking {
            ImportKind::TypeOnly
        } else {
            ImportKind::Static
        };
        if let Some(cap) = PY_FROM.captures(trimmed) {
            if &cap[1] == "__future__" {
                continue;
            }
            let members = cap[2]
                .split(',')
                .map(|part| part.trim().trim_matches(|c| c == '(' || c == ')' || c == '\\'))
                .filter_map(|part| part.split_whitespace().next())
                .map(str::to_string)
                .collect();
            schema.imports.push(ImportRecord {
                name: cap[1].to_string(),
                kind,
                members,
                file_path: schema.path.clone(),
                line,
            });
        } else if let Some(cap) = PY_IMPORT.captures(trimmed) {
            for part in cap[1].split(',') {
                if let Some(name) = part.split_whitespace().next() {
                    schema.imports.push(ImportRecord {
                        name: name.to_string(),
                        kind,
                        members: Vec::new(),
                        file_path: schema.path.clone(),
                        line,
                    });
                }
            }
        }
    }
}

fn extract_c_style(text: &str, schema: &mut FileSchema) {
    let lines = LineIndex::new(text);
    let depths = line_depths(text);
    let depth_at = |line: usize| depths.get(line - 1).copied().unwrap_or(0);
    let path = schema.path.clone();
    let import = |name: &str, kind: ImportKind, offset: usize| ImportRecord {
        name: name.to_string(),
        kind,
        members: Vec::new(),
        file_path: path.clone(),
        line: lines.line_of(offset),
    };

    for cap in JS_IMPORT_FROM.captures_iter(text) {
        let kind = if cap.get(1).is_some() {
            ImportKind::TypeOnly
        } else {
            ImportKind::Static
        };
        schema.imports.push(import(&cap[2], kind, offset_of(&cap)));
    }
    for cap in JS_IMPORT_BARE.captures_iter(text) {
        schema
            .imports
            .push(import(&cap[1], ImportKind::Static, offset_of(&cap)));
    }
    for cap in JS_DYNAMIC.captures_iter(text) {
        schema
            .imports
            .push(import(&cap[1], ImportKind::Dynamic, offset_of(&cap)));
    }
    for cap in JS_REQUIRE.captures_iter(text) {
        schema
            .imports
            .push(import(&cap[1], ImportKind::Require, offset_of(&cap)));
    }

    // (type index, first line, last body line, depth of the class line)
    let mut class_bodies: Vec<(usize, usize, usize, usize)> = Vec::new();
    for cap in JS_CLASS.captures_iter(text) {
        let line = lines.line_of(offset_of(&cap));
        class_bodies.push((schema.types.len(), line, block_end(&depths, line), depth_at(line)));
        let mut bases = Vec::new();
        if let Some(base) = cap.get(3) {
            bases.push(base.as_str().trim().to_string());
        }
        if let Some(list) = cap.get(4) {
            bases.extend(split_type_list(list.as_str()));
        }
        schema.types.push(TypeRecord {
            name: cap[2].to_string(),
            bases,
            methods: Vec::new(),
            line,
            is_exported: cap.get(1).is_some(),
            file_path: schema.path.clone(),
        });
    }
    for cap in JS_METHOD.captures_iter(text) {
        let name = &cap[2];
        if NOT_METHODS.contains(&name) {
            continue;
        }
        let line = lines.line_of(offset_of(&cap));
        let owner = class_bodies
            .iter()
            .filter(|(_, start, end, depth)| *start < line && line <= *end && depth_at(line) == depth + 1)
            .max_by_key(|(_, start, _, _)| *start);
        let Some((idx, ..)) = owner else {
            continue;
        };
        schema.types[*idx].methods.push(FunctionRecord {
            name: name.to_string(),
            params: cap.get(3).map(|m| split_params(m.as_str())).unwrap_or_default(),
            return_type: cap.get(4).map(|m| m.as_str().trim().to_string()),
            line,
            is_async: cap.get(1).is_some(),
            is_exported: false,
            file_path: schema.path.clone(),
        });
    }
    for cap in JS_INTERFACE.captures_iter(text) {
        schema.types.push(TypeRecord {
            name: cap[2].to_string(),
            bases: cap.get(3).map(|m| split_type_list(m.as_str())).unwrap_or_default(),
            methods: Vec::new(),
            line: lines.line_of(offset_of(&cap)),
            is_exported: cap.get(1).is_some(),
            file_path: schema.path.clone(),
        });
    }
    for cap in JS_FUNCTION.captures_iter(text) {
        let line = lines.line_of(offset_of(&cap));
        if depth_at(line) > 0 {
            continue;
        }
        schema.functions.push(FunctionRecord {
            name: cap[3].to_string(),
            params: cap.get(4).map(|m| split_params(m.as_str())).unwrap_or_default(),
            return_type: cap.get(5).map(|m| m.as_str().trim().to_string()),
            line,
            is_async: cap.get(2).is_some(),
            is_exported: cap.get(1).is_some(),
            file_path: schema.path.clone(),
        });
    }
    for cap in JS_ARROW.captures_iter(text) {
        let line = lines.line_of(offset_of(&cap));
        if depth_at(line) > 0 {
            continue;
        }
        let params = match (cap.get(4), cap.get(5)) {
            (Some(list), _) => split_params(list.as_str()),
            (None, Some(single)) => vec![Parameter::new(single.as_str(), None)],
            (None, None) => Vec::new(),
        };
        schema.functions.push(FunctionRecord {
            name: cap[2].to_string(),
            params,
            return_type: cap.get(6).map(|m| m.as_str().trim().to_string()),
            line,
            is_async: cap.get(3).is_some(),
            is_exported: cap.get(1).is_some(),
            file_path: schema.path.clone(),
        });
    }
}

/// Brace depth at the start of every line, skipping braces in strings and
/// comments. Regex literals and `${}` inside templates are not tracked.
fn line_depths(text: &str) -> Vec<usize> {
    #[derive(Clone, Copy)]
    enum Lex {
        Code,
        Quoted(char),
        LineComment,
        BlockComment,
    }
    let mut depths = vec![0];
    let mut depth = 0usize;
    let mut state = Lex::Code;
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match state {
            Lex::Code => match ch {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                '"' | '\'' | '`' => state = Lex::Quoted(ch),
                '/' if chars.peek() == Some(&'/') => state = Lex::LineComment,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = Lex::BlockComment;
                }
                _ => {}
            },
            Lex::Quoted(quote) => match ch {
                '\\' => {
                    if chars.next() == Some('\n') {
                        depths.push(depth);
                    }
                }
                '\n' if quote != '`' => state = Lex::Code,
                _ if ch == quote => state = Lex::Code,
                _ => {}
            },
            Lex::LineComment => {
                if ch == '\n' {
                    state = Lex::Code;
                }
            }
            Lex::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Lex::Code;
                }
            }
        }
        if ch == '\n' {
            depths.push(depth);
        }
    }
    depths
}

/// Last line of the block opened on `line`: every following line that
/// starts deeper than `line` does.
fn block_end(depths: &[usize], line: usize) -> usize {
    let Some(&depth) = depths.get(line - 1) else {
        return line;
    };
    let mut end = line;
    while depths.get(end).is_some_and(|next| *next > depth) {
        end += 1;
    }
    end
}

/// The triple-quote delimiter left open at the end of `line`, if any.
fn unclosed_triple_quote(line: &str) -> Option<&'static str> {
    let mut open: Option<&'static str> = None;
    let mut rest = line;
    loop {
        match open {
            None => {
                let next = ["\"\"\"", "'''"]
                    .into_iter()
                    .filter_map(|delim| rest.find(delim).map(|pos| (pos, delim)))
                    .min_by_key(|(pos, _)| *pos);
                let (pos, delim) = next?;
                open = Some(delim);
                rest = &rest[pos + 3..];
            }
            Some(delim) => {
                let Some(pos) = rest.find(delim) else {
                    return open;
                };
                open = None;
                rest = &rest[pos + 3..];
            }
        }
    }
}

/// Splits `a: int, b = 2, *rest` into name/type-hint pairs. Shared with the
/// matcher backend, which only sees parameter text.
pub(crate) fn split_params(raw: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in raw.chars() {
        match ch {
            '(' | '[' | '{' | '<' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' | '>' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                out.extend(parse_param(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    out.extend(parse_param(&current));
    out
}

fn parse_param(raw: &str) -> Option<Parameter> {
    let without_default = match raw.split_once('=') {
        Some((head, _)) if !head.trim_end().ends_with(['<', '>', '!']) => head,
        _ => raw,
    };
    let (name, type_hint) = match without_default.split_once(':') {
        Some((name, hint)) => (name.trim(), Some(hint.trim().to_string())),
        None => (without_default.trim(), None),
    };
    let name = name.trim_end_matches('?');
    if name.is_empty() || name == "*" || name == "/" {
        return None;
    }
    Some(Parameter::new(
        name,
        type_hint.filter(|hint| !hint.is_empty()),
    ))
}

fn split_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|ch| ch.is_whitespace())
        .map(|ch| if ch == '\t' { 4 } else { 1 })
        .sum()
}

/// Offset of the construct itself, past any leading indentation the
/// line-anchored patterns consume.
fn offset_of(cap: &regex::Captures<'_>) -> usize {
    let Some(whole) = cap.get(0) else {
        return 0;
    };
    let skipped = whole.as_str().len() - whole.as_str().trim_start().len();
    whole.start() + skipped
}

pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    /// 1-based line containing `offset`.
    pub(crate) fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|start| *start <= offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(path: &str, language: Language, text: &str) -> FileSchema {
        PatternExtractor::new()
            .extract(&SourceFile::in_memory(path, language, text))
            .unwrap()
    }

    #[test]
    fn python_methods_follow_indentation() {
        let schema = extract(
            "a.py",
            Language::Python,
            "import os, sys as system\nfrom .util import (helper,\n\nclass Foo(Base, metaclass=Meta):\n    def method(self, x: int = 1) -> str:\n        def local():\n            pass\n        return ''\n\nasync def run(a, *args, **kwargs):\n    pass\n",
        );
        assert_eq!(schema.provenance, Provenance::TextPattern);
        assert_eq!(schema.types.len(), 1);
        assert_eq!(schema.types[0].bases, vec!["Base"]);
        let methods: Vec<_> = schema.types[0].methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(methods, vec!["method"]);
        assert_eq!(
            schema.types[0].methods[0].params[1],
            Parameter::new("x", Some("int".into()))
        );
        assert_eq!(schema.types[0].methods[0].return_type.as_deref(), Some("str"));
        let functions: Vec<_> = schema.functions.iter().map(|f| (f.name.as_str(), f.is_async)).collect();
        assert_eq!(functions, vec![("run", true)]);
        let imports: Vec<_> = schema.imports.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(imports, vec!["os", "sys", ".util"]);
    }

    #[test]
    fn c_style_imports_cover_all_kinds() {
        let schema = extract(
            "src/app.ts",
            Language::TypeScript,
            "import React from 'react';\nimport { a,\n  b } from \"./util\";\nimport type { User } from './types';\nimport './styles.css';\nconst fs = require('fs');\nconst lazy = () => import('./lazy');\nexport { x } from './x';\n",
        );
        let imports: Vec<_> = schema
            .imports
            .iter()
            .map(|i| (i.name.as_str(), i.kind, i.line))
            .collect();
        assert_eq!(
            imports,
            vec![
                ("react", ImportKind::Static, 1),
                ("./util", ImportKind::Static, 2),
                ("./types", ImportKind::TypeOnly, 4),
                ("./styles.css", ImportKind::Static, 5),
                ("fs", ImportKind::Require, 6),
                ("./lazy", ImportKind::Dynamic, 7),
                ("./x", ImportKind::Static, 8),
            ]
        );
    }

    #[test]
    fn c_style_functions_and_types() {
        let schema = extract(
            "src/app.ts",
            Language::TypeScript,
            "export abstract class Repo extends Base implements Store, Cache {\n}\ninterface Props extends A, B {\n}\nexport async function load(id: string, opts?: Options): Promise<User> {\n}\nconst add = (a: number, b: number) => a + b;\nexport const double = async x => x * 2;\n",
        );
        assert_eq!(schema.types[0].name, "Repo");
        assert!(schema.types[0].is_exported);
        assert_eq!(schema.types[0].bases, vec!["Base", "Store", "Cache"]);
        assert_eq!(schema.types[1].bases, vec!["A", "B"]);

        let load = &schema.functions[0];
        assert_eq!(load.name, "load");
        assert!(load.is_async && load.is_exported);
        assert_eq!(load.line, 5);
        assert_eq!(load.return_type.as_deref(), Some("Promise<User>"));
        assert_eq!(
            load.params,
            vec![
                Parameter::new("id", Some("string".into())),
                Parameter::new("opts", Some("Options".into())),
            ]
        );
        assert_eq!(schema.functions[1].name, "add");
        assert_eq!(schema.functions[2].name, "double");
        assert!(schema.functions[2].is_async && schema.functions[2].is_exported);
        assert_eq!(schema.functions[2].params, vec![Parameter::new("x", None)]);
    }

    #[test]
    fn semicolon_free_reexport_keeps_its_line() {
        let schema = extract(
            "src/index.ts",
            Language::TypeScript,
            "export const VERSION = 2\nexport { a } from './a'\nimport {\n  b,\n} from './b'\n",
        );
        let imports: Vec<_> = schema.imports.iter().map(|i| (i.name.as_str(), i.line)).collect();
        assert_eq!(imports, vec![("./a", 2), ("./b", 3)]);
    }

    #[test]
    fn class_methods_belong_to_the_class() {
        let schema = extract(
            "src/cart.ts",
            Language::TypeScript,
            "export class Cart {\n  add(item: Item) {\n    const log = () => 1;\n    if (item) {\n    }\n  }\n  async total(): Promise<number> {\n    function sum() {\n    }\n    return 0;\n  }\n  static get empty() {\n    return new Cart();\n  }\n}\nconst config = {\n  load() {\n  },\n};\nexport function checkout(cart: Cart) {\n  const inner = async () => 2;\n}\n",
        );
        assert_eq!(schema.types.len(), 1);
        let methods: Vec<_> = schema.types[0]
            .methods
            .iter()
            .map(|m| (m.name.as_str(), m.line, m.is_async))
            .collect();
        assert_eq!(
            methods,
            vec![("add", 2, false), ("total", 7, true), ("empty", 12, false)]
        );
        assert_eq!(
            schema.types[0].methods[0].params,
            vec![Parameter::new("item", Some("Item".into()))]
        );
        assert_eq!(schema.types[0].methods[1].return_type.as_deref(), Some("Promise<number>"));

        let functions: Vec<_> = schema.functions.iter().map(|f| (f.name.as_str(), f.line)).collect();
        assert_eq!(functions, vec![("checkout", 20)]);
    }

    #[test]
    fn braces_in_strings_and_comments_do_not_count() {
        let depths = line_depths("const a = '{';\n// }\n/* { */\nfunction f() {\n  `${x}\n  }`;\n}\n");
        assert_eq!(depths, vec![0, 0, 0, 0, 1, 1, 1, 0]);
    }

    #[test]
    fn python_multiline_strings_do_not_close_scopes() {
        let schema = extract(
            "db.py",
            Language::Python,
            "def outer():\n    query = \"\"\"\nSELECT *\nFROM users\n\"\"\"\n    def helper():\n        return query\n    return helper\n\ndef after():\n    '''doc'''\n",
        );
        let functions: Vec<_> = schema.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(functions, vec!["outer", "after"]);
    }

    #[test]
    fn line_index_is_one_based() {
        let index = LineIndex::new("a\nb\nc");
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 2);
        assert_eq!(index.line_of(4), 3);
    }
}
