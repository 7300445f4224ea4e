use crate::indexer::extract::{ExtractionError, LanguageExtractor, SourceFile};
use crate::indexer::pattern::PatternExtractor;
use crate::model::{
    FileSchema, FunctionRecord, ImportKind, ImportRecord, Parameter, Provenance, TypeRecord,
};
use anyhow::Result;
use tracing::warn;
use tree_sitter::{Node, Parser};

#[derive(Clone, Copy)]
struct Context {
    /// Index into `FileSchema::types` of the class whose body is being walked.
    class: Option<usize>,
    fn_depth: usize,
    type_checking: bool,
}

/// Native syntax-tree extractor for Python.
///
/// Files whose tree contains error nodes are handed to the text-pattern
/// extractor instead, so a half-written file still yields an (approximate)
/// schema.
pub struct PythonExtractor {
    fallback: PatternExtractor,
}

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        // Fails early if the bundled grammar is ABI-incompatible with the runtime.
        new_parser()?;
        Ok(Self {
            fallback: PatternExtractor::new(),
        })
    }

    /// Parses without the text-pattern fallback. `Ok(None)` means the tree had
    /// syntax errors.
    pub fn extract_native(&self, file: &SourceFile) -> Result<Option<FileSchema>, ExtractionError> {
        let mut parser = new_parser().map_err(|err| ExtractionError::ParseFailure {
            path: file.rel_path.clone(),
            message: err.to_string(),
        })?;
        let Some(tree) = parser.parse(&file.text, None) else {
            return Err(ExtractionError::ParseFailure {
                path: file.rel_path.clone(),
                message: "parser produced no tree".to_string(),
            });
        };
        let root = tree.root_node();
        if root.has_error() {
            return Ok(None);
        }
        let mut schema = FileSchema::new(
            file.rel_path.clone(),
            file.language.tag(),
            Provenance::NativeSyntaxTree,
        );
        let ctx = Context {
            class: None,
            fn_depth: 0,
            type_checking: false,
        };
        walk_children(root, ctx, &file.text, &mut schema);
        Ok(Some(schema))
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extract(&self, file: &SourceFile) -> Result<FileSchema, ExtractionError> {
        match self.extract_native(file)? {
            Some(schema) => Ok(schema),
            None => {
                warn!(path = %file.rel_path, "syntax errors in python source, using text patterns");
                self.fallback.extract(file)
            }
        }
    }
}

fn new_parser() -> Result<Parser, tree_sitter::LanguageError> {
    let mut parser = Parser::new();
    let language = tree_sitter_python::LANGUAGE;
    parser.set_language(&language.into())?;
    Ok(parser)
}

fn walk_node(node: Node<'_>, ctx: Context, source: &str, schema: &mut FileSchema) {
    match node.kind() {
        "decorated_definition" => {
            if let Some(definition) = node.child_by_field_name("definition") {
                walk_node(definition, ctx, source, schema);
            }
            return;
        }
        "class_definition" => {
            handle_class(node, ctx, source, schema);
            return;
        }
        "function_definition" => {
            handle_function(node, ctx, source, schema);
            return;
        }
        "import_statement" | "import_from_statement" => {
            handle_import(node, ctx, source, schema);
            return;
        }
        "if_statement" if is_type_checking_guard(node, source) => {
            if let Some(consequence) = node.child_by_field_name("consequence") {
                let guarded = Context {
                    type_checking: true,
                    ..ctx
                };
                walk_children(consequence, guarded, source, schema);
            }
            let mut cursor = node.walk();
            for alternative in node.children_by_field_name("alternative", &mut cursor) {
                walk_node(alternative, ctx, source, schema);
            }
            return;
        }
        "call" => {
            if let Some(record) = dynamic_import(node, source, &schema.path) {
                schema.imports.push(record);
            }
        }
        _ => {}
    }
    walk_children(node, ctx, source, schema);
}

fn walk_children(node: Node<'_>, ctx: Context, source: &str, schema: &mut FileSchema) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        walk_node(child, ctx, source, schema);
    }
}

fn handle_class(node: Node<'_>, ctx: Context, source: &str, schema: &mut FileSchema) {
    let body = node.child_by_field_name("body");
    let name = node.child_by_field_name("name").map(|n| node_text(n, source));
    let (Some(name), true) = (name, ctx.fn_depth == 0) else {
        // Classes local to a function are not part of the file's surface, but
        // their bodies can still import things.
        if let Some(body) = body {
            walk_children(body, ctx, source, schema);
        }
        return;
    };
    schema.types.push(TypeRecord {
        name,
        bases: base_classes(node, source),
        methods: Vec::new(),
        line: line_of(node),
        is_exported: false,
        file_path: schema.path.clone(),
    });
    let next = Context {
        class: Some(schema.types.len() - 1),
        ..ctx
    };
    if let Some(body) = body {
        walk_children(body, next, source, schema);
    }
}

fn handle_function(node: Node<'_>, ctx: Context, source: &str, schema: &mut FileSchema) {
    if ctx.fn_depth == 0 {
        if let Some(name_node) = node.child_by_field_name("name") {
            let record = FunctionRecord {
                name: node_text(name_node, source),
                params: parameters(node, source),
                return_type: node
                    .child_by_field_name("return_type")
                    .map(|n| node_text(n, source)),
                line: line_of(node),
                is_async: is_async(node),
                is_exported: false,
                file_path: schema.path.clone(),
            };
            match ctx.class {
                Some(idx) => schema.types[idx].methods.push(record),
                None => schema.functions.push(record),
            }
        }
    }
    let next = Context {
        class: None,
        fn_depth: ctx.fn_depth + 1,
        ..ctx
    };
    if let Some(body) = node.child_by_field_name("body") {
        walk_children(body, next, source, schema);
    }
}

fn handle_import(node: Node<'_>, ctx: Context, source: &str, schema: &mut FileSchema) {
    let kind = if ctx.type_checking {
        ImportKind::TypeOnly
    } else {
        ImportKind::Static
    };
    let line = line_of(node);
    let mut cursor = node.walk();
    if node.kind() == "import_statement" {
        for name in node.children_by_field_name("name", &mut cursor) {
            schema.imports.push(ImportRecord {
                name: imported_name(name, source),
                kind,
                members: Vec::new(),
                file_path: schema.path.clone(),
                line,
            });
        }
        return;
    }
    let Some(module) = node.child_by_field_name("module_name") else {
        return;
    };
    let mut members: Vec<String> = node
        .children_by_field_name("name", &mut cursor)
        .map(|name| imported_name(name, source))
        .collect();
    let mut cursor = node.walk();
    if node
        .named_children(&mut cursor)
        .any(|child| child.kind() == "wildcard_import")
    {
        members.push("*".to_string());
    }
    schema.imports.push(ImportRecord {
        name: node_text(module, source),
        kind,
        members,
        file_path: schema.path.clone(),
        line,
    });
}

/// `importlib.import_module("x")` and `__import__("x")` with a literal argument.
fn dynamic_import(node: Node<'_>, source: &str, path: &str) -> Option<ImportRecord> {
    let function = node.child_by_field_name("function")?;
    let callee = node_text(function, source);
    if !matches!(
        callee.as_str(),
        "importlib.import_module" | "import_module" | "__import__"
    ) {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    let name = unquote_string_literal(&node_text(first, source))?;
    if name.is_empty() {
        return None;
    }
    Some(ImportRecord {
        name,
        kind: ImportKind::Dynamic,
        members: Vec::new(),
        file_path: path.to_string(),
        line: line_of(node),
    })
}

fn is_type_checking_guard(node: Node<'_>, source: &str) -> bool {
    node.child_by_field_name("condition")
        .map(|cond| node_text(cond, source))
        .is_some_and(|cond| cond == "TYPE_CHECKING" || cond.ends_with(".TYPE_CHECKING"))
}

fn parameters(node: Node<'_>, source: &str) -> Vec<Parameter> {
    let Some(params) = node.child_by_field_name("parameters") else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut cursor = params.walk();
    for child in params.named_children(&mut cursor) {
        let type_hint = child
            .child_by_field_name("type")
            .map(|n| node_text(n, source));
        let name = match child.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" => {
                Some(node_text(child, source))
            }
            "default_parameter" | "typed_default_parameter" => child
                .child_by_field_name("name")
                .map(|n| node_text(n, source)),
            "typed_parameter" => child.named_child(0).map(|n| node_text(n, source)),
            _ => None,
        };
        if let Some(name) = name {
            out.push(Parameter::new(name, type_hint));
        }
    }
    out
}

fn base_classes(node: Node<'_>, source: &str) -> Vec<String> {
    let Some(superclasses) = node.child_by_field_name("superclasses") else {
        return Vec::new();
    };
    let mut cursor = superclasses.walk();
    superclasses
        .named_children(&mut cursor)
        .filter(|child| !matches!(child.kind(), "keyword_argument" | "comment"))
        .map(|child| node_text(child, source))
        .filter(|base| !base.is_empty())
        .collect()
}

fn imported_name(node: Node<'_>, source: &str) -> String {
    if node.kind() == "aliased_import" {
        if let Some(name) = node.child_by_field_name("name") {
            return node_text(name, source);
        }
    }
    node_text(node, source)
}

fn is_async(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .take_while(|child| child.kind() != "def")
        .any(|child| child.kind() == "async");
    found
}

fn line_of(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

fn node_text(node: Node<'_>, source: &str) -> String {
    let start = node.start_byte();
    let end = node.end_byte();
    source.get(start..end).unwrap_or("").trim().to_string()
}

pub(crate) fn unquote_string_literal(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut idx = 0;
    for (offset, ch) in trimmed.char_indices() {
        if ch.is_ascii_alphabetic() {
            idx = offset + ch.len_utf8();
        } else {
            break;
        }
    }
    let rest = &trimmed[idx..];
    for quote in ["'''", "\"\"\"", "\"", "'", "`"] {
        if rest.len() >= quote.len() * 2 && rest.starts_with(quote) && rest.ends_with(quote) {
            return Some(rest[quote.len()..rest.len() - quote.len()].to_string());
        }
    }
    None
}
