use codeschema::graph::{self, DependencyReport, EdgeKind};
use codeschema::indexer::Indexer;
use codeschema::indexer::scan::ScanOptions;
use codeschema::model::{DirectorySchema, FileSchema, ImportKind, ImportRecord, Provenance};
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn scan(root: &Path) -> DirectorySchema {
    let options = ScanOptions::new(true).without_matcher();
    Indexer::new_with_options(root.to_path_buf(), options)
        .unwrap()
        .scan()
        .unwrap()
}

fn schema(path: &str, language: &str, imports: &[(&str, ImportKind)]) -> FileSchema {
    let mut schema = FileSchema::new(path, language, Provenance::NativeSyntaxTree);
    for (idx, (name, kind)) in imports.iter().enumerate() {
        schema.imports.push(ImportRecord {
            name: name.to_string(),
            kind: *kind,
            members: Vec::new(),
            file_path: path.to_string(),
            line: idx + 1,
        });
    }
    schema
}

#[test]
fn mutual_python_imports_form_one_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "import b\n\ndef run():\n    pass\n");
    write(dir.path(), "b.py", "import a\n");

    let tree = scan(dir.path());
    let graph = graph::build(tree.all_files());
    assert_eq!(graph.nodes(), ["a.py", "b.py"]);
    assert_eq!(graph.internal_edges().count(), 2);

    let cycles = graph::find_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].files().len(), 2);
    assert_eq!(cycles[0].path().first(), cycles[0].path().last());
}

#[test]
fn files_without_imports_yield_no_edges() {
    let dir = tempfile::tempdir().unwrap();
    for idx in 0..25 {
        write(
            dir.path(),
            &format!("pkg/module_{idx:02}.py"),
            &format!("def handler_{idx}():\n    return {idx}\n"),
        );
    }
    let tree = scan(dir.path());
    assert_eq!(tree.all_files().len(), 25);

    let graph = graph::build(tree.all_files());
    assert_eq!(graph.nodes().len(), 25);
    assert!(graph.edges().is_empty());
    assert!(graph::find_cycles(&graph).is_empty());
}

#[test]
fn injected_three_file_cycle_is_reported() {
    let schemas = [
        schema("A.py", "python", &[("B", ImportKind::Static)]),
        schema("B.py", "python", &[("C", ImportKind::Static)]),
        schema("C.py", "python", &[("A", ImportKind::Static), ("json", ImportKind::Static)]),
        schema("D.py", "python", &[("A", ImportKind::Static)]),
    ];
    let cycles = graph::find_cycles(&graph::build(&schemas));
    assert_eq!(cycles.len(), 1);
    let mut members: Vec<_> = cycles[0].files().to_vec();
    members.sort();
    assert_eq!(members, ["A.py", "B.py", "C.py"]);
}

#[test]
fn acyclic_graph_reports_nothing_and_self_import_reports_pair() {
    let acyclic = [
        schema("a.py", "python", &[("b", ImportKind::Static), ("c", ImportKind::Static)]),
        schema("b.py", "python", &[("c", ImportKind::Static)]),
        schema("c.py", "python", &[]),
    ];
    assert!(graph::find_cycles(&graph::build(&acyclic)).is_empty());

    let selfish = [schema("a.py", "python", &[("a", ImportKind::Static)])];
    let cycles = graph::find_cycles(&graph::build(&selfish));
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].path(), ["a.py", "a.py"]);
}

#[test]
fn external_targets_keep_raw_specifiers() {
    let schemas = [
        schema(
            "src/app.ts",
            "typescript",
            &[
                ("react", ImportKind::Static),
                ("./util", ImportKind::Static),
                ("react", ImportKind::TypeOnly),
                ("lodash/fp", ImportKind::Require),
            ],
        ),
        schema("src/util.ts", "typescript", &[("./app", ImportKind::Dynamic)]),
    ];
    let graph = graph::build(&schemas);
    let external: Vec<_> = graph.external_edges().map(|e| (e.target.as_str(), e.import_kind)).collect();
    assert_eq!(
        external,
        vec![
            ("react", ImportKind::Static),
            ("react", ImportKind::TypeOnly),
            ("lodash/fp", ImportKind::Require),
        ]
    );
    let internal: Vec<_> = graph
        .internal_edges()
        .map(|e| (e.source.as_str(), e.target.as_str(), e.kind))
        .collect();
    assert_eq!(
        internal,
        vec![
            ("src/app.ts", "src/util.ts", EdgeKind::Internal),
            ("src/util.ts", "src/app.ts", EdgeKind::Internal),
        ]
    );

    let report = DependencyReport::from_graph(&graph).with_cycles(graph::find_cycles(&graph));
    assert_eq!(report.external_packages[0].name, "react");
    assert_eq!(report.external_packages[0].count, 2);
    assert_eq!(report.cycles.as_ref().map(Vec::len), Some(1));
}

#[test]
fn relative_python_package_imports_resolve() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app/__init__.py", "");
    write(dir.path(), "app/core.py", "from . import helpers\nfrom .models import User\n");
    write(dir.path(), "app/helpers.py", "import os\n");
    write(dir.path(), "app/models.py", "from app.core import run\n");

    let tree = scan(dir.path());
    let graph = graph::build(tree.all_files());
    let core: Vec<_> = graph
        .edges_from("app/core.py")
        .map(|e| (e.target.as_str(), e.resolved))
        .collect();
    assert_eq!(
        core,
        vec![("app/helpers.py", true), ("app/models.py", true)]
    );
    let cycles = graph::find_cycles(&graph);
    assert_eq!(cycles.len(), 1);
    let mut members = cycles[0].files().to_vec();
    members.sort();
    assert_eq!(members, ["app/core.py", "app/models.py"]);
}
