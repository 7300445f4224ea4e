// Spawns throwaway scripts in place of the ast-grep binary. Kept to a single
// test so no other thread forks while a script is still open for writing.
#![cfg(unix)]

use codeschema::indexer::astgrep::{AstGrepMatcher, StructuralMatcher};
use codeschema::indexer::bindings;
use codeschema::indexer::extract::Language;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn process_matcher_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let target = Path::new("src/app.ts");
    let pattern = "function $NAME($$$PARAMS) { $$$ }";

    let ok = script(
        dir.path(),
        "ok.sh",
        r#"echo '[{"text":"function f() {}","range":{"start":{"line":2,"column":0}},"metaVariables":{"single":{"NAME":{"text":"f"}},"multi":{}}}]'"#,
    );
    let records = AstGrepMatcher::new(&ok, Duration::from_secs(10))
        .find(target, pattern, None, Language::TypeScript)
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(bindings::resolve(&records[0], "NAME").as_deref(), Some("f"));
    assert_eq!(bindings::start_line(&records[0]), 3);

    let no_match = script(dir.path(), "none.sh", "exit 1");
    let records = AstGrepMatcher::new(&no_match, Duration::from_secs(10))
        .find(target, pattern, None, Language::TypeScript)
        .unwrap();
    assert!(records.is_empty());

    let failing = script(dir.path(), "fail.sh", "echo 'bad pattern' >&2\nexit 2");
    let err = AstGrepMatcher::new(&failing, Duration::from_secs(10))
        .find(target, pattern, None, Language::TypeScript)
        .unwrap_err();
    assert!(err.reason.contains("bad pattern"));

    let garbage = script(dir.path(), "garbage.sh", "echo 'not json'");
    assert!(
        AstGrepMatcher::new(&garbage, Duration::from_secs(10))
            .find(target, pattern, None, Language::TypeScript)
            .is_err()
    );

    let hanging = script(dir.path(), "hang.sh", "exec sleep 30");
    let started = Instant::now();
    let err = AstGrepMatcher::new(&hanging, Duration::from_millis(300))
        .find(target, pattern, None, Language::TypeScript)
        .unwrap_err();
    assert!(err.reason.contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));

    // exits at once but leaves a background process holding stdout
    let lingering = script(dir.path(), "linger.sh", "(sleep 3) &\necho '[]'");
    let started = Instant::now();
    let err = AstGrepMatcher::new(&lingering, Duration::from_millis(300))
        .find(target, pattern, None, Language::TypeScript)
        .unwrap_err();
    assert!(err.reason.contains("still open"));
    assert!(started.elapsed() < Duration::from_secs(2));

    let selector_args = script(dir.path(), "args.sh", "echo \"$@\" >&2\nexit 2");
    let err = AstGrepMatcher::new(&selector_args, Duration::from_secs(10))
        .find(target, "class $C { $NAME() {} }", Some("method_definition"), Language::TypeScript)
        .unwrap_err();
    assert!(err.reason.contains("--selector method_definition --lang typescript"));
}
