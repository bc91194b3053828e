// tests/watch_registry.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use buildwatch::config::{TaskTarget, WatchTarget};
use buildwatch::errors::BuildwatchError;
use buildwatch::resolve::VariableResolver;
use buildwatch::types::UndefinedVariablePolicy;
use buildwatch::watch::{compile_rules, WatchRegistry, WatchRule};
use buildwatch_test_utils::fake_watch::FakeWatchBackend;
use buildwatch_test_utils::init_tracing;

fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

fn project() -> TempDir {
    init_tracing();
    let dir = TempDir::new().unwrap();
    touch(dir.path(), "src/main.go");
    touch(dir.path(), "src/util.go");
    touch(dir.path(), "src/api/handler.go");
    touch(dir.path(), "assets/site.css");
    touch(dir.path(), "README.md");
    dir
}

fn no_vars() -> VariableResolver {
    VariableResolver::new(BTreeMap::new(), UndefinedVariablePolicy::Strict).unwrap()
}

fn build_target() -> WatchTarget {
    WatchTarget::Task(TaskTarget::parse("build"))
}

fn rules(root: &Path, patterns: &[&str]) -> Vec<WatchRule> {
    let watch: BTreeMap<String, WatchTarget> = patterns
        .iter()
        .map(|p| (p.to_string(), build_target()))
        .collect();
    compile_rules(&watch, &no_vars(), root).unwrap()
}

#[test]
fn overlapping_patterns_register_a_directory_once() {
    let dir = project();
    let backend = FakeWatchBackend::new();
    let registry = WatchRegistry::new(backend.clone());

    let added = registry
        .register_rules(&rules(dir.path(), &["src/*.go", "src/main.go", "./src/util.go"]))
        .unwrap();

    assert_eq!(added, 1);
    assert_eq!(backend.registered(), vec![dir.path().join("src")]);
}

#[test]
fn each_containing_directory_is_registered() {
    let dir = project();
    let backend = FakeWatchBackend::new();
    let registry = WatchRegistry::new(backend.clone());

    registry
        .register_rules(&rules(dir.path(), &["src/*.go", "assets/*.css", "*.md"]))
        .unwrap();

    assert_eq!(
        registry.watched_directories(),
        vec![
            dir.path().to_path_buf(),
            dir.path().join("assets"),
            dir.path().join("src"),
        ]
    );
    assert_eq!(backend.registered().len(), 3);
}

#[test]
fn single_star_does_not_descend() {
    let dir = project();
    let registry = WatchRegistry::new(FakeWatchBackend::new());

    registry.register_rules(&rules(dir.path(), &["src/*.go"])).unwrap();

    assert!(registry.is_watched(&dir.path().join("src")));
    assert!(!registry.is_watched(&dir.path().join("src/api")));
}

#[test]
fn double_star_reaches_nested_directories() {
    let dir = project();
    let registry = WatchRegistry::new(FakeWatchBackend::new());

    registry.register_rules(&rules(dir.path(), &["src/**/*.go"])).unwrap();

    assert!(registry.is_watched(&dir.path().join("src")));
    assert!(registry.is_watched(&dir.path().join("src/api")));
}

#[test]
fn pattern_without_matches_registers_nothing() {
    let dir = project();
    let backend = FakeWatchBackend::new();
    let registry = WatchRegistry::new(backend.clone());

    let added = registry
        .register_rules(&rules(dir.path(), &["docs/*.rst"]))
        .unwrap();

    assert_eq!(added, 0);
    assert!(backend.registered().is_empty());
}

#[test]
fn malformed_pattern_is_invalid_pattern() {
    let dir = project();
    let result = WatchRule::compile("src/[.go", build_target(), &no_vars(), dir.path());

    match result {
        Err(BuildwatchError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "src/[.go"),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[test]
fn refused_directory_is_skipped() {
    let dir = project();
    let backend = FakeWatchBackend::new().refuse(dir.path().join("assets"));
    let registry = WatchRegistry::new(backend.clone());

    let added = registry
        .register_rules(&rules(dir.path(), &["assets/*.css", "src/*.go"]))
        .unwrap();

    assert_eq!(added, 1);
    assert_eq!(registry.watched_directories(), vec![dir.path().join("src")]);
}

#[test]
fn register_directory_reports_whether_it_was_new() {
    let dir = project();
    let backend = FakeWatchBackend::new();
    let registry = WatchRegistry::new(backend.clone());
    let src = dir.path().join("src");

    assert!(registry.register_directory(&src).unwrap());
    assert!(!registry.register_directory(&src).unwrap());
    assert_eq!(backend.registered(), vec![src]);
}

#[test]
fn variables_are_resolved_in_patterns() {
    let dir = project();
    let resolver = VariableResolver::new(
        BTreeMap::from([("srcdir".to_string(), "src".to_string())]),
        UndefinedVariablePolicy::Strict,
    )
    .unwrap();

    let rule = WatchRule::compile("${srcdir}/*.go", build_target(), &resolver, dir.path()).unwrap();

    assert_eq!(rule.pattern(), "src/*.go");
    assert!(rule.matches(&dir.path().join("src/main.go")));
    assert!(!rule.matches(&dir.path().join("src/api/handler.go")));
    assert!(!rule.matches(&dir.path().join("assets/site.css")));
}

#[test]
fn undefined_variable_in_pattern_is_an_error() {
    let dir = project();
    let result = WatchRule::compile("${nope}/*.go", build_target(), &no_vars(), dir.path());
    assert!(matches!(result, Err(BuildwatchError::UndefinedVariable(_))));
}

// `*` is not a valid file name character on Windows.
#[cfg(unix)]
#[test]
fn glob_characters_in_the_root_are_literal() {
    init_tracing();
    let parent = TempDir::new().unwrap();
    let root = parent.path().join("proj [v2]*");
    touch(&root, "src/main.go");
    touch(&parent.path().join("proj v"), "src/other.go");

    let backend = FakeWatchBackend::new();
    let registry = WatchRegistry::new(backend.clone());
    let rules = rules(&root, &["src/*.go"]);

    let added = registry.register_rules(&rules).unwrap();

    assert_eq!(added, 1);
    assert_eq!(backend.registered(), vec![root.join("src")]);
    assert!(rules[0].matches(&root.join("src/main.go")));
    assert!(!rules[0].matches(&parent.path().join("proj v/src/other.go")));
}
