// tests/change_dispatcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use buildwatch::config::ConfigFile;
use buildwatch::engine::Engine;
use buildwatch::errors::BuildwatchError;
use buildwatch::types::MissingWatchTaskPolicy;
use buildwatch::watch::{ChangeDispatcher, ChangeEvent, ChangeKind, WatchMessage, DEFAULT_DEBOUNCE};
use buildwatch_test_utils::builders::ConfigFileBuilder;
use buildwatch_test_utils::fake_process::FakeProcessBackend;
use buildwatch_test_utils::recording_sink::RecordingSink;
use buildwatch_test_utils::{init_tracing, wait_until, with_timeout};

const ROOT: &str = "/project";

struct Harness {
    backend: FakeProcessBackend,
    dispatcher: ChangeDispatcher,
    fatal_rx: mpsc::UnboundedReceiver<BuildwatchError>,
}

fn harness(cfg: ConfigFile, backend: FakeProcessBackend) -> Harness {
    init_tracing();
    let engine = Engine::new(
        &cfg,
        ROOT,
        Arc::new(backend.clone()),
        Arc::new(RecordingSink::new()),
    )
    .unwrap();

    let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
    let dispatcher = ChangeDispatcher::new(
        ROOT,
        Arc::new(engine.rules().to_vec()),
        Arc::clone(engine.executor()),
        cfg.settings().missing_watch_task,
        fatal_tx,
    );

    Harness {
        backend,
        dispatcher,
        fatal_rx,
    }
}

fn at(rel: &str) -> PathBuf {
    Path::new(ROOT).join(rel)
}

async fn join_all(handles: Vec<tokio::task::JoinHandle<()>>) {
    for handle in handles {
        with_timeout(handle).await.unwrap();
    }
}

#[tokio::test]
async fn go_change_restarts_the_daemon_task_once() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["./server"])
        .watch_task("src/*.go", "#${build}")
        .build();
    let h = harness(cfg, FakeProcessBackend::new().hang("./server"));

    let handles = h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.go")));
    assert_eq!(handles.len(), 1);
    join_all(handles).await;

    assert_eq!(h.backend.spawn_count("./server"), 1);
    assert_eq!(h.backend.live_count("./server"), 1);

    join_all(h.dispatcher.dispatch(&ChangeEvent::write(at("src/util.go")))).await;

    assert_eq!(h.backend.spawn_count("./server"), 2);
    assert_eq!(h.backend.killed(), vec![h.backend.pids_of("./server")[0]]);
    assert_eq!(h.backend.live_count("./server"), 1);
}

#[tokio::test]
async fn non_write_events_are_ignored() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .watch_task("src/*.go", "build")
        .build();
    let h = harness(cfg, FakeProcessBackend::new());

    let event = ChangeEvent {
        path: at("src/main.go"),
        kind: ChangeKind::Other,
    };

    assert!(h.dispatcher.dispatch(&event).is_empty());
    assert!(h.backend.spawned().is_empty());
}

#[tokio::test]
async fn paths_outside_every_pattern_trigger_nothing() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .watch_task("src/*.go", "build")
        .build();
    let h = harness(cfg, FakeProcessBackend::new());

    assert!(h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.rs"))).is_empty());
    assert!(h.dispatcher.dispatch(&ChangeEvent::write(at("src/api/x.go"))).is_empty());
    assert!(h.dispatcher.dispatch(&ChangeEvent::write("/elsewhere/src/main.go")).is_empty());
}

#[tokio::test]
async fn every_matching_rule_is_triggered() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .with_task("lint", &["go vet"])
        .watch_task("src/*.go", "build")
        .watch_task("src/main.go", "lint")
        .watch_commands("src/*", &["echo changed"])
        .build();
    let h = harness(cfg, FakeProcessBackend::new());

    let handles = h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.go")));
    assert_eq!(handles.len(), 3);
    join_all(handles).await;

    let mut spawned = h.backend.spawned();
    spawned.sort();
    assert_eq!(spawned, vec!["echo changed", "go build", "go vet"]);
}

#[tokio::test]
async fn command_list_target_runs_as_blocking_commands() {
    let cfg = ConfigFileBuilder::new()
        .with_variable("name", "site")
        .with_task("default", &["true"])
        .watch_commands("assets/*.css", &["echo rebuilding ${name}", "make css"])
        .build();
    let h = harness(cfg, FakeProcessBackend::new());

    join_all(h.dispatcher.dispatch(&ChangeEvent::write(at("assets/main.css")))).await;

    assert_eq!(h.backend.spawned(), vec!["echo rebuilding site", "make css"]);
}

#[tokio::test]
async fn missing_task_is_logged_under_log_policy() {
    let cfg = ConfigFileBuilder::new()
        .with_task("default", &["true"])
        .watch_task("src/*.go", "ghost")
        .build();
    let mut h = harness(cfg, FakeProcessBackend::new());

    join_all(h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.go")))).await;

    assert!(h.fatal_rx.try_recv().is_err());
    assert!(h.backend.spawned().is_empty());
}

#[tokio::test]
async fn missing_task_is_escalated_under_exit_policy() {
    let cfg = ConfigFileBuilder::new()
        .with_task("default", &["true"])
        .watch_task("src/*.go", "ghost")
        .missing_watch_task(MissingWatchTaskPolicy::Exit)
        .build();
    let mut h = harness(cfg, FakeProcessBackend::new());

    join_all(h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.go")))).await;

    let err = h.fatal_rx.try_recv().unwrap();
    assert!(matches!(err, BuildwatchError::TaskNotFound(name) if name == "ghost"));
}

#[tokio::test]
async fn command_failure_is_never_escalated() {
    let cfg = ConfigFileBuilder::new()
        .with_task("test", &["go test"])
        .watch_task("src/*.go", "test")
        .missing_watch_task(MissingWatchTaskPolicy::Exit)
        .build();
    let mut h = harness(cfg, FakeProcessBackend::new().exit_with("go test", 1));

    join_all(h.dispatcher.dispatch(&ChangeEvent::write(at("src/main.go")))).await;

    assert_eq!(h.backend.spawn_count("go test"), 1);
    assert!(h.fatal_rx.try_recv().is_err());
}

#[tokio::test]
async fn run_loop_survives_watch_errors_and_handles_later_events() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .watch_task("src/*.go", "build")
        .build();
    let h = harness(cfg, FakeProcessBackend::new());
    let backend = h.backend.clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = h.dispatcher.spawn(rx);

    tx.send(WatchMessage::Error("inotify queue overflow".to_string())).unwrap();
    tx.send(WatchMessage::Change(ChangeEvent::write(at("src/main.go")))).unwrap();

    wait_until(|| backend.spawn_count("go build") == 1).await;

    drop(tx);
    with_timeout(handle).await.unwrap();
}

#[tokio::test]
async fn slow_task_does_not_block_later_events() {
    let cfg = ConfigFileBuilder::new()
        .with_task("slow", &["./long-job"])
        .with_task("fast", &["echo fast"])
        .watch_task("src/*.go", "slow")
        .watch_task("docs/*.md", "fast")
        .build();
    // `./long-job` runs in blocking mode and never finishes.
    let h = harness(cfg, FakeProcessBackend::new().hang("./long-job"));
    let backend = h.backend.clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let _handle = h.dispatcher.spawn(rx);

    tx.send(WatchMessage::Change(ChangeEvent::write(at("src/main.go")))).unwrap();
    wait_until(|| backend.spawn_count("./long-job") == 1).await;

    tx.send(WatchMessage::Change(ChangeEvent::write(at("docs/index.md")))).unwrap();
    wait_until(|| backend.spawn_count("echo fast") == 1).await;

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(backend.live_count("./long-job"), 1);
}

#[tokio::test]
async fn burst_of_writes_to_one_file_triggers_once() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .watch_task("src/*.go", "build")
        .build();
    let h = harness(cfg, FakeProcessBackend::new());
    let backend = h.backend.clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let _handle = h.dispatcher.spawn(rx);

    // A single save: truncate, then the new contents.
    tx.send(WatchMessage::Change(ChangeEvent::write(at("src/main.go")))).unwrap();
    tx.send(WatchMessage::Change(ChangeEvent::write(at("src/main.go")))).unwrap();

    wait_until(|| backend.spawn_count("go build") == 1).await;
    tokio::time::sleep(DEFAULT_DEBOUNCE * 3).await;
    assert_eq!(backend.spawn_count("go build"), 1);
}

#[tokio::test]
async fn pending_writes_are_dispatched_when_the_channel_closes() {
    let cfg = ConfigFileBuilder::new()
        .with_task("build", &["go build"])
        .watch_task("src/*.go", "build")
        .build();
    let h = harness(cfg, FakeProcessBackend::new());
    let backend = h.backend.clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let handle = h.dispatcher.with_debounce(Duration::from_secs(60)).spawn(rx);

    tx.send(WatchMessage::Change(ChangeEvent::write(at("src/main.go")))).unwrap();
    drop(tx);
    with_timeout(handle).await.unwrap();

    wait_until(|| backend.spawn_count("go build") == 1).await;
}
