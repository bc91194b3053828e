// tests/watch_events.rs

use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
    RenameMode,
};
use notify::EventKind;
use buildwatch::watch::ChangeKind;

#[test]
fn data_modifications_are_writes() {
    let writes = [
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        EventKind::Modify(ModifyKind::Data(DataChange::Size)),
        EventKind::Modify(ModifyKind::Data(DataChange::Any)),
        EventKind::Modify(ModifyKind::Any),
    ];

    for kind in &writes {
        assert_eq!(ChangeKind::from(kind), ChangeKind::Write, "{kind:?}");
    }
}

#[test]
fn everything_else_is_ignored() {
    let others = [
        EventKind::Create(CreateKind::File),
        EventKind::Remove(RemoveKind::File),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)),
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any)),
        EventKind::Access(AccessKind::Close(AccessMode::Write)),
        EventKind::Access(AccessKind::Open(AccessMode::Any)),
        EventKind::Any,
        EventKind::Other,
    ];

    for kind in &others {
        assert_eq!(ChangeKind::from(kind), ChangeKind::Other, "{kind:?}");
    }
}

#[cfg(target_os = "linux")]
mod inotify {
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use buildwatch::engine::Engine;
    use buildwatch::watch::DEFAULT_DEBOUNCE;
    use buildwatch_test_utils::builders::ConfigFileBuilder;
    use buildwatch_test_utils::fake_process::FakeProcessBackend;
    use buildwatch_test_utils::recording_sink::RecordingSink;
    use buildwatch_test_utils::{init_tracing, wait_until};

    #[tokio::test]
    async fn saving_a_watched_file_triggers_its_task_once() {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::write(root.join("src/main.go"), "package main\n").unwrap();

        let cfg = ConfigFileBuilder::new()
            .with_task("default", &["true"])
            .with_task("build", &["go build"])
            .watch_task("src/*.go", "build")
            .build();
        let backend = FakeProcessBackend::new();
        let engine = Engine::new(
            &cfg,
            &root,
            Arc::new(backend.clone()),
            Arc::new(RecordingSink::new()),
        )
        .unwrap();

        let run = tokio::spawn(async move { engine.run("default", true).await });

        // The initial task runs after the directories are registered.
        wait_until(|| backend.spawn_count("true") == 1).await;

        // Truncate plus write: two modify events from the kernel.
        fs::write(root.join("src/main.go"), "package main\n\nfunc main() {}\n").unwrap();

        wait_until(|| backend.spawn_count("go build") == 1).await;
        tokio::time::sleep(DEFAULT_DEBOUNCE * 3 + Duration::from_millis(200)).await;
        assert_eq!(backend.spawn_count("go build"), 1);

        // Untouched files and other kinds of change trigger nothing.
        fs::write(root.join("src/notes.txt"), "todo").unwrap();
        fs::remove_file(root.join("src/notes.txt")).unwrap();
        tokio::time::sleep(DEFAULT_DEBOUNCE * 3).await;
        assert_eq!(backend.spawn_count("go build"), 1);

        run.abort();
    }
}
