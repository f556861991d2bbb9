use std::{
    fs::{remove_file, write},
    path::PathBuf,
    sync::mpsc::channel,
    thread::spawn,
    time::Duration,
};

use {
    async_channel::unbounded,
    notify::{
        Event,
        event::{AccessKind, CreateKind, DataChange, EventKind, ModifyKind, RemoveKind, RenameMode},
    },
    tempfile::tempdir,
};

use crate::{
    error::domain::SoundboardError,
    library::file_watcher::{
        FolderWatcher, RawEvent, WatchBatch, WatchBatcher, WatchEvent, classify_event,
    },
};

fn event(kind: EventKind, paths: &[&str]) -> Event {
    paths
        .iter()
        .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
}

#[test]
fn test_classify_create_and_remove() {
    let dir = PathBuf::from("/sounds");

    assert_eq!(
        classify_event(
            &event(EventKind::Create(CreateKind::File), &["/sounds/a.wav"]),
            &dir,
            true
        ),
        vec![RawEvent::Change(WatchEvent::Created(PathBuf::from(
            "/sounds/a.wav"
        )))]
    );
    assert_eq!(
        classify_event(
            &event(EventKind::Remove(RemoveKind::File), &["/sounds/a.wav"]),
            &dir,
            true
        ),
        vec![RawEvent::Change(WatchEvent::Removed(PathBuf::from(
            "/sounds/a.wav"
        )))]
    );
}

#[test]
fn test_classify_rename_both() {
    let dir = PathBuf::from("/sounds");
    let raw_events = classify_event(
        &event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/sounds/old.wav", "/sounds/new.wav"],
        ),
        &dir,
        true,
    );

    assert_eq!(
        raw_events,
        vec![
            RawEvent::Change(WatchEvent::Removed(PathBuf::from("/sounds/old.wav"))),
            RawEvent::Change(WatchEvent::Created(PathBuf::from("/sounds/new.wav"))),
        ]
    );
}

#[test]
fn test_classify_ignores_writes_access_and_settings_files() {
    let dir = PathBuf::from("/sounds");

    let write_event = event(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        &["/sounds/a.wav"],
    );
    assert!(classify_event(&write_event, &dir, true).is_empty());

    let access_event = event(EventKind::Access(AccessKind::Any), &["/sounds/a.wav"]);
    assert!(classify_event(&access_event, &dir, true).is_empty());

    let settings_event = event(EventKind::Create(CreateKind::File), &["/sounds/.settings"]);
    assert!(classify_event(&settings_event, &dir, true).is_empty());
    assert_eq!(classify_event(&settings_event, &dir, false).len(), 1);

    let temp_event = event(
        EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        &["/sounds/.settings.tmp"],
    );
    assert!(classify_event(&temp_event, &dir, true).is_empty());
}

#[test]
fn test_classify_keeps_hidden_sounds() {
    let dir = PathBuf::from("/sounds");

    assert_eq!(
        classify_event(
            &event(EventKind::Create(CreateKind::File), &["/sounds/.intro.wav"]),
            &dir,
            true
        ),
        vec![RawEvent::Change(WatchEvent::Created(PathBuf::from(
            "/sounds/.intro.wav"
        )))]
    );
    assert_eq!(
        classify_event(
            &event(EventKind::Remove(RemoveKind::File), &["/sounds/.intro.wav"]),
            &dir,
            true
        ),
        vec![RawEvent::Change(WatchEvent::Removed(PathBuf::from(
            "/sounds/.intro.wav"
        )))]
    );
}

#[test]
fn test_classify_directory_removal_is_failure() {
    let dir = PathBuf::from("/sounds");
    let raw_events = classify_event(
        &event(EventKind::Remove(RemoveKind::Folder), &["/sounds"]),
        &dir,
        true,
    );

    assert!(matches!(raw_events.as_slice(), [RawEvent::Failed(_)]));
}

#[test]
fn test_batcher_coalesces_queued_events() {
    let (sender, receiver) = unbounded();
    let mut batcher = WatchBatcher::new(receiver);

    for name in ["a.wav", "b.wav", "c.wav"] {
        sender
            .try_send(RawEvent::Change(WatchEvent::Created(PathBuf::from(name))))
            .unwrap();
    }

    let batch = batcher.next_batch().unwrap().unwrap();
    assert_eq!(batch.len(), 3);
    assert_eq!(batch.events()[0], WatchEvent::Created(PathBuf::from("a.wav")));

    sender
        .try_send(RawEvent::Change(WatchEvent::Removed(PathBuf::from("a.wav"))))
        .unwrap();
    let batch = batcher.next_batch().unwrap().unwrap();
    assert_eq!(
        batch.events(),
        &[WatchEvent::Removed(PathBuf::from("a.wav"))]
    );
}

#[test]
fn test_batcher_ends_after_failure() {
    let (sender, receiver) = unbounded();
    let mut batcher = WatchBatcher::new(receiver);

    sender
        .try_send(RawEvent::Failed("inotify queue overflow".to_string()))
        .unwrap();
    sender
        .try_send(RawEvent::Change(WatchEvent::Created(PathBuf::from("a.wav"))))
        .unwrap();

    assert!(matches!(
        batcher.next_batch(),
        Some(Err(SoundboardError::WatchRegistrationFailure { .. }))
    ));
    assert!(batcher.next_batch().is_none());
}

#[test]
fn test_batcher_ends_when_sender_is_dropped() {
    let (sender, receiver) = unbounded::<RawEvent>();
    let mut batcher = WatchBatcher::new(receiver);
    drop(sender);

    assert!(batcher.next_batch().is_none());
}

#[test]
fn test_watch_batch_is_never_empty() {
    assert!(WatchBatch::from_events(Vec::new()).is_none());
}

#[test]
fn test_watch_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    assert!(matches!(
        FolderWatcher::watch(&missing, None),
        Err(SoundboardError::WatchRegistrationFailure { .. })
    ));
}

#[test]
fn test_watcher_reports_created_and_removed_files() {
    let dir = tempdir().unwrap();
    let watcher = FolderWatcher::watch(dir.path(), None).unwrap();
    let (batch_tx, batch_rx) = channel();

    spawn(move || {
        for batch in watcher {
            if batch_tx.send(batch).is_err() {
                break;
            }
        }
    });

    let sound = dir.path().join("new.wav");
    write(&sound, b"RIFF").unwrap();
    let batch = batch_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("no batch after create")
        .unwrap();
    assert!(
        batch
            .events()
            .iter()
            .any(|event| matches!(event, WatchEvent::Created(path) if path.ends_with("new.wav")))
    );

    // Drain whatever else the create produced before checking the delete
    while batch_rx.recv_timeout(Duration::from_millis(200)).is_ok() {}

    remove_file(&sound).unwrap();
    let removed = (0..10)
        .filter_map(|_| batch_rx.recv_timeout(Duration::from_secs(1)).ok())
        .flatten()
        .any(|batch| {
            batch
                .events()
                .iter()
                .any(|event| matches!(event, WatchEvent::Removed(path) if path.ends_with("new.wav")))
        });
    assert!(removed);
}
