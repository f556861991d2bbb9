use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use tempfile::tempdir;

use crate::{
    audio::{
        registry::DeviceState,
        testing::{MockBackend, write_wav},
    },
    config::settings::{Settings, SettingsStore},
    error::{
        domain::SoundboardError,
        operational::{Disposition, ErrorPolicy},
    },
    library::sound_library::{SoundEntry, SoundLibrary},
    state::{app_state::AppState, snapshot::LibrarySnapshot},
};

fn app_state(dir: &Path, outputs: &[&str]) -> AppState<MockBackend> {
    AppState::new(
        SettingsStore::new(dir),
        MockBackend::with_outputs(outputs),
        ErrorPolicy::default(),
    )
}

fn snapshot(generation: u64, names: &[&str]) -> LibrarySnapshot {
    LibrarySnapshot {
        generation,
        entries: names
            .iter()
            .map(|name| SoundEntry::new(PathBuf::from(name)))
            .collect(),
    }
}

#[test]
fn test_restore_without_settings_file() {
    let dir = tempdir().unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);

    let settings = state.restore().clone();

    assert_eq!(settings, Settings::default());
    assert_eq!(state.device_state(), DeviceState::NoDevice);
}

#[test]
fn test_selected_device_survives_restart() {
    let dir = tempdir().unwrap();
    {
        let mut state = app_state(dir.path(), &["Speakers", "Headphones"]);
        state.restore();
        state.select_device("Headphones").unwrap();
        state.set_always_on_top(true);
    }

    let mut state = app_state(dir.path(), &["Speakers", "Headphones"]);
    let settings = state.restore().clone();

    assert_eq!(
        settings,
        Settings {
            device_name: Some("Headphones".to_string()),
            always_on_top: true,
        }
    );
    assert_eq!(
        state.device_state(),
        DeviceState::DeviceOpen("Headphones".to_string())
    );
}

#[test]
fn test_restore_with_vanished_device_has_no_device() {
    let dir = tempdir().unwrap();
    SettingsStore::new(dir.path())
        .save(&Settings {
            device_name: Some("USB Headset".to_string()),
            always_on_top: true,
        })
        .unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);

    let settings = state.restore().clone();

    assert_eq!(state.device_state(), DeviceState::NoDevice);
    assert_eq!(state.active_device(), None);
    assert_eq!(settings.device_name.as_deref(), Some("USB Headset"));
    assert!(settings.always_on_top);
    // The file still names the device so replugging it restores it
    assert_eq!(
        read_to_string(dir.path().join(".settings")).unwrap(),
        "USB Headset\r\ntrue\r\n"
    );
}

#[test]
fn test_toggle_after_vanished_device_keeps_stored_device() {
    let dir = tempdir().unwrap();
    SettingsStore::new(dir.path())
        .save(&Settings {
            device_name: Some("USB Headset".to_string()),
            always_on_top: true,
        })
        .unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);
    state.restore();

    state.set_always_on_top(false);

    assert_eq!(
        read_to_string(dir.path().join(".settings")).unwrap(),
        "USB Headset\r\nfalse\r\n"
    );

    // Plugged back in before the next start
    let mut state = app_state(dir.path(), &["Speakers", "USB Headset"]);
    state.restore();
    assert_eq!(state.active_device(), Some("USB Headset"));
}

#[test]
fn test_restore_with_corrupt_settings_uses_defaults() {
    let dir = tempdir().unwrap();
    write(dir.path().join(".settings"), "Speakers\r\nmaybe\r\n").unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);

    let settings = state.restore().clone();

    assert_eq!(settings, Settings::default());
    assert_eq!(state.device_state(), DeviceState::NoDevice);
}

#[test]
fn test_select_device_writes_settings_file() {
    let dir = tempdir().unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);

    state.select_device("Speakers").unwrap();

    assert_eq!(
        read_to_string(dir.path().join(".settings")).unwrap(),
        "Speakers\r\nfalse\r\n"
    );
}

#[test]
fn test_failed_select_keeps_stored_device() {
    let dir = tempdir().unwrap();
    let mut state = app_state(dir.path(), &["Speakers"]);
    state.select_device("Speakers").unwrap();

    let result = state.select_device("Bluetooth");

    assert!(matches!(
        result,
        Err(SoundboardError::DeviceUnavailable { .. })
    ));
    assert_eq!(state.active_device(), Some("Speakers"));
    assert_eq!(state.settings().device_name.as_deref(), Some("Speakers"));
}

#[test]
fn test_device_lost_during_switch_keeps_stored_device() {
    let dir = tempdir().unwrap();
    let backend = MockBackend {
        broken: vec!["Headphones".to_string()],
        ..MockBackend::with_outputs(&["Speakers", "Headphones"])
    };
    let mut state = AppState::new(SettingsStore::new(dir.path()), backend, ErrorPolicy::Lenient);
    state.select_device("Speakers").unwrap();

    assert!(state.select_device("Headphones").is_err());

    assert_eq!(state.device_state(), DeviceState::NoDevice);
    assert_eq!(
        read_to_string(dir.path().join(".settings")).unwrap(),
        "Speakers\r\nfalse\r\n"
    );
}

#[test]
fn test_play_by_index() {
    let dir = tempdir().unwrap();
    write_wav(&dir.path().join("a.wav"), 1, 44100);
    let mut state = app_state(dir.path(), &["Speakers"]);
    state
        .load_sounds(&SoundLibrary::new(dir.path().to_path_buf()))
        .unwrap();

    assert!(matches!(
        state.play(0),
        Err(SoundboardError::NoDeviceSelected)
    ));

    state.select_device("Speakers").unwrap();
    state.play(0).unwrap();
    assert!(state.registry().is_playing());

    assert!(matches!(state.play(1), Err(SoundboardError::IoFailure(_))));
}

#[test]
fn test_unplugged_device_cannot_be_reselected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.wav");
    write_wav(&path, 2, 48000);
    let mut state = app_state(dir.path(), &["Speakers"]);
    state.select_device("Speakers").unwrap();
    state.play_path(&path).unwrap();

    state.registry().backend().unplug("Speakers");

    assert!(state.list_outputs().unwrap().is_empty());
    assert!(state.select_device("Speakers").is_err());
    assert_eq!(state.active_device(), Some("Speakers"));
}

#[test]
fn test_stale_snapshot_is_ignored() {
    let dir = tempdir().unwrap();
    let mut state = app_state(dir.path(), &[]);

    assert!(state.apply_snapshot(snapshot(2, &["a.wav", "b.wav"])));
    assert!(!state.apply_snapshot(snapshot(1, &["a.wav"])));
    assert!(!state.apply_snapshot(snapshot(2, &[])));

    assert_eq!(state.generation(), 2);
    assert_eq!(state.sounds().len(), 2);

    assert!(state.apply_snapshot(snapshot(3, &[])));
    assert!(state.sounds().is_empty());
}

#[test]
fn test_toggle_always_on_top_persists() {
    let dir = tempdir().unwrap();
    let mut state = app_state(dir.path(), &[]);

    state.set_always_on_top(true);
    assert!(state.always_on_top());
    assert_eq!(
        read_to_string(dir.path().join(".settings")).unwrap(),
        "\r\ntrue\r\n"
    );

    state.set_always_on_top(false);
    assert_eq!(
        SettingsStore::new(dir.path()).load(),
        Settings::default()
    );
}

#[test]
fn test_report_uses_policy() {
    let dir = tempdir().unwrap();
    let state = app_state(dir.path(), &[]);

    assert_eq!(
        state.report(&SoundboardError::NoDeviceSelected, "Playing sound"),
        Disposition::Warn
    );
    assert_eq!(
        state.report(&SoundboardError::watch_failure("gone"), "Watching folder"),
        Disposition::Fatal
    );
}
