//! Window behaviour that can be checked without a display.

use libadwaita::{init, prelude::ApplicationExt};

use crate::{
    config::settings::get_sound_dir,
    ui::{application::SoundboardApplication, device_dialog::device_button_label},
};

#[test]
fn test_device_button_label_names_active_device() {
    assert_eq!(
        device_button_label(Some("Speakers")),
        "Change Output Device... (Speakers)"
    );
}

#[test]
fn test_device_button_label_without_device() {
    assert_eq!(
        device_button_label(None),
        "Change Output Device... (No Device selected)"
    );
}

#[test]
#[ignore = "Requires GTK display for UI testing"]
fn test_application_creates_sound_directory() {
    if init().is_err() {
        return;
    }

    let application = SoundboardApplication::new().unwrap();

    assert!(get_sound_dir().is_dir());
    assert_eq!(
        application.app.application_id().as_deref(),
        Some("io.github.soundboard")
    );
}
