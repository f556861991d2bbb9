//! Main application window.
//!
//! This module implements the `SoundboardApplication`, which owns the
//! application state on the GTK main thread and runs the folder watch loop
//! on a blocking worker.

use std::{
    cell::RefCell,
    path::{Path, PathBuf},
    rc::Rc,
    sync::Arc,
};

use {
    anyhow::Result,
    async_channel::{Receiver, bounded, unbounded},
    libadwaita::{
        AlertDialog, Application, ApplicationWindow, HeaderBar,
        gio::{AppInfo, AppLaunchContext, File},
        glib::MainContext,
        gtk::{
            Box as GtkBox, Button, CheckButton, Label, ListBox, ListBoxRow,
            Orientation::{Horizontal, Vertical},
            PolicyType::Never,
            ScrolledWindow,
            SelectionMode::Single,
        },
        prelude::{
            AdwApplicationWindowExt, AdwDialogExt, AlertDialogExt, ApplicationExt,
            ApplicationExtManual, BoxExt, ButtonExt, CheckButtonExt, FileExt, GtkWindowExt,
            ListBoxRowExt,
        },
    },
    tokio::task::spawn_blocking,
    tracing::{debug, info, warn},
};

use crate::{
    audio::output::CpalBackend,
    config::settings::{SettingsStore, ensure_sound_dir, get_sound_dir},
    error::{
        domain::SoundboardError,
        operational::{Disposition::Fatal, ErrorPolicy, ErrorReporter, ResultExt},
    },
    library::{
        file_watcher::{FolderWatcher, FolderWatcherConfig},
        scanner::LibraryScanner,
        sound_library::{SoundEntry, SoundLibrary},
    },
    state::{app_state::AppState, snapshot::SnapshotSlot},
    ui::device_dialog::{DeviceDialog, device_button_label},
};

/// Application state as shared between GTK signal handlers.
pub type SharedState = Rc<RefCell<AppState<CpalBackend>>>;

/// Title used for the window and for message dialogs.
pub const APP_TITLE: &str = "Soundboard";

/// Main application class with window management.
pub struct SoundboardApplication {
    /// The main application instance.
    pub app: Application,
    /// Directory the sounds are listed from.
    sound_dir: PathBuf,
    /// Application state, restored from the settings file.
    state: SharedState,
}

impl SoundboardApplication {
    /// Creates a new soundboard application instance.
    ///
    /// Creates the sound directory if needed, restores the settings, and
    /// lists the sounds already present.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SoundboardApplication` or an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the sound directory cannot be created or listed.
    pub fn new() -> Result<Self> {
        let sound_dir = get_sound_dir();
        ensure_sound_dir(&sound_dir).add_contextf(format!(
            "Failed to create sound directory {}",
            sound_dir.display()
        ))?;

        let mut state = AppState::new(
            SettingsStore::new(&sound_dir),
            CpalBackend::new(),
            ErrorPolicy::default(),
        );
        state.restore();
        state
            .load_sounds(&SoundLibrary::new(sound_dir.clone()))
            .add_context("Failed to list the sound directory")?;

        let app = Application::builder()
            .application_id("io.github.soundboard")
            .build();

        Ok(Self {
            app,
            sound_dir,
            state: Rc::new(RefCell::new(state)),
        })
    }

    /// Runs the application.
    ///
    /// This method starts the GTK main loop and displays the main window.
    pub fn run(&self) {
        self.app.connect_activate({
            let sound_dir = self.sound_dir.clone();
            let state = self.state.clone();

            move |app| build_ui(app, &sound_dir, &state)
        });

        self.app.run();
    }
}

/// Builds the main window and starts watching the sound directory.
fn build_ui(app: &Application, sound_dir: &Path, state: &SharedState) {
    let window = ApplicationWindow::builder()
        .application(app)
        .title(APP_TITLE)
        .default_width(420)
        .default_height(520)
        .build();

    let open_button = Button::with_label(&format!("Open {}", sound_dir.display()));
    open_button.connect_clicked({
        let sound_dir = sound_dir.to_path_buf();
        move |_| open_in_file_browser(&sound_dir)
    });

    let always_on_top = CheckButton::with_label("Always on top");
    always_on_top.set_active(state.borrow().always_on_top());
    always_on_top.connect_toggled({
        let state = state.clone();
        move |button| {
            let active = button.is_active();
            // GTK4 leaves stacking to the compositor; the choice is only kept
            info!("Always on top requested: {}", active);
            state.borrow_mut().set_always_on_top(active);
        }
    });

    let device_button = Button::with_label(&device_button_label(state.borrow().active_device()));

    let controls = GtkBox::builder()
        .orientation(Horizontal)
        .spacing(6)
        .build();
    controls.append(&open_button);
    controls.append(&always_on_top);

    let sound_list = ListBox::builder().selection_mode(Single).build();
    fill_sound_list(&sound_list, state.borrow().sounds());

    sound_list.connect_row_activated({
        let app = app.clone();
        let window = window.clone();
        let state = state.clone();
        move |_, row| {
            let Ok(index) = usize::try_from(row.index()) else {
                return;
            };
            let result = state.borrow_mut().play(index);
            if let Err(e) = result {
                show_error(&app, &window, &state, &e, "Failed to play sound");
            }
        }
    });

    device_button.connect_clicked({
        let app = app.clone();
        let window = window.clone();
        let state = state.clone();
        move |button| DeviceDialog::new(&app, &window, &state, button).present()
    });

    let scroller = ScrolledWindow::builder()
        .hscrollbar_policy(Never)
        .vexpand(true)
        .child(&sound_list)
        .build();

    let content = GtkBox::builder()
        .orientation(Vertical)
        .spacing(12)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();
    content.append(&controls);
    content.append(&device_button);
    content.append(&scroller);

    let main_box = GtkBox::builder().orientation(Vertical).build();
    main_box.append(&HeaderBar::new());
    main_box.append(&content);

    window.set_content(Some(&main_box));
    window.present();

    start_watching(app, &window, sound_dir, state, &sound_list);
}

/// Starts the watch loop on a blocking worker and applies its snapshots on
/// the main context.
///
/// The first snapshot is taken after the watch is registered, so it covers
/// files changed since the initial listing.
fn start_watching(
    app: &Application,
    window: &ApplicationWindow,
    sound_dir: &Path,
    state: &SharedState,
    sound_list: &ListBox,
) {
    let config = FolderWatcherConfig::default();
    let watcher = match FolderWatcher::watch(sound_dir, Some(config.clone())) {
        Ok(watcher) => watcher,
        Err(e) => {
            show_error(app, window, state, &e, "Failed to watch sound directory");
            return;
        }
    };

    let slot = Arc::new(SnapshotSlot::new());
    let (wake_tx, wake_rx) = bounded(1);
    let (error_tx, error_rx) = unbounded();

    let scanner = LibraryScanner::new(SoundLibrary::new(sound_dir.to_path_buf()), watcher, &config);
    spawn_blocking({
        let slot = Arc::clone(&slot);
        move || {
            if let Err(e) = scanner.run(&slot, &wake_tx) {
                let _ = error_tx.send_blocking(e);
            }
        }
    });

    MainContext::default().spawn_local({
        let state = state.clone();
        let sound_list = sound_list.clone();
        async move {
            while wake_rx.recv().await.is_ok() {
                let Some(snapshot) = slot.take() else {
                    continue;
                };
                let applied = state.borrow_mut().apply_snapshot(snapshot);
                if applied {
                    fill_sound_list(&sound_list, state.borrow().sounds());
                }
            }
            debug!("Watch loop stopped sending updates");
        }
    });

    watch_errors(app, window, state, error_rx);
}

/// Shows the first error the watch loop reports.
fn watch_errors(
    app: &Application,
    window: &ApplicationWindow,
    state: &SharedState,
    error_rx: Receiver<SoundboardError>,
) {
    let app = app.clone();
    let window = window.clone();
    let state = state.clone();
    MainContext::default().spawn_local(async move {
        if let Ok(error) = error_rx.recv().await {
            show_error(&app, &window, &state, &error, "Sound directory watch failed");
        }
    });
}

/// Replaces every row with one label per sound.
fn fill_sound_list(sound_list: &ListBox, sounds: &[SoundEntry]) {
    sound_list.remove_all();
    for sound in sounds {
        let label = Label::builder()
            .label(sound.display_name().as_ref())
            .xalign(0.0)
            .build();
        let row = ListBoxRow::builder().child(&label).build();
        sound_list.append(&row);
    }
    debug!("Showing {} sounds", sounds.len());
}

/// Opens the sound directory in the desktop's file browser.
fn open_in_file_browser(sound_dir: &Path) {
    let uri = File::for_path(sound_dir).uri();
    if let Err(e) = AppInfo::launch_default_for_uri(&uri, None::<&AppLaunchContext>) {
        warn!("Failed to open {:?} in file browser: {}", sound_dir, e);
    }
}

/// Reports an error and shows it in a message dialog.
///
/// Errors the policy treats as fatal close the application once the dialog
/// is dismissed.
pub fn show_error(
    app: &Application,
    window: &ApplicationWindow,
    state: &SharedState,
    error: &SoundboardError,
    context: &str,
) {
    let disposition = state.borrow().report(error, context);
    let message = ErrorReporter::to_user_message(error);

    let dialog = AlertDialog::new(Some(APP_TITLE), Some(&message));
    dialog.add_response("close", "_Close");
    dialog.set_default_response(Some("close"));
    dialog.set_close_response("close");

    if disposition == Fatal {
        let app = app.clone();
        dialog.connect_response(None, move |_, _| app.quit());
    }

    dialog.present(Some(window));
}
