//! Output device picker.
//!
//! Lists the enumerated output devices in a drop-down inside an alert
//! dialog; confirming selects the device and persists the choice.

use {
    libadwaita::{
        AlertDialog, Application, ApplicationWindow,
        ResponseAppearance::Suggested,
        gtk::{Button, DropDown},
        prelude::{AdwDialogExt, AlertDialogExt, ButtonExt},
    },
    tracing::debug,
};

use crate::ui::application::{APP_TITLE, SharedState, show_error};

/// Response id of the confirm button.
const SELECT_RESPONSE: &str = "select";

/// Response id of the cancel button.
const CANCEL_RESPONSE: &str = "cancel";

/// Formats the label of the button that opens the picker.
///
/// # Arguments
///
/// * `device` - Name of the active device, if any.
///
/// # Returns
///
/// The label text.
pub fn device_button_label(device: Option<&str>) -> String {
    format!(
        "Change Output Device... ({})",
        device.unwrap_or("No Device selected")
    )
}

/// Dialog for choosing the output device.
pub struct DeviceDialog {
    app: Application,
    window: ApplicationWindow,
    state: SharedState,
    /// Button whose label shows the active device.
    button: Button,
}

impl DeviceDialog {
    /// Creates a new device dialog.
    ///
    /// # Arguments
    ///
    /// * `app` - Application to quit if an error turns out fatal.
    /// * `window` - Parent window.
    /// * `state` - Application state.
    /// * `button` - Button to relabel after a selection.
    pub fn new(
        app: &Application,
        window: &ApplicationWindow,
        state: &SharedState,
        button: &Button,
    ) -> Self {
        Self {
            app: app.clone(),
            window: window.clone(),
            state: state.clone(),
            button: button.clone(),
        }
    }

    /// Enumerates devices and shows the picker.
    ///
    /// Enumeration errors are shown instead of the picker.
    pub fn present(self) {
        let listed = self.state.borrow().list_outputs();
        let outputs = match listed {
            Ok(outputs) => outputs,
            Err(e) => {
                show_error(
                    &self.app,
                    &self.window,
                    &self.state,
                    &e,
                    "Failed to list output devices",
                );
                return;
            }
        };

        let names: Vec<&str> = outputs.iter().map(String::as_str).collect();
        let drop_down = DropDown::from_strings(&names);
        let active = self.state.borrow().active_device().map(str::to_string);
        if let Some(position) = active
            .as_deref()
            .and_then(|active| outputs.iter().position(|output| output == active))
            .and_then(|position| u32::try_from(position).ok())
        {
            drop_down.set_selected(position);
        }

        let body = if outputs.is_empty() {
            "No output devices found."
        } else {
            "Select the device sounds are played on."
        };
        let dialog = AlertDialog::new(Some(APP_TITLE), Some(body));
        dialog.add_response(CANCEL_RESPONSE, "_Cancel");
        dialog.add_response(SELECT_RESPONSE, "_Select");
        dialog.set_response_appearance(SELECT_RESPONSE, Suggested);
        dialog.set_response_enabled(SELECT_RESPONSE, !outputs.is_empty());
        dialog.set_default_response(Some(SELECT_RESPONSE));
        dialog.set_close_response(CANCEL_RESPONSE);
        dialog.set_extra_child(Some(&drop_down));

        let window = self.window.clone();
        dialog.connect_response(Some(SELECT_RESPONSE), move |_, _| {
            let Some(name) = usize::try_from(drop_down.selected())
                .ok()
                .and_then(|index| outputs.get(index))
            else {
                debug!("No output device chosen");
                return;
            };
            self.select(name);
        });

        dialog.present(Some(&window));
    }

    fn select(&self, name: &str) {
        let result = self.state.borrow_mut().select_device(name);
        self.button
            .set_label(&device_button_label(self.state.borrow().active_device()));

        if let Err(e) = result {
            show_error(
                &self.app,
                &self.window,
                &self.state,
                &e,
                "Failed to select output device",
            );
        }
    }
}
