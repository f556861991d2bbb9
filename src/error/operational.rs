//! Operational error context propagation with `anyhow`, and the policy that
//! decides which soundboard errors end the process.

use std::{error::Error as StdError, fmt::Display};

use {
    anyhow::{Context, Result as AnyhowResult},
    tracing::{error, warn},
};

use crate::error::domain::SoundboardError;

/// Extension trait for enhanced error context.
pub trait ResultExt<T, E> {
    /// Adds context to an error with a static string.
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;

    /// Adds context to an error with a formatted string.
    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn add_context(self, context: &'static str) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(context)
    }

    fn add_contextf(self, format: impl Display) -> AnyhowResult<T>
    where
        E: StdError + Send + Sync + 'static,
    {
        self.context(format.to_string())
    }
}

/// Centralized error reporting and logging.
pub struct ErrorReporter;

impl ErrorReporter {
    /// Reports a warning-level error (recoverable issues).
    pub fn warn(error: &dyn Display, context: &str) {
        warn!(context = context, error = %error, "Warning error");
    }

    /// Reports an error-level error (non-recoverable issues).
    pub fn error(error: &dyn Display, context: &str) {
        error!(context = context, error = %error, "Error error");
    }

    /// Converts an error to the message shown in the alert dialog.
    pub fn to_user_message(error: &SoundboardError) -> String {
        match error {
            SoundboardError::NoDeviceSelected => error.to_string(),
            _ => format!("An error occurred: {error}"),
        }
    }
}

/// What the shell should do after an error has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Show the message and keep running.
    Warn,
    /// Show the message and terminate.
    Fatal,
}

/// Decides per error kind whether the application continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Terminate on every failure except a missing device selection and a
    /// corrupt settings file.
    Strict,
    /// Terminate only when the sound directory or its watch is lost.
    #[default]
    Lenient,
}

impl ErrorPolicy {
    /// Classifies an error without logging it.
    #[must_use]
    pub fn disposition(self, error: &SoundboardError) -> Disposition {
        match (self, error) {
            (_, SoundboardError::NoDeviceSelected | SoundboardError::SettingsCorrupt { .. }) => {
                Disposition::Warn
            }
            (
                _,
                SoundboardError::DirectoryUnavailable { .. }
                | SoundboardError::WatchRegistrationFailure { .. },
            ) => Disposition::Fatal,
            (ErrorPolicy::Strict, _) => Disposition::Fatal,
            (ErrorPolicy::Lenient, _) => Disposition::Warn,
        }
    }

    /// Logs an error at the level matching its disposition and returns it.
    pub fn report(self, error: &SoundboardError, context: &str) -> Disposition {
        let disposition = self.disposition(error);
        match disposition {
            Disposition::Warn => ErrorReporter::warn(error, context),
            Disposition::Fatal => ErrorReporter::error(error, context),
        }
        disposition
    }
}
