//! Error handling built on `thiserror` and `anyhow`.
//!
//! `domain` holds the `SoundboardError` taxonomy; `operational` holds
//! context helpers, logging, and the policy that decides which errors are
//! fatal.

pub mod domain;
pub mod operational;

pub use {
    domain::{Result, SoundboardError},
    operational::{Disposition, ErrorPolicy, ErrorReporter, ResultExt},
};
