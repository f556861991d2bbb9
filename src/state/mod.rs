//! Application state and the handoff of sound lists between threads.
//!
//! `AppState` lives on the UI thread. The watch loop runs elsewhere and
//! passes complete sound lists through a `SnapshotSlot`.

pub mod app_state;
pub mod snapshot;

#[cfg(test)]
mod tests;

pub use {
    app_state::AppState,
    snapshot::{LibrarySnapshot, SnapshotSlot},
};
