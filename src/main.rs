//! Soundboard
//!
//! This is the main entry point for the soundboard application.
//! It initializes logging and GTK/Libadwaita and starts the main loop.

use {
    anyhow::Result,
    libadwaita::{gtk, init as adw_init},
    soundboard::ui::SoundboardApplication,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

/// Main entry point for the soundboard application.
///
/// Log verbosity follows `RUST_LOG` and defaults to `info`.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    info!("Starting soundboard v{}", env!("CARGO_PKG_VERSION"));

    // Initialize GTK and Libadwaita
    gtk::init()?;
    if let Err(e) = adw_init() {
        warn!("Failed to initialize Libadwaita: {}", e);
    }

    // Create and run the application
    let app = SoundboardApplication::new()?;
    app.run();

    Ok(())
}
