//! # TUI
//!
//! A small terminal UI engine and the post screen built on it.
//!
//! The engine paints into an in-memory cell grid and flushes it through a
//! [`Surface`]. Only [`CrosstermSurface`] talks to the real terminal;
//! [`ScriptedSurface`] replays canned events for tests.
//!
//! ```text
//!   Surface ──events──► Engine::tick ──► CommandTable ──► action(&mut Engine)
//!      ▲                    │
//!      └────cells───────────┴── widgets (Label, Table) + footer
//! ```

mod app;
pub mod command;
pub mod engine;
pub mod error;
pub mod surface;
pub mod widgets;

use log::{info, warn};

use crate::core::config::ResolvedConfig;
use crate::core::content::{DirectorySource, scan};
use crate::core::refresh::Refresh;

pub use app::PostScreen;
pub use command::{Command, CommandKey, CommandTable};
pub use engine::{Cursor, Engine, Handle, Mode};
pub use error::EngineError;
pub use surface::{CrosstermSurface, ScriptedSurface, Surface, SurfaceEvent, restore_terminal};
pub use widgets::{Canvas, Label, Table, Widget};

/// Show the post screen for `config.content_dir` until the user quits.
///
/// Quitting exits the process from inside the engine, so this only returns
/// on error.
pub fn run(config: ResolvedConfig) -> Result<(), EngineError> {
    let dir = config.content_dir.clone();
    let extension = config.extension.clone();
    // The first listing overlaps with terminal setup and the first paint
    let listing = Refresh::spawn("content-scan", move || scan(&dir, &extension));

    let mut engine = Engine::new(CrosstermSurface::new())?;
    let source = DirectorySource::new(&config.content_dir, &config.extension);
    let heading = format!("hydra: {}", config.content_dir.display());
    let screen = PostScreen::install(&mut engine, source, config.editor.clone(), &heading);
    screen.set_status("Loading…");
    engine.redraw()?;

    match listing.wait() {
        Some(Ok(entries)) => {
            info!("Listed {} posts", entries.len());
            screen.with_source(|source| source.set_entries(entries));
            screen.set_status("");
        }
        Some(Err(e)) => {
            warn!("Initial listing failed: {}", e);
            screen.set_status(format!("Could not list posts: {e}"));
        }
        None => screen.set_status("Could not list posts"),
    }
    screen.sync(&mut engine);
    engine.redraw()?;

    loop {
        engine.tick()?;
        if screen.relayout(&engine) {
            engine.redraw()?;
        }
    }
}
