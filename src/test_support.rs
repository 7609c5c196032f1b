//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::tui::{Engine, ScriptedSurface};

/// An engine over a blank scripted surface of `width` x `height` cells.
pub fn engine(width: u16, height: u16) -> Engine<ScriptedSurface> {
    Engine::new(ScriptedSurface::new(width, height)).unwrap()
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
